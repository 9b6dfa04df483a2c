pub mod build_cmd;
pub mod options_cmd;
pub mod preview_cmd;
pub mod validate_cmd;
