//! Types shared between the ShaderLab native module and its host runtimes:
//! transform math, the common uniform block layout, the JSON scene format,
//! and the embedded GLSL templates.

pub mod math;
pub mod scene_format;
pub mod shaders;
pub mod uniforms;
pub mod viewport;
