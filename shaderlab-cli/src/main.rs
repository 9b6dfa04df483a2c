mod cli;
mod commands;
mod project;

use clap::Parser;

use cli::{Cli, Command};
use commands::preview_cmd::PreviewSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build { target } => {
            let ctx = project::detect_project_context()?;
            commands::build_cmd::run(target, ctx).await
        }
        Command::Validate { scene } => commands::validate_cmd::run(&scene),
        Command::Preview {
            scene,
            frames,
            stereo,
            width,
            height,
            options,
        } => commands::preview_cmd::run(
            &scene,
            options,
            PreviewSettings {
                frames,
                stereo,
                width,
                height,
            },
        ),
        Command::Options { write } => commands::options_cmd::run(write),
    }
}
