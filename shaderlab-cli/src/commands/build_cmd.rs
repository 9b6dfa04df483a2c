use std::path::PathBuf;

use crate::project::ProjectContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// wasm-pack bundle of the host runtime.
    Web,
    /// cdylib of the native module for foreign hosts.
    Native,
}

impl Target {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Web => "web runtime",
            Self::Native => "native module",
        }
    }

    fn program(&self) -> &'static str {
        match self {
            Self::Web => "wasm-pack",
            Self::Native => "cargo",
        }
    }

    fn command(&self, workspace: &std::path::Path) -> (Vec<&'static str>, PathBuf) {
        match self {
            Self::Web => (
                vec!["build", "--target", "web", "--release"],
                workspace.join("shaderlab-web"),
            ),
            Self::Native => (
                vec!["build", "--release", "-p", "shaderlab-native"],
                workspace.to_path_buf(),
            ),
        }
    }
}

pub async fn run(target: Option<String>, ctx: ProjectContext) -> anyhow::Result<()> {
    let target_str = match target.as_deref().or(ctx.default_target()) {
        Some(t) => t.to_string(),
        None => anyhow::bail!("No target given and no default_target configured. Options: web, native"),
    };
    let target = parse_target(&target_str)?;

    let program = target.program();
    let program_path = which::which(program)
        .map_err(|_| anyhow::anyhow!("`{program}` not found on PATH; it is required to build the {}", target.label()))?;
    let (args, cwd) = target.command(&ctx.workspace_path);

    println!("Building {} in {}...", target.label(), cwd.display());
    log::debug!("using {}", program_path.display());

    let status = tokio::process::Command::new(program_path)
        .args(&args)
        .current_dir(&cwd)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .await?;

    std::process::exit(status.code().unwrap_or(1));
}

fn parse_target(s: &str) -> anyhow::Result<Target> {
    match s.to_lowercase().as_str() {
        "web" | "wasm" => Ok(Target::Web),
        "native" | "ffi" => Ok(Target::Native),
        _ => anyhow::bail!("Unknown target: {s}. Options: web, native"),
    }
}
