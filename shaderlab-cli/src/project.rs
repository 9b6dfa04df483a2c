use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the CLI is being run from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKind {
    /// A ShaderLab source checkout (has both runtime crates).
    Workspace,
    /// A scene project with .shaderlab/config.toml
    SceneProject,
}

/// Configuration read from .shaderlab/config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// ShaderLab checkout, relative to the project root.
    pub workspace_path: String,
    #[serde(default)]
    pub default_target: Option<String>,
    /// Viewer options preset used by `preview`, relative to the project root.
    #[serde(default)]
    pub options: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project_root: PathBuf,
    pub kind: ProjectKind,
    /// For Workspace: same as project_root.
    pub workspace_path: PathBuf,
    pub config: Option<ProjectConfig>,
}

impl ProjectContext {
    pub fn default_target(&self) -> Option<&str> {
        self.config.as_ref()?.default_target.as_deref()
    }

    pub fn options_path(&self) -> Option<PathBuf> {
        let options = self.config.as_ref()?.options.as_ref()?;
        Some(self.project_root.join(options))
    }
}

/// Detect project context from the current directory, walking up.
pub fn detect_project_context() -> anyhow::Result<ProjectContext> {
    detect_project_context_from(&std::env::current_dir()?)
}

pub fn detect_project_context_from(start: &Path) -> anyhow::Result<ProjectContext> {
    let mut dir = start.to_path_buf();
    loop {
        if is_workspace(&dir) {
            return Ok(ProjectContext {
                project_root: dir.clone(),
                kind: ProjectKind::Workspace,
                workspace_path: dir,
                config: None,
            });
        }
        let config_path = dir.join(".shaderlab").join("config.toml");
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: ProjectConfig = toml::from_str(&content)?;
            let workspace_path = dir.join(&config.workspace_path);
            return Ok(ProjectContext {
                project_root: dir,
                kind: ProjectKind::SceneProject,
                workspace_path,
                config: Some(config),
            });
        }
        if !dir.pop() {
            anyhow::bail!(
                "Could not find a ShaderLab project.\n\
                 Run `slcli` from within a ShaderLab checkout or a directory with .shaderlab/config.toml"
            );
        }
    }
}

fn is_workspace(dir: &Path) -> bool {
    dir.join("Cargo.toml").exists()
        && dir.join("shaderlab-native").join("Cargo.toml").exists()
        && dir.join("shaderlab-web").join("Cargo.toml").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[workspace]").unwrap();
        for member in ["shaderlab-native", "shaderlab-web"] {
            let member_dir = dir.path().join(member);
            std::fs::create_dir(&member_dir).unwrap();
            std::fs::write(member_dir.join("Cargo.toml"), "[package]").unwrap();
        }
        let nested = dir.path().join("shaderlab-web");

        let ctx = detect_project_context_from(&nested).unwrap();
        assert_eq!(ctx.kind, ProjectKind::Workspace);
        assert_eq!(ctx.project_root, dir.path());
        assert!(ctx.config.is_none());
        assert_eq!(ctx.default_target(), None);
    }

    #[test]
    fn test_detect_scene_project() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".shaderlab");
        std::fs::create_dir(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "workspace_path = \"../shaderlab\"\ndefault_target = \"web\"\noptions = \"viewer.toml\"\n",
        )
        .unwrap();

        let ctx = detect_project_context_from(dir.path()).unwrap();
        assert_eq!(ctx.kind, ProjectKind::SceneProject);
        assert_eq!(ctx.workspace_path, dir.path().join("../shaderlab"));
        assert_eq!(ctx.default_target(), Some("web"));
        assert_eq!(ctx.options_path(), Some(dir.path().join("viewer.toml")));
    }

    #[test]
    fn test_detect_no_project() {
        let dir = tempfile::tempdir().unwrap();
        // Nested so pop() hits the tempdir root, not filesystem root
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(detect_project_context_from(&nested).is_err());
    }
}
