use std::path::PathBuf;

use anyhow::Context;
use shaderlab_web::ViewerOptions;

pub fn run(write: Option<PathBuf>) -> anyhow::Result<()> {
    let options = ViewerOptions::default();
    match write {
        Some(path) => {
            options.save(&path).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default viewer options to {}", path.display());
        }
        None => print!("{}", options.to_toml()?),
    }
    Ok(())
}
