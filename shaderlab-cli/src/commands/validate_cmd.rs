use std::path::Path;

use anyhow::Context;
use glam::{Quat, Vec3};
use shaderlab_native::pragma;
use shaderlab_shared::scene_format::{SceneDocument, SceneError};
use shaderlab_shared::shaders::{ShaderSlot, SHADER_SLOT_COUNT};

/// What a scene document would load.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub position: Vec3,
    pub orientation: Quat,
    /// Written before the common slot existed.
    pub legacy: bool,
    /// Source length per slot; `None` keeps the current source.
    pub slot_lengths: [Option<usize>; SHADER_SLOT_COUNT],
    pub particle_resolution: [i32; 2],
    pub vertex_count: i32,
}

pub fn inspect(json: &str) -> Result<SceneReport, SceneError> {
    let scene = SceneDocument::parse(json)?;
    let source = |slot: ShaderSlot| scene.shaders[slot.index()].as_deref().unwrap_or("");
    Ok(SceneReport {
        position: scene.position,
        orientation: scene.orientation,
        legacy: scene.shaders[ShaderSlot::Common.index()].is_none(),
        slot_lengths: std::array::from_fn(|i| scene.shaders[i].as_ref().map(String::len)),
        particle_resolution: pragma::particle_resolution(source(ShaderSlot::Simulation)),
        vertex_count: pragma::vertex_count(source(ShaderSlot::Vertex)),
    })
}

pub fn run(path: &Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let report = inspect(&json).with_context(|| format!("{} is not a valid scene", path.display()))?;

    println!("{}: ok{}", path.display(), if report.legacy { " (legacy, 3 shaders)" } else { "" });
    println!("  camera position    {:?}", report.position.to_array());
    println!("  camera orientation {:?}", report.orientation.to_array());
    for slot in ShaderSlot::ALL {
        match report.slot_lengths[slot.index()] {
            Some(len) => println!("  {:<10} {len} bytes", slot.label()),
            None => println!("  {:<10} (unchanged)", slot.label()),
        }
    }
    let [w, h] = report.particle_resolution;
    println!("  particles          {w}x{h}, {} vertices each", report.vertex_count);
    Ok(())
}
