//! Export and import of the live scene (camera pose plus shader slots).

use glam::{Quat, Vec3};
use shaderlab_shared::scene_format::SceneDocument;
use shaderlab_shared::shaders::{ShaderSlot, SHADER_SLOT_COUNT};

use crate::camera::Camera;
use crate::error::SceneLoadError;
use crate::transport::{self, NativeModule};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub position: Vec3,
    pub orientation: Quat,
    pub shaders: [String; SHADER_SLOT_COUNT],
}

impl SceneSnapshot {
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument::from_parts(self.position, self.orientation, &self.shaders)
    }
}

/// Read the camera pose and all four slot sources.
pub fn capture<M: NativeModule + ?Sized>(camera: &Camera, module: &mut M) -> Result<SceneSnapshot, SceneLoadError> {
    let mut shaders: [String; SHADER_SLOT_COUNT] = Default::default();
    for slot in ShaderSlot::ALL {
        shaders[slot.index()] =
            transport::shader_source(module, slot.index() as i32)?.ok_or(SceneLoadError::NotReady)?;
    }
    Ok(SceneSnapshot {
        position: camera.position,
        orientation: camera.orientation,
        shaders,
    })
}

/// Validate `json` completely, then apply it. An invalid document or a module
/// that is not ready leaves camera and shaders untouched.
pub fn apply_scene<M: NativeModule + ?Sized>(
    json: &str,
    camera: &mut Camera,
    module: &mut M,
) -> Result<(), SceneLoadError> {
    let scene = SceneDocument::parse(json).map_err(|e| {
        log::warn!("scene rejected: {e}");
        SceneLoadError::from(e)
    })?;
    if !module.is_ready() {
        return Err(SceneLoadError::NotReady);
    }

    for (index, source) in scene.shaders.iter().enumerate() {
        if let Some(source) = source {
            transport::set_shader_source(module, index as i32, source)?;
        }
    }
    camera.position = scene.position;
    camera.orientation = scene.orientation;
    camera.recompute_matrices();
    log::info!("scene loaded at {:?}", scene.position);
    Ok(())
}
