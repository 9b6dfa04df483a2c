//! JSON scene format used for share links and exports.
//!
//! ```json
//! {
//!   "camera": { "position": [0, 0, 3], "orientation": [0, 0, 0, 1] },
//!   "shaders": [{ "source": "..." }, { "source": "..." }, ...]
//! }
//! ```
//!
//! `orientation` is the world-to-camera rotation as `[x, y, z, w]`: the view
//! matrix is `R(orientation) * T(-position)`, so it is the inverse of the
//! camera's rotation in world space.
//!
//! Documents written before the common slot existed carry three shaders
//! (simulation, vertex, fragment); they land in slots 1..=3.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shaders::SHADER_SLOT_COUNT;

/// Shader count of pre-common-slot documents.
pub const LEGACY_SHADER_COUNT: usize = 3;
/// Slot offset applied to legacy shader arrays.
pub const LEGACY_SLOT_OFFSET: usize = 1;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("camera.position needs at least 3 numbers, found {0}")]
    ShortPosition(usize),
    #[error("camera.orientation needs at least 4 numbers, found {0}")]
    ShortOrientation(usize),
    #[error("camera.{field} component {index} is not a finite number")]
    NonFinite { field: &'static str, index: usize },
    #[error("camera.orientation has zero length")]
    DegenerateOrientation,
    #[error("scene needs at least 3 shaders, found {0}")]
    TooFewShaders(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub position: Vec<f32>,
    /// World-to-camera quaternion as `[x, y, z, w]`.
    pub orientation: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderRecord {
    pub source: String,
}

/// On-disk/on-link representation. Unvalidated until [`SceneDocument::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub camera: CameraRecord,
    pub shaders: Vec<ShaderRecord>,
}

/// A document that passed validation, ready to apply without further checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedScene {
    pub position: Vec3,
    pub orientation: Quat,
    /// One entry per shader slot; `None` leaves the slot untouched.
    pub shaders: [Option<String>; SHADER_SLOT_COUNT],
}

impl SceneDocument {
    /// Build a document from a live camera pose and all four slot sources.
    pub fn from_parts(position: Vec3, orientation: Quat, sources: &[String; SHADER_SLOT_COUNT]) -> Self {
        Self {
            camera: CameraRecord {
                position: position.to_array().to_vec(),
                orientation: orientation.to_array().to_vec(),
            },
            shaders: sources
                .iter()
                .map(|source| ShaderRecord { source: source.clone() })
                .collect(),
        }
    }

    /// Parse and validate in one step.
    pub fn parse(json: &str) -> Result<ValidatedScene, SceneError> {
        let doc: SceneDocument = serde_json::from_str(json)?;
        doc.validate()
    }

    pub fn to_json(&self) -> String {
        // Validated documents hold only strings and finite floats.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every field before anything is applied to live state.
    pub fn validate(&self) -> Result<ValidatedScene, SceneError> {
        let p = &self.camera.position;
        if p.len() < 3 {
            return Err(SceneError::ShortPosition(p.len()));
        }
        let o = &self.camera.orientation;
        if o.len() < 4 {
            return Err(SceneError::ShortOrientation(o.len()));
        }
        check_finite("position", &p[..3])?;
        check_finite("orientation", &o[..4])?;
        let orientation = Quat::from_xyzw(o[0], o[1], o[2], o[3]);
        if orientation.length_squared() <= f32::EPSILON {
            return Err(SceneError::DegenerateOrientation);
        }

        let count = self.shaders.len();
        if count < LEGACY_SHADER_COUNT {
            return Err(SceneError::TooFewShaders(count));
        }
        let offset = if count == LEGACY_SHADER_COUNT { LEGACY_SLOT_OFFSET } else { 0 };

        let mut shaders: [Option<String>; SHADER_SLOT_COUNT] = Default::default();
        for (i, record) in self.shaders.iter().take(SHADER_SLOT_COUNT - offset).enumerate() {
            shaders[i + offset] = Some(record.source.clone());
        }

        Ok(ValidatedScene {
            position: Vec3::new(p[0], p[1], p[2]),
            orientation: orientation.normalize(),
            shaders,
        })
    }
}

fn check_finite(field: &'static str, values: &[f32]) -> Result<(), SceneError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SceneError::NonFinite { field, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_json(shader_count: usize) -> String {
        let shaders: Vec<String> = (0..shader_count)
            .map(|i| format!(r#"{{ "source": "src{i}" }}"#))
            .collect();
        format!(
            r#"{{ "camera": {{ "position": [1, 2, 3], "orientation": [0, 0, 0, 1] }}, "shaders": [{}] }}"#,
            shaders.join(",")
        )
    }

    #[test]
    fn test_legacy_three_shaders_shift_by_one() {
        let scene = SceneDocument::parse(&doc_json(3)).unwrap();
        assert_eq!(scene.shaders[0], None);
        assert_eq!(scene.shaders[1].as_deref(), Some("src0"));
        assert_eq!(scene.shaders[2].as_deref(), Some("src1"));
        assert_eq!(scene.shaders[3].as_deref(), Some("src2"));
    }

    #[test]
    fn test_four_shaders_map_directly() {
        let scene = SceneDocument::parse(&doc_json(4)).unwrap();
        for i in 0..4 {
            assert_eq!(scene.shaders[i].as_deref(), Some(format!("src{i}").as_str()));
        }
        assert_eq!(scene.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.orientation, Quat::IDENTITY);
    }

    #[test]
    fn test_extra_shaders_are_ignored() {
        let scene = SceneDocument::parse(&doc_json(6)).unwrap();
        assert_eq!(scene.shaders[3].as_deref(), Some("src3"));
    }

    #[test]
    fn test_too_few_shaders_rejected() {
        let err = SceneDocument::parse(&doc_json(2)).unwrap_err();
        assert!(matches!(err, SceneError::TooFewShaders(2)));
    }

    #[test]
    fn test_short_camera_arrays_rejected() {
        let json = r#"{ "camera": { "position": [1, 2], "orientation": [0, 0, 0, 1] }, "shaders": [] }"#;
        assert!(matches!(SceneDocument::parse(json), Err(SceneError::ShortPosition(2))));

        let json = r#"{ "camera": { "position": [1, 2, 3], "orientation": [0, 0, 1] }, "shaders": [] }"#;
        assert!(matches!(SceneDocument::parse(json), Err(SceneError::ShortOrientation(3))));
    }

    #[test]
    fn test_zero_orientation_rejected() {
        let json = doc_json(4).replace("[0, 0, 0, 1]", "[0, 0, 0, 0]");
        assert!(matches!(SceneDocument::parse(&json), Err(SceneError::DegenerateOrientation)));
    }

    #[test]
    fn test_out_of_range_camera_values_rejected() {
        let json = doc_json(4).replace("[1, 2, 3]", "[1e39, 2, 3]");
        assert!(matches!(
            SceneDocument::parse(&json),
            Err(SceneError::NonFinite { field: "position", index: 0 })
        ));

        let json = doc_json(4).replace("[0, 0, 0, 1]", "[0, 0, -1e39, 1]");
        assert!(matches!(
            SceneDocument::parse(&json),
            Err(SceneError::NonFinite { field: "orientation", index: 2 })
        ));
    }

    #[test]
    fn test_non_finite_pose_does_not_export_unloadable_json() {
        let sources = std::array::from_fn(|i| format!("src{i}"));
        let doc = SceneDocument::from_parts(Vec3::new(f32::INFINITY, 0.0, 0.0), Quat::IDENTITY, &sources);
        assert!(doc.to_json().contains("null"));
        assert!(matches!(doc.validate(), Err(SceneError::NonFinite { field: "position", index: 0 })));
    }

    #[test]
    fn test_unparsable_json_rejected() {
        assert!(matches!(SceneDocument::parse("{ not json"), Err(SceneError::Parse(_))));
        assert!(matches!(SceneDocument::parse(r#"{ "shaders": [] }"#), Err(SceneError::Parse(_))));
    }

    #[test]
    fn test_exported_document_reloads() {
        let sources = [
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ];
        let orientation = Quat::from_rotation_y(0.5);
        let doc = SceneDocument::from_parts(Vec3::new(0.5, -1.0, 2.0), orientation, &sources);
        let scene = SceneDocument::parse(&doc.to_json()).unwrap();
        assert_eq!(scene.shaders[2].as_deref(), Some("c"));
        assert!(scene.orientation.abs_diff_eq(orientation, 1e-6));
    }
}
