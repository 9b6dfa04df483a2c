//! Crate-level error types.

use shaderlab_native::{HeapError, ModuleError};
use shaderlab_shared::scene_format::SceneError;
use thiserror::Error;

/// Failure talking to the native module. Not-ready is never an error; those
/// calls are skipped instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("native heap: {0}")]
    Heap(#[from] HeapError),
    #[error("native call failed: {0}")]
    Module(#[from] ModuleError),
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("options parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("options serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Why a scene document was not applied. Nothing is mutated in either case.
#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("invalid scene: {0}")]
    Invalid(#[from] SceneError),
    #[error("native module is not ready")]
    NotReady,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
