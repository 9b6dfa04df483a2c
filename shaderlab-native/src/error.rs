use thiserror::Error;

use crate::heap::HeapError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("controller index {0} out of range")]
    ControllerIndex(i32),
    #[error("shader slot {0} out of range")]
    ShaderSlot(i32),
}

/// Failure of an offset-addressed entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error(transparent)]
    Heap(#[from] HeapError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
