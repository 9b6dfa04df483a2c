//! Marshalling of matrices, controller poses and shader sources into the
//! native module's linear memory.
//!
//! Every call follows acquire, write, call, release. Buffers are owned by a
//! [`ScopedHeap`] and released when it drops, so no foreign-side buffer
//! outlives the call that allocated it. When the module is not ready every
//! operation is skipped and reports `Ok(false)` (or `Ok(None)`).

use glam::{Mat4, Quat, Vec3};
use shaderlab_shared::math::to_column_major;
use shaderlab_shared::viewport::Viewport;

use crate::error::TransportError;

/// Button values carried per controller.
pub const CONTROLLER_BUTTONS: usize = 4;

/// Operations the host needs from the native module. Pointers are offsets
/// into the module's own linear memory.
pub trait NativeModule {
    /// `false` until the module has finished initializing.
    fn is_ready(&self) -> bool;

    fn malloc(&mut self, bytes: u32) -> Result<u32, TransportError>;
    fn free(&mut self, ptr: u32) -> Result<(), TransportError>;
    fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), TransportError>;
    fn read_c_string(&self, ptr: u32) -> Result<String, TransportError>;

    fn set_view_and_projection_matrices(&mut self, view_ptr: u32, projection_ptr: u32) -> Result<(), TransportError>;
    fn set_controller_at_index(
        &mut self,
        index: i32,
        position_ptr: u32,
        velocity_ptr: u32,
        orientation_ptr: u32,
        buttons_ptr: u32,
    ) -> Result<(), TransportError>;
    fn set_user_shader_source(&mut self, index: i32, source_ptr: u32) -> Result<(), TransportError>;
    /// Module-owned string; the caller must not free it.
    fn get_user_shader_source(&mut self, index: i32) -> Result<u32, TransportError>;

    fn update(&mut self, time_seconds: f64);
    fn render(&mut self, viewport: Viewport);
    fn average_frames_per_second(&self) -> f64;
}

// ============================================================
// Scoped allocation
// ============================================================

/// Owns every allocation made through it and frees them all on drop,
/// including when a later write or call fails.
pub struct ScopedHeap<'m, M: NativeModule + ?Sized> {
    module: &'m mut M,
    allocations: Vec<u32>,
}

impl<'m, M: NativeModule + ?Sized> ScopedHeap<'m, M> {
    pub fn new(module: &'m mut M) -> Self {
        Self {
            module,
            allocations: Vec::new(),
        }
    }

    pub fn alloc_f32(&mut self, values: &[f32]) -> Result<u32, TransportError> {
        self.alloc_bytes(bytemuck::cast_slice(values))
    }

    /// NUL-terminated copy of `s`.
    pub fn alloc_c_string(&mut self, s: &str) -> Result<u32, TransportError> {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        self.alloc_bytes(&bytes)
    }

    fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<u32, TransportError> {
        let ptr = self.module.malloc(bytes.len() as u32)?;
        self.allocations.push(ptr);
        self.module.write_bytes(ptr, bytes)?;
        Ok(ptr)
    }

    pub fn module(&mut self) -> &mut M {
        &mut *self.module
    }
}

impl<M: NativeModule + ?Sized> Drop for ScopedHeap<'_, M> {
    fn drop(&mut self) {
        for ptr in self.allocations.drain(..) {
            if let Err(e) = self.module.free(ptr) {
                log::error!("failed to release native buffer {ptr:#x}: {e}");
            }
        }
    }
}

// ============================================================
// Controller pose
// ============================================================

/// Tracked controller sample. Absent fields are sent as zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerPose {
    pub position: Option<Vec3>,
    pub linear_velocity: Option<Vec3>,
    pub orientation: Option<Quat>,
    /// Analog button values; only the first four are sent.
    pub buttons: Vec<f32>,
}

impl ControllerPose {
    /// Flat buffers in wire order: position, velocity, orientation `[x, y, z, w]`, buttons.
    pub fn marshal(&self) -> ([f32; 3], [f32; 3], [f32; 4], [f32; CONTROLLER_BUTTONS]) {
        let position = self.position.unwrap_or(Vec3::ZERO).to_array();
        let velocity = self.linear_velocity.unwrap_or(Vec3::ZERO).to_array();
        let orientation = self.orientation.map_or([0.0; 4], |q| q.to_array());
        let mut buttons = [0.0; CONTROLLER_BUTTONS];
        for (slot, value) in buttons.iter_mut().zip(&self.buttons) {
            *slot = *value;
        }
        (position, velocity, orientation, buttons)
    }
}

// ============================================================
// Operations
// ============================================================

pub fn send_view_projection<M: NativeModule + ?Sized>(
    module: &mut M,
    view: &Mat4,
    projection: &Mat4,
) -> Result<bool, TransportError> {
    if !module.is_ready() {
        return Ok(false);
    }
    let mut heap = ScopedHeap::new(module);
    let view_ptr = heap.alloc_f32(&to_column_major(view))?;
    let projection_ptr = heap.alloc_f32(&to_column_major(projection))?;
    heap.module().set_view_and_projection_matrices(view_ptr, projection_ptr)?;
    Ok(true)
}

/// `index` 0 is the left hand, 1 the right.
pub fn send_controller_pose<M: NativeModule + ?Sized>(
    module: &mut M,
    index: i32,
    pose: &ControllerPose,
) -> Result<bool, TransportError> {
    if !module.is_ready() {
        return Ok(false);
    }
    let (position, velocity, orientation, buttons) = pose.marshal();
    let mut heap = ScopedHeap::new(module);
    let position_ptr = heap.alloc_f32(&position)?;
    let velocity_ptr = heap.alloc_f32(&velocity)?;
    let orientation_ptr = heap.alloc_f32(&orientation)?;
    let buttons_ptr = heap.alloc_f32(&buttons)?;
    heap.module()
        .set_controller_at_index(index, position_ptr, velocity_ptr, orientation_ptr, buttons_ptr)?;
    Ok(true)
}

pub fn set_shader_source<M: NativeModule + ?Sized>(
    module: &mut M,
    index: i32,
    source: &str,
) -> Result<bool, TransportError> {
    if !module.is_ready() {
        return Ok(false);
    }
    let mut heap = ScopedHeap::new(module);
    let ptr = heap.alloc_c_string(source)?;
    heap.module().set_user_shader_source(index, ptr)?;
    Ok(true)
}

pub fn shader_source<M: NativeModule + ?Sized>(module: &mut M, index: i32) -> Result<Option<String>, TransportError> {
    if !module.is_ready() {
        return Ok(None);
    }
    let ptr = module.get_user_shader_source(index)?;
    Ok(Some(module.read_c_string(ptr)?))
}

pub fn update<M: NativeModule + ?Sized>(module: &mut M, time_seconds: f64) -> bool {
    if !module.is_ready() {
        return false;
    }
    module.update(time_seconds);
    true
}

pub fn render<M: NativeModule + ?Sized>(module: &mut M, viewport: Viewport) -> bool {
    if !module.is_ready() {
        return false;
    }
    module.render(viewport);
    true
}
