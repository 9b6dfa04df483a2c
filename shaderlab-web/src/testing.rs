//! Recording native module for host-side tests.

use std::collections::HashSet;

use glam::Mat4;
use shaderlab_native::HostedModule;
use shaderlab_shared::uniforms::CommonUniforms;
use shaderlab_shared::viewport::Viewport;

use crate::error::TransportError;
use crate::transport::NativeModule;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Malloc(u32),
    Free(u32),
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    SetController {
        index: i32,
        position: [f32; 3],
        velocity: [f32; 3],
        orientation: [f32; 4],
        buttons: [f32; 4],
    },
    SetShaderSource {
        index: i32,
        source: String,
    },
    GetShaderSource(i32),
    Update(f64),
    Render(Viewport),
}

/// Wraps a real [`HostedModule`] and records every boundary call in order.
pub struct RecordingModule {
    pub inner: HostedModule,
    pub ready: bool,
    pub calls: Vec<Call>,
    outstanding: HashSet<u32>,
}

impl RecordingModule {
    pub fn new() -> Self {
        Self {
            inner: HostedModule::new(),
            ready: true,
            calls: Vec::new(),
            outstanding: HashSet::new(),
        }
    }

    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Host allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.outstanding.len()
    }

    pub fn uniforms(&self) -> &CommonUniforms {
        self.inner.engine().uniforms()
    }

    /// Calls other than heap management.
    pub fn boundary_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Malloc(_) | Call::Free(_)))
            .collect()
    }
}

impl NativeModule for RecordingModule {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn malloc(&mut self, bytes: u32) -> Result<u32, TransportError> {
        self.calls.push(Call::Malloc(bytes));
        let ptr = NativeModule::malloc(&mut self.inner, bytes)?;
        self.outstanding.insert(ptr);
        Ok(ptr)
    }

    fn free(&mut self, ptr: u32) -> Result<(), TransportError> {
        self.calls.push(Call::Free(ptr));
        self.outstanding.remove(&ptr);
        NativeModule::free(&mut self.inner, ptr)
    }

    fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), TransportError> {
        NativeModule::write_bytes(&mut self.inner, ptr, bytes)
    }

    fn read_c_string(&self, ptr: u32) -> Result<String, TransportError> {
        NativeModule::read_c_string(&self.inner, ptr)
    }

    fn set_view_and_projection_matrices(&mut self, view_ptr: u32, projection_ptr: u32) -> Result<(), TransportError> {
        let heap = self.inner.heap();
        let view = Mat4::from_cols_array(&heap.read_f32::<16>(view_ptr)?);
        let projection = Mat4::from_cols_array(&heap.read_f32::<16>(projection_ptr)?);
        self.calls.push(Call::SetViewProjection { view, projection });
        NativeModule::set_view_and_projection_matrices(&mut self.inner, view_ptr, projection_ptr)
    }

    fn set_controller_at_index(
        &mut self,
        index: i32,
        position_ptr: u32,
        velocity_ptr: u32,
        orientation_ptr: u32,
        buttons_ptr: u32,
    ) -> Result<(), TransportError> {
        let heap = self.inner.heap();
        self.calls.push(Call::SetController {
            index,
            position: heap.read_f32(position_ptr)?,
            velocity: heap.read_f32(velocity_ptr)?,
            orientation: heap.read_f32(orientation_ptr)?,
            buttons: heap.read_f32(buttons_ptr)?,
        });
        NativeModule::set_controller_at_index(
            &mut self.inner,
            index,
            position_ptr,
            velocity_ptr,
            orientation_ptr,
            buttons_ptr,
        )
    }

    fn set_user_shader_source(&mut self, index: i32, source_ptr: u32) -> Result<(), TransportError> {
        let source = self.inner.heap().read_c_string(source_ptr)?;
        self.calls.push(Call::SetShaderSource { index, source });
        NativeModule::set_user_shader_source(&mut self.inner, index, source_ptr)
    }

    fn get_user_shader_source(&mut self, index: i32) -> Result<u32, TransportError> {
        self.calls.push(Call::GetShaderSource(index));
        NativeModule::get_user_shader_source(&mut self.inner, index)
    }

    fn update(&mut self, time_seconds: f64) {
        self.calls.push(Call::Update(time_seconds));
        NativeModule::update(&mut self.inner, time_seconds);
    }

    fn render(&mut self, viewport: Viewport) {
        self.calls.push(Call::Render(viewport));
        NativeModule::render(&mut self.inner, viewport);
    }

    fn average_frames_per_second(&self) -> f64 {
        NativeModule::average_frames_per_second(&self.inner)
    }
}
