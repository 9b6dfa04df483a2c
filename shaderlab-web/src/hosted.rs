//! In-process native module: the host links `shaderlab-native` directly and
//! drives it through the same offset-addressed boundary a foreign build uses.

use shaderlab_native::HostedModule;
use shaderlab_shared::viewport::Viewport;

use crate::error::TransportError;
use crate::transport::NativeModule;

impl NativeModule for HostedModule {
    fn is_ready(&self) -> bool {
        true
    }

    fn malloc(&mut self, bytes: u32) -> Result<u32, TransportError> {
        Ok(HostedModule::malloc(self, bytes)?)
    }

    fn free(&mut self, ptr: u32) -> Result<(), TransportError> {
        Ok(HostedModule::free(self, ptr)?)
    }

    fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<(), TransportError> {
        Ok(self.heap_mut().write_bytes(ptr, bytes)?)
    }

    fn read_c_string(&self, ptr: u32) -> Result<String, TransportError> {
        Ok(self.heap().read_c_string(ptr)?)
    }

    fn set_view_and_projection_matrices(&mut self, view_ptr: u32, projection_ptr: u32) -> Result<(), TransportError> {
        Ok(HostedModule::set_view_and_projection_matrices(self, view_ptr, projection_ptr)?)
    }

    fn set_controller_at_index(
        &mut self,
        index: i32,
        position_ptr: u32,
        velocity_ptr: u32,
        orientation_ptr: u32,
        buttons_ptr: u32,
    ) -> Result<(), TransportError> {
        Ok(HostedModule::set_controller_at_index(
            self,
            index,
            position_ptr,
            velocity_ptr,
            orientation_ptr,
            buttons_ptr,
        )?)
    }

    fn set_user_shader_source(&mut self, index: i32, source_ptr: u32) -> Result<(), TransportError> {
        Ok(self.set_user_shader_source_at_index(index, source_ptr)?)
    }

    fn get_user_shader_source(&mut self, index: i32) -> Result<u32, TransportError> {
        Ok(self.get_user_shader_source_at_index(index)?)
    }

    fn update(&mut self, time_seconds: f64) {
        HostedModule::update(self, time_seconds);
    }

    fn render(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            log::debug!("render skipped for empty viewport {viewport:?}");
            return;
        }
        HostedModule::render(self, viewport.x, viewport.y, viewport.width, viewport.height);
    }

    fn average_frames_per_second(&self) -> f64 {
        HostedModule::average_frames_per_second(self)
    }
}
