use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Number of tracked controllers (0 = left hand, 1 = right hand).
pub const CONTROLLER_COUNT: usize = 2;

/// Default particle framebuffer edge length when no `#pragma size` is given.
pub const DEFAULT_PARTICLE_RESOLUTION: i32 = 256;

/// Uniform block shared by the simulation and shading programs.
///
/// Layout matches the `CommonUniforms` block in `shaders/common_uniforms.glsl`
/// (std140: every member is 16-byte aligned, trailing padding included).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CommonUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub inverse_model_view: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    pub model_view_projection: [[f32; 4]; 4],
    pub inverse_model_view_projection: [[f32; 4]; 4],
    pub controller_transform: [[[f32; 4]; 4]; CONTROLLER_COUNT],
    pub controller_velocity: [[f32; 4]; CONTROLLER_COUNT],
    pub controller_buttons: [[f32; 4]; CONTROLLER_COUNT],
    pub size: [i32; 2],
    pub time: f32,
    pub time_delta: f32,
    pub frame: i32,
    pub _pad: [i32; 3],
}

impl Default for CommonUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            model_view: identity,
            projection: identity,
            inverse_model_view: identity,
            inverse_projection: identity,
            model_view_projection: identity,
            inverse_model_view_projection: identity,
            controller_transform: [identity; CONTROLLER_COUNT],
            controller_velocity: [[0.0; 4]; CONTROLLER_COUNT],
            controller_buttons: [[0.0; 4]; CONTROLLER_COUNT],
            size: [DEFAULT_PARTICLE_RESOLUTION; 2],
            time: 0.0,
            time_delta: 0.0,
            frame: 0,
            _pad: [0; 3],
        }
    }
}

impl CommonUniforms {
    /// Store view and projection and refresh every derived matrix.
    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        let mvp = projection * view;
        self.model_view = view.to_cols_array_2d();
        self.projection = projection.to_cols_array_2d();
        self.inverse_model_view = view.inverse().to_cols_array_2d();
        self.inverse_projection = projection.inverse().to_cols_array_2d();
        self.model_view_projection = mvp.to_cols_array_2d();
        self.inverse_model_view_projection = mvp.inverse().to_cols_array_2d();
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model_view)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
    }

    /// Raw bytes as uploaded to the uniform buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
