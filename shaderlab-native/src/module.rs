//! The native module as seen across the linear-memory boundary.
//!
//! Every entry point takes `u32` offsets into the module's own heap. Callers
//! allocate with [`HostedModule::malloc`], write, call, then free.

use glam::Mat4;
use shaderlab_shared::math::MAT4_FLOATS;
use shaderlab_shared::shaders::SHADER_SLOT_COUNT;
use shaderlab_shared::viewport::Viewport;

use crate::engine::{EngineState, RenderRecord};
use crate::error::ModuleError;
use crate::heap::{HeapError, LinearHeap};

pub struct HostedModule {
    heap: LinearHeap,
    engine: EngineState,
    /// Module-owned C strings handed out by `get_user_shader_source_at_index`.
    exported_sources: [Option<u32>; SHADER_SLOT_COUNT],
}

impl HostedModule {
    pub fn new() -> Self {
        log::info!("native module initialized");
        Self {
            heap: LinearHeap::new(),
            engine: EngineState::new(),
            exported_sources: [None; SHADER_SLOT_COUNT],
        }
    }

    // ─── Memory ───

    pub fn malloc(&mut self, bytes: u32) -> Result<u32, HeapError> {
        self.heap.malloc(bytes)
    }

    pub fn free(&mut self, ptr: u32) -> Result<(), HeapError> {
        self.heap.free(ptr)
    }

    pub fn heap(&self) -> &LinearHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut LinearHeap {
        &mut self.heap
    }

    pub fn engine(&self) -> &EngineState {
        &self.engine
    }

    /// Direct engine access for hosts that pass values rather than offsets.
    pub fn engine_mut(&mut self) -> &mut EngineState {
        &mut self.engine
    }

    // ─── Entry points ───

    /// Both pointers address 16 column-major floats.
    pub fn set_view_and_projection_matrices(&mut self, view_ptr: u32, projection_ptr: u32) -> Result<(), ModuleError> {
        let view: [f32; MAT4_FLOATS] = self.heap.read_f32(view_ptr)?;
        let projection: [f32; MAT4_FLOATS] = self.heap.read_f32(projection_ptr)?;
        self.engine
            .set_view_projection(Mat4::from_cols_array(&view), Mat4::from_cols_array(&projection));
        Ok(())
    }

    /// Reads 3 position, 3 velocity, 4 orientation and 4 button floats.
    pub fn set_controller_at_index(
        &mut self,
        index: i32,
        position_ptr: u32,
        velocity_ptr: u32,
        orientation_ptr: u32,
        buttons_ptr: u32,
    ) -> Result<(), ModuleError> {
        let position = self.heap.read_f32::<3>(position_ptr)?;
        let velocity = self.heap.read_f32::<3>(velocity_ptr)?;
        let orientation = self.heap.read_f32::<4>(orientation_ptr)?;
        let buttons = self.heap.read_f32::<4>(buttons_ptr)?;
        self.engine
            .set_controller(index, position, velocity, orientation, buttons)?;
        Ok(())
    }

    /// Replace a user shader slot from a NUL-terminated string.
    pub fn set_user_shader_source_at_index(&mut self, index: i32, source_ptr: u32) -> Result<(), ModuleError> {
        let source = self.heap.read_c_string(source_ptr)?;
        self.engine.set_user_shader_source(index, &source)?;

        // Slot index was validated above.
        if let Some(stale) = self
            .exported_sources
            .get_mut(index as usize)
            .and_then(Option::take)
        {
            self.heap.free(stale)?;
        }
        Ok(())
    }

    /// Pointer to the slot's source as a C string. The module owns it; it stays
    /// valid until the slot is next replaced.
    pub fn get_user_shader_source_at_index(&mut self, index: i32) -> Result<u32, ModuleError> {
        let source = self.engine.user_shader_source(index)?;
        let slot = index as usize;
        if let Some(ptr) = self.exported_sources[slot] {
            return Ok(ptr);
        }
        let ptr = self.heap.alloc_c_string(source)?;
        self.exported_sources[slot] = Some(ptr);
        Ok(ptr)
    }

    pub fn update(&mut self, time_seconds: f64) {
        self.engine.update(time_seconds);
    }

    pub fn render(&mut self, x: i32, y: i32, width: i32, height: i32) -> &RenderRecord {
        self.engine.render(Viewport::new(x, y, width, height))
    }

    pub fn average_frames_per_second(&self) -> f64 {
        self.engine.average_fps()
    }
}

impl Default for HostedModule {
    fn default() -> Self {
        Self::new()
    }
}
