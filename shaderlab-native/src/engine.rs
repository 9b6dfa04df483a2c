use glam::{Mat4, Quat, Vec3};
use shaderlab_shared::math::{perspective_gl, pose_transform};
use shaderlab_shared::shaders::{ShaderSlot, COMMON_UNIFORMS, SHADER_SLOT_COUNT};
use shaderlab_shared::uniforms::{CommonUniforms, CONTROLLER_COUNT};
use shaderlab_shared::viewport::Viewport;

use crate::error::EngineError;
use crate::frame_clock::FrameClock;
use crate::pragma;

/// Assembled programs: simulation fragment, shade vertex, shade fragment.
pub const PROGRAM_COUNT: usize = SHADER_SLOT_COUNT - 1;

/// The simulation pass covers its target with a single oversized triangle.
pub const FULLSCREEN_TRIANGLE_VERTICES: u64 = 3;

/// Ping-pong particle state targets.
const PARTICLE_TARGET_COUNT: usize = 2;

const DEFAULT_CONTROLLER_POSITIONS: [Vec3; CONTROLLER_COUNT] =
    [Vec3::new(-0.5, 1.0, 0.0), Vec3::new(0.5, 1.0, 0.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Advance particle state into the back target.
    Simulate,
    /// Draw particles into the caller's viewport.
    Shade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub pass: PassKind,
    pub viewport: Viewport,
    pub vertex_count: u64,
}

/// Everything one `render` call did, including the uniform block it uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub uniforms: CommonUniforms,
    pub simulate: DrawCall,
    pub shade: DrawCall,
    /// Index of the target the simulation wrote this frame.
    pub front_target: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_rendered: u64,
    pub vertices_drawn: u64,
    /// Particle targets (re)created because the resolution changed.
    pub target_allocations: u32,
}

// ============================================================
// Engine state
// ============================================================

/// CPU side of the particle engine: uniforms, shader slots, pragmas, timing
/// and per-pass draw bookkeeping.
pub struct EngineState {
    uniforms: CommonUniforms,
    controller_position: [Vec3; CONTROLLER_COUNT],
    controller_orientation: [Quat; CONTROLLER_COUNT],

    user_sources: [String; SHADER_SLOT_COUNT],
    assembled: [String; PROGRAM_COUNT],
    particle_resolution: [i32; 2],
    vertex_count: i32,

    clock: FrameClock,
    target_sizes: [Option<[i32; 2]>; PARTICLE_TARGET_COUNT],
    front_target: usize,
    stats: RenderStats,
    last_render: Option<RenderRecord>,
}

impl EngineState {
    pub fn new() -> Self {
        let mut state = Self {
            uniforms: CommonUniforms::default(),
            controller_position: DEFAULT_CONTROLLER_POSITIONS,
            controller_orientation: [Quat::IDENTITY; CONTROLLER_COUNT],
            user_sources: ShaderSlot::ALL.map(|slot| slot.default_source().to_string()),
            assembled: Default::default(),
            particle_resolution: [0; 2],
            vertex_count: pragma::DEFAULT_VERTEX_COUNT,
            clock: FrameClock::default(),
            target_sizes: [None; PARTICLE_TARGET_COUNT],
            front_target: 0,
            stats: RenderStats::default(),
            last_render: None,
        };

        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        state.uniforms.set_view_projection(view, perspective_gl(60.0, 1.0, 0.01, 1000.0));

        for slot in ShaderSlot::ALL {
            state.refresh_slot(slot);
        }
        state.uniforms.size = state.particle_resolution;
        state
    }

    // ─── Shader slots ───

    pub fn set_user_shader_source(&mut self, index: i32, source: &str) -> Result<(), EngineError> {
        let slot = slot_from_index(index)?;
        self.user_sources[slot.index()] = source.to_string();
        self.refresh_slot(slot);
        log::debug!("{} shader updated ({} bytes)", slot.label(), source.len());
        Ok(())
    }

    pub fn user_shader_source(&self, index: i32) -> Result<&str, EngineError> {
        let slot = slot_from_index(index)?;
        Ok(&self.user_sources[slot.index()])
    }

    /// Full program source for a template slot; `None` for the common slot.
    pub fn assembled_source(&self, slot: ShaderSlot) -> Option<&str> {
        program_index(slot).map(|i| self.assembled[i].as_str())
    }

    fn refresh_slot(&mut self, slot: ShaderSlot) {
        match slot {
            // Shared helpers are spliced into every program.
            ShaderSlot::Common => {
                for program in &ShaderSlot::ALL[1..] {
                    self.reassemble(*program);
                }
            }
            ShaderSlot::Simulation => {
                self.reassemble(slot);
                self.particle_resolution = pragma::particle_resolution(&self.user_sources[slot.index()]);
            }
            ShaderSlot::Vertex => {
                self.reassemble(slot);
                self.vertex_count = pragma::vertex_count(&self.user_sources[slot.index()]);
            }
            ShaderSlot::Fragment => self.reassemble(slot),
        }
    }

    fn reassemble(&mut self, slot: ShaderSlot) {
        let (Some(i), Some((template, marker))) = (program_index(slot), slot.template()) else {
            return;
        };
        let split = template.find(marker).map_or(template.len(), |p| p + marker.len());
        let (prefix, postfix) = template.split_at(split);
        self.assembled[i] = format!(
            "{prefix}\n{COMMON_UNIFORMS}\n{}\n{}{postfix}",
            self.user_sources[ShaderSlot::Common.index()],
            self.user_sources[slot.index()],
        );
    }

    // ─── Transforms & controllers ───

    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.uniforms.set_view_projection(view, projection);
    }

    /// Store one controller's pose. Orientation is `[x, y, z, w]`; a zero
    /// quaternion is read as identity.
    pub fn set_controller(
        &mut self,
        index: i32,
        position: [f32; 3],
        velocity: [f32; 3],
        orientation: [f32; 4],
        buttons: [f32; 4],
    ) -> Result<(), EngineError> {
        let i = usize::try_from(index)
            .ok()
            .filter(|i| *i < CONTROLLER_COUNT)
            .ok_or(EngineError::ControllerIndex(index))?;

        let q = Quat::from_array(orientation);
        self.controller_position[i] = Vec3::from_array(position);
        self.controller_orientation[i] = if q.length_squared() <= f32::EPSILON {
            Quat::IDENTITY
        } else {
            q.normalize()
        };
        self.uniforms.controller_velocity[i] = [velocity[0], velocity[1], velocity[2], 0.0];
        self.uniforms.controller_buttons[i] = buttons;
        Ok(())
    }

    // ─── Per-frame ───

    /// Advance the clock and refresh every time- and controller-derived uniform.
    pub fn update(&mut self, time_seconds: f64) {
        self.clock.tick(time_seconds);

        for i in 0..CONTROLLER_COUNT {
            self.uniforms.controller_transform[i] =
                pose_transform(self.controller_position[i], self.controller_orientation[i]).to_cols_array_2d();
        }
        self.uniforms.size = self.particle_resolution;
        self.uniforms.time = time_seconds as f32;
        self.uniforms.time_delta = self.clock.delta_seconds as f32;
        self.uniforms.frame = self.clock.elapsed_frames as i32;
    }

    /// Run the simulation pass, then the shade pass into `viewport`.
    pub fn render(&mut self, viewport: Viewport) -> &RenderRecord {
        let [w, h] = self.particle_resolution;
        for size in self.target_sizes.iter_mut() {
            if *size != Some([w, h]) {
                *size = Some([w, h]);
                self.stats.target_allocations += 1;
            }
        }
        self.front_target = (self.front_target + 1) % PARTICLE_TARGET_COUNT;

        let simulate = DrawCall {
            pass: PassKind::Simulate,
            viewport: Viewport::full(w, h),
            vertex_count: FULLSCREEN_TRIANGLE_VERTICES,
        };
        let shade = DrawCall {
            pass: PassKind::Shade,
            viewport,
            // Both factors come from pragmas.
            vertex_count: u64::from(self.vertex_count.unsigned_abs()).saturating_mul(Viewport::full(w, h).area()),
        };

        self.stats.frames_rendered += 1;
        self.stats.vertices_drawn = self
            .stats
            .vertices_drawn
            .saturating_add(simulate.vertex_count)
            .saturating_add(shade.vertex_count);

        self.last_render.insert(RenderRecord {
            uniforms: self.uniforms,
            simulate,
            shade,
            front_target: self.front_target,
        })
    }

    // ─── Accessors ───

    pub fn uniforms(&self) -> &CommonUniforms {
        &self.uniforms
    }

    pub fn particle_resolution(&self) -> [i32; 2] {
        self.particle_resolution
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn average_fps(&self) -> f64 {
        self.clock.average_fps
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn last_render(&self) -> Option<&RenderRecord> {
        self.last_render.as_ref()
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_from_index(index: i32) -> Result<ShaderSlot, EngineError> {
    usize::try_from(index)
        .ok()
        .and_then(ShaderSlot::from_index)
        .ok_or(EngineError::ShaderSlot(index))
}

fn program_index(slot: ShaderSlot) -> Option<usize> {
    slot.index().checked_sub(1)
}
