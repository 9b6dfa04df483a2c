//! Per-viewer render context: owns all host-side state and runs one tick per
//! frame callback.

use shaderlab_shared::uniforms::CONTROLLER_COUNT;
use shaderlab_shared::viewport::Viewport;

use crate::camera::Camera;
use crate::clock::PlaybackClock;
use crate::error::{SceneLoadError, TransportError};
use crate::input::{InputEvent, MotionState};
use crate::options::ViewerOptions;
use crate::scene::{self, SceneSnapshot};
use crate::stereo::{eye_passes, FrameScheduler, FrameSource, FrameToken, PresentMode, PresentationDevice, StereoComposer};
use crate::transport::{self, ControllerPose, NativeModule};

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The token was replaced by a newer chain; do not reschedule.
    Superseded,
    /// Frame drawn with `passes` view passes; schedule the next one.
    Continue { passes: usize },
}

pub struct RendererContext<M: NativeModule> {
    module: M,
    camera: Camera,
    motion: MotionState,
    options: ViewerOptions,
    clock: PlaybackClock,
    composer: StereoComposer,
    scheduler: FrameScheduler,
    canvas: Viewport,
    controllers: [Option<ControllerPose>; CONTROLLER_COUNT],
    device: Option<Box<dyn PresentationDevice>>,
}

impl<M: NativeModule> RendererContext<M> {
    pub fn new(module: M, options: ViewerOptions) -> Self {
        Self {
            module,
            camera: Camera::new(&options),
            motion: MotionState::default(),
            clock: PlaybackClock::new(options.start_paused),
            options,
            composer: StereoComposer::default(),
            scheduler: FrameScheduler::new(),
            canvas: Viewport::default(),
            controllers: Default::default(),
            device: None,
        }
    }

    /// Begin a frame chain on the source matching the current mode.
    pub fn start(&mut self) -> FrameToken {
        let source = match self.composer.mode() {
            PresentMode::Mono => FrameSource::Window,
            PresentMode::Stereo => FrameSource::Presentation,
        };
        self.scheduler.start(source)
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        self.motion = std::mem::take(&mut self.motion).reduce(event, &self.options.keys);
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.canvas = Viewport::full(width.max(0), height.max(0));
        self.camera.set_aspect_ratio(self.canvas.aspect_ratio());
    }

    /// `None` when the controller is disconnected; nothing is sent for it.
    pub fn set_controller_pose(&mut self, index: usize, pose: Option<ControllerPose>) {
        match self.controllers.get_mut(index) {
            Some(slot) => *slot = pose,
            None => log::warn!("ignoring pose for controller {index}"),
        }
    }

    pub fn set_presentation_device(&mut self, device: Option<Box<dyn PresentationDevice>>) {
        self.device = device;
    }

    /// Presentation-change notification. Returns the token of the new chain
    /// when the frame source switched; the caller schedules its first callback.
    pub fn on_presentation_change(&mut self, presenting: bool) -> Option<FrameToken> {
        self.composer.on_presentation_change(presenting, &mut self.scheduler)
    }

    /// Run one frame: input, camera, controllers, simulation time, passes, submit.
    pub fn tick(&mut self, token: FrameToken, timestamp_ms: f64) -> Result<TickOutcome, TransportError> {
        if !self.scheduler.is_current(token) {
            return Ok(TickOutcome::Superseded);
        }

        let dt = self.clock.tick(timestamp_ms) as f32;
        let look = self.motion.take_look();
        self.camera.apply_look(look, self.options.look_sensitivity);
        self.camera.integrate(&self.motion, dt, &self.options);
        self.camera.recompute_matrices();

        for (index, pose) in self.controllers.iter().enumerate() {
            if let Some(pose) = pose {
                transport::send_controller_pose(&mut self.module, index as i32, pose)?;
            }
        }
        transport::update(&mut self.module, self.clock.time_seconds());

        let stereo_frame = match (self.composer.mode(), self.device.as_mut()) {
            (PresentMode::Stereo, Some(device)) => device.frame(),
            _ => None,
        };
        let passes = match stereo_frame {
            Some(frame) => {
                for pass in eye_passes(self.canvas, &frame) {
                    transport::send_view_projection(&mut self.module, &pass.view, &pass.projection)?;
                    transport::render(&mut self.module, pass.viewport);
                }
                if let Some(device) = self.device.as_mut() {
                    device.submit_frame();
                }
                2
            }
            None => {
                let view = self.camera.view_matrix();
                let projection = self.camera.projection_matrix();
                transport::send_view_projection(&mut self.module, &view, &projection)?;
                transport::render(&mut self.module, self.canvas);
                1
            }
        };

        Ok(TickOutcome::Continue { passes })
    }

    // ─── Scene ───

    pub fn export_scene(&mut self) -> Result<String, SceneLoadError> {
        let snapshot: SceneSnapshot = scene::capture(&self.camera, &mut self.module)?;
        Ok(snapshot.to_document().to_json())
    }

    pub fn load_scene(&mut self, json: &str) -> Result<(), SceneLoadError> {
        scene::apply_scene(json, &mut self.camera, &mut self.module)
    }

    pub fn set_shader_source(&mut self, index: i32, source: &str) -> Result<bool, TransportError> {
        transport::set_shader_source(&mut self.module, index, source)
    }

    pub fn shader_source(&mut self, index: i32) -> Result<Option<String>, TransportError> {
        transport::shader_source(&mut self.module, index)
    }

    // ─── Playback ───

    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.camera.recompute_matrices();
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.clock.toggle_pause()
    }

    pub fn rewind(&mut self) {
        self.clock.rewind();
    }

    // ─── Accessors ───

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn mode(&self) -> PresentMode {
        self.composer.mode()
    }

    pub fn canvas(&self) -> Viewport {
        self.canvas
    }

    pub fn average_frames_per_second(&self) -> f64 {
        if self.module.is_ready() {
            self.module.average_frames_per_second()
        } else {
            0.0
        }
    }
}
