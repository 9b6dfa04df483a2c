use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::{Mat4, Quat, Vec3};
use shaderlab_native::HostedModule;
use shaderlab_shared::math::perspective_gl;
use shaderlab_web::camera::Camera;
use shaderlab_web::stereo::{EyeView, PresentationDevice, StereoFrame};
use shaderlab_web::{RendererContext, TickOutcome, ViewerOptions};

use crate::project;

/// Synthetic frame timestamps step at 60 Hz.
const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
/// Interpupillary distance of the headless headset, in world units.
const EYE_SEPARATION: f32 = 0.064;

#[derive(Debug, Clone, Copy)]
pub struct PreviewSettings {
    pub frames: u32,
    pub stereo: bool,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewReport {
    pub position: Vec3,
    pub orientation: Quat,
    pub passes: usize,
    pub frames_rendered: u64,
    pub vertices_drawn: u64,
    pub particle_resolution: [i32; 2],
    pub simulation_time: f64,
    pub average_fps: f64,
}

/// Headset with a fixed pose: two eyes straddling the camera.
struct FixedHeadset {
    frame: StereoFrame,
}

impl FixedHeadset {
    fn around(camera: &Camera) -> Self {
        let projection = perspective_gl(
            camera.field_of_view_y,
            camera.viewport_aspect_ratio * 0.5,
            camera.clip_near,
            camera.clip_far,
        );
        let eye = |offset: f32| EyeView {
            view: Mat4::from_translation(Vec3::new(offset, 0.0, 0.0)) * camera.view_matrix(),
            projection,
        };
        Self {
            frame: StereoFrame {
                left: eye(EYE_SEPARATION * 0.5),
                right: eye(-EYE_SEPARATION * 0.5),
            },
        }
    }
}

impl PresentationDevice for FixedHeadset {
    fn is_presenting(&self) -> bool {
        true
    }

    fn frame(&mut self) -> Option<StereoFrame> {
        Some(self.frame)
    }

    fn submit_frame(&mut self) {}
}

/// Load `json` into a fresh context and run `settings.frames` ticks.
pub fn simulate(json: &str, options: ViewerOptions, settings: PreviewSettings) -> anyhow::Result<PreviewReport> {
    let mut ctx = RendererContext::new(HostedModule::new(), options);
    ctx.resize(settings.width, settings.height);
    ctx.load_scene(json)?;

    let token = if settings.stereo {
        let headset = FixedHeadset::around(ctx.camera());
        ctx.set_presentation_device(Some(Box::new(headset)));
        ctx.on_presentation_change(true)
            .context("stereo presentation did not start")?
    } else {
        ctx.start()
    };

    let mut passes = 0;
    for frame in 0..settings.frames {
        match ctx.tick(token, f64::from(frame) * FRAME_INTERVAL_MS)? {
            TickOutcome::Continue { passes: n } => passes += n,
            TickOutcome::Superseded => break,
        }
    }

    let engine = ctx.module().engine();
    let stats = engine.stats();
    Ok(PreviewReport {
        position: ctx.camera().position,
        orientation: ctx.camera().orientation,
        passes,
        frames_rendered: stats.frames_rendered,
        vertices_drawn: stats.vertices_drawn,
        particle_resolution: engine.particle_resolution(),
        simulation_time: ctx.clock().time_seconds(),
        average_fps: ctx.average_frames_per_second(),
    })
}

fn load_options(explicit: Option<PathBuf>) -> anyhow::Result<ViewerOptions> {
    let path = explicit.or_else(|| project::detect_project_context().ok()?.options_path());
    match path {
        Some(path) => {
            log::info!("viewer options from {}", path.display());
            ViewerOptions::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(ViewerOptions::default()),
    }
}

pub fn run(scene: &Path, options: Option<PathBuf>, settings: PreviewSettings) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(scene).with_context(|| format!("reading {}", scene.display()))?;
    let options = load_options(options)?;
    let report = simulate(&json, options, settings)?;

    let mode = if settings.stereo { "stereo" } else { "mono" };
    println!("{}: {} frames ({mode}, {}x{})", scene.display(), settings.frames, settings.width, settings.height);
    println!("  camera position    {:?}", report.position.to_array());
    println!("  camera orientation {:?}", report.orientation.to_array());
    println!("  view passes        {}", report.passes);
    println!("  draws              {}", report.frames_rendered);
    println!("  vertices           {}", report.vertices_drawn);
    let [w, h] = report.particle_resolution;
    println!("  particles          {w}x{h}");
    println!("  simulation time    {:.3}s", report.simulation_time);
    println!("  average fps        {:.1}", report.average_fps);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"{
        "camera": { "position": [0, 0, 3], "orientation": [0, 0, 0, 1] },
        "shaders": [
            { "source": "#pragma size 4 2\nvoid main() {}" },
            { "source": "#pragma vertexCount 3\nvoid main() {}" },
            { "source": "void main() {}" }
        ]
    }"##;

    fn settings(frames: u32, stereo: bool) -> PreviewSettings {
        PreviewSettings {
            frames,
            stereo,
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn test_mono_preview_counts() {
        let report = simulate(SCENE, ViewerOptions::default(), settings(120, false)).unwrap();
        assert_eq!(report.passes, 120);
        assert_eq!(report.frames_rendered, 120);
        assert_eq!(report.particle_resolution, [4, 2]);
        // Simulation triangle plus 3 vertices per particle.
        assert_eq!(report.vertices_drawn, 120 * (3 + 3 * 4 * 2));
        assert_eq!(report.position, Vec3::new(0.0, 0.0, 3.0));
        assert!((report.simulation_time - 119.0 / 60.0).abs() < 1e-9);
        assert!((report.average_fps - 60.0).abs() < 1.0, "{}", report.average_fps);
    }

    #[test]
    fn test_stereo_preview_draws_twice_per_frame() {
        let report = simulate(SCENE, ViewerOptions::default(), settings(10, true)).unwrap();
        assert_eq!(report.passes, 20);
        assert_eq!(report.frames_rendered, 20);
    }

    #[test]
    fn test_paused_options_freeze_time() {
        let options = ViewerOptions {
            start_paused: true,
            ..Default::default()
        };
        let report = simulate(SCENE, options, settings(30, false)).unwrap();
        assert_eq!(report.simulation_time, 0.0);
    }

    #[test]
    fn test_invalid_scene_fails() {
        assert!(simulate("{}", ViewerOptions::default(), settings(1, false)).is_err());
    }

    #[test]
    fn test_headset_eyes_straddle_camera() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(1.0, 0.0, 0.0);
        camera.recompute_matrices();
        let headset = FixedHeadset::around(&camera);
        let left = headset.frame.left.view.transform_point3(camera.position);
        let right = headset.frame.right.view.transform_point3(camera.position);
        assert!((left.x - right.x - EYE_SEPARATION).abs() < 1e-5);
    }
}
