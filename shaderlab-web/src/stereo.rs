//! Mono/stereo presentation and frame-callback scheduling.

use glam::Mat4;
use shaderlab_shared::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentMode {
    #[default]
    Mono,
    Stereo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Device-reported matrices for one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    pub view: Mat4,
    pub projection: Mat4,
}

/// Per-eye matrices for one presented frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoFrame {
    pub left: EyeView,
    pub right: EyeView,
}

/// One eye's draw: its half of the canvas and its matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePass {
    pub eye: Eye,
    pub viewport: Viewport,
    pub view: Mat4,
    pub projection: Mat4,
}

/// Left then right pass, each on its half of `canvas`.
pub fn eye_passes(canvas: Viewport, frame: &StereoFrame) -> [EyePass; 2] {
    [
        EyePass {
            eye: Eye::Left,
            viewport: canvas.left_half(),
            view: frame.left.view,
            projection: frame.left.projection,
        },
        EyePass {
            eye: Eye::Right,
            viewport: canvas.right_half(),
            view: frame.right.view,
            projection: frame.right.projection,
        },
    ]
}

/// Head-mounted presentation device. The browser adapter implements this over
/// the VR display; tests use a fake.
pub trait PresentationDevice {
    fn is_presenting(&self) -> bool;
    /// Matrices for the frame about to be drawn, or `None` when the device has no pose.
    fn frame(&mut self) -> Option<StereoFrame>;
    /// Hand the composed canvas to the device.
    fn submit_frame(&mut self);
}

// ============================================================
// Scheduling
// ============================================================

/// Who drives the per-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    /// The window's animation-frame callback.
    Window,
    /// The presentation device's own frame callback.
    Presentation,
}

/// Identity of one scheduled callback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken {
    id: u64,
    source: FrameSource,
}

impl FrameToken {
    pub fn source(&self) -> FrameSource {
        self.source
    }
}

/// Issues tokens for callback chains. Starting a chain supersedes the previous
/// one; a tick whose token is no longer current must stop without rescheduling.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    current: Option<FrameToken>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, source: FrameSource) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken {
            id: self.next_id,
            source,
        };
        if let Some(prev) = self.current.replace(token) {
            log::debug!("frame chain {} ({:?}) superseded by {}", prev.id, prev.source, token.id);
        }
        token
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn is_current(&self, token: FrameToken) -> bool {
        self.current == Some(token)
    }

    pub fn active_source(&self) -> Option<FrameSource> {
        self.current.map(|t| t.source)
    }
}

// ============================================================
// Composer
// ============================================================

/// Tracks the presentation mode and switches the frame source with it.
#[derive(Debug, Default)]
pub struct StereoComposer {
    mode: PresentMode,
}

impl StereoComposer {
    pub fn mode(&self) -> PresentMode {
        self.mode
    }

    /// Handle a presentation-change notification. Returns the new chain's
    /// token when the mode changed, `None` when it did not.
    pub fn on_presentation_change(&mut self, presenting: bool, scheduler: &mut FrameScheduler) -> Option<FrameToken> {
        let (mode, source) = if presenting {
            (PresentMode::Stereo, FrameSource::Presentation)
        } else {
            (PresentMode::Mono, FrameSource::Window)
        };
        if mode == self.mode {
            return None;
        }
        log::info!("presentation mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Some(scheduler.start(source))
    }
}
