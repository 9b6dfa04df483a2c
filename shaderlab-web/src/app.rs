use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{Mat4, Quat, Vec3};
use js_sys::{Array, Float32Array, Function, Object, Reflect};
use shaderlab_native::HostedModule;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, VrDisplay, VrFrameData, Window};

use crate::input::InputEvent;
use crate::options::ViewerOptions;
use crate::renderer::{RendererContext, TickOutcome};
use crate::stereo::{EyeView, FrameSource, FrameToken, PresentationDevice, StereoFrame};
use crate::transport::ControllerPose;

type FrameClosure = Closure<dyn FnMut(f64)>;
type FrameSlot = Rc<RefCell<Option<FrameClosure>>>;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ============================================================
// Browser presentation device
// ============================================================

struct VrHeadset {
    display: VrDisplay,
    frame_data: VrFrameData,
}

impl PresentationDevice for VrHeadset {
    fn is_presenting(&self) -> bool {
        self.display.is_presenting()
    }

    fn frame(&mut self) -> Option<StereoFrame> {
        if !self.display.get_frame_data(&self.frame_data) {
            return None;
        }
        let data: &JsValue = self.frame_data.as_ref();
        Some(StereoFrame {
            left: EyeView {
                view: matrix(data, "leftViewMatrix")?,
                projection: matrix(data, "leftProjectionMatrix")?,
            },
            right: EyeView {
                view: matrix(data, "rightViewMatrix")?,
                projection: matrix(data, "rightProjectionMatrix")?,
            },
        })
    }

    fn submit_frame(&mut self) {
        self.display.submit_frame();
    }
}

fn floats(obj: &JsValue, key: &str) -> Option<Vec<f32>> {
    let value = Reflect::get(obj, &JsValue::from_str(key)).ok()?;
    if value.is_null() || value.is_undefined() {
        return None;
    }
    Some(Float32Array::new(&value).to_vec())
}

fn matrix(obj: &JsValue, key: &str) -> Option<Mat4> {
    let cols: [f32; 16] = floats(obj, key)?.try_into().ok()?;
    Some(Mat4::from_cols_array(&cols))
}

fn vec3(obj: &JsValue, key: &str) -> Option<Vec3> {
    let v = floats(obj, key)?;
    (v.len() >= 3).then(|| Vec3::new(v[0], v[1], v[2]))
}

fn quat(obj: &JsValue, key: &str) -> Option<Quat> {
    let v = floats(obj, key)?;
    (v.len() >= 4).then(|| Quat::from_xyzw(v[0], v[1], v[2], v[3]))
}

/// Tracked gamepads keyed by hand: 0 left, 1 right.
fn sample_controllers(window: &Window) -> [Option<ControllerPose>; 2] {
    let mut poses: [Option<ControllerPose>; 2] = Default::default();
    let Ok(pads) = window.navigator().get_gamepads() else {
        return poses;
    };
    for pad in pads.iter().filter(|p| !p.is_null() && !p.is_undefined()) {
        let hand = Reflect::get(&pad, &"hand".into()).ok().and_then(|h| h.as_string());
        let index = match hand.as_deref() {
            Some("left") => 0,
            Some("right") => 1,
            _ => continue,
        };
        let Some(pose) = Reflect::get(&pad, &"pose".into()).ok().filter(|p| p.is_object()) else {
            continue;
        };
        let buttons = Reflect::get(&pad, &"buttons".into())
            .ok()
            .map(|b| Array::from(&b))
            .map(|b| {
                b.iter()
                    .filter_map(|button| Reflect::get(&button, &"value".into()).ok())
                    .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                    .collect()
            })
            .unwrap_or_default();
        poses[index] = Some(ControllerPose {
            position: vec3(&pose, "position"),
            linear_velocity: vec3(&pose, "linearVelocity"),
            orientation: quat(&pose, "orientation"),
            buttons,
        });
    }
    poses
}

// ============================================================
// Frame loop
// ============================================================

/// State shared between the exported handle, event listeners and frame callbacks.
struct Shared {
    window: Window,
    ctx: RefCell<RendererContext<HostedModule>>,
    display: Option<VrDisplay>,
    /// The running chain's callback and the one it replaced. The replaced
    /// callback may still fire once more; it sees a stale token and stops.
    chains: RefCell<(Option<FrameSlot>, Option<FrameSlot>)>,
}

fn request_frame(shared: &Shared, source: FrameSource, callback: &Function) -> Result<i32, JsValue> {
    match (source, shared.display.as_ref()) {
        (FrameSource::Presentation, Some(display)) => display.request_animation_frame(callback),
        _ => shared.window.request_animation_frame(callback),
    }
}

fn run_chain(shared: &Rc<Shared>, token: FrameToken) -> Result<(), JsValue> {
    let slot: FrameSlot = Rc::new(RefCell::new(None));
    let weak_slot: Weak<RefCell<Option<FrameClosure>>> = Rc::downgrade(&slot);
    let state = Rc::clone(shared);

    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        let poses = sample_controllers(&state.window);
        let outcome = {
            let mut ctx = state.ctx.borrow_mut();
            for (index, pose) in poses.into_iter().enumerate() {
                ctx.set_controller_pose(index, pose);
            }
            ctx.tick(token, timestamp)
        };
        match outcome {
            Ok(TickOutcome::Superseded) => return,
            Ok(TickOutcome::Continue { .. }) => {}
            Err(e) => log::error!("frame failed: {e}"),
        }
        let Some(slot) = weak_slot.upgrade() else {
            return;
        };
        let slot = slot.borrow();
        if let Some(callback) = slot.as_ref() {
            if let Err(e) = request_frame(&state, token.source(), callback.as_ref().unchecked_ref()) {
                log::error!("failed to schedule frame: {e:?}");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    {
        let borrowed = slot.borrow();
        if let Some(callback) = borrowed.as_ref() {
            request_frame(shared, token.source(), callback.as_ref().unchecked_ref())?;
        }
    }
    let mut chains = shared.chains.borrow_mut();
    chains.1 = chains.0.replace(slot);
    Ok(())
}

fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
    target: &web_sys::EventTarget,
    event: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn install_input(shared: &Rc<Shared>, document: &Document, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    let lock_target = canvas.clone();
    listen(canvas, "mousedown", move |_: MouseEvent| lock_target.request_pointer_lock())?;

    let state = Rc::clone(shared);
    let doc = document.clone();
    listen(canvas, "mouseup", move |_: MouseEvent| {
        state.ctx.borrow_mut().handle_event(&InputEvent::PointerUp);
        doc.exit_pointer_lock();
    })?;

    let state = Rc::clone(shared);
    let doc = document.clone();
    let canvas_element: web_sys::Element = canvas.clone().into();
    listen(document, "pointerlockchange", move |_: web_sys::Event| {
        let locked = doc.pointer_lock_element().is_some_and(|el| el == canvas_element);
        let event = if locked { InputEvent::PointerDown } else { InputEvent::CaptureLost };
        state.ctx.borrow_mut().handle_event(&event);
    })?;

    let state = Rc::clone(shared);
    listen(document, "mousemove", move |e: MouseEvent| {
        let event = InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        };
        state.ctx.borrow_mut().handle_event(&event);
    })?;

    let state = Rc::clone(shared);
    listen(document, "keydown", move |e: KeyboardEvent| {
        state.ctx.borrow_mut().handle_event(&InputEvent::KeyDown { code: e.code() });
    })?;

    let state = Rc::clone(shared);
    listen(document, "keyup", move |e: KeyboardEvent| {
        state.ctx.borrow_mut().handle_event(&InputEvent::KeyUp { code: e.code() });
    })?;

    Ok(())
}

fn install_presentation(shared: &Rc<Shared>) -> Result<(), JsValue> {
    let Some(display) = shared.display.clone() else {
        return Ok(());
    };
    let state = Rc::clone(shared);
    listen(&shared.window, "vrdisplaypresentchange", move |_: web_sys::Event| {
        let token = state.ctx.borrow_mut().on_presentation_change(display.is_presenting());
        if let Some(token) = token {
            if let Err(e) = run_chain(&state, token) {
                log::error!("failed to switch frame source: {e:?}");
            }
        }
    })
}

async fn first_vr_display(window: &Window) -> Option<VrDisplay> {
    let promise = window.navigator().get_vr_displays().ok()?;
    let displays = JsFuture::from(promise).await.ok()?;
    Array::from(&displays).get(0).dyn_into::<VrDisplay>().ok()
}

// ============================================================
// Exported handle
// ============================================================

/// Viewer handle exported to JavaScript.
#[wasm_bindgen]
pub struct App {
    shared: Rc<Shared>,
    canvas: HtmlCanvasElement,
}

impl App {
    pub(crate) async fn new(canvas_id: &str, options: ViewerOptions) -> Result<App, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| "Element is not a canvas")?;

        let mut ctx = RendererContext::new(HostedModule::new(), options);
        ctx.resize(canvas.width() as i32, canvas.height() as i32);

        let display = first_vr_display(&window).await;
        match &display {
            Some(display) => {
                log::info!("VR display found: {}", display.display_name());
                ctx.set_presentation_device(Some(Box::new(VrHeadset {
                    display: display.clone(),
                    frame_data: VrFrameData::new()?,
                })));
            }
            None => log::info!("no VR display, stereo disabled"),
        }

        let shared = Rc::new(Shared {
            window,
            ctx: RefCell::new(ctx),
            display,
            chains: RefCell::new((None, None)),
        });
        install_input(&shared, &document, &canvas)?;
        install_presentation(&shared)?;

        let token = shared.ctx.borrow_mut().start();
        run_chain(&shared, token)?;

        Ok(App { shared, canvas })
    }
}

#[wasm_bindgen]
impl App {
    #[wasm_bindgen(getter)]
    pub fn stereo_available(&self) -> bool {
        self.shared.display.is_some()
    }

    /// Ask the display to present the canvas. Resolves when the request settles;
    /// the mode switch itself follows the presentation-change event.
    pub fn enter_vr(&self) -> Result<js_sys::Promise, JsValue> {
        let display = self.shared.display.as_ref().ok_or("No VR display")?;
        let layer = Object::new();
        Reflect::set(&layer, &"source".into(), &self.canvas)?;
        display.request_present(&Array::of1(&layer))
    }

    pub fn exit_vr(&self) -> Result<js_sys::Promise, JsValue> {
        let display = self.shared.display.as_ref().ok_or("No VR display")?;
        display.exit_present()
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.shared.ctx.borrow_mut().resize(width as i32, height as i32);
    }

    pub fn set_shader_source(&self, index: i32, source: &str) -> Result<bool, JsValue> {
        self.shared.ctx.borrow_mut().set_shader_source(index, source).map_err(js_err)
    }

    pub fn shader_source(&self, index: i32) -> Result<Option<String>, JsValue> {
        self.shared.ctx.borrow_mut().shader_source(index).map_err(js_err)
    }

    pub fn export_scene(&self) -> Result<String, JsValue> {
        self.shared.ctx.borrow_mut().export_scene().map_err(js_err)
    }

    pub fn load_scene(&self, json: &str) -> Result<(), JsValue> {
        self.shared.ctx.borrow_mut().load_scene(json).map_err(js_err)
    }

    pub fn toggle_pause(&self) -> bool {
        self.shared.ctx.borrow_mut().toggle_pause()
    }

    pub fn rewind(&self) {
        self.shared.ctx.borrow_mut().rewind();
    }

    pub fn reset_camera(&self) {
        self.shared.ctx.borrow_mut().reset_camera();
    }

    pub fn average_fps(&self) -> f64 {
        self.shared.ctx.borrow().average_frames_per_second()
    }

    pub fn time(&self) -> f64 {
        self.shared.ctx.borrow().clock().time_seconds()
    }
}
