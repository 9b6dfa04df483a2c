//! ShaderLab native particle module: C FFI entry points.
//!
//! Built as a cdylib for foreign hosts and as an rlib for in-process hosts
//! (the web runtime and the CLI link [`HostedModule`] directly).
//! All exported functions use `extern "C"` ABI with `#[no_mangle]` and never
//! unwind across the boundary: failures return `0`/`-1`/null and are logged.

pub mod engine;
pub mod error;
pub mod frame_clock;
pub mod handle;
pub mod heap;
pub mod module;
pub mod pragma;

pub use engine::{EngineState, RenderRecord, RenderStats};
pub use error::{EngineError, ModuleError};
pub use heap::{HeapError, LinearHeap};
pub use module::HostedModule;

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::{LazyLock, Mutex, MutexGuard};

use glam::Mat4;
use handle::HandleStore;
use shaderlab_shared::math::MAT4_FLOATS;
use shaderlab_shared::viewport::Viewport;

/// A module instance plus the C strings it has handed to the host.
struct NativeInstance {
    module: HostedModule,
    last_error: Option<CString>,
    exported: HashMap<i32, CString>,
}

impl NativeInstance {
    fn fail(&mut self, context: &str, err: impl std::fmt::Display) -> i32 {
        let message = format!("{context}: {err}");
        log::error!("{message}");
        self.last_error = CString::new(message).ok();
        -1
    }
}

static INSTANCES: LazyLock<Mutex<HandleStore<NativeInstance>>> =
    LazyLock::new(|| Mutex::new(HandleStore::new()));

fn instances() -> MutexGuard<'static, HandleStore<NativeInstance>> {
    // A panic while holding the lock leaves the store itself consistent.
    INSTANCES.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_instance<R>(handle: u64, missing: R, f: impl FnOnce(&mut NativeInstance) -> R) -> R {
    match instances().get_mut(handle) {
        Some(instance) => f(instance),
        None => {
            log::warn!("unknown native module handle {handle}");
            missing
        }
    }
}

/// Copy `N` floats from a host pointer. Null yields `None`.
///
/// # Safety
/// `ptr` must be null or valid for reads of `N` floats.
unsafe fn read_floats<const N: usize>(ptr: *const f32) -> Option<[f32; N]> {
    if ptr.is_null() {
        return None;
    }
    let slice = std::slice::from_raw_parts(ptr, N);
    slice.try_into().ok()
}

// ============================================================
// FFI: Lifecycle
// ============================================================

/// Create a module instance. Returns a handle (> 0).
#[no_mangle]
pub extern "C" fn sl_native_initialize() -> u64 {
    let _ = env_logger::try_init();
    instances().insert(NativeInstance {
        module: HostedModule::new(),
        last_error: None,
        exported: HashMap::new(),
    })
}

#[no_mangle]
pub extern "C" fn sl_native_shutdown(handle: u64) {
    let mut store = instances();
    if store.remove(handle).is_some() {
        log::info!("native module {handle} shut down, {} still live", store.live());
    }
}

// ============================================================
// FFI: Per-frame
// ============================================================

/// Set view and projection from two pointers to 16 column-major floats each.
///
/// # Safety
/// Both pointers must be null or valid for reads of 16 floats.
#[no_mangle]
pub unsafe extern "C" fn sl_native_set_view_and_projection_matrices(
    handle: u64,
    view: *const f32,
    projection: *const f32,
) -> i32 {
    let view = read_floats::<MAT4_FLOATS>(view);
    let projection = read_floats::<MAT4_FLOATS>(projection);
    with_instance(handle, -1, |instance| {
        let (Some(view), Some(projection)) = (view, projection) else {
            return instance.fail("set_view_and_projection_matrices", "null matrix pointer");
        };
        instance
            .module
            .engine_mut()
            .set_view_projection(Mat4::from_cols_array(&view), Mat4::from_cols_array(&projection));
        0
    })
}

/// # Safety
/// Pointers must be null or valid for reads of 3, 3, 4 and 4 floats.
/// Null fields are read as zeros.
#[no_mangle]
pub unsafe extern "C" fn sl_native_set_controller_at_index(
    handle: u64,
    index: i32,
    position: *const f32,
    velocity: *const f32,
    orientation: *const f32,
    buttons: *const f32,
) -> i32 {
    let position = read_floats::<3>(position).unwrap_or_default();
    let velocity = read_floats::<3>(velocity).unwrap_or_default();
    let orientation = read_floats::<4>(orientation).unwrap_or_default();
    let buttons = read_floats::<4>(buttons).unwrap_or_default();
    with_instance(handle, -1, |instance| {
        match instance
            .module
            .engine_mut()
            .set_controller(index, position, velocity, orientation, buttons)
        {
            Ok(()) => 0,
            Err(e) => instance.fail("set_controller_at_index", e),
        }
    })
}

/// # Safety
/// `source` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn sl_native_set_user_shader_source(handle: u64, index: i32, source: *const c_char) -> i32 {
    if source.is_null() {
        return with_instance(handle, -1, |instance| instance.fail("set_user_shader_source", "null source"));
    }
    let source = CStr::from_ptr(source).to_string_lossy().into_owned();
    with_instance(handle, -1, |instance| {
        match instance.module.engine_mut().set_user_shader_source(index, &source) {
            Ok(()) => {
                instance.exported.remove(&index);
                0
            }
            Err(e) => instance.fail("set_user_shader_source", e),
        }
    })
}

/// Source of a shader slot, valid until that slot is next set or the module shuts down.
/// Null on failure.
#[no_mangle]
pub extern "C" fn sl_native_get_user_shader_source(handle: u64, index: i32) -> *const c_char {
    with_instance(handle, std::ptr::null(), |instance| {
        let source = match instance.module.engine().user_shader_source(index) {
            // Interior NULs would truncate the C string.
            Ok(source) => source.replace('\0', ""),
            Err(e) => {
                instance.fail("get_user_shader_source", e);
                return std::ptr::null();
            }
        };
        let Ok(c_source) = CString::new(source) else {
            return std::ptr::null();
        };
        instance.exported.entry(index).or_insert(c_source).as_ptr()
    })
}

#[no_mangle]
pub extern "C" fn sl_native_update(handle: u64, time_seconds: f64) -> i32 {
    with_instance(handle, -1, |instance| {
        instance.module.update(time_seconds);
        0
    })
}

#[no_mangle]
pub extern "C" fn sl_native_render(handle: u64, x: i32, y: i32, width: i32, height: i32) -> i32 {
    with_instance(handle, -1, |instance| {
        let viewport = Viewport::new(x, y, width, height);
        if viewport.is_empty() {
            log::debug!("render skipped for empty viewport {viewport:?}");
            return 0;
        }
        instance.module.render(x, y, width, height);
        0
    })
}

#[no_mangle]
pub extern "C" fn sl_native_average_fps(handle: u64) -> f64 {
    with_instance(handle, 0.0, |instance| instance.module.average_frames_per_second())
}

// ============================================================
// FFI: Error handling
// ============================================================

/// Last error message, valid until the next failing call. Null when none.
#[no_mangle]
pub extern "C" fn sl_native_last_error(handle: u64) -> *const c_char {
    with_instance(handle, std::ptr::null(), |instance| {
        instance
            .last_error
            .as_ref()
            .map_or(std::ptr::null(), |e| e.as_ptr())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_str(ptr: *const c_char) -> String {
        assert!(!ptr.is_null());
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    #[test]
    fn test_lifecycle() {
        let h = sl_native_initialize();
        assert_ne!(h, 0);
        assert_eq!(sl_native_update(h, 0.0), 0);
        assert_eq!(sl_native_render(h, 0, 0, 64, 64), 0);
        sl_native_shutdown(h);
        assert_eq!(sl_native_update(h, 0.0), -1);
        assert_eq!(sl_native_average_fps(h), 0.0);
    }

    #[test]
    fn test_matrices_through_ffi() {
        let h = sl_native_initialize();
        let view = Mat4::from_rotation_x(0.3).to_cols_array();
        let proj = Mat4::IDENTITY.to_cols_array();
        let status = unsafe { sl_native_set_view_and_projection_matrices(h, view.as_ptr(), proj.as_ptr()) };
        assert_eq!(status, 0);

        let status = unsafe { sl_native_set_view_and_projection_matrices(h, std::ptr::null(), proj.as_ptr()) };
        assert_eq!(status, -1);
        assert!(c_str(sl_native_last_error(h)).contains("null matrix"));
        sl_native_shutdown(h);
    }

    #[test]
    fn test_shader_source_through_ffi() {
        let h = sl_native_initialize();
        let src = CString::new("#pragma size 32 32").unwrap();
        assert_eq!(unsafe { sl_native_set_user_shader_source(h, 1, src.as_ptr()) }, 0);
        assert_eq!(c_str(sl_native_get_user_shader_source(h, 1)), "#pragma size 32 32");

        assert_eq!(unsafe { sl_native_set_user_shader_source(h, 4, src.as_ptr()) }, -1);
        assert!(c_str(sl_native_last_error(h)).contains("slot 4"));
        assert!(sl_native_get_user_shader_source(h, -1).is_null());
        sl_native_shutdown(h);
    }

    #[test]
    fn test_controller_with_null_fields() {
        let h = sl_native_initialize();
        let position = [0.0f32, 1.5, 0.0];
        let status = unsafe {
            sl_native_set_controller_at_index(
                h,
                1,
                position.as_ptr(),
                std::ptr::null(),
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        assert_eq!(status, 0);
        let status = unsafe {
            sl_native_set_controller_at_index(
                h,
                2,
                position.as_ptr(),
                std::ptr::null(),
                std::ptr::null(),
                std::ptr::null(),
            )
        };
        assert_eq!(status, -1);
        sl_native_shutdown(h);
    }
}
