use std::{
    ffi::{CString, c_char, c_void},
    path::Path,
};

use framepump_runtime::{CoreError, CoreOutcome, EmulatorCore};

pub type CreateFn = unsafe extern "C" fn(user_data: *mut c_void) -> bool;
pub type DestroyFn = unsafe extern "C" fn(user_data: *mut c_void);
pub type RunFrameFn = unsafe extern "C" fn(user_data: *mut c_void, surface: *mut c_void) -> bool;
pub type SetOutputSizeFn =
    unsafe extern "C" fn(user_data: *mut c_void, width: u32, height: u32) -> bool;
pub type LoadRomFn = unsafe extern "C" fn(user_data: *mut c_void, path: *const c_char) -> bool;

/// Entry points of a core that lives in the host's dynamic library.
///
/// Every function receives `user_data` unchanged. `create` and `destroy` are
/// optional; the other three are required.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FramepumpCoreVTable {
    pub user_data: *mut c_void,
    pub create: Option<CreateFn>,
    pub destroy: Option<DestroyFn>,
    pub run_frame: Option<RunFrameFn>,
    pub set_output_size: Option<SetOutputSizeFn>,
    pub load_rom: Option<LoadRomFn>,
}

// SAFETY: the table is copied to the pump thread, which is where the host
// expects `create` to run. `user_data` is never dereferenced by Rust.
unsafe impl Send for FramepumpCoreVTable {}

/// Host render target, e.g. a `CAMetalLayer*` or a GL framebuffer id cast to
/// a pointer. Only ever dereferenced by the host core.
pub struct ForeignSurface(pub(crate) *mut c_void);

// SAFETY: the pointer is forwarded to the core on the pump thread without
// being dereferenced on the Rust side.
unsafe impl Send for ForeignSurface {}

/// [`EmulatorCore`] backed by a [`FramepumpCoreVTable`].
pub struct ForeignCore {
    user_data: *mut c_void,
    destroy: Option<DestroyFn>,
    run_frame: RunFrameFn,
    set_output_size: SetOutputSizeFn,
    load_rom: LoadRomFn,
}

// SAFETY: the host promises its core may be driven from the pump thread; all
// calls are serialized by the coordinator lock.
unsafe impl Send for ForeignCore {}

impl ForeignCore {
    /// Validate the table and run the host's `create` entry point.
    ///
    /// # Safety
    /// The function pointers in `vtable` must be valid for the lifetime of
    /// the returned core and callable from any thread.
    pub unsafe fn create(vtable: FramepumpCoreVTable) -> Result<Self, CoreError> {
        let run_frame = vtable.run_frame.ok_or(CoreError::Unsupported {
            operation: "run_frame",
        })?;
        let set_output_size = vtable.set_output_size.ok_or(CoreError::Unsupported {
            operation: "set_output_size",
        })?;
        let load_rom = vtable.load_rom.ok_or(CoreError::Unsupported {
            operation: "load_rom",
        })?;

        if let Some(create) = vtable.create
            && !unsafe { create(vtable.user_data) }
        {
            return Err(CoreError::create("host core refused to initialize"));
        }

        Ok(Self {
            user_data: vtable.user_data,
            destroy: vtable.destroy,
            run_frame,
            set_output_size,
            load_rom,
        })
    }
}

impl EmulatorCore for ForeignCore {
    type Surface = ForeignSurface;

    fn run_frame(&mut self, surface: &ForeignSurface) -> CoreOutcome {
        if unsafe { (self.run_frame)(self.user_data, surface.0) } {
            Ok(())
        } else {
            Err(CoreError::render("host core reported a failed frame"))
        }
    }

    fn set_output_size(&mut self, width: u32, height: u32) -> CoreOutcome {
        if unsafe { (self.set_output_size)(self.user_data, width, height) } {
            Ok(())
        } else {
            Err(CoreError::resize(width, height, "host core rejected size"))
        }
    }

    fn load_rom(&mut self, path: &Path) -> CoreOutcome {
        let path = path
            .to_str()
            .ok_or_else(|| CoreError::load("path is not valid UTF-8"))?;
        let path = CString::new(path).map_err(|_| CoreError::load("path contains a NUL byte"))?;
        if unsafe { (self.load_rom)(self.user_data, path.as_ptr()) } {
            Ok(())
        } else {
            Err(CoreError::load("host core rejected ROM"))
        }
    }
}

impl Drop for ForeignCore {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy {
            unsafe { destroy(self.user_data) };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    unsafe extern "C" fn refuse(_user_data: *mut c_void) -> bool {
        false
    }

    unsafe extern "C" fn frame(_user_data: *mut c_void, _surface: *mut c_void) -> bool {
        true
    }

    unsafe extern "C" fn size(_user_data: *mut c_void, _width: u32, _height: u32) -> bool {
        true
    }

    fn table() -> FramepumpCoreVTable {
        FramepumpCoreVTable {
            user_data: ptr::null_mut(),
            create: None,
            destroy: None,
            run_frame: Some(frame),
            set_output_size: Some(size),
            load_rom: None,
        }
    }

    #[test]
    fn missing_entry_point_is_unsupported() {
        let result = unsafe { ForeignCore::create(table()) };
        assert!(matches!(
            result,
            Err(CoreError::Unsupported {
                operation: "load_rom"
            })
        ));
    }

    #[test]
    fn refused_create_is_a_creation_failure() {
        unsafe extern "C" fn load(_user_data: *mut c_void, _path: *const c_char) -> bool {
            true
        }
        let vtable = FramepumpCoreVTable {
            create: Some(refuse),
            load_rom: Some(load),
            ..table()
        };
        let result = unsafe { ForeignCore::create(vtable) };
        assert!(matches!(result, Err(CoreError::CreateFailed { .. })));
    }
}
