use std::{
    ffi::{CStr, c_char, c_void},
    ptr,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use framepump_ffi::{
    FramepumpCoreVTable, framepump_frame_seq, framepump_has_rom_loaded, framepump_is_running,
    framepump_pick_cancelled, framepump_pick_document, framepump_set_drawable_size,
    framepump_set_paused, framepump_start, framepump_stop,
};
use once_cell::sync::Lazy;

// The exported API drives one process-wide pump.
static SERIAL: Mutex<()> = Mutex::new(());
static EVENTS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));
static FOREIGN_SURFACES: AtomicUsize = AtomicUsize::new(0);

const SURFACE: usize = 0xABCD;

fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    EVENTS.lock().unwrap().clear();
    FOREIGN_SURFACES.store(0, Ordering::SeqCst);
    guard
}

fn log(event: impl Into<String>) {
    EVENTS.lock().unwrap().push(event.into());
}

fn events() -> Vec<String> {
    EVENTS.lock().unwrap().clone()
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

unsafe extern "C" fn create(_user_data: *mut c_void) -> bool {
    log("create");
    true
}

unsafe extern "C" fn destroy(_user_data: *mut c_void) {
    log("destroy");
}

unsafe extern "C" fn run_frame(_user_data: *mut c_void, surface: *mut c_void) -> bool {
    if surface as usize != SURFACE {
        FOREIGN_SURFACES.fetch_add(1, Ordering::SeqCst);
    }
    thread::sleep(Duration::from_micros(100));
    true
}

unsafe extern "C" fn set_output_size(_user_data: *mut c_void, width: u32, height: u32) -> bool {
    log(format!("size {width}x{height}"));
    true
}

unsafe extern "C" fn load_rom(_user_data: *mut c_void, path: *const c_char) -> bool {
    let path = unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned();
    log(format!("load {path}"));
    !path.ends_with(".bad")
}

fn vtable() -> FramepumpCoreVTable {
    FramepumpCoreVTable {
        user_data: ptr::null_mut(),
        create: Some(create),
        destroy: Some(destroy),
        run_frame: Some(run_frame),
        set_output_size: Some(set_output_size),
        load_rom: Some(load_rom),
    }
}

#[test]
fn host_shell_lifecycle() {
    let _serial = serial();
    let table = vtable();

    assert!(unsafe { framepump_start(&table, SURFACE as *mut c_void, 0) });
    assert!(!unsafe { framepump_start(&table, SURFACE as *mut c_void, 0) });
    assert!(wait_until(|| framepump_frame_seq() > 0));
    assert_eq!(events().first().map(String::as_str), Some("create"));

    assert!(framepump_set_drawable_size(800, 600));
    assert!(!framepump_set_drawable_size(800, 600));
    assert!(!framepump_set_drawable_size(0, 600));
    assert!(wait_until(|| events().iter().any(|e| e == "size 800x600")));

    assert!(unsafe { framepump_pick_document(c"games/zelda.3ds".as_ptr()) });
    assert!(framepump_has_rom_loaded());
    assert!(!unsafe { framepump_pick_document(c"games/notes.bad".as_ptr()) });
    assert!(!framepump_has_rom_loaded());
    assert!(!unsafe { framepump_pick_document(ptr::null()) });

    let before = events().len();
    framepump_pick_cancelled();
    assert_eq!(events().len(), before);

    framepump_set_paused(true);
    thread::sleep(Duration::from_millis(30));
    let paused_at = framepump_frame_seq();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(framepump_frame_seq(), paused_at);
    framepump_set_paused(false);
    assert!(wait_until(|| framepump_frame_seq() > paused_at));

    framepump_stop();
    assert!(!framepump_is_running());
    assert_eq!(framepump_frame_seq(), 0);
    assert_eq!(events().last().map(String::as_str), Some("destroy"));
    assert_eq!(FOREIGN_SURFACES.load(Ordering::SeqCst), 0);

    let loads: Vec<_> = events()
        .into_iter()
        .filter(|e| e.starts_with("load "))
        .collect();
    assert_eq!(loads, ["load games/zelda.3ds", "load games/notes.bad"]);

    // Stopping twice is harmless.
    framepump_stop();
}

#[test]
fn missing_entry_point_stops_pump_without_creating_core() {
    let _serial = serial();
    let table = FramepumpCoreVTable {
        run_frame: None,
        ..vtable()
    };

    assert!(unsafe { framepump_start(&table, SURFACE as *mut c_void, 60) });
    assert!(wait_until(|| !framepump_is_running()));
    framepump_stop();

    assert!(events().is_empty());
}

#[test]
fn start_replaces_pump_that_exited_on_its_own() {
    let _serial = serial();
    let broken = FramepumpCoreVTable {
        load_rom: None,
        ..vtable()
    };

    assert!(unsafe { framepump_start(&broken, SURFACE as *mut c_void, 0) });
    assert!(wait_until(|| !framepump_is_running()));
    assert!(!unsafe { framepump_pick_document(c"games/late.3ds".as_ptr()) });

    let table = vtable();
    assert!(unsafe { framepump_start(&table, SURFACE as *mut c_void, 0) });
    assert!(wait_until(|| framepump_frame_seq() > 0));
    assert!(framepump_is_running());
    assert!(!unsafe { framepump_start(&table, SURFACE as *mut c_void, 0) });

    framepump_stop();
    assert_eq!(events().first().map(String::as_str), Some("create"));
    assert_eq!(events().last().map(String::as_str), Some("destroy"));
}

#[test]
fn null_vtable_is_rejected() {
    let _serial = serial();
    assert!(!unsafe { framepump_start(ptr::null(), ptr::null_mut(), 0) });
    assert!(!framepump_is_running());
    assert!(!framepump_set_drawable_size(640, 480));
}
