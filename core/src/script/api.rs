//! Lua bindings exposed to input scripts
//!
//! | Table    | Functions |
//! |----------|-----------|
//! | `core`   | `advance(n)`, `frame()`, `log(msg)`, `pause()`, `reset()`, `panic(msg)` |
//! | `memory` | `read_u8(addr)`, `read_u16(addr)`, `read_u32(addr)` |
//! | `padN`   | `press`, `release`, `release_all`, `hold`, `is_pressed`, `is_held`, `stick`, `cstick`, `triggers`, `hold_stick`, `hold_cstick`, `hold_triggers` |
//!
//! Button constants (`A`, `B`, `Start`, `DPadUp`, ..) are globals and may be
//! combined by passing several to one call.

use mlua::{Lua, Table, Value, Variadic};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::pads::{Layer, ScriptPads};
use crate::movie::BackendEvent;
use crate::pad::{MAX_PADS, PadButtons};
use crate::session::MemoryView;

/// Globals that could reach the filesystem or compile new chunks
const REMOVED_GLOBALS: [&str; 3] = ["dofile", "loadfile", "load"];

/// Button constants as script globals
const BUTTON_GLOBALS: [(&str, PadButtons); 12] = [
    ("A", PadButtons::A),
    ("B", PadButtons::B),
    ("X", PadButtons::X),
    ("Y", PadButtons::Y),
    ("Z", PadButtons::Z),
    ("L", PadButtons::L),
    ("R", PadButtons::R),
    ("Start", PadButtons::START),
    ("DPadUp", PadButtons::UP),
    ("DPadDown", PadButtons::DOWN),
    ("DPadLeft", PadButtons::LEFT),
    ("DPadRight", PadButtons::RIGHT),
];

/// `core.advance` must yield from Lua itself; a Rust callback cannot.
const ADVANCE_CHUNK: &str = r#"
local yield = coroutine.yield
return function(frames)
    frames = frames or 1
    if frames < 0 then
        return
    end
    yield(frames)
end
"#;

/// State shared between the Lua callbacks and the bridge
#[derive(Default)]
pub struct ScriptShared {
    pads: Mutex<ScriptPads>,
    requests: Mutex<Vec<BackendEvent>>,
    panic: Mutex<Option<String>>,
    frame: AtomicU64,
}

impl ScriptShared {
    pub fn pads(&self) -> MutexGuard<'_, ScriptPads> {
        self.pads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_request(&self, event: BackendEvent) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn take_requests(&self) -> Vec<BackendEvent> {
        std::mem::take(&mut *self.requests.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn take_panic(&self) -> Option<String> {
        self.panic.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn set_panic(&self, message: String) {
        *self.panic.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    pub fn set_frame(&self, frame: u64) {
        self.frame.store(frame, Ordering::Relaxed);
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }
}

fn buttons_from_args(args: &Variadic<u16>) -> PadButtons {
    args.iter()
        .fold(PadButtons::empty(), |acc, bits| acc | PadButtons::from_bits_retain(*bits))
}

/// Drop globals a sandboxed script must not see
pub fn sandbox(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();
    for name in REMOVED_GLOBALS {
        globals.set(name, Value::Nil)?;
    }
    Ok(())
}

/// Install every table and constant into the script's globals
pub fn install(
    lua: &Lua,
    shared: Arc<ScriptShared>,
    memory: Option<Arc<dyn MemoryView>>,
) -> mlua::Result<()> {
    let globals = lua.globals();

    for (name, buttons) in BUTTON_GLOBALS {
        globals.set(name, buttons.bits())?;
    }

    globals.set("core", core_table(lua, shared.clone())?)?;
    globals.set("memory", memory_table(lua, memory)?)?;
    for index in 0..MAX_PADS {
        globals.set(format!("pad{}", index + 1), pad_table(lua, shared.clone(), index)?)?;
    }
    Ok(())
}

fn core_table(lua: &Lua, shared: Arc<ScriptShared>) -> mlua::Result<Table> {
    let core = lua.create_table()?;

    let advance: mlua::Function = lua.load(ADVANCE_CHUNK).set_name("=advance").eval()?;
    core.set("advance", advance)?;

    let state = shared.clone();
    core.set(
        "frame",
        lua.create_function(move |_, ()| Ok(state.frame()))?,
    )?;

    core.set(
        "log",
        lua.create_function(|_, message: String| {
            tracing::info!(target: "inputreel::script", "{message}");
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    core.set(
        "pause",
        lua.create_function(move |_, ()| {
            state.push_request(BackendEvent::Pause);
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    core.set(
        "reset",
        lua.create_function(move |_, ()| {
            state.push_request(BackendEvent::Reset);
            Ok(())
        })?,
    )?;

    core.set(
        "panic",
        lua.create_function(move |_, message: Option<String>| -> mlua::Result<()> {
            let message = message.unwrap_or_else(|| "panic".to_string());
            shared.set_panic(message.clone());
            Err(mlua::Error::runtime(message))
        })?,
    )?;

    Ok(core)
}

fn memory_table(lua: &Lua, memory: Option<Arc<dyn MemoryView>>) -> mlua::Result<Table> {
    let table = lua.create_table()?;

    let view = memory.clone();
    table.set(
        "read_u8",
        lua.create_function(move |_, addr: u32| Ok(view.as_ref().and_then(|m| m.read_u8(addr))))?,
    )?;

    let view = memory.clone();
    table.set(
        "read_u16",
        lua.create_function(move |_, addr: u32| Ok(view.as_ref().and_then(|m| m.read_u16(addr))))?,
    )?;

    table.set(
        "read_u32",
        lua.create_function(move |_, addr: u32| {
            Ok(memory.as_ref().and_then(|m| m.read_u32(addr)))
        })?,
    )?;

    Ok(table)
}

fn pad_table(lua: &Lua, shared: Arc<ScriptShared>, index: usize) -> mlua::Result<Table> {
    let table = lua.create_table()?;

    let state = shared.clone();
    table.set(
        "press",
        lua.create_function(move |_, args: Variadic<u16>| {
            state.pads()[index].press(buttons_from_args(&args));
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    table.set(
        "hold",
        lua.create_function(move |_, args: Variadic<u16>| {
            state.pads()[index].hold(buttons_from_args(&args));
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    table.set(
        "release",
        lua.create_function(move |_, args: Variadic<u16>| {
            state.pads()[index].release(buttons_from_args(&args));
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    table.set(
        "release_all",
        lua.create_function(move |_, ()| {
            state.pads()[index].release_all();
            Ok(())
        })?,
    )?;

    let state = shared.clone();
    table.set(
        "is_pressed",
        lua.create_function(move |_, args: Variadic<u16>| {
            Ok(state.pads()[index].is_pressed(buttons_from_args(&args)))
        })?,
    )?;

    let state = shared.clone();
    table.set(
        "is_held",
        lua.create_function(move |_, args: Variadic<u16>| {
            Ok(state.pads()[index].is_held(buttons_from_args(&args)))
        })?,
    )?;

    let analog = [
        ("stick", Layer::Pressed, AnalogKind::Stick),
        ("cstick", Layer::Pressed, AnalogKind::CStick),
        ("triggers", Layer::Pressed, AnalogKind::Triggers),
        ("hold_stick", Layer::Held, AnalogKind::Stick),
        ("hold_cstick", Layer::Held, AnalogKind::CStick),
        ("hold_triggers", Layer::Held, AnalogKind::Triggers),
    ];
    for (name, layer, kind) in analog {
        let state = shared.clone();
        table.set(
            name,
            lua.create_function(move |_, (a, b): (Option<i64>, Option<i64>)| {
                let (a, b) = (a.unwrap_or(0), b.unwrap_or(0));
                let mut pads = state.pads();
                let pad = &mut pads[index];
                match kind {
                    AnalogKind::Stick => pad.set_stick(layer, a, b),
                    AnalogKind::CStick => pad.set_c_stick(layer, a, b),
                    AnalogKind::Triggers => pad.set_triggers(layer, a, b),
                }
                Ok(())
            })?,
        )?;
    }

    Ok(table)
}

#[derive(Clone, Copy)]
enum AnalogKind {
    Stick,
    CStick,
    Triggers,
}
