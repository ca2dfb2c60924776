//! Scripted input source
//!
//! A Lua script's `main` runs as a coroutine that is resumed synchronously
//! from the session tick, never concurrently with the host. `core.advance(n)`
//! suspends it; the bridge then lets `n - 1` ticks pass on a counter before
//! resuming again, so burned frames never re-enter the interpreter.
//!
//! ```lua
//! function main()
//!     pad1.hold(A)
//!     core.advance(3)
//!     pad1.release(A)
//!     core.advance(60)
//! end
//! ```
//!
//! Errors and a returning `main` both finish playback.

pub mod api;
pub mod pads;

use mlua::{HookTriggers, Lua, LuaOptions, MultiValue, StdLib, Thread, ThreadStatus, Value, VmState};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ScriptError;
use crate::movie::{BackendEvent, BackendEvents, Playback};
use crate::pad::{MAX_PADS, PadStatus};
use crate::session::MemoryView;
use api::ScriptShared;

/// Instructions between budget checks
const HOOK_INTERVAL: u32 = 1000;

/// Playback backend fed by a running script
pub struct ScriptPlayback {
    // Keeps the interpreter alive for as long as the thread.
    _lua: Lua,
    thread: Thread,
    shared: Arc<ScriptShared>,
    /// Ticks left before the next resumption
    wait: u64,
    finished: bool,
    /// Instructions run in the current resumption, in hook intervals
    spent: Arc<AtomicU32>,
}

impl ScriptPlayback {
    /// Read and start a script file
    pub fn load(
        path: &Path,
        memory: Option<Arc<dyn MemoryView>>,
        instruction_budget: u32,
    ) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        Self::from_source(&name, &source, memory, instruction_budget)
    }

    /// Compile a script and prepare its `main` coroutine without running it
    pub fn from_source(
        name: &str,
        source: &str,
        memory: Option<Arc<dyn MemoryView>>,
        instruction_budget: u32,
    ) -> Result<Self, ScriptError> {
        let libs = StdLib::COROUTINE | StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8;
        let lua = Lua::new_with(libs, LuaOptions::default())
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        let shared = Arc::new(ScriptShared::default());
        api::sandbox(&lua).map_err(|e| ScriptError::Load(e.to_string()))?;
        api::install(&lua, shared.clone(), memory).map_err(|e| ScriptError::Load(e.to_string()))?;

        lua.load(source)
            .set_name(format!("@{name}"))
            .exec()
            .map_err(|e| ScriptError::Load(e.to_string()))?;

        let main = match lua.globals().get::<Value>("main")? {
            Value::Function(main) => main,
            _ => return Err(ScriptError::MissingMain),
        };
        let thread = lua.create_thread(main)?;

        let spent = Arc::new(AtomicU32::new(0));
        if instruction_budget > 0 {
            let limit = instruction_budget.div_ceil(HOOK_INTERVAL);
            let counter = spent.clone();
            thread.set_hook(
                HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
                move |_, _| {
                    if counter.fetch_add(1, Ordering::Relaxed) + 1 > limit {
                        return Err(mlua::Error::runtime(
                            "instruction budget exceeded without advancing a frame",
                        ));
                    }
                    Ok(VmState::Continue)
                },
            );
        }

        tracing::debug!(script = name, instruction_budget, "script loaded");
        Ok(Self {
            _lua: lua,
            thread,
            shared,
            wait: 0,
            finished: false,
            spent,
        })
    }

    /// Run the coroutine until it yields or ends
    fn resume(&mut self, frame: u64) -> Result<(), ScriptError> {
        self.shared.set_frame(frame);
        self.spent.store(0, Ordering::Relaxed);

        let values = match self.thread.resume::<MultiValue>(()) {
            Ok(values) => values,
            Err(e) => {
                self.finished = true;
                return Err(match self.shared.take_panic() {
                    Some(message) => ScriptError::Panic(message),
                    None => ScriptError::Runtime(e.to_string()),
                });
            }
        };

        if self.thread.status() != ThreadStatus::Resumable {
            tracing::info!(frame, "script finished");
            self.finished = true;
            return Ok(());
        }

        let frames = match values.iter().next() {
            Some(Value::Integer(n)) => *n,
            Some(Value::Number(n)) => *n as i64,
            _ => 1,
        };
        self.wait = frames.max(1) as u64 - 1;
        Ok(())
    }

    /// Buffers the next poll will see; for inspection and tests
    pub fn pad_buffers(&self, index: usize) -> Option<pads::ScriptPad> {
        self.shared.pads().get(index).copied()
    }
}

impl Playback for ScriptPlayback {
    fn read_pad(&mut self, _frame: u64, index: usize) -> PadStatus {
        if index >= MAX_PADS {
            return PadStatus::NEUTRAL;
        }
        self.shared.pads()[index].take_frame()
    }

    fn read_motion(&mut self, _frame: u64, _index: usize, _report: &mut [u8]) {}

    fn advance(&mut self, frame: u64) -> BackendEvents {
        let mut events = BackendEvents::new();
        if self.finished {
            return events;
        }
        if self.wait > 0 {
            self.wait -= 1;
            return events;
        }

        let result = self.resume(frame);
        events.extend(self.shared.take_requests());
        if let Err(e) = result {
            tracing::error!(frame, error = %e, "script fault");
            events.push(BackendEvent::Fault(e));
        }
        events
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
