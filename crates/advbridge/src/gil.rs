//! Lock discipline around the embedded interpreter.
//!
//! The GIL alone serializes interpreter bytecode, but interpreter-side code
//! is free to drop it mid-call (torch and numpy kernels do). Bridge calls
//! must interleave at call granularity only, so a process-wide re-entrant
//! permit is taken before entering the GIL and held for the full call.

use std::sync::OnceLock;

use parking_lot::ReentrantMutex;
use pyo3::Python;

static INTERPRETER_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn interpreter_lock() -> &'static ReentrantMutex<()> {
    INTERPRETER_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Runs `f` with exclusive interpreter access for the calling thread.
///
/// Blocks until the permit is available. Re-entrant: a bridge call may nest
/// another on the same thread without deadlocking. Both the permit and the
/// GIL are released on every exit path.
pub(crate) fn with_interpreter<T>(f: impl for<'py> FnOnce(Python<'py>) -> T) -> T {
    let _permit = interpreter_lock().lock();
    Python::with_gil(f)
}
