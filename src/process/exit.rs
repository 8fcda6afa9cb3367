//! Exit code conventions.

use std::io;
use std::process::ExitStatus;

/// Generic failure.
pub const GENERAL_FAILURE: i32 = 1;
/// Invalid configuration or usage.
pub const USAGE: i32 = 2;
/// A required service is unavailable (`EX_UNAVAILABLE`).
pub const UNAVAILABLE: i32 = 69;
/// Address already in use (`EADDRINUSE` on Linux).
pub const ADDR_IN_USE: i32 = 98;
/// Deadline exceeded, as reported by `timeout(1)`.
pub const TIMED_OUT: i32 = 124;
/// Command found but not executable.
pub const CANNOT_EXECUTE: i32 = 126;
/// Command not found.
pub const NOT_FOUND: i32 = 127;
/// Added to the signal number when a process dies from a signal.
pub const SIGNAL_BASE: i32 = 128;

/// Shell-style exit code for a finished child.
pub fn code_from_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_BASE + signal;
        }
    }
    GENERAL_FAILURE
}

/// Exit code for a command that could not be started.
pub fn spawn_failure_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::NotFound => NOT_FOUND,
        _ => CANNOT_EXECUTE,
    }
}
