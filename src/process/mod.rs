//! Child process plumbing.
//!
//! # Data Flow
//! ```text
//! CommandSpec (program, args, env)
//!     → runner.rs / supervise.rs (spawn, wait, deadline)
//!     → signals.rs (relay SIGTERM/SIGINT/... to the child)
//!     → exit.rs (ExitStatus → shell-style exit code)
//! ```
//!
//! # Design Decisions
//! - Children inherit stdio; the bootstrap never captures their output
//! - Exit codes follow shell conventions (127 not found, 128+n signals)
//! - Signals are relayed, not handled: the child decides what they mean

pub mod command;
pub mod exit;
pub mod runner;
pub mod signals;
pub mod supervise;

pub use command::CommandSpec;
pub use runner::{CommandRunner, SystemRunner};
pub use signals::ForwardedSignal;
pub use supervise::{supervise, ChildReport};
