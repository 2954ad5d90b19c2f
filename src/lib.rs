/*!
 * SemTester Library
 * Diagnostic harness for POSIX signals, fork and named semaphores
 */

pub mod core;
pub mod harness;
pub mod ipc;
pub mod monitoring;
pub mod platform;
pub mod process;
pub mod signals;

// Re-exports
pub use crate::core::{ConsoleLog, HarnessConfig, HarnessError, HarnessResult, OsFailure};
pub use harness::{Harness, ProcessContext, RunReport};
pub use ipc::{NamedSemaphore, OpenMode, SemaphoreInitializer, SemaphoreSettings};
pub use monitoring::init_tracing;
pub use platform::{Platform, PosixPlatform};
pub use process::{ChildExit, ForkOutcome, Pid, ProcessRole, ProcessSpawner};
pub use signals::{SignalRegistrar, SignalSpec, SignalWatcher, SIGNAL_SPECS};

/// Process exit code for every fatal harness failure
pub const EXIT_FAILURE_CODE: i32 = -1;
