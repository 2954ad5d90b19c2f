/*!
 * Signals Module
 * POSIX signal observation: registration, async handler and watcher
 */

mod atomic_stats;
mod handler;
mod registrar;
pub mod types;

// Re-export public API
pub use atomic_stats::{AtomicSignalStats, MAX_SIGNO};
pub use handler::{on_signal, signal_stats, SignalWatcher};
pub use registrar::{install_handler, SignalRegistrar};
pub use types::{SignalRecord, SignalSpec, SIGNAL_SPECS};
