/*!
 * Platform Traits
 * Every OS interaction of the harness goes through this seam
 */

use crate::core::console::ConsoleLog;
use crate::core::errors::{HarnessError, HarnessResult};
use crate::ipc::SemaphoreSettings;
use crate::process::types::{ChildExit, ForkOutcome, Pid};
use crate::signals::SignalSpec;
use std::time::Duration;

/// OS primitives used by the harness flow
pub trait Platform {
    /// Open named-semaphore handle
    type Semaphore;

    /// Id of the calling process (changes across fork)
    fn current_pid(&self) -> Pid;

    /// Set up the channel that carries signal deliveries to the console
    fn init_signal_log(&self) -> HarnessResult<()>;

    /// Install the harness handler for one signal
    fn register_signal(&self, spec: &SignalSpec) -> HarnessResult<()>;

    /// Duplicate the calling process
    fn fork(&self) -> HarnessResult<ForkOutcome>;

    fn open_semaphore(&self, settings: &SemaphoreSettings) -> HarnessResult<Self::Semaphore>;

    fn unlink_semaphore(&self, name: &str) -> HarnessResult<()>;

    fn close_semaphore(&self, semaphore: Self::Semaphore) -> HarnessResult<()>;

    /// Block for `duration`, reporting delivered signals on `console`
    fn wait(&self, duration: Duration, console: &ConsoleLog);

    /// Wait for a child to terminate
    fn reap(&self, child: Pid) -> HarnessResult<ChildExit>;

    /// Console failure line for OS errors, tracing for everything else
    fn report_failure(&self, console: &ConsoleLog, err: &HarnessError) {
        match err {
            HarnessError::Os(failure) => console.failure(self.current_pid(), failure),
            other => tracing::error!(error = %other, "Harness step failed"),
        }
    }
}
