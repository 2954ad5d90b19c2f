/*!
 * POSIX Platform
 * Real implementation backed by nix and the libc semaphore API
 */

use super::traits::Platform;
use crate::core::console::ConsoleLog;
use crate::core::errors::{HarnessError, HarnessResult};
use crate::ipc::{NamedSemaphore, SemaphoreSettings};
use crate::process::types::{ChildExit, ForkOutcome, Pid};
use crate::signals::{install_handler, SignalSpec, SignalWatcher};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, getpid, ForkResult, Pid as NixPid};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Platform backed by the running OS
#[derive(Debug, Default)]
pub struct PosixPlatform {
    watcher: Mutex<Option<SignalWatcher>>,
}

impl PosixPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for PosixPlatform {
    type Semaphore = NamedSemaphore;

    fn current_pid(&self) -> Pid {
        getpid().as_raw() as Pid
    }

    fn init_signal_log(&self) -> HarnessResult<()> {
        let watcher = SignalWatcher::install()?;
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }

    fn register_signal(&self, spec: &SignalSpec) -> HarnessResult<()> {
        install_handler(spec)
    }

    fn fork(&self) -> HarnessResult<ForkOutcome> {
        // SAFETY: the harness forks before the process starts any thread, so the
        // child does not inherit locks held by threads that no longer exist
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(ForkOutcome::Parent {
                child: child.as_raw() as Pid,
            }),
            Ok(ForkResult::Child) => {
                if let Some(watcher) = self.watcher.lock().as_mut() {
                    if let Err(e) = watcher.rearm() {
                        warn!(error = %e, "Child keeps the inherited signal pipe");
                    }
                }
                Ok(ForkOutcome::Child)
            }
            Err(errno) => Err(HarnessError::os("fork", None, errno)),
        }
    }

    fn open_semaphore(&self, settings: &SemaphoreSettings) -> HarnessResult<NamedSemaphore> {
        NamedSemaphore::open(settings)
    }

    fn unlink_semaphore(&self, name: &str) -> HarnessResult<()> {
        NamedSemaphore::unlink(name)
    }

    fn close_semaphore(&self, semaphore: NamedSemaphore) -> HarnessResult<()> {
        semaphore.close()
    }

    fn wait(&self, duration: Duration, console: &ConsoleLog) {
        match self.watcher.lock().as_ref() {
            Some(watcher) => watcher.watch(duration, console),
            None => std::thread::sleep(duration),
        }
    }

    fn reap(&self, child: Pid) -> HarnessResult<ChildExit> {
        let pid = NixPid::from_raw(child as i32);
        loop {
            match waitpid(pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(ChildExit::Exited(code)),
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    return Ok(ChildExit::Signaled(signal as i32))
                }
                Ok(status) => debug!(?status, "Ignoring non-terminal wait status"),
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    return Err(HarnessError::os("waitpid", Some(&child.to_string()), errno))
                }
            }
        }
    }
}
