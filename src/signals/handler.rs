/*!
 * Signal Handler
 *
 * Two-stage delivery: the async handler only bumps counters and writes a
 * fixed-size record into a non-blocking self-pipe; the watcher drains the
 * pipe from normal context and does the console I/O.
 */

use super::atomic_stats::AtomicSignalStats;
use super::types::SignalRecord;
use crate::core::console::ConsoleLog;
use crate::core::errors::{HarnessError, HarnessResult};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd::pipe2;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, FromRawFd, IntoRawFd, OwnedFd};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Write end of the current process's self-pipe, -1 until installed
static WRITE_FD: AtomicI32 = AtomicI32::new(-1);

static STATS: AtomicSignalStats = AtomicSignalStats::new();

/// Delivery counters for this process
pub fn signal_stats() -> &'static AtomicSignalStats {
    &STATS
}

/// The installed `SA_SIGINFO` handler. Async-signal-safe calls only.
pub extern "C" fn on_signal(
    signo: libc::c_int,
    _info: *mut libc::siginfo_t,
    _context: *mut libc::c_void,
) {
    // SAFETY: errno is thread-local; it is restored before returning
    let saved_errno = unsafe { *errno_location() };

    STATS.record_delivery(signo);

    let fd = WRITE_FD.load(Ordering::Acquire);
    if fd >= 0 {
        // SAFETY: getpid is async-signal-safe
        let pid = unsafe { libc::getpid() };
        let bytes = SignalRecord { signo, pid }.to_bytes();
        // SAFETY: write is async-signal-safe; writes below PIPE_BUF are atomic
        let written = unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
        if written != bytes.len() as isize {
            STATS.record_drop();
        }
    } else {
        STATS.record_drop();
    }

    // SAFETY: see above
    unsafe { *errno_location() = saved_errno };
}

#[cfg(any(target_os = "linux", target_os = "android"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__error()
}

/// Normal-context reader of the self-pipe
#[derive(Debug)]
pub struct SignalWatcher {
    reader: File,
}

impl SignalWatcher {
    /// Create the self-pipe and publish its write end to the handler
    pub fn install() -> HarnessResult<Self> {
        let reader = publish_new_pipe()?;
        debug!("Signal self-pipe installed");
        Ok(Self { reader })
    }

    /// Replace the pipe inherited across fork with a private one
    ///
    /// The inherited pipe is left unread: anything still in it is reported by
    /// the parent, tagged with the pid that received it.
    pub fn rearm(&mut self) -> HarnessResult<()> {
        self.reader = publish_new_pipe()?;
        debug!("Signal self-pipe re-armed after fork");
        Ok(())
    }

    /// Read every record currently in the pipe
    pub fn drain(&self) -> Vec<SignalRecord> {
        let mut records = Vec::new();
        let mut buf = [0u8; SignalRecord::SIZE * 64];

        loop {
            match (&self.reader).read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    records.extend(buf[..n].chunks_exact(SignalRecord::SIZE).map(|chunk| {
                        let mut bytes = [0u8; SignalRecord::SIZE];
                        bytes.copy_from_slice(chunk);
                        SignalRecord::from_bytes(bytes)
                    }));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Failed to read signal self-pipe");
                    break;
                }
            }
        }

        records
    }

    /// Print `<pid> - Signal <number> received` for every pending record
    pub fn report(&self, console: &ConsoleLog) -> usize {
        let records = self.drain();
        for record in &records {
            debug!(signo = record.signo, pid = record.pid, "Signal delivered");
            console.line(format_args!(
                "{} - Signal {} received",
                record.pid, record.signo
            ));
        }
        records.len()
    }

    /// Block for `duration`, reporting signals as they arrive
    ///
    /// An interrupted poll resumes until the deadline, so the full duration
    /// always elapses.
    pub fn watch(&self, duration: Duration, console: &ConsoleLog) {
        let deadline = Instant::now() + duration;

        loop {
            self.report(console);

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let slice_ms = remaining.as_micros().div_ceil(1000).min(u128::from(u16::MAX)) as u16;
            let mut fds = [PollFd::new(self.reader.as_fd(), PollFlags::POLLIN)];

            match poll(&mut fds, PollTimeout::from(slice_ms)) {
                Ok(_) | Err(Errno::EINTR) => {}
                Err(errno) => {
                    warn!(%errno, "poll on signal self-pipe failed, sleeping instead");
                    std::thread::sleep(remaining);
                    self.report(console);
                    break;
                }
            }
        }
    }
}

fn publish_new_pipe() -> HarnessResult<File> {
    let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK)
        .map_err(|errno| HarnessError::os("pipe2", None, errno))?;

    let old = WRITE_FD.swap(write_end.into_raw_fd(), Ordering::AcqRel);
    if old >= 0 {
        // SAFETY: `old` was published by a previous call and is owned by nobody else
        drop(unsafe { OwnedFd::from_raw_fd(old) });
    }

    Ok(File::from(read_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_handler_invocation_writes_a_record() {
        // Calling the handler directly exercises stage 1 without touching dispositions
        let watcher = SignalWatcher::install().unwrap();
        let before = signal_stats().delivered(libc::SIGUSR2);

        on_signal(libc::SIGUSR2, std::ptr::null_mut(), std::ptr::null_mut());

        let records = watcher.drain();
        assert_eq!(signal_stats().delivered(libc::SIGUSR2), before + 1);
        assert!(records.contains(&SignalRecord {
            signo: libc::SIGUSR2,
            pid: std::process::id() as i32,
        }));
    }

    #[test]
    #[serial]
    fn test_empty_watch_returns_after_duration() {
        let watcher = SignalWatcher::install().unwrap();
        let (console, sink) = ConsoleLog::memory();

        let started = Instant::now();
        watcher.watch(Duration::from_millis(30), &console);

        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(sink.contents(), "");
    }

    #[test]
    #[serial]
    fn test_full_pipe_drops_records_and_counts_them() {
        let watcher = SignalWatcher::install().unwrap();
        let dropped_before = signal_stats().dropped();

        // Nobody drains while the handler runs, so the pipe eventually fills
        let mut calls = 0u64;
        while signal_stats().dropped() == dropped_before && calls < 1_000_000 {
            on_signal(libc::SIGUSR2, std::ptr::null_mut(), std::ptr::null_mut());
            calls += 1;
        }
        let dropped = signal_stats().dropped() - dropped_before;
        assert!(dropped > 0, "pipe never filled after {} calls", calls);

        let records = watcher.drain();
        assert!(!records.is_empty());
        assert_eq!(records.len() as u64 + dropped, calls);
        let expected = SignalRecord {
            signo: libc::SIGUSR2,
            pid: std::process::id() as i32,
        };
        assert!(records.iter().all(|r| *r == expected));
    }

    #[test]
    #[serial]
    fn test_delivery_without_log_channel_is_counted_as_dropped() {
        let watcher = SignalWatcher::install().unwrap();
        let fd = WRITE_FD.swap(-1, Ordering::AcqRel);
        let dropped_before = signal_stats().dropped();

        on_signal(libc::SIGUSR2, std::ptr::null_mut(), std::ptr::null_mut());

        WRITE_FD.store(fd, Ordering::Release);
        assert_eq!(signal_stats().dropped(), dropped_before + 1);
        assert!(watcher.drain().is_empty());
    }
}
