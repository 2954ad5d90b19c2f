/*!
 * Signal Types
 * The fixed signal set and the record passed from handler to watcher
 */

use nix::sys::signal::Signal;
use std::fmt;

/// A signal the harness observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSpec {
    pub signal: Signal,
    pub name: &'static str,
}

impl SignalSpec {
    pub const fn new(signal: Signal, name: &'static str) -> Self {
        Self { signal, name }
    }

    pub fn number(&self) -> i32 {
        self.signal as i32
    }
}

impl fmt::Display for SignalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Registration order is part of the console output
pub const SIGNAL_SPECS: [SignalSpec; 5] = [
    SignalSpec::new(Signal::SIGABRT, "SIGABRT"),
    SignalSpec::new(Signal::SIGINT, "SIGINT"),
    SignalSpec::new(Signal::SIGQUIT, "SIGQUIT"),
    SignalSpec::new(Signal::SIGSEGV, "SIGSEGV"),
    SignalSpec::new(Signal::SIGTERM, "SIGTERM"),
];

/// One delivery, as written into the self-pipe by the async handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    pub signo: i32,
    /// Receiving process, which may differ from the draining one right after fork
    pub pid: i32,
}

impl SignalRecord {
    pub const SIZE: usize = 8;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.signo.to_ne_bytes());
        bytes[4..].copy_from_slice(&self.pid.to_ne_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let [a, b, c, d, e, f, g, h] = bytes;
        Self {
            signo: i32::from_ne_bytes([a, b, c, d]),
            pid: i32::from_ne_bytes([e, f, g, h]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_order_and_numbers() {
        let names: Vec<_> = SIGNAL_SPECS.iter().map(|s| s.name).collect();
        assert_eq!(names, ["SIGABRT", "SIGINT", "SIGQUIT", "SIGSEGV", "SIGTERM"]);

        for spec in SIGNAL_SPECS {
            assert_eq!(spec.number(), spec.signal as i32);
            assert_eq!(spec.to_string(), spec.signal.as_str());
        }
    }

    #[test]
    fn test_record_layout() {
        let record = SignalRecord { signo: 15, pid: 4242 };
        let bytes = record.to_bytes();
        assert_eq!(&bytes[..4], &15i32.to_ne_bytes());
        assert_eq!(SignalRecord::from_bytes(bytes), record);
    }
}
