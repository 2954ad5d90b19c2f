/*!
 * Signal Registrar
 * Installs the SA_SIGINFO handler with an empty block mask
 */

use super::handler::on_signal;
use super::types::{SignalSpec, SIGNAL_SPECS};
use crate::core::console::ConsoleLog;
use crate::core::errors::{HarnessError, HarnessResult};
use crate::platform::Platform;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet};
use tracing::{debug, warn};

/// Replace the disposition of `spec.signal` with the harness handler
pub fn install_handler(spec: &SignalSpec) -> HarnessResult<()> {
    let action = SigAction::new(
        SigHandler::SigAction(on_signal),
        SaFlags::SA_SIGINFO,
        SigSet::empty(),
    );

    // SAFETY: `on_signal` only performs async-signal-safe operations
    unsafe { sigaction(spec.signal, &action) }
        .map(drop)
        .map_err(|errno| HarnessError::os("sigaction", Some(spec.name), errno))
}

/// Registers the harness handler for a list of signals
#[derive(Debug, Clone)]
pub struct SignalRegistrar {
    specs: Vec<SignalSpec>,
}

impl Default for SignalRegistrar {
    fn default() -> Self {
        Self::new(&SIGNAL_SPECS)
    }
}

impl SignalRegistrar {
    pub fn new(specs: &[SignalSpec]) -> Self {
        Self {
            specs: specs.to_vec(),
        }
    }

    pub fn specs(&self) -> &[SignalSpec] {
        &self.specs
    }

    /// Announce and register every spec in order. A failure is logged and the
    /// loop moves on. Returns how many registrations succeeded.
    pub fn register_all<P: Platform>(&self, platform: &P, console: &ConsoleLog) -> usize {
        let mut registered = 0;

        for spec in &self.specs {
            console.line(format_args!("Registering for signal {}", spec.name));
            match platform.register_signal(spec) {
                Ok(()) => {
                    debug!(signal = spec.name, signo = spec.number(), "Handler installed");
                    registered += 1;
                }
                Err(e) => {
                    platform.report_failure(console, &e);
                    warn!(signal = spec.name, error = %e, "Handler not installed");
                }
            }
        }

        registered
    }
}
