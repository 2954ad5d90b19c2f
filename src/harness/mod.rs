/*!
 * Harness
 *
 * Worker entry point run once per OS process. The root runs it from the
 * top; each forked child continues it from the spawn loop with role
 * `Child`, then opens, unlinks, holds and closes its own semaphore handle.
 */

mod context;

pub use context::{ProcessContext, RunReport};

use crate::core::config::HarnessConfig;
use crate::core::console::ConsoleLog;
use crate::core::errors::HarnessResult;
use crate::ipc::SemaphoreInitializer;
use crate::platform::Platform;
use crate::process::ProcessSpawner;
use crate::signals::SignalRegistrar;
use tracing::{debug, error, info, info_span, warn};

/// Log channel → signals → spawn → semaphore → hold → close
pub struct Harness<P: Platform> {
    platform: P,
    config: HarnessConfig,
    registrar: SignalRegistrar,
}

impl<P: Platform> Harness<P> {
    pub fn new(platform: P, config: HarnessConfig) -> Self {
        Self {
            platform,
            config,
            registrar: SignalRegistrar::default(),
        }
    }

    /// Observe a different signal list
    pub fn with_registrar(mut self, registrar: SignalRegistrar) -> Self {
        self.registrar = registrar;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run to completion in the calling process. Errors have already been
    /// written to `console` when this returns them.
    pub fn run(&self, console: &ConsoleLog) -> HarnessResult<RunReport> {
        let platform = &self.platform;
        let main_pid = platform.current_pid();
        console.line(format_args!("MAIN PID: {}", main_pid));

        let span = info_span!("harness", main_pid);
        let _enter = span.enter();
        info!(
            children = self.config.child_count,
            hold_ms = self.config.hold.as_millis() as u64,
            semaphore = %self.config.semaphore.name,
            "Harness starting"
        );

        if let Err(e) = platform.init_signal_log() {
            platform.report_failure(console, &e);
            error!(error = %e, "Signal log channel unavailable");
            return Err(e);
        }

        let mut ctx = ProcessContext::new(console);

        let signals_registered = self.registrar.register_all(platform, ctx.console);

        let spawned = ProcessSpawner::new(self.config.child_count, self.config.spawn_delay)
            .spawn_all(platform, ctx.console)?;
        ctx.role = spawned.role;
        ctx.children = spawned.children;
        debug!(role = %ctx.role, pid = platform.current_pid(), "Spawn phase complete");

        let semaphore = SemaphoreInitializer::new(self.config.semaphore.clone())
            .initialize(platform, ctx.console)?;
        ctx.semaphore = Some(semaphore);

        platform.wait(self.config.hold, ctx.console);

        if let Some(semaphore) = ctx.semaphore.take() {
            if let Err(e) = platform.close_semaphore(semaphore) {
                platform.report_failure(ctx.console, &e);
                warn!(error = %e, "Semaphore close failed");
            }
        }

        let mut child_exits = Vec::new();
        if ctx.role.is_root() && self.config.reap_children {
            for &child in &ctx.children {
                match platform.reap(child) {
                    Ok(exit) => {
                        info!(child, ?exit, "Child reaped");
                        child_exits.push((child, exit));
                    }
                    Err(e) => {
                        platform.report_failure(ctx.console, &e);
                        warn!(child, error = %e, "Child could not be reaped");
                    }
                }
            }
        }

        info!(role = %ctx.role, "Harness finished");

        Ok(RunReport {
            pid: platform.current_pid(),
            role: ctx.role,
            signals_registered,
            children: ctx.children,
            child_exits,
        })
    }
}
