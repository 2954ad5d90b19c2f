/*!
 * Semaphore Initializer
 * Open-then-unlink of the well-known semaphore name
 */

use super::semaphore::SemaphoreSettings;
use crate::core::console::ConsoleLog;
use crate::core::errors::HarnessResult;
use crate::platform::Platform;
use tracing::{info, warn};

/// Opens the named semaphore and removes its name right away
#[derive(Debug, Clone)]
pub struct SemaphoreInitializer {
    settings: SemaphoreSettings,
}

impl SemaphoreInitializer {
    pub fn new(settings: SemaphoreSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SemaphoreSettings {
        &self.settings
    }

    /// Open failure is returned after the unlink attempt; unlink failure is
    /// only logged.
    pub fn initialize<P: Platform>(
        &self,
        platform: &P,
        console: &ConsoleLog,
    ) -> HarnessResult<P::Semaphore> {
        let opened = platform.open_semaphore(&self.settings);
        if let Err(e) = &opened {
            platform.report_failure(console, e);
        }

        // Unlinked whether this process created the name or found it
        match platform.unlink_semaphore(&self.settings.name) {
            Ok(()) => info!(name = %self.settings.name, "Semaphore name unlinked"),
            Err(e) => {
                platform.report_failure(console, &e);
                warn!(name = %self.settings.name, error = %e, "Semaphore unlink failed");
            }
        }

        opened
    }
}
