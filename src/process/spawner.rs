/*!
 * Process Spawner
 * Sequential fork loop producing one parent and N direct children
 */

use super::types::{ForkOutcome, Pid, ProcessRole};
use crate::core::console::ConsoleLog;
use crate::core::errors::HarnessResult;
use crate::platform::Platform;
use std::time::Duration;
use tracing::{error, info};

/// Where a process stands once the spawn loop is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub role: ProcessRole,
    /// Children forked by this process; empty in children
    pub children: Vec<Pid>,
}

/// Forks `count` children, waiting `delay` after each one
#[derive(Debug, Clone, Copy)]
pub struct ProcessSpawner {
    count: u32,
    delay: Duration,
}

impl ProcessSpawner {
    pub fn new(count: u32, delay: Duration) -> Self {
        Self { count, delay }
    }

    /// Run the loop. A child leaves immediately, so there are no grandchildren.
    ///
    /// Fork failure is fatal: it is logged and returned, never mistaken for
    /// the child branch.
    pub fn spawn_all<P: Platform>(
        &self,
        platform: &P,
        console: &ConsoleLog,
    ) -> HarnessResult<SpawnOutcome> {
        let mut children = Vec::new();

        for index in 0..self.count {
            match platform.fork() {
                Ok(ForkOutcome::Parent { child }) => {
                    console.line(format_args!("Child process created. PID: {}", child));
                    info!(child, index, "Child process created");
                    children.push(child);
                    platform.wait(self.delay, console);
                }
                Ok(ForkOutcome::Child) => {
                    return Ok(SpawnOutcome {
                        role: ProcessRole::Child { index },
                        children: Vec::new(),
                    });
                }
                Err(e) => {
                    platform.report_failure(console, &e);
                    error!(index, spawned = children.len(), "Fork failed, aborting run");
                    return Err(e);
                }
            }
        }

        Ok(SpawnOutcome {
            role: ProcessRole::Root,
            children,
        })
    }
}
