/*!
 * Process Context
 * Per-process state threaded through the harness instead of globals
 */

use crate::core::console::ConsoleLog;
use crate::process::types::{ChildExit, Pid, ProcessRole};

/// Everything one harness process owns between setup and exit
#[derive(Debug)]
pub struct ProcessContext<'a, S> {
    pub console: &'a ConsoleLog,
    pub role: ProcessRole,
    pub children: Vec<Pid>,
    pub semaphore: Option<S>,
}

impl<'a, S> ProcessContext<'a, S> {
    pub fn new(console: &'a ConsoleLog) -> Self {
        Self {
            console,
            role: ProcessRole::Root,
            children: Vec::new(),
            semaphore: None,
        }
    }
}

/// What a completed run did, from this process's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub pid: Pid,
    pub role: ProcessRole,
    pub signals_registered: usize,
    pub children: Vec<Pid>,
    /// Filled only when the root reaps its children
    pub child_exits: Vec<(Pid, ChildExit)>,
}
