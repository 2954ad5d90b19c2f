/*!
 * Process Types
 * Roles and outcomes of the fork-based worker model
 */

use std::fmt;

/// OS process identifier
pub type Pid = u32;

/// Which copy of the harness this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// The process started from the command line
    Root,
    /// The `index`-th child forked by the root (0-based)
    Child { index: u32 },
}

impl ProcessRole {
    pub fn is_root(&self) -> bool {
        matches!(self, ProcessRole::Root)
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Root => f.write_str("root"),
            ProcessRole::Child { index } => write!(f, "child#{}", index),
        }
    }
}

/// Result of a successful fork, seen from the calling side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkOutcome {
    Parent { child: Pid },
    Child,
}

/// How a reaped child ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited(i32),
    Signaled(i32),
}

impl ChildExit {
    pub fn success(&self) -> bool {
        matches!(self, ChildExit::Exited(0))
    }
}
