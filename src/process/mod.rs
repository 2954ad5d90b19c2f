/*!
 * Process Module
 * Fork-based child spawning
 */

mod spawner;
pub mod types;

pub use spawner::{ProcessSpawner, SpawnOutcome};
pub use types::{ChildExit, ForkOutcome, Pid, ProcessRole};
