/*!
 * IPC Module
 * Named POSIX semaphore used by every harness process
 */

mod initializer;
mod semaphore;

pub use initializer::SemaphoreInitializer;
pub use semaphore::{NamedSemaphore, OpenMode, SemaphoreSettings};
