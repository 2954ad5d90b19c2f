/*!
 * Platform Module
 * OS abstraction used by the harness
 */

mod posix;
pub mod traits;

pub use posix::PosixPlatform;
pub use traits::Platform;
