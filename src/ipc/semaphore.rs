/*!
 * Named Semaphore
 * RAII wrapper around POSIX sem_open / sem_unlink / sem_close
 */

use crate::core::errors::{HarnessError, HarnessResult};
use nix::errno::Errno;
use nix::libc;
use std::ffi::CString;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::str::FromStr;

/// How the semaphore is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// `O_CREAT`: create if absent, attach otherwise
    #[default]
    Create,
    /// `O_CREAT | O_EXCL`, falling back to `O_RDWR` when the name exists
    Exclusive,
}

impl FromStr for OpenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(OpenMode::Create),
            "exclusive" => Ok(OpenMode::Exclusive),
            other => Err(format!("unknown open mode '{}' (create|exclusive)", other)),
        }
    }
}

/// Parameters for opening the named semaphore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreSettings {
    pub name: String,
    pub mode: u32,
    pub initial_value: u32,
    pub open_mode: OpenMode,
}

impl Default for SemaphoreSettings {
    fn default() -> Self {
        Self {
            name: "/semtester".to_string(),
            mode: 0o660,
            initial_value: 1,
            open_mode: OpenMode::Create,
        }
    }
}

impl SemaphoreSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }
}

/// Process-local handle to a system-wide named semaphore
///
/// The handle stays valid after the name is unlinked. Dropping it closes it.
pub struct NamedSemaphore {
    sem: NonNull<libc::sem_t>,
    name: String,
}

impl NamedSemaphore {
    /// Open according to `settings.open_mode`
    pub fn open(settings: &SemaphoreSettings) -> HarnessResult<Self> {
        let name = c_name(&settings.name, "O_CREAT")?;

        let sem = match settings.open_mode {
            OpenMode::Create => {
                raw_open(&name, libc::O_CREAT, settings.mode, settings.initial_value)
                    .map_err(|errno| HarnessError::os("sem_open", Some("O_CREAT"), errno))
            }
            OpenMode::Exclusive => {
                match raw_open(
                    &name,
                    libc::O_CREAT | libc::O_EXCL,
                    settings.mode,
                    settings.initial_value,
                ) {
                    Err(Errno::EEXIST) => {
                        tracing::debug!(name = %settings.name, "Semaphore exists, attaching");
                        raw_open(&name, libc::O_RDWR, 0, 0)
                            .map_err(|errno| HarnessError::os("sem_open", Some("O_RDWR"), errno))
                    }
                    result => result.map_err(|errno| {
                        HarnessError::os("sem_open", Some("O_CREAT|O_EXCL"), errno)
                    }),
                }
            }
        }?;

        Ok(Self {
            sem,
            name: settings.name.clone(),
        })
    }

    /// Attach to an existing semaphore without creating it
    pub fn open_existing(name: &str) -> HarnessResult<Self> {
        let c = c_name(name, "O_RDWR")?;
        let sem = raw_open(&c, libc::O_RDWR, 0, 0)
            .map_err(|errno| HarnessError::os("sem_open", Some("O_RDWR"), errno))?;
        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Remove `name` from the system namespace; open handles stay usable
    pub fn unlink(name: &str) -> HarnessResult<()> {
        let c = CString::new(name).map_err(|_| HarnessError::os("sem_unlink", None, Errno::EINVAL))?;
        // SAFETY: `c` is a valid NUL-terminated string for the duration of the call
        if unsafe { libc::sem_unlink(c.as_ptr()) } != 0 {
            return Err(HarnessError::os("sem_unlink", None, Errno::last()));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decrement without blocking. `Ok(false)` when the count is zero.
    pub fn try_acquire(&self) -> HarnessResult<bool> {
        // SAFETY: `self.sem` came from a successful sem_open and is not yet closed
        if unsafe { libc::sem_trywait(self.sem.as_ptr()) } == 0 {
            return Ok(true);
        }
        match Errno::last() {
            Errno::EAGAIN => Ok(false),
            errno => Err(HarnessError::os("sem_trywait", None, errno)),
        }
    }

    pub fn release(&self) -> HarnessResult<()> {
        // SAFETY: see try_acquire
        if unsafe { libc::sem_post(self.sem.as_ptr()) } != 0 {
            return Err(HarnessError::os("sem_post", None, Errno::last()));
        }
        Ok(())
    }

    /// Current count
    pub fn value(&self) -> HarnessResult<i32> {
        let mut value: libc::c_int = 0;
        // SAFETY: see try_acquire; `value` outlives the call
        if unsafe { libc::sem_getvalue(self.sem.as_ptr(), &mut value) } != 0 {
            return Err(HarnessError::os("sem_getvalue", None, Errno::last()));
        }
        Ok(value)
    }

    /// Close explicitly, reporting failure instead of swallowing it in drop
    pub fn close(self) -> HarnessResult<()> {
        let mut this = ManuallyDrop::new(self);
        drop(std::mem::take(&mut this.name));
        // SAFETY: `this` is never dropped, so the handle is closed exactly once
        if unsafe { libc::sem_close(this.sem.as_ptr()) } != 0 {
            return Err(HarnessError::os("sem_close", None, Errno::last()));
        }
        Ok(())
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        // SAFETY: the handle is still open; `close` bypasses this drop
        if unsafe { libc::sem_close(self.sem.as_ptr()) } != 0 {
            tracing::warn!(name = %self.name, errno = %Errno::last(), "sem_close failed during drop");
        }
    }
}

impl fmt::Debug for NamedSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedSemaphore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn c_name(name: &str, param: &'static str) -> HarnessResult<CString> {
    CString::new(name).map_err(|_| HarnessError::os("sem_open", Some(param), Errno::EINVAL))
}

fn raw_open(
    name: &CString,
    oflag: libc::c_int,
    mode: u32,
    value: u32,
) -> Result<NonNull<libc::sem_t>, Errno> {
    // SAFETY: `name` is NUL-terminated; mode and value are only read when O_CREAT is set
    let sem = unsafe {
        libc::sem_open(
            name.as_ptr(),
            oflag,
            mode as libc::mode_t,
            value as libc::c_uint,
        )
    };
    if sem == libc::SEM_FAILED {
        return Err(Errno::last());
    }
    NonNull::new(sem).ok_or(Errno::EINVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_mode_parsing() {
        assert_eq!("create".parse::<OpenMode>(), Ok(OpenMode::Create));
        assert_eq!("Exclusive".parse::<OpenMode>(), Ok(OpenMode::Exclusive));
        assert!("shared".parse::<OpenMode>().is_err());
    }

    #[test]
    fn test_interior_nul_is_rejected_before_the_os_sees_it() {
        let settings = SemaphoreSettings::named("/bad\0name");
        let err = NamedSemaphore::open(&settings).unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EINVAL));
    }
}
