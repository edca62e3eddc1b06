use std::fmt;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::error::{Result, SableError};
use crate::value::Value;

/// A lock that can be acquired in one call and released in another,
/// unlike a guard-scoped mutex.
#[derive(Default)]
pub struct Lock {
    held: Mutex<bool>,
    released: Condvar,
}

impl Lock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is free, then take it.
    pub fn acquire(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    /// Release the lock. Returns whether it was held.
    pub fn release(&self) -> bool {
        let mut held = self.held.lock();
        let was_held = *held;
        *held = false;
        self.released.notify_one();
        was_held
    }

    pub fn is_locked(&self) -> bool {
        *self.held.lock()
    }
}

impl fmt::Debug for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lock({})", self.is_locked())
    }
}

/// A native thread running an interpreter function.
pub struct ThreadHandle {
    pub name: String,
    handle: Mutex<Option<JoinHandle<Result<Value>>>>,
}

impl ThreadHandle {
    pub fn new(name: impl Into<String>, handle: JoinHandle<Result<Value>>) -> Self {
        ThreadHandle {
            name: name.into(),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Wait for the thread and return its result. A thread can be joined once.
    pub fn join(&self) -> Result<Value> {
        let handle = self
            .handle
            .lock()
            .take()
            .ok_or_else(|| SableError::eval(format!("thread {} was already joined", self.name)))?;
        handle
            .join()
            .map_err(|_| SableError::eval(format!("thread {} panicked", self.name)))?
    }

    pub fn is_alive(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadHandle({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn lock_release_reports_prior_state() {
        let lock = Lock::new();
        assert!(!lock.is_locked());
        lock.acquire();
        assert!(lock.is_locked());
        assert!(lock.release());
        assert!(!lock.release());
    }

    #[test]
    fn lock_blocks_until_released_elsewhere() {
        let lock = Arc::new(Lock::new());
        lock.acquire();
        let waiter = {
            let lock = Arc::clone(&lock);
            std::thread::spawn(move || {
                lock.acquire();
                lock.release();
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        lock.release();
        waiter.join().unwrap();
        assert!(!lock.is_locked());
    }

    #[test]
    fn thread_handle_joins_once() {
        let t = ThreadHandle::new("worker", std::thread::spawn(|| Ok(Value::int(7))));
        assert_eq!(t.join().unwrap(), Value::int(7));
        assert!(!t.is_alive());
        assert!(t.join().is_err());
    }

    #[test]
    fn thread_handle_propagates_errors() {
        let t = ThreadHandle::new(
            "failing",
            std::thread::spawn(|| Err(SableError::eval("boom"))),
        );
        let err = t.join().unwrap_err();
        assert_eq!(err.to_string(), "Eval error: boom");
    }
}
