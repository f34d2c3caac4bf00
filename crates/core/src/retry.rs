//! Bounded fixed-delay retry for disk I/O
//!
//! Change notifications routinely fire before the writing process has
//! released the file, so every read and write of a synchronized file goes
//! through a fixed, bounded retry window. No backoff growth, no jitter: the
//! window stays predictable so callers know the worst case up front.

use std::thread;
use std::time::Duration;

/// Retry budget for one fallible I/O action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first; values below one behave as one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempt budget is spent. The final
    /// failure is propagated unchanged, never swallowed.
    ///
    /// # Errors
    /// Returns the last error after the budget is exhausted.
    pub fn run<T, E>(&self, mut op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.attempts {
                        return Err(err);
                    }
                    thread::sleep(self.delay);
                }
            }
        }
    }
}
