//! Bounded polling used in place of fixed pauses.
//!
//! Every synchronization point in the page objects goes through [`Waiter`]:
//! read something, test it, and either return the value that satisfied the
//! predicate or fail with a timeout that names the condition and the last
//! value seen. A fixed sleep is never a substitute for a condition check.

use std::fmt::Debug;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_PAGE_LOAD_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Per-operation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_element_ms")]
    pub element_ms: u64,

    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,

    #[serde(default = "default_request_ms")]
    pub request_ms: u64,

    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,
}

fn default_element_ms() -> u64 { DEFAULT_ELEMENT_TIMEOUT_MS }
fn default_page_load_ms() -> u64 { DEFAULT_PAGE_LOAD_TIMEOUT_MS }
fn default_request_ms() -> u64 { DEFAULT_REQUEST_TIMEOUT_MS }
fn default_poll_ms() -> u64 { DEFAULT_POLL_INTERVAL_MS }

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_ms: DEFAULT_ELEMENT_TIMEOUT_MS,
            page_load_ms: DEFAULT_PAGE_LOAD_TIMEOUT_MS,
            request_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    pub fn element(&self) -> Waiter {
        Waiter::new(self.element_ms, self.poll_interval_ms)
    }

    pub fn page_load(&self) -> Waiter {
        Waiter::new(self.page_load_ms, self.poll_interval_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }
}

/// Poll-until-condition with a bounded timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms.max(1)),
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read until `predicate` holds and return the value that satisfied it.
    ///
    /// Errors from `read` are not retried: they come from the collaborator,
    /// not from the page still settling.
    pub fn until<T, R, P>(&self, condition: &str, mut read: R, predicate: P) -> E2eResult<T>
    where
        T: Debug,
        R: FnMut() -> E2eResult<T>,
        P: Fn(&T) -> bool,
    {
        self.run(condition, || {
            let value = read()?;
            if predicate(&value) {
                Ok(Ok(value))
            } else {
                Ok(Err(format!("{:?}", value)))
            }
        })
    }

    /// Read until `accept` maps the observation to a result.
    pub fn poll<T, U, R, A>(&self, condition: &str, mut read: R, mut accept: A) -> E2eResult<U>
    where
        T: Debug,
        R: FnMut() -> E2eResult<T>,
        A: FnMut(&T) -> Option<U>,
    {
        self.run(condition, || {
            let value = read()?;
            match accept(&value) {
                Some(accepted) => Ok(Ok(accepted)),
                None => Ok(Err(format!("{:?}", value))),
            }
        })
    }

    fn run<U, F>(&self, condition: &str, mut attempt: F) -> E2eResult<U>
    where
        F: FnMut() -> E2eResult<Result<U, String>>,
    {
        let start = Instant::now();
        let mut last_seen = String::from("<nothing read>");
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            match attempt()? {
                Ok(value) => {
                    tracing::trace!(condition, polls, "condition met");
                    return Ok(value);
                }
                Err(seen) => last_seen = seen,
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(E2eError::Timeout {
                    condition: condition.to_string(),
                    last_seen,
                    waited_ms: elapsed.as_millis(),
                });
            }
            thread::sleep(self.poll_interval.min(self.timeout - elapsed));
        }
    }
}
