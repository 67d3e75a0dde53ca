// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RecvQueue — in-process, thread-safe notification queue with a `peek`
// augmentation, decoupling the cross-process `req` signal from the
// application's `recv`/`peek` call.
//
// Tokens carry no payload (the slot they refer to is always the
// receiver's current `idx`), so the queue only needs to track a count.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{ChannelError, Result};

pub(crate) struct RecvQueue {
    state: Mutex<usize>,
    cv: Condvar,
}

impl RecvQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Enqueue a token. Never blocks: capacity always matches the ring
    /// size, so the queue can never overflow in a correctly driven port.
    pub(crate) fn put_nowait(&self) {
        let mut n = self.state.lock().unwrap();
        *n += 1;
        self.cv.notify_all();
    }

    /// Dequeue the head, or (if `peek`) return without removing it.
    ///
    /// `block = false` fails immediately with `EmptyQueue` if nothing is
    /// queued. `block = true, timeout_ms = None` waits indefinitely.
    /// `block = true, timeout_ms = Some(ms)` waits at most `ms`
    /// milliseconds before failing with `EmptyQueue`. A negative timeout is
    /// rejected with `BadTimeout` before any waiting happens.
    pub(crate) fn get(&self, block: bool, timeout_ms: Option<i64>, peek: bool) -> Result<()> {
        if let Some(ms) = timeout_ms {
            if ms < 0 {
                return Err(ChannelError::BadTimeout(format!(
                    "timeout must be non-negative, got {ms}"
                )));
            }
        }

        let mut n = self.state.lock().unwrap();
        if *n == 0 {
            if !block {
                return Err(ChannelError::EmptyQueue);
            }
            match timeout_ms {
                None => {
                    while *n == 0 {
                        n = self.cv.wait(n).unwrap();
                    }
                }
                Some(ms) => {
                    let deadline = Instant::now() + Duration::from_millis(ms as u64);
                    loop {
                        if *n != 0 {
                            break;
                        }
                        let now = Instant::now();
                        if now >= deadline {
                            return Err(ChannelError::EmptyQueue);
                        }
                        let (guard, _timeout) = self.cv.wait_timeout(n, deadline - now).unwrap();
                        n = guard;
                    }
                }
            }
        }

        if !peek {
            *n -= 1;
        }
        Ok(())
    }

    pub(crate) fn qsize(&self) -> usize {
        *self.state.lock().unwrap()
    }
}
