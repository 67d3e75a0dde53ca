// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Cross-platform named inter-process counting semaphore.
// Delegates to platform::PlatformSemaphore (POSIX or Windows).

use std::io;

use crate::platform::PlatformSemaphore;

/// A named, inter-process counting semaphore.
///
/// On POSIX this is a named semaphore opened via `sem_open`. On Windows
/// this is a kernel named semaphore via `CreateSemaphoreW`.
///
/// This is the primitive the `req`/`ack` handshake of a channel port is
/// built on: `wait` blocks (optionally with a timeout) until the count is
/// positive, decrementing it by one; `post` increments the count by the
/// given amount, waking any waiters.
pub struct IpcSemaphore {
    inner: PlatformSemaphore,
}

impl IpcSemaphore {
    /// Open (or create) a named semaphore. If this call creates the
    /// semaphore it starts at `initial`; if it already exists, the existing
    /// count is kept.
    pub fn open(name: &str, initial: u32) -> io::Result<Self> {
        let inner = PlatformSemaphore::open(name, initial)?;
        Ok(Self { inner })
    }

    /// Decrement the count, blocking while it is zero.
    ///
    /// `timeout_ms = None` blocks indefinitely and always returns `Ok(true)`
    /// on success. `Some(ms)` blocks for at most `ms` milliseconds, returning
    /// `Ok(false)` if the timeout elapses before the count becomes positive.
    pub fn wait(&self, timeout_ms: Option<u64>) -> io::Result<bool> {
        self.inner.wait(timeout_ms)
    }

    /// Non-blocking variant of `wait`: returns `Ok(true)` if the count was
    /// positive and has been decremented, `Ok(false)` if it was zero.
    pub fn try_wait(&self) -> io::Result<bool> {
        self.inner.wait(Some(0))
    }

    /// Increment the count by `count`, releasing that many waiters.
    pub fn post(&self, count: u32) -> io::Result<()> {
        self.inner.post(count)
    }

    /// Remove the backing storage for a named semaphore (static helper).
    pub fn clear_storage(name: &str) {
        PlatformSemaphore::clear_storage(name);
    }
}
