// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// SendPort — the producer endpoint of a channel.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use crate::dtype::TensorElement;
use crate::error::{ChannelError, Result};
use crate::local_semaphore::LocalSemaphore;
use crate::observer::{Observer, SelectablePort};
use crate::slot_proto::Proto;
use crate::ring::RingView;
use crate::semaphore::IpcSemaphore;
use crate::shm::ShmHandle;
use crate::tensor::Tensor;

/// How often the ack-drain thread wakes on its own to recheck `done`,
/// bounding how long `join()` takes to quiesce an otherwise-idle port.
const DRAIN_POLL_MS: u64 = 50;

/// Producer endpoint of a channel: blocking `send`, non-blocking `probe`,
/// an observer hook, and a background thread draining the `ack`
/// semaphore.
pub struct SendPort<T: TensorElement> {
    name: String,
    proto: Proto<T>,
    region: Arc<ShmHandle>,
    req: Arc<IpcSemaphore>,
    ack: Arc<IpcSemaphore>,
    started: AtomicBool,
    done: Arc<AtomicBool>,
    idx: Mutex<usize>,
    permit: OnceLock<Arc<LocalSemaphore>>,
    ring: OnceLock<RingView<T>>,
    observer: Arc<Mutex<Option<Observer>>>,
    drain_thread: OnceLock<thread::JoinHandle<()>>,
}

impl<T: TensorElement> SendPort<T> {
    pub(crate) fn new(
        name: impl Into<String>,
        proto: Proto<T>,
        region: Arc<ShmHandle>,
        req: Arc<IpcSemaphore>,
        ack: Arc<IpcSemaphore>,
    ) -> Self {
        Self {
            name: name.into(),
            proto,
            region,
            req,
            ack,
            started: AtomicBool::new(false),
            done: Arc::new(AtomicBool::new(false)),
            idx: Mutex::new(0),
            permit: OnceLock::new(),
            ring: OnceLock::new(),
            observer: Arc::new(Mutex::new(None)),
            drain_thread: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        self.proto.shape()
    }

    pub fn dtype(&self) -> crate::dtype::DType {
        self.proto.dtype()
    }

    pub fn size(&self) -> usize {
        self.proto.size()
    }

    /// Idempotent preparation: materialise the ring view, create the
    /// internal slot-permit initialised to `size`, spawn the ack-drain
    /// thread. Fails if called twice.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ChannelError::UsageError(format!(
                "SendPort '{}' already started",
                self.name
            )));
        }

        let ring = RingView::new(Arc::clone(&self.region), &self.proto);
        let _ = self.ring.set(ring);
        let permit = Arc::new(LocalSemaphore::new(self.proto.size()));
        let _ = self.permit.set(Arc::clone(&permit));

        let ack = Arc::clone(&self.ack);
        let done = Arc::clone(&self.done);
        let observer = Arc::clone(&self.observer);
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(format!("sendport-ack-drain-{name}"))
            .spawn(move || ack_drain_loop(ack, permit, done, observer, name))
            .expect("failed to spawn ack-drain thread");
        let _ = self.drain_thread.set(handle);

        Ok(())
    }

    /// Send one tensor. Fails with `ShapeMismatch` before touching any
    /// semaphore if `data`'s shape disagrees with the channel's Proto.
    /// Blocks until a slot permit is available.
    pub fn send(&self, data: &Tensor<T>) -> Result<()> {
        if !self.started.load(Ordering::Acquire) {
            return Err(ChannelError::UsageError(format!(
                "SendPort '{}' used before start()",
                self.name
            )));
        }
        if data.shape() != self.proto.shape() {
            return Err(ChannelError::ShapeMismatch {
                expected: self.proto.shape().to_vec(),
                actual: data.shape().to_vec(),
            });
        }

        let permit = self
            .permit
            .get()
            .expect("permit set by start() before send() can run");
        permit.acquire();

        let idx = {
            let mut idx = self.idx.lock().unwrap();
            let current = *idx;
            *idx = (current + 1) % self.proto.size();
            current
        };

        let ring = self.ring.get().expect("ring set by start()");
        ring.write_slot(idx, data);

        self.req.post(1)?;
        tracing::trace!(port = %self.name, idx, "sent slot");
        Ok(())
    }

    /// Non-blocking: true iff a subsequent `send` would not block.
    pub fn probe(&self) -> bool {
        match self.permit.get() {
            Some(p) => p.available(),
            None => false,
        }
    }

    /// Set `done`, causing the ack-drain thread to exit at its next
    /// wakeup. Does not wait for in-flight sends.
    pub fn join(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// True once the ack-drain thread has exited, whether from `join()`
    /// quiescing an idle port or from the `ack` semaphore reporting the
    /// peer is gone. Returns `true` if `start()` was never called, since
    /// there is then no thread to be running.
    pub fn drain_thread_finished(&self) -> bool {
        self.drain_thread
            .get()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Register an observer, fired on a full->not-full transition.
    pub fn set_observer(&self, observer: Observer) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    /// Remove the currently installed observer, if any.
    pub fn clear_observer(&self) {
        *self.observer.lock().unwrap() = None;
    }
}

impl<T: TensorElement> SelectablePort for SendPort<T> {
    fn probe(&self) -> bool {
        SendPort::probe(self)
    }

    fn set_observer(&self, observer: Observer) {
        SendPort::set_observer(self, observer)
    }

    fn clear_observer(&self) {
        SendPort::clear_observer(self)
    }
}

fn ack_drain_loop(
    ack: Arc<IpcSemaphore>,
    permit: Arc<LocalSemaphore>,
    done: Arc<AtomicBool>,
    observer: Arc<Mutex<Option<Observer>>>,
    name: String,
) {
    loop {
        if done.load(Ordering::Acquire) {
            return;
        }
        match ack.wait(Some(DRAIN_POLL_MS)) {
            Ok(false) => continue, // poll timed out, recheck `done`
            Ok(true) => {
                let was_full = !permit.available();
                permit.release();
                if was_full {
                    if let Some(obs) = observer.lock().unwrap().clone() {
                        if catch_unwind(AssertUnwindSafe(|| obs())).is_err() {
                            tracing::warn!(port = %name, "observer callback panicked");
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(port = %name, error = %err, "ack semaphore gone, peer is gone");
                return;
            }
        }
    }
}
