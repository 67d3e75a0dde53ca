// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// RecvPort — the consumer endpoint of a channel.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use crate::dtype::TensorElement;
use crate::error::{ChannelError, Result};
use crate::observer::{Observer, SelectablePort};
use crate::slot_proto::Proto;
use crate::recv_queue::RecvQueue;
use crate::ring::RingView;
use crate::semaphore::IpcSemaphore;
use crate::shm::ShmHandle;
use crate::tensor::Tensor;

/// How often the req-drain thread wakes on its own to recheck `done`,
/// bounding how long `join()` takes to quiesce an otherwise-idle port.
const DRAIN_POLL_MS: u64 = 50;

/// Consumer endpoint of a channel: blocking `recv`, non-destructive
/// `peek`, non-blocking `probe`, an observer hook, and a background
/// thread draining the `req` semaphore.
pub struct RecvPort<T: TensorElement> {
    name: String,
    proto: Proto<T>,
    region: Arc<ShmHandle>,
    req: Arc<IpcSemaphore>,
    ack: Arc<IpcSemaphore>,
    started: AtomicBool,
    done: Arc<AtomicBool>,
    idx: Mutex<usize>,
    queue: OnceLock<Arc<RecvQueue>>,
    ring: OnceLock<RingView<T>>,
    observer: Arc<Mutex<Option<Observer>>>,
    drain_thread: OnceLock<thread::JoinHandle<()>>,
}

impl<T: TensorElement> RecvPort<T> {
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
            queue: OnceLock::new(),
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

    /// Idempotent preparation: materialise the ring view, create an empty
    /// RecvQueue, spawn the req-drain thread.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(ChannelError::UsageError(format!(
                "RecvPort '{}' already started",
                self.name
            )));
        }

        let ring = RingView::new(Arc::clone(&self.region), &self.proto);
        let _ = self.ring.set(ring);
        let queue = Arc::new(RecvQueue::new());
        let _ = self.queue.set(Arc::clone(&queue));

        let req = Arc::clone(&self.req);
        let done = Arc::clone(&self.done);
        let observer = Arc::clone(&self.observer);
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(format!("recvport-req-drain-{name}"))
            .spawn(move || req_drain_loop(req, queue, done, observer, name))
            .expect("failed to spawn req-drain thread");
        let _ = self.drain_thread.set(handle);

        Ok(())
    }

    /// Block until a slot is available, copy it out, advance past it, and
    /// release `ack`.
    pub fn recv(&self) -> Result<Tensor<T>> {
        self.recv_timeout(None)
    }

    /// Bounded-wait variant of `recv`. `None` blocks indefinitely.
    pub fn recv_timeout(&self, timeout_ms: Option<i64>) -> Result<Tensor<T>> {
        let queue = self.require_started()?;
        queue.get(true, timeout_ms, false)?;

        let idx = {
            let mut idx = self.idx.lock().unwrap();
            let current = *idx;
            *idx = (current + 1) % self.proto.size();
            current
        };

        let ring = self.ring.get().expect("ring set by start()");
        let tensor = ring.read_slot(idx);

        self.ack.post(1)?;
        tracing::trace!(port = %self.name, idx, "received slot");
        Ok(tensor)
    }

    /// Block until a slot is available and copy it out, without advancing
    /// past it or releasing `ack`. Repeated `peek`s with no intervening
    /// `recv` see the same slot.
    pub fn peek(&self) -> Result<Tensor<T>> {
        self.peek_timeout(None)
    }

    /// Bounded-wait variant of `peek`. `None` blocks indefinitely.
    pub fn peek_timeout(&self, timeout_ms: Option<i64>) -> Result<Tensor<T>> {
        let queue = self.require_started()?;
        queue.get(true, timeout_ms, true)?;

        let idx = *self.idx.lock().unwrap();
        let ring = self.ring.get().expect("ring set by start()");
        Ok(ring.read_slot(idx))
    }

    /// Non-blocking: true iff a queued token is waiting.
    pub fn probe(&self) -> bool {
        match self.queue.get() {
            Some(q) => q.qsize() > 0,
            None => false,
        }
    }

    /// Set `done`.
    pub fn join(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// True once the req-drain thread has exited, whether from `join()`
    /// quiescing an idle port or from the `req` semaphore reporting the
    /// peer is gone. Returns `true` if `start()` was never called, since
    /// there is then no thread to be running.
    pub fn drain_thread_finished(&self) -> bool {
        self.drain_thread
            .get()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Register an observer, fired on an empty->not-empty transition.
    pub fn set_observer(&self, observer: Observer) {
        *self.observer.lock().unwrap() = Some(observer);
    }

    /// Remove the currently installed observer, if any.
    pub fn clear_observer(&self) {
        *self.observer.lock().unwrap() = None;
    }

    fn require_started(&self) -> Result<&Arc<RecvQueue>> {
        if !self.started.load(Ordering::Acquire) {
            return Err(ChannelError::UsageError(format!(
                "RecvPort '{}' used before start()",
                self.name
            )));
        }
        Ok(self.queue.get().expect("queue set by start()"))
    }
}

impl<T: TensorElement> SelectablePort for RecvPort<T> {
    fn probe(&self) -> bool {
        RecvPort::probe(self)
    }

    fn set_observer(&self, observer: Observer) {
        RecvPort::set_observer(self, observer)
    }

    fn clear_observer(&self) {
        RecvPort::clear_observer(self)
    }
}

fn req_drain_loop(
    req: Arc<IpcSemaphore>,
    queue: Arc<RecvQueue>,
    done: Arc<AtomicBool>,
    observer: Arc<Mutex<Option<Observer>>>,
    name: String,
) {
    loop {
        if done.load(Ordering::Acquire) {
            return;
        }
        match req.wait(Some(DRAIN_POLL_MS)) {
            Ok(false) => continue, // poll timed out, recheck `done`
            Ok(true) => {
                let was_empty = queue.qsize() == 0;
                queue.put_nowait();
                if was_empty {
                    if let Some(obs) = observer.lock().unwrap().clone() {
                        if catch_unwind(AssertUnwindSafe(|| obs())).is_err() {
                            tracing::warn!(port = %name, "observer callback panicked");
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(port = %name, error = %err, "req semaphore gone, peer is gone");
                return;
            }
        }
    }
}
