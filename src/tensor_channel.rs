// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Channel factory: allocates the shared region, creates the two
// semaphores, and binds a matched SendPort/RecvPort pair over them.

use std::io;
use std::sync::Arc;

use crate::dtype::TensorElement;
use crate::error::Result;
use crate::slot_proto::Proto;
use crate::recv_port::RecvPort;
use crate::semaphore::IpcSemaphore;
use crate::send_port::SendPort;
use crate::shm::{ShmHandle, ShmOpenMode};

/// The shared-memory allocator contract the factory consumes.
///
/// The core does not define how the returned region is named or
/// destroyed beyond what `ShmHandle` already provides; a caller who needs
/// a different backing allocator can supply their own implementation.
pub trait ShmAllocator: Send + Sync {
    fn allocate(&self, name: &str, nbytes: usize) -> io::Result<Arc<ShmHandle>>;
}

/// The default allocator: a named, process-shareable `ShmHandle`.
pub struct DefaultAllocator;

impl ShmAllocator for DefaultAllocator {
    fn allocate(&self, name: &str, nbytes: usize) -> io::Result<Arc<ShmHandle>> {
        let handle = ShmHandle::acquire(name, nbytes, ShmOpenMode::CreateOrOpen)?;
        Ok(Arc::new(handle))
    }
}

/// A matched SendPort/RecvPort pair sharing one ring of slots and one
/// `req`/`ack` semaphore pair.
pub struct Channel<T: TensorElement> {
    pub src_port: SendPort<T>,
    pub dst_port: RecvPort<T>,
}

impl<T: TensorElement> Channel<T> {
    /// Create a channel backed by the default shared-memory allocator.
    pub fn create(
        src_name: impl Into<String>,
        dst_name: impl Into<String>,
        shape: Vec<usize>,
        size: usize,
    ) -> Result<Self> {
        Self::create_with_allocator(src_name, dst_name, shape, size, &DefaultAllocator)
    }

    /// Create a channel backed by a caller-supplied allocator.
    pub fn create_with_allocator(
        src_name: impl Into<String>,
        dst_name: impl Into<String>,
        shape: Vec<usize>,
        size: usize,
        allocator: &dyn ShmAllocator,
    ) -> Result<Self> {
        let src_name = src_name.into();
        let dst_name = dst_name.into();

        let proto = Proto::<T>::new(shape, size)?;

        let region_name = format!("{src_name}_{dst_name}_region");
        let region = allocator.allocate(&region_name, proto.nbytes() * proto.size())?;

        let req = Arc::new(IpcSemaphore::open(
            &format!("{src_name}_{dst_name}_req"),
            0,
        )?);
        let ack = Arc::new(IpcSemaphore::open(
            &format!("{src_name}_{dst_name}_ack"),
            0,
        )?);

        let src_port = SendPort::new(
            src_name,
            proto.clone(),
            Arc::clone(&region),
            Arc::clone(&req),
            Arc::clone(&ack),
        );
        let dst_port = RecvPort::new(dst_name, proto, region, req, ack);

        Ok(Self { src_port, dst_port })
    }
}
