// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// A bounded shared-memory CSP channel moving fixed-shape, fixed-dtype
// tensors between one sender and one receiver, plus a selector over
// several such channels. Built on the same shared-memory primitives as
// the rest of this crate — same POSIX/Win32 syscalls, same
// process-shared layout conventions.

pub mod shm_name;

mod platform;

mod shm;
pub use shm::{ShmHandle, ShmOpenMode};

mod spin_lock;
pub use spin_lock::SpinLock;

mod semaphore;
pub use semaphore::IpcSemaphore;

pub mod error;
pub use error::ChannelError;

pub mod dtype;
pub use dtype::{DType, TensorElement};

mod tensor;
pub use tensor::Tensor;

mod slot_proto;
pub use slot_proto::Proto;

mod ring;

mod local_semaphore;

mod recv_queue;

mod observer;
pub use observer::{Observer, SelectablePort};

mod send_port;
pub use send_port::SendPort;

mod recv_port;
pub use recv_port::RecvPort;

mod selector;
pub use selector::Selector;

mod tensor_channel;
pub use tensor_channel::{Channel, DefaultAllocator, ShmAllocator};
