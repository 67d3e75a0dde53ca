// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Proto — the immutable per-slot payload descriptor shared by both ends
// of a channel.

use std::marker::PhantomData;

use crate::dtype::{DType, TensorElement};
use crate::error::{ChannelError, Result};

/// Immutable descriptor of the per-slot payload: element shape, element
/// dtype, and the byte size of one slot.
///
/// `nbytes` always equals `product(shape) * size_of::<T>()`. Both ports of
/// a channel are built from the same `Proto`, so shape/dtype mismatches
/// between them cannot occur at runtime — only a caller passing a
/// wrong-shaped tensor to `send`/`peek`/`recv` ever surfaces a mismatch.
#[derive(Debug, Clone)]
pub struct Proto<T: TensorElement> {
    shape: Vec<usize>,
    size: usize,
    nbytes: usize,
    _marker: PhantomData<T>,
}

impl<T: TensorElement> Proto<T> {
    /// Build and validate a descriptor for `size` slots of tensors shaped
    /// `shape`.
    pub fn new(shape: Vec<usize>, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ChannelError::UsageError(
                "ring size must be at least 1".into(),
            ));
        }
        let elems: usize = shape.iter().product();
        let nbytes = elems * std::mem::size_of::<T>();
        if nbytes == 0 {
            return Err(ChannelError::UsageError(
                "slot byte size must be at least 1".into(),
            ));
        }
        Ok(Self {
            shape,
            size,
            nbytes,
            _marker: PhantomData,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nbytes(&self) -> usize {
        self.nbytes
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }
}
