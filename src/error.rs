// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy for the tensor channel.

/// Errors returned from channel, port, and selector operations.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    /// A `send`/`recv`/`peek` was given a tensor whose shape does not match
    /// the shape fixed when the port's channel was created.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A non-blocking `recv`/`peek` found no message waiting.
    #[error("recv queue is empty")]
    EmptyQueue,

    /// A timeout value could not be interpreted (negative, non-finite, or
    /// otherwise outside the accepted range).
    #[error("invalid timeout: {0}")]
    BadTimeout(String),

    /// The peer process is gone — its semaphore or shared-memory handle can
    /// no longer be reached. Analogous to end-of-stream.
    #[error("peer is gone")]
    PeerGone,

    /// The port or selector was used out of its required order (e.g.
    /// `send`/`recv` before `start`, or `start` called twice).
    #[error("usage error: {0}")]
    UsageError(String),

    /// A platform shared-memory or semaphore syscall failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
