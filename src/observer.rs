// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Observer callback type shared by SendPort, RecvPort, and Selector.
//
// Observers are edge-triggered: a port's drain thread invokes them only on
// a readiness transition (full->not-full for a sender, empty->not-empty
// for a receiver), never on every drain iteration. They run on the drain
// thread, not the application thread, so implementations must not assume
// thread affinity.

use std::sync::Arc;

pub type Observer = Arc<dyn Fn() + Send + Sync>;

/// A port that can be waited on by a `Selector`.
pub trait SelectablePort: Send + Sync {
    /// Non-blocking readiness check.
    fn probe(&self) -> bool;

    /// Install a shared observer, replacing any previous one.
    fn set_observer(&self, observer: Observer);

    /// Remove the currently installed observer, if any.
    fn clear_observer(&self);
}
