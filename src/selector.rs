// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Selector — waits on a set of (port, action) pairs and dispatches the
// action of whichever port first reports ready.

use std::sync::{Arc, Condvar, Mutex};

use crate::observer::SelectablePort;

/// Deregisters every listed port's observer unconditionally, including on
/// a panic unwinding through `select`. This is the resolution of the
/// "does not deregister on exceptional exit" open question: cleanup here
/// is unconditional rather than tied to the normal-return path only.
struct ObserverGuard<'a> {
    ports: &'a [&'a dyn SelectablePort],
}

impl<'a> Drop for ObserverGuard<'a> {
    fn drop(&mut self) {
        for port in self.ports {
            port.clear_observer();
        }
    }
}

/// Waits for the first of several ports to become ready and runs the
/// associated action. Disposable: construct a new `Selector` per call or
/// reuse `Selector::select` as an associated function — it carries no
/// state between calls.
pub struct Selector;

impl Selector {
    /// `pairs` is scanned in the given order on every wakeup; the
    /// earliest-listed ready port wins. Blocks if no port is ready, woken
    /// by any listed port's observer firing. All observers are cleared
    /// before this function returns, on every exit path.
    pub fn select<R>(pairs: &[(&dyn SelectablePort, &dyn Fn() -> R)]) -> R {
        let sync = Arc::new((Mutex::new(()), Condvar::new()));
        let sync_for_observer = Arc::clone(&sync);
        let observer: crate::observer::Observer = Arc::new(move || {
            let (lock, cv) = &*sync_for_observer;
            let _guard = lock.lock().unwrap();
            cv.notify_all();
        });

        let ports: Vec<&dyn SelectablePort> = pairs.iter().map(|(port, _)| *port).collect();
        for port in &ports {
            port.set_observer(Arc::clone(&observer));
        }
        let _guard = ObserverGuard { ports: &ports };

        let (lock, cv) = &*sync;
        let mut held = lock.lock().unwrap();
        loop {
            for (port, action) in pairs {
                if port.probe() {
                    for p in &ports {
                        p.clear_observer();
                    }
                    drop(held);
                    return action();
                }
            }
            held = cv.wait(held).unwrap();
        }
    }
}
