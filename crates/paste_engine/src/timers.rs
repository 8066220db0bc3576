use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, EventSink, TimerId};

struct Pending {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    pending: HashMap<TimerId, Pending>,
}

/// Keyed one-shot timers reporting `EngineEvent::TimerElapsed`.
///
/// Scheduling an existing id replaces the earlier timer; an elapsed or
/// cancelled timer never reports.
#[derive(Clone)]
pub struct Timers {
    registry: Arc<Mutex<Registry>>,
    sink: Arc<dyn EventSink>,
}

impl Timers {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            sink,
        }
    }

    pub fn schedule(&self, runtime: &Handle, id: TimerId, delay: Duration) {
        let cancel = CancellationToken::new();
        let generation = {
            let mut registry = lock(&self.registry);
            registry.next_generation += 1;
            let generation = registry.next_generation;
            if let Some(previous) = registry.pending.insert(
                id,
                Pending {
                    generation,
                    cancel: cancel.clone(),
                },
            ) {
                previous.cancel.cancel();
            }
            generation
        };

        let registry = self.registry.clone();
        let sink = self.sink.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let current = {
                        let mut registry = lock(&registry);
                        match registry.pending.get(&id) {
                            Some(pending) if pending.generation == generation => {
                                registry.pending.remove(&id);
                                true
                            }
                            _ => false,
                        }
                    };
                    if current {
                        sink.emit(EngineEvent::TimerElapsed(id));
                    }
                }
            }
        });
    }

    pub fn cancel(&self, id: TimerId) {
        if let Some(pending) = lock(&self.registry).pending.remove(&id) {
            pending.cancel.cancel();
        }
    }

    pub fn cancel_all(&self) {
        for (_, pending) in lock(&self.registry).pending.drain() {
            pending.cancel.cancel();
        }
    }

    pub fn pending(&self) -> usize {
        lock(&self.registry).pending.len()
    }
}

fn lock(registry: &Mutex<Registry>) -> std::sync::MutexGuard<'_, Registry> {
    // Entries are plain tokens; a poisoned lock is still usable.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
