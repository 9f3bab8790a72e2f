//! Pub/Sub event bus between the sequencer and the viewer controller.
//!
//! The sequencer's callbacks cannot borrow the controller that owns the
//! sequencer, so they publish events instead:
//! - `emit()` invokes subscribers immediately AND queues the event
//! - `poll()` drains the queue; the controller applies events in its update loop
//!
//! Subscribers of one event type run in subscription order. Ordering across
//! event types is only guaranteed for the queue, which is FIFO.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Queue capacity; when reached, the oldest half is dropped
const MAX_QUEUE_SIZE: usize = 1000;

/// Anything `'static + Send + Sync` can be an event.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Queued event
pub type BoxedEvent = Box<dyn Event>;

#[derive(Default)]
struct Shared {
    subscribers: RwLock<HashMap<TypeId, Vec<Callback>>>,
    queue: Mutex<Vec<BoxedEvent>>,
}

impl Shared {
    fn dispatch(&self, type_id: TypeId, event: BoxedEvent) {
        // Clone the callback list so subscribers may emit without deadlocking
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&type_id)
            .cloned()
            .unwrap_or_default();
        for cb in &callbacks {
            // Deref to `dyn Event` so `as_any` sees the concrete type, not the Box
            cb((*event).as_any());
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict = queue.len() / 2;
            warn!("EventBus queue full ({} events), dropping oldest {}", queue.len(), evict);
            queue.drain(0..evict);
        }
        queue.push(event);
    }
}

/// Event bus owned by the controller. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type E.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.shared
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    pub fn emit<E: Event>(&self, event: E) {
        self.shared.dispatch(TypeId::of::<E>(), Box::new(event));
    }

    /// Drain queued events in emission order.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Emit-only handle for callbacks and worker threads.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn unsubscribe_all<E: Event>(&self) {
        self.shared
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<E>());
    }

    /// Drop all subscribers and queued events
    pub fn clear(&self) {
        self.shared.subscribers.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.shared
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .is_some_and(|v| !v.is_empty())
    }

    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Emit-only view of an [`EventBus`].
#[derive(Clone)]
pub struct EventEmitter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.shared.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event>(&self, event: E) {
        self.shared.dispatch(TypeId::of::<E>(), Box::new(event));
    }
}

/// Downcast a queued event to its concrete type.
///
/// Must go through `**event` so the `dyn Event` vtable is used; calling
/// `as_any()` on the `Box` itself would hit the blanket impl for the Box.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
