//! Named lifecycle events an entity emits, and handle-based subscriptions to them.
//!
//! NPC scripts and feat timers subscribe here instead of poking at entity
//! internals. Every subscription returns a [`ListenerHandle`]; cancelling
//! goes through the handle, never through closure identity.

use std::collections::BTreeMap;
use std::fmt;

/// Fired by [`crate::entity::PlayerEntity::has_energy`] when an energy-gated action succeeds.
pub const ACTION_EVENT: &str = "action";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEvent {
    pub name: String,
    /// Event-specific amount (the energy cost for `action`).
    pub value: Option<i64>,
}

impl EntityEvent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn action(cost: i64) -> Self {
        Self::new(ACTION_EVENT).with_value(cost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

pub type Listener = Box<dyn FnMut(&EntityEvent) + Send>;

struct Subscription {
    event: String,
    once: bool,
    listener: Listener,
}

/// Listener table owned by a single entity.
#[derive(Default)]
pub struct LifecycleBus {
    next_id: u64,
    subscriptions: BTreeMap<ListenerHandle, Subscription>,
}

impl fmt::Debug for LifecycleBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `listener` every time `event` is emitted until unsubscribed.
    pub fn subscribe(
        &mut self,
        event: &str,
        listener: impl FnMut(&EntityEvent) + Send + 'static,
    ) -> ListenerHandle {
        self.insert(event, false, Box::new(listener))
    }

    /// Call `listener` on the next emission of `event` only.
    pub fn once(
        &mut self,
        event: &str,
        listener: impl FnMut(&EntityEvent) + Send + 'static,
    ) -> ListenerHandle {
        self.insert(event, true, Box::new(listener))
    }

    /// Returns false when the handle was already gone.
    pub fn unsubscribe(&mut self, handle: ListenerHandle) -> bool {
        self.subscriptions.remove(&handle).is_some()
    }

    /// Deliver `event` to its listeners in subscription order. Returns how many ran.
    pub fn emit(&mut self, event: &EntityEvent) -> usize {
        let handles: Vec<ListenerHandle> = self
            .subscriptions
            .iter()
            .filter(|(_, sub)| sub.event == event.name)
            .map(|(h, _)| *h)
            .collect();

        for handle in &handles {
            let once = match self.subscriptions.get_mut(handle) {
                Some(sub) => {
                    (sub.listener)(event);
                    sub.once
                }
                None => continue,
            };
            if once {
                self.subscriptions.remove(handle);
            }
        }
        handles.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.subscriptions
            .values()
            .filter(|sub| sub.event == event)
            .count()
    }

    fn insert(&mut self, event: &str, once: bool, listener: Listener) -> ListenerHandle {
        self.next_id += 1;
        let handle = ListenerHandle(self.next_id);
        self.subscriptions.insert(
            handle,
            Subscription {
                event: event.to_string(),
                once,
                listener,
            },
        );
        handle
    }
}
