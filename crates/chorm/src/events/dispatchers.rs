use super::types::{EventDispatcher, QueryEvent};
use std::sync::{Arc, Mutex};

/// A dispatcher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch(&self, _event: &QueryEvent) {}
}

/// Fans events out to several dispatchers in registration order.
#[derive(Clone, Default)]
pub struct CompositeDispatcher {
    dispatchers: Vec<Arc<dyn EventDispatcher>>,
}

impl CompositeDispatcher {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dispatcher.
    pub fn add<D: EventDispatcher + 'static>(mut self, dispatcher: D) -> Self {
        self.dispatchers.push(Arc::new(dispatcher));
        self
    }

    /// Add a shared dispatcher.
    pub fn add_arc(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatchers.push(dispatcher);
        self
    }

    /// Number of registered dispatchers.
    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }
}

impl EventDispatcher for CompositeDispatcher {
    fn dispatch(&self, event: &QueryEvent) {
        for dispatcher in &self.dispatchers {
            dispatcher.dispatch(event);
        }
    }
}

/// Keeps every event in memory.
///
/// Handy for tests and for inspecting what a unit of work sent.
#[derive(Debug, Default)]
pub struct CollectingDispatcher {
    events: Mutex<Vec<QueryEvent>>,
}

impl CollectingDispatcher {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of collected events.
    pub fn events(&self) -> Vec<QueryEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// SQL of collected events, in dispatch order.
    pub fn statements(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.sql).collect()
    }

    /// Drop collected events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventDispatcher for CollectingDispatcher {
    fn dispatch(&self, event: &QueryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
