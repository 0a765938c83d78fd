use crate::input::events::{EventKind, MapEvent};
use crate::prelude::HashMap;
use std::collections::VecDeque;

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Typed pub/sub for map events.
///
/// Events are queued by the map as they happen and delivered in order by
/// [`EventManager::process_events`], so listeners never run in the middle of a
/// map mutation.
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<EventKind, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listeners.len())
            .field("event_queue", &self.event_queue)
            .finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    /// Drop every listener for an event kind
    pub fn off(&mut self, kind: EventKind) {
        self.listeners.remove(&kind);
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Deliver queued events to listeners and return them in emission order
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(&event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_receive_only_their_kind() {
        let mut manager = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        manager.on(EventKind::ZoomEnd, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.emit(MapEvent::ZoomEnd { zoom: 2.0 });
        manager.emit(MapEvent::DragStart);
        assert_eq!(manager.pending_events(), 2);

        let events = manager.process_events();
        assert_eq!(events.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(manager.pending_events(), 0);
    }

    #[test]
    fn test_off_removes_listeners() {
        let mut manager = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        manager.on(EventKind::DragEnd, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.off(EventKind::DragEnd);
        manager.emit(MapEvent::DragEnd);
        manager.process_events();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
