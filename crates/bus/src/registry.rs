//! Handler registry - event kind to handler mapping

use crate::handler::EventHandler;
use crate::routing::EventKind;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each event kind to at most one handler
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the kind
    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        if let Some(previous) = self.handlers.insert(kind, handler) {
            tracing::warn!(kind = %kind, handler = previous.name(), "handler replaced");
        }
    }

    pub fn with(mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn get(&self, kind: EventKind) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
