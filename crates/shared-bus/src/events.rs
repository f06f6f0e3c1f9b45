//! # Bus Events
//!
//! Anything published on the bus implements [`BusEvent`], which maps an
//! event to the topic subscribers filter on.

use std::fmt::Debug;
use std::hash::Hash;

/// An event that can travel over an [`InMemoryEventBus`](crate::InMemoryEventBus).
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Topic type used for subscription filtering.
    type Topic: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Topic of this event.
    fn topic(&self) -> Self::Topic;
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone)]
pub struct EventFilter<T> {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<T>,
}

impl<T> Default for EventFilter<T> {
    fn default() -> Self {
        Self { topics: Vec::new() }
    }
}

impl<T: PartialEq> EventFilter<T> {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<T>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    pub fn matches<E>(&self, event: &E) -> bool
    where
        E: BusEvent<Topic = T>,
    {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
