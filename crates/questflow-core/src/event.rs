//! Named events published on an event channel

use crate::{Tick, Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Name of the event the game clock publishes on every advance
pub const TICK_EVENT: &str = "tick";

/// Property of a tick event holding the new tick number
pub const TICK_PROPERTY: &str = "tick";

/// A named event with arbitrary properties
///
/// Once handed to [`EventChannel::publish`](crate::EventChannel::publish) an
/// event is shared behind an `Rc` and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name listeners subscribe to
    pub name: String,
    /// Event properties
    #[serde(default)]
    pub properties: ValueMap,
}

impl Event {
    /// Create an event without properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: ValueMap::new(),
        }
    }

    /// Create an event carrying the given properties
    pub fn with_properties(name: impl Into<String>, properties: ValueMap) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Create a clock tick event
    pub fn tick(tick: Tick) -> Self {
        Self::new(TICK_EVENT).with_property(TICK_PROPERTY, tick)
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get the event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The tick number, if this is a well-formed tick event
    pub fn tick_number(&self) -> Option<Tick> {
        if self.name != TICK_EVENT {
            return None;
        }
        self.property(TICK_PROPERTY)
            .and_then(Value::as_int)
            .and_then(|tick| Tick::try_from(tick).ok())
    }
}

/// Equality filter on a single event property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Property to inspect
    pub property: String,
    /// Value the property must equal
    pub value: Value,
}

impl PropertyFilter {
    /// Create a filter
    pub fn new(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Check whether an event satisfies the filter
    ///
    /// Values compare strictly: `Int(3)` does not match `String("3")`.
    pub fn matches(&self, event: &Event) -> bool {
        event.property(&self.property) == Some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_event() {
        let event = Event::tick(42);
        assert_eq!(event.name(), TICK_EVENT);
        assert_eq!(event.tick_number(), Some(42));
    }

    #[test]
    fn test_tick_number_requires_tick_name() {
        let event = Event::new("request-move-to").with_property(TICK_PROPERTY, 3i64);
        assert_eq!(event.tick_number(), None);

        let negative = Event::new(TICK_EVENT).with_property(TICK_PROPERTY, -1i64);
        assert_eq!(negative.tick_number(), None);
    }

    #[test]
    fn test_property_filter() {
        let event = Event::new("take-prize")
            .with_property("src", "prizeImages/Sushi.png")
            .with_property("coins", 100i64);

        assert!(PropertyFilter::new("src", "prizeImages/Sushi.png").matches(&event));
        assert!(!PropertyFilter::new("src", "prizeImages/Key.png").matches(&event));
        assert!(!PropertyFilter::new("coins", "100").matches(&event));
        assert!(!PropertyFilter::new("missing", Value::Null).matches(&event));
    }

    #[test]
    fn test_event_from_ron() {
        let event: Event = ron::from_str(r#"(name: "start-session")"#).unwrap();
        assert_eq!(event, Event::new("start-session"));
    }
}
