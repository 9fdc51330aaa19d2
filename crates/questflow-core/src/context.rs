//! The `(payload, context)` pair threaded through every behavior

use crate::{CancelGroup, Event, EventChannel, GameClock, Value};
use std::fmt;
use std::rc::Rc;

/// Behavior-specific data flowing from one step to the next
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// Nothing yet
    #[default]
    Empty,
    /// The event that resumed a waiting behavior
    Event(Rc<Event>),
    /// A value produced by `constant` or `transform`
    Value(Value),
}

impl Payload {
    /// Get the event, if this payload carries one
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Payload::Event(event) => Some(event),
            _ => None,
        }
    }

    /// Get the value, if this payload carries one
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a property on the event, or a key on a map value
    pub fn property(&self, key: &str) -> Option<&Value> {
        match self {
            Payload::Event(event) => event.property(key),
            Payload::Value(value) => value.get(key),
            Payload::Empty => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<Event> for Payload {
    fn from(event: Event) -> Self {
        Payload::Event(Rc::new(event))
    }
}

/// Everything the behaviors of one session share
///
/// The channel, clock and root group are handles; `state` is whatever the
/// session keeps alongside them (game state, outbound sink, configuration).
/// Mutating `state` is safe without locks because dispatch is synchronous.
pub struct Context<S> {
    channel: EventChannel,
    clock: GameClock,
    root: CancelGroup,
    state: S,
}

impl<S> Context<S> {
    /// Bundle a session's channel, clock, root group and state
    pub fn new(channel: EventChannel, clock: GameClock, root: CancelGroup, state: S) -> Self {
        Self {
            channel,
            clock,
            root,
            state,
        }
    }

    /// The session's event channel
    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// The session's game clock
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The session's root cancellation group
    pub fn root(&self) -> &CancelGroup {
        &self.root
    }

    /// Session-defined state
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: fmt::Debug> fmt::Debug for Context<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("channel", &self.channel)
            .field("clock", &self.clock)
            .field("root", &self.root)
            .field("state", &self.state)
            .finish()
    }
}

/// A payload travelling with its shared context
pub struct Pair<S> {
    pub payload: Payload,
    pub context: Rc<Context<S>>,
}

impl<S> Pair<S> {
    /// Create a pair
    pub fn new(payload: impl Into<Payload>, context: Rc<Context<S>>) -> Self {
        Self {
            payload: payload.into(),
            context,
        }
    }

    /// Create a pair with an empty payload
    pub fn empty(context: Rc<Context<S>>) -> Self {
        Self {
            payload: Payload::Empty,
            context,
        }
    }

    /// Replace the payload, keeping the context
    pub fn with_payload(self, payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            context: self.context,
        }
    }
}

impl<S> Clone for Pair<S> {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone(),
            context: Rc::clone(&self.context),
        }
    }
}

impl<S> fmt::Debug for Pair<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pair").field("payload", &self.payload).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_property() {
        let event = Payload::from(Event::new("request-move-to").with_property("rank", 2i64));
        assert_eq!(event.property("rank"), Some(&Value::Int(2)));
        assert!(event.as_event().is_some());

        let mut map = crate::ValueMap::new();
        map.insert("file".into(), Value::Int(3));
        let value = Payload::from(Value::Map(map));
        assert_eq!(value.property("file"), Some(&Value::Int(3)));

        assert_eq!(Payload::Empty.property("rank"), None);
    }

    #[test]
    fn test_pair_with_payload_keeps_context() {
        let channel = EventChannel::new();
        let clock = GameClock::new(channel.clone());
        let context = Rc::new(Context::new(channel, clock, CancelGroup::new(), ()));

        let pair = Pair::empty(Rc::clone(&context)).with_payload(Value::Int(4));
        assert_eq!(pair.payload, Payload::Value(Value::Int(4)));
        assert!(Rc::ptr_eq(&pair.context, &context));
    }
}
