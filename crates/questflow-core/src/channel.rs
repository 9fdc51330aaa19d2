//! Synchronous per-session publish/subscribe channel
//!
//! # Guarantees
//!
//! - **Synchronous dispatch**: `publish` runs every matching listener before it returns
//! - **Registration order**: earlier listeners run before later ones
//! - **No buffering**: a listener registered after an event is published never sees it
//! - **Removal wins**: a listener unsubscribed during dispatch (for example by a
//!   cancellation triggered from an earlier listener) is skipped for the rest of
//!   that dispatch, even though it matched when the event was published
//!
//! Listeners may subscribe, unsubscribe and publish re-entrantly from inside
//! their own callback.

use crate::{Event, ListenerToken, PropertyFilter};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Callback invoked with each matching event
pub type Listener = Rc<dyn Fn(&Rc<Event>)>;

struct Registration {
    name: String,
    filter: Option<PropertyFilter>,
    listener: Listener,
}

impl Registration {
    fn matches(&self, event: &Event) -> bool {
        self.name == event.name && self.filter.as_ref().map_or(true, |f| f.matches(event))
    }
}

#[derive(Default)]
struct Registry {
    next_token: u64,
    listeners: IndexMap<ListenerToken, Registration>,
}

/// Handle to a session's event channel
///
/// Cloning the handle shares the same channel.
#[derive(Clone, Default)]
pub struct EventChannel {
    registry: Rc<RefCell<Registry>>,
}

impl EventChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for every event named `name`
    pub fn subscribe(
        &self,
        name: impl Into<String>,
        listener: impl Fn(&Rc<Event>) + 'static,
    ) -> ListenerToken {
        self.register(name.into(), None, Rc::new(listener))
    }

    /// Listen for events named `name` whose properties satisfy `filter`
    pub fn subscribe_filtered(
        &self,
        name: impl Into<String>,
        filter: PropertyFilter,
        listener: impl Fn(&Rc<Event>) + 'static,
    ) -> ListenerToken {
        self.register(name.into(), Some(filter), Rc::new(listener))
    }

    fn register(
        &self,
        name: String,
        filter: Option<PropertyFilter>,
        listener: Listener,
    ) -> ListenerToken {
        let mut registry = self.registry.borrow_mut();
        registry.next_token += 1;
        let token = ListenerToken::new(registry.next_token);
        trace!(%token, event = %name, filtered = filter.is_some(), "listener subscribed");
        registry.listeners.insert(
            token,
            Registration {
                name,
                filter,
                listener,
            },
        );
        token
    }

    /// Remove a listener
    ///
    /// Returns `false` if the token was already removed; removing twice is a no-op.
    pub fn unsubscribe(&self, token: ListenerToken) -> bool {
        let removed = self.registry.borrow_mut().listeners.shift_remove(&token);
        match removed {
            Some(_) => {
                trace!(%token, "listener unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Check whether a listener is still registered
    pub fn is_subscribed(&self, token: ListenerToken) -> bool {
        self.registry.borrow().listeners.contains_key(&token)
    }

    /// Deliver an event to every matching listener, in registration order
    ///
    /// Returns the number of listeners that ran.
    pub fn publish(&self, event: Event) -> usize {
        let event = Rc::new(event);
        let matching: Vec<ListenerToken> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|(_, registration)| registration.matches(&event))
            .map(|(token, _)| *token)
            .collect();
        trace!(event = %event.name, listeners = matching.len(), "publishing event");

        let mut delivered = 0;
        for token in matching {
            let listener = match self.registry.borrow().listeners.get(&token) {
                Some(registration) => Rc::clone(&registration.listener),
                None => continue,
            };
            listener(&event);
            delivered += 1;
        }
        delivered
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    /// Number of registered listeners for one event name
    pub fn listener_count_for(&self, name: &str) -> usize {
        self.registry
            .borrow()
            .listeners
            .values()
            .filter(|registration| registration.name == name)
            .count()
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_publish_in_registration_order() {
        let channel = EventChannel::new();
        let log = recorder();

        for label in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            channel.subscribe("ping", move |_| log.borrow_mut().push(label.to_string()));
        }

        assert_eq!(channel.publish(Event::new("ping")), 3);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_name_and_filter_matching() {
        let channel = EventChannel::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        channel.subscribe_filtered(
            "take-prize",
            PropertyFilter::new("src", "prizeImages/Sushi.png"),
            move |_| h.set(h.get() + 1),
        );

        channel.publish(Event::new("take-prize").with_property("src", "prizeImages/bonsai.png"));
        channel.publish(Event::new("other").with_property("src", "prizeImages/Sushi.png"));
        assert_eq!(hits.get(), 0);

        channel.publish(Event::new("take-prize").with_property("src", "prizeImages/Sushi.png"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_twice_is_noop() {
        let channel = EventChannel::new();
        let hits = Rc::new(Cell::new(0));

        let first = channel.subscribe("ping", |_| {});
        let h = Rc::clone(&hits);
        let second = channel.subscribe("ping", move |_| h.set(h.get() + 1));

        assert!(channel.unsubscribe(first));
        assert!(!channel.unsubscribe(first));
        assert!(channel.is_subscribed(second));
        assert_eq!(channel.listener_count(), 1);

        channel.publish(Event::new("ping"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_no_buffering() {
        let channel = EventChannel::new();
        channel.publish(Event::new("ping"));

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        channel.subscribe("ping", move |_| h.set(h.get() + 1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_removed_during_dispatch_is_skipped() {
        let channel = EventChannel::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<ListenerToken>>> = Rc::new(Cell::new(None));

        let ch = channel.clone();
        let v = Rc::clone(&victim);
        channel.subscribe("ping", move |_| {
            if let Some(token) = v.get() {
                ch.unsubscribe(token);
            }
        });
        let h = Rc::clone(&hits);
        victim.set(Some(channel.subscribe("ping", move |_| h.set(h.get() + 1))));

        assert_eq!(channel.publish(Event::new("ping")), 1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_subscribe_during_dispatch_misses_current_event() {
        let channel = EventChannel::new();
        let late_hits = Rc::new(Cell::new(0));

        let ch = channel.clone();
        let late = Rc::clone(&late_hits);
        channel.subscribe("ping", move |_| {
            let late = Rc::clone(&late);
            ch.subscribe("ping", move |_| late.set(late.get() + 1));
        });

        channel.publish(Event::new("ping"));
        assert_eq!(late_hits.get(), 0);

        channel.publish(Event::new("ping"));
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_reentrant_publish() {
        let channel = EventChannel::new();
        let log = recorder();

        let ch = channel.clone();
        let l = Rc::clone(&log);
        channel.subscribe("outer", move |_| {
            l.borrow_mut().push("outer:before".into());
            ch.publish(Event::new("inner"));
            l.borrow_mut().push("outer:after".into());
        });
        let l = Rc::clone(&log);
        channel.subscribe("inner", move |_| l.borrow_mut().push("inner".into()));

        channel.publish(Event::new("outer"));
        assert_eq!(*log.borrow(), vec!["outer:before", "inner", "outer:after"]);
    }

    #[test]
    fn test_listener_count_for() {
        let channel = EventChannel::new();
        channel.subscribe("tick", |_| {});
        channel.subscribe("tick", |_| {});
        channel.subscribe("take-prize", |_| {});
        assert_eq!(channel.listener_count_for("tick"), 2);
        assert_eq!(channel.listener_count_for("request-move-to"), 0);
    }
}
