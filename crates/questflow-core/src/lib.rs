//! Questflow Core - Cancellable behavior composition on a tick clock
//!
//! This crate provides the runtime that drives one real-time session:
//! - Dynamic value types (`Value`, `ValueMap`) for event payloads
//! - A synchronous publish/subscribe `EventChannel`
//! - A tick-based `GameClock` that publishes `tick` events
//! - Revocable `CancelGroup`s with parent/child scoping
//! - `Behavior` trees built from waits, delays and transforms, composed with
//!   sequence, fan-out, race and repeat
//!
//! ## Execution Model
//!
//! Everything runs on one logical thread. A behavior suspends only while it
//! waits for an event; while suspended it owns exactly one listener on the
//! channel and one canceller in its scope. Publishing an event runs every
//! matching listener before `publish` returns, so state kept in the shared
//! [`Context`] never needs a lock.
//!
//! ```
//! use questflow_core::{runtime, Behavior, CancelGroup, Context, EventChannel, GameClock};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let channel = EventChannel::new();
//! let clock = GameClock::new(channel.clone());
//! let context = Rc::new(Context::new(channel, clock, CancelGroup::new(), Cell::new(0)));
//!
//! // Count every tick, forever
//! let counter = Behavior::wait("tick")
//!     .then(Behavior::tap(|_, ctx: &Context<Cell<i32>>| ctx.state().set(ctx.state().get() + 1)))
//!     .repeat();
//! runtime::spawn(&counter, &context).unwrap();
//!
//! context.clock().start().unwrap();
//! context.clock().advance();
//! context.clock().advance();
//! assert_eq!(context.state().get(), 2);
//! ```

mod behavior;
mod cancel;
mod channel;
pub mod clock;
mod context;
mod error;
mod event;
mod identity;
pub mod runtime;
mod value;

pub use behavior::{Behavior, BehaviorKind, TransformFn};
pub use cancel::{CancelGroup, Canceller};
pub use channel::{EventChannel, Listener};
pub use clock::{ClockState, GameClock, Tick};
pub use context::{Context, Pair, Payload};
pub use error::{Error, Result};
pub use event::{Event, PropertyFilter, TICK_EVENT, TICK_PROPERTY};
pub use identity::{CancelId, ListenerToken};
pub use runtime::Continuation;
pub use value::{Value, ValueMap};
