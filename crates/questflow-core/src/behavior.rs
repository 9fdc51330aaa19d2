//! Behavior descriptions and their combinators
//!
//! A [`Behavior`] is an inert, reusable description of what to wait for and
//! what to do next. Nothing happens until it is handed to
//! [`runtime::start`](crate::runtime::start). The same value may be started
//! any number of times; `repeat` relies on that.
//!
//! | Kind | Suspends | Continues with |
//! |------|----------|----------------|
//! | `Wait` | until a named event | the event |
//! | `WaitFiltered` | until a named event with one matching property | the event |
//! | `Delay` | until the first tick past `start + n` | the tick event |
//! | `Constant` | no | the constant |
//! | `Transform` | no | the function's result |
//! | `Sequence` | if any step does | the last step's result |
//! | `Fan` | forever | never |
//! | `Race` | until the first branch completes | the winner's result |
//! | `Repeat` | forever | never |
//! | `Aside` | if the inner behavior does | its own input |

use crate::{Context, Error, Payload, PropertyFilter, Result, Tick, Value};
use std::fmt;
use std::rc::Rc;

/// Function run by a `Transform` step
pub type TransformFn<S> = dyn Fn(Payload, &Context<S>) -> Payload;

/// The closed set of behavior shapes
pub enum BehaviorKind<S> {
    /// Wait for the next event with this name
    Wait { name: String },
    /// Wait for the next event with this name whose property matches
    WaitFiltered { name: String, filter: PropertyFilter },
    /// Wait until `ticks` whole ticks have passed
    Delay { ticks: Tick },
    /// Continue immediately with a fixed value
    Constant(Value),
    /// Continue immediately with a computed payload
    Transform(Rc<TransformFn<S>>),
    /// Run steps one after another
    Sequence(Rc<[Behavior<S>]>),
    /// Start every member against the same input; never continues
    Fan(Rc<[Behavior<S>]>),
    /// Run both branches; the first to complete wins and the other is revoked
    Race(Behavior<S>, Behavior<S>),
    /// Restart the body with its own output, forever
    Repeat(Behavior<S>),
    /// Run the inner behavior, then continue with the original input
    Aside(Behavior<S>),
}

/// A reusable behavior description
pub struct Behavior<S> {
    kind: Rc<BehaviorKind<S>>,
}

impl<S> Clone for Behavior<S> {
    fn clone(&self) -> Self {
        Self {
            kind: Rc::clone(&self.kind),
        }
    }
}

impl<S> Behavior<S> {
    fn from_kind(kind: BehaviorKind<S>) -> Self {
        Self {
            kind: Rc::new(kind),
        }
    }

    /// Get the shape of this behavior
    pub fn kind(&self) -> &BehaviorKind<S> {
        &self.kind
    }

    // === Primitives ===

    /// Wait for the next event named `name`
    pub fn wait(name: impl Into<String>) -> Self {
        Self::from_kind(BehaviorKind::Wait { name: name.into() })
    }

    /// Wait for the next event named `name` whose `property` equals `value`
    pub fn wait_for(
        name: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::from_kind(BehaviorKind::WaitFiltered {
            name: name.into(),
            filter: PropertyFilter::new(property, value),
        })
    }

    /// Wait `ticks` whole ticks plus the remainder of the current one
    pub fn delay_ticks(ticks: Tick) -> Self {
        Self::from_kind(BehaviorKind::Delay { ticks })
    }

    /// Continue with a fixed value
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::from_kind(BehaviorKind::Constant(value.into()))
    }

    /// Continue with `f(payload, context)`
    pub fn transform(f: impl Fn(Payload, &Context<S>) -> Payload + 'static) -> Self {
        Self::from_kind(BehaviorKind::Transform(Rc::new(f)))
    }

    /// Run a side effect and pass the payload through unchanged
    pub fn tap(f: impl Fn(&Payload, &Context<S>) + 'static) -> Self {
        Self::transform(move |payload, context| {
            f(&payload, context);
            payload
        })
    }

    // === Combinators ===

    /// Run `self`, then `next` with its result
    pub fn then(self, next: Behavior<S>) -> Self {
        let mut steps = self.into_steps();
        steps.extend(next.into_steps());
        Self::from_kind(BehaviorKind::Sequence(steps.into()))
    }

    /// Run `self` and `other` side by side
    pub fn fan(self, other: Behavior<S>) -> Self {
        let mut members = self.into_members();
        members.extend(other.into_members());
        Self::from_kind(BehaviorKind::Fan(members.into()))
    }

    /// Run every behavior side by side
    ///
    /// An empty fan-out is valid and does nothing.
    pub fn all(members: impl IntoIterator<Item = Behavior<S>>) -> Self {
        let members: Vec<Behavior<S>> = members
            .into_iter()
            .flat_map(Behavior::into_members)
            .collect();
        Self::from_kind(BehaviorKind::Fan(members.into()))
    }

    /// Run `self` and `other`; whichever completes first wins
    pub fn either(self, other: Behavior<S>) -> Self {
        Self::from_kind(BehaviorKind::Race(self, other))
    }

    /// Restart `self` with its own output every time it completes
    pub fn repeat(self) -> Self {
        Self::from_kind(BehaviorKind::Repeat(self))
    }

    /// Run `self`, then continue with the payload it was given
    pub fn aside(self) -> Self {
        Self::from_kind(BehaviorKind::Aside(self))
    }

    fn into_steps(self) -> Vec<Behavior<S>> {
        match self.kind() {
            BehaviorKind::Sequence(steps) => steps.to_vec(),
            _ => vec![self],
        }
    }

    fn into_members(self) -> Vec<Behavior<S>> {
        match self.kind() {
            BehaviorKind::Fan(members) => members.to_vec(),
            _ => vec![self],
        }
    }

    // === Validation ===

    /// Check whether every run of this behavior suspends before continuing
    ///
    /// A behavior that never continues (`Fan`, `Repeat`) counts as suspending.
    pub fn suspends(&self) -> bool {
        match self.kind() {
            BehaviorKind::Wait { .. }
            | BehaviorKind::WaitFiltered { .. }
            | BehaviorKind::Delay { .. }
            | BehaviorKind::Fan(_)
            | BehaviorKind::Repeat(_) => true,
            BehaviorKind::Constant(_) | BehaviorKind::Transform(_) => false,
            BehaviorKind::Sequence(steps) => steps.iter().any(Behavior::suspends),
            BehaviorKind::Race(left, right) => left.suspends() && right.suspends(),
            BehaviorKind::Aside(inner) => inner.suspends(),
        }
    }

    /// Reject trees that would loop without ever yielding
    ///
    /// A `Repeat` whose body can complete synchronously would restart itself
    /// without bound on the first activation.
    pub fn validate(&self) -> Result<()> {
        match self.kind() {
            BehaviorKind::Sequence(steps) => steps.iter().try_for_each(Behavior::validate),
            BehaviorKind::Fan(members) => members.iter().try_for_each(Behavior::validate),
            BehaviorKind::Race(left, right) => {
                left.validate()?;
                right.validate()
            }
            BehaviorKind::Aside(inner) => inner.validate(),
            BehaviorKind::Repeat(body) => {
                if !body.suspends() {
                    return Err(Error::RepeatWithoutSuspension(format!("{:?}", body)));
                }
                body.validate()
            }
            _ => Ok(()),
        }
    }
}

impl<S> fmt::Debug for Behavior<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            BehaviorKind::Wait { name } => write!(f, "Wait({})", name),
            BehaviorKind::WaitFiltered { name, filter } => {
                write!(f, "WaitFiltered({}, {} = {})", name, filter.property, filter.value)
            }
            BehaviorKind::Delay { ticks } => write!(f, "Delay({})", ticks),
            BehaviorKind::Constant(value) => write!(f, "Constant({})", value),
            BehaviorKind::Transform(_) => write!(f, "Transform"),
            BehaviorKind::Sequence(steps) => f.debug_tuple("Sequence").field(&steps).finish(),
            BehaviorKind::Fan(members) => f.debug_tuple("Fan").field(&members).finish(),
            BehaviorKind::Race(left, right) => {
                f.debug_tuple("Race").field(left).field(right).finish()
            }
            BehaviorKind::Repeat(body) => f.debug_tuple("Repeat").field(body).finish(),
            BehaviorKind::Aside(inner) => f.debug_tuple("Aside").field(inner).finish(),
        }
    }
}
