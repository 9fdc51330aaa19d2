//! Interpreter that runs behavior trees against a channel, clock and scope
//!
//! Each behavior is run in continuation-passing style: a step either calls
//! its continuation straight away or registers one listener plus one
//! canceller and returns. The listener, when it fires, removes itself,
//! discards its canceller with [`CancelGroup::advance`] and resumes the
//! continuation. Cancelling the scope instead runs the canceller, which
//! removes the listener, so the continuation can never fire afterwards.
//!
//! ```text
//! run(Race(a, b), scope)
//!   arena = scope.child()
//!   run(a, arena) ──► listener A + canceller A in arena
//!   run(b, arena) ──► listener B + canceller B in arena
//!   event for A   ──► A removes itself, arena.cancel_all() removes B,
//!                     continuation runs in scope
//! ```

use crate::{
    Behavior, BehaviorKind, CancelGroup, CancelId, Context, Error, Event, ListenerToken, Pair,
    Payload, PropertyFilter, Result, Tick, TICK_EVENT,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// What to do with a behavior's result
pub type Continuation<S> = Rc<dyn Fn(Pair<S>)>;

/// Validate `behavior` and start it in `scope`
///
/// `on_complete` runs if the whole tree completes; trees built around `fan`
/// or `repeat` never do. Fails before registering anything if the tree is
/// malformed or the scope is already cancelled.
pub fn start<S: 'static>(
    behavior: &Behavior<S>,
    pair: Pair<S>,
    scope: &CancelGroup,
    on_complete: impl Fn(Pair<S>) + 'static,
) -> Result<()> {
    behavior.validate()?;
    if scope.is_cancelled() {
        return Err(Error::GroupCancelled);
    }
    run(behavior, pair, scope, Rc::new(on_complete));
    Ok(())
}

/// Start `behavior` with an empty payload in the context's root group
pub fn spawn<S: 'static>(behavior: &Behavior<S>, context: &Rc<Context<S>>) -> Result<()> {
    let root = context.root().clone();
    start(behavior, Pair::empty(Rc::clone(context)), &root, |_| {
        trace!("behavior tree completed");
    })
}

/// Run one behavior; nothing runs in a cancelled scope
fn run<S: 'static>(
    behavior: &Behavior<S>,
    pair: Pair<S>,
    scope: &CancelGroup,
    cont: Continuation<S>,
) {
    if scope.is_cancelled() {
        trace!(?behavior, "scope cancelled, not running");
        return;
    }

    match behavior.kind() {
        BehaviorKind::Wait { name } => wait(name, None, pair, scope, cont),
        BehaviorKind::WaitFiltered { name, filter } => {
            wait(name, Some(filter.clone()), pair, scope, cont)
        }
        BehaviorKind::Delay { ticks } => delay(*ticks, pair, scope, cont),
        BehaviorKind::Constant(value) => cont(pair.with_payload(value.clone())),
        BehaviorKind::Transform(f) => {
            let payload = f(pair.payload, &*pair.context);
            cont(Pair {
                payload,
                context: pair.context,
            })
        }
        BehaviorKind::Sequence(steps) => {
            run_sequence(Rc::clone(steps), 0, pair, scope.clone(), cont)
        }
        BehaviorKind::Fan(members) => {
            for member in members.iter() {
                let finished: Continuation<S> =
                    Rc::new(|_: Pair<S>| trace!("fan member completed"));
                run(member, pair.clone(), scope, finished);
            }
        }
        BehaviorKind::Race(left, right) => race(left, right, pair, scope, cont),
        BehaviorKind::Repeat(body) => repeat(body.clone(), pair, scope.clone()),
        BehaviorKind::Aside(inner) => {
            let kept = pair.payload.clone();
            let resume: Continuation<S> = Rc::new(move |done: Pair<S>| {
                cont(Pair {
                    payload: kept.clone(),
                    context: done.context,
                })
            });
            run(inner, pair, scope, resume);
        }
    }
}

fn run_sequence<S: 'static>(
    steps: Rc<[Behavior<S>]>,
    index: usize,
    pair: Pair<S>,
    scope: CancelGroup,
    cont: Continuation<S>,
) {
    let Some(step) = steps.get(index).cloned() else {
        cont(pair);
        return;
    };
    if index + 1 == steps.len() {
        run(&step, pair, &scope, cont);
        return;
    }

    let next_scope = scope.clone();
    let next: Continuation<S> = Rc::new(move |pair: Pair<S>| {
        run_sequence(
            Rc::clone(&steps),
            index + 1,
            pair,
            next_scope.clone(),
            Rc::clone(&cont),
        )
    });
    run(&step, pair, &scope, next);
}

fn race<S: 'static>(
    left: &Behavior<S>,
    right: &Behavior<S>,
    pair: Pair<S>,
    scope: &CancelGroup,
    cont: Continuation<S>,
) {
    let arena = scope.child();
    let settled = Rc::new(Cell::new(false));

    let finish: Continuation<S> = {
        let arena = arena.clone();
        Rc::new(move |pair: Pair<S>| {
            if settled.replace(true) {
                return;
            }
            // the loser's listener goes before anything else runs
            arena.cancel_all();
            cont(pair);
        })
    };

    run(left, pair.clone(), &arena, Rc::clone(&finish));
    run(right, pair, &arena, finish);
}

fn repeat<S: 'static>(body: Behavior<S>, pair: Pair<S>, scope: CancelGroup) {
    let again_body = body.clone();
    let again_scope = scope.clone();
    let again: Continuation<S> = Rc::new(move |pair: Pair<S>| {
        repeat(again_body.clone(), pair, again_scope.clone());
    });
    run(&body, pair, &scope, again);
}

/// Registration bookkeeping shared by a listener and its canceller
struct Suspension {
    token: Cell<Option<ListenerToken>>,
    cancel_id: Cell<Option<CancelId>>,
}

impl Suspension {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            token: Cell::new(None),
            cancel_id: Cell::new(None),
        })
    }

    /// Tear down the registration after the listener fired
    ///
    /// Returns `false` if it was already torn down.
    fn resume<S>(&self, context: &Context<S>, scope: &CancelGroup) -> bool {
        let Some(token) = self.token.take() else {
            return false;
        };
        context.channel().unsubscribe(token);
        if let Some(id) = self.cancel_id.take() {
            scope.advance(id);
        }
        true
    }

    /// Record the listener and register its canceller in `scope`
    fn arm<S>(this: &Rc<Self>, token: ListenerToken, context: &Context<S>, scope: &CancelGroup) {
        this.token.set(Some(token));
        let channel = context.channel().clone();
        let suspension = Rc::clone(this);
        let id = scope.add(move || {
            if let Some(token) = suspension.token.take() {
                channel.unsubscribe(token);
            }
        });
        // add() on a cancelled scope already ran the canceller
        if this.token.get().is_some() {
            this.cancel_id.set(Some(id));
        }
    }
}

fn wait<S: 'static>(
    name: &str,
    filter: Option<PropertyFilter>,
    pair: Pair<S>,
    scope: &CancelGroup,
    cont: Continuation<S>,
) {
    let suspension = Suspension::new();
    let context = pair.context;

    let listener = {
        let suspension = Rc::clone(&suspension);
        let context = Rc::clone(&context);
        let scope = scope.clone();
        move |event: &Rc<Event>| {
            if !suspension.resume(&context, &scope) {
                return;
            }
            cont(Pair {
                payload: Payload::Event(Rc::clone(event)),
                context: Rc::clone(&context),
            });
        }
    };

    let channel = context.channel();
    let token = match filter {
        Some(filter) => channel.subscribe_filtered(name, filter, listener),
        None => channel.subscribe(name, listener),
    };
    Suspension::arm(&suspension, token, &context, scope);
}

fn delay<S: 'static>(ticks: Tick, pair: Pair<S>, scope: &CancelGroup, cont: Continuation<S>) {
    let suspension = Suspension::new();
    let context = pair.context;
    let begin = context.clock().game_tick();
    let deadline = begin.saturating_add(ticks);
    trace!(begin, ticks, "delay armed");

    let listener = {
        let suspension = Rc::clone(&suspension);
        let context = Rc::clone(&context);
        let scope = scope.clone();
        move |event: &Rc<Event>| {
            let Some(tick) = event.tick_number() else {
                return;
            };
            if tick <= deadline || !suspension.resume(&context, &scope) {
                return;
            }
            cont(Pair {
                payload: Payload::Event(Rc::clone(event)),
                context: Rc::clone(&context),
            });
        }
    };

    let token = context.channel().subscribe(TICK_EVENT, listener);
    Suspension::arm(&suspension, token, &context, scope);
}
