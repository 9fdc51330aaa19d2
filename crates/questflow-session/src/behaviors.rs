//! The quest's behavior tree
//!
//! ```text
//! wait(start-session) ─► start game ─► fan ─┬─ countdown        (repeat)
//!                                           ├─ timeout          (once)
//!                                           ├─ movement         (repeat)
//!                                           ├─ prize pickups    (repeat per sprite)
//!                                           ├─ tile cycle       (repeat)
//!                                           └─ key and chest    (repeat)
//! ```
//!
//! Every handler reads and writes the shared [`Quest`] through the context
//! and reports to the client through its outbox.

use crate::config::SessionConfig;
use crate::content::{overwrites_from_value, overwrites_to_value, GameContent, Prize, Sprites, TileOverwrite};
use crate::notify::Notification;
use crate::quest::{Quest, QuestContext};
use questflow_core::{Behavior, Event, Payload, Tick, Value, TICK_EVENT, TICK_PROPERTY};
use tracing::{debug, info, warn};

/// Inbound signal that starts the game
pub const START_SESSION: &str = "start-session";
/// Inbound signal asking to move the player
pub const REQUEST_MOVE_TO: &str = "request-move-to";
/// Published when the player lands on a prize
pub const TAKE_PRIZE: &str = "take-prize";

const START_SOUND: &str = "win.m4a";
const GAME_OVER_SOUND: &str = "win.m4a";
const PRIZE_SOUND: &str = "boo";
const CHEST_SOUND: &str = "dahdahdah2.m4a";

type QuestBehavior = Behavior<Quest>;

/// The whole session: wait for the start signal, then run every game behavior
pub fn session_tree(content: &GameContent, config: &SessionConfig) -> QuestBehavior {
    Behavior::wait(START_SESSION)
        .then(Behavior::tap(start_game))
        .then(Behavior::all([
            countdown(),
            timeout(config.ticks_in_game),
            movement(),
            prize_pickups(&content.sprites.collectibles),
            tile_cycle(
                &content.tile_cycle,
                config.tile_apply_ticks,
                config.tile_restore_ticks,
            ),
            key_and_chest(&content.sprites, config.chest_window_ticks),
        ]))
}

fn start_game(_: &Payload, ctx: &QuestContext) {
    let clock = ctx.clock();
    clock.reset();
    if let Err(err) = clock.start() {
        warn!(error = %err, "game clock did not start");
    }
    info!("game started");
    let quest = ctx.state();
    quest.message("The game has started!");
    quest.sound(START_SOUND, 0.5);
}

// === Countdown and timeout ===

/// Report the ticks remaining on every tick
pub fn countdown() -> QuestBehavior {
    Behavior::wait(TICK_EVENT)
        .then(Behavior::tap(report_countdown))
        .repeat()
}

fn report_countdown(payload: &Payload, ctx: &QuestContext) {
    let Some(tick) = payload.as_event().and_then(Event::tick_number) else {
        return;
    };
    let quest = ctx.state();
    let remaining = quest.config().ticks_in_game as i64 - tick as i64;
    quest.notify(Notification::CountdownUpdated { ticks: remaining });
}

/// End the game on tick `ticks_in_game`
pub fn timeout(ticks_in_game: Tick) -> QuestBehavior {
    Behavior::wait_for(TICK_EVENT, TICK_PROPERTY, ticks_in_game).then(Behavior::tap(game_over))
}

fn game_over(_: &Payload, ctx: &QuestContext) {
    info!(tick = ctx.clock().game_tick(), "time has run out");
    let quest = ctx.state();
    quest.notify(Notification::CountdownUpdated { ticks: 0 });
    quest.message("Time has run out!");
    quest.sound(GAME_OVER_SOUND, 0.5);
    ctx.root().cancel_all();
    ctx.clock().stop();
}

// === Movement and prizes ===

/// Move the player on every request, taking any prize at the destination
pub fn movement() -> QuestBehavior {
    Behavior::wait(REQUEST_MOVE_TO)
        .then(Behavior::tap(move_player))
        .repeat()
}

fn move_player(payload: &Payload, ctx: &QuestContext) {
    let rank = payload.property("rank").and_then(Value::coerce_int);
    let file = payload.property("file").and_then(Value::coerce_int);
    let (Some(rank), Some(file)) = (rank, file) else {
        warn!(
            rank = ?payload.property("rank"),
            file = ?payload.property("file"),
            "dropping move request without numeric coordinates"
        );
        return;
    };

    let quest = ctx.state();
    let prize = quest.game().prize_at(rank, file).cloned();
    if let Some(prize) = prize {
        debug!(rank, file, src = %prize.src, "landed on a prize");
        ctx.channel()
            .publish(Event::with_properties(TAKE_PRIZE, prize.properties()));
    }

    let moved = quest.game_mut().move_player(rank, file);
    if let Some(piece) = moved {
        quest.notify(Notification::PieceMoved(piece));
    }
}

/// Credit points whenever a prize with this sprite is taken
pub fn prize_pickup(sprite: &str) -> QuestBehavior {
    Behavior::wait_for(TAKE_PRIZE, "src", sprite)
        .then(Behavior::tap(take_prize))
        .repeat()
}

/// One pickup behavior per collectible sprite
pub fn prize_pickups(sprites: &[String]) -> QuestBehavior {
    Behavior::all(sprites.iter().map(|sprite| prize_pickup(sprite)))
}

fn take_prize(payload: &Payload, ctx: &QuestContext) {
    let Some(prize) = payload.as_event().and_then(Prize::from_event) else {
        warn!(?payload, "take-prize without a prize");
        return;
    };
    let quest = ctx.state();
    quest.game_mut().remove_prize_at(prize.rank, prize.file);
    let points = quest.game_mut().credit(prize.coins.unwrap_or(0));
    debug!(src = %prize.src, points, "prize taken");
    quest.notify(Notification::PointsUpdated(points));
    quest.sound(PRIZE_SOUND, 0.3);
    quest.notify(Notification::PrizeRemoved(prize));
}

// === Tiles ===

/// Apply `overwrites`, hold, restore, hold, forever
///
/// The payload between steps is the change set to apply next: applying one
/// yields its inverse, which the next application undoes.
pub fn tile_cycle(overwrites: &[TileOverwrite], apply_hold: Tick, restore_hold: Tick) -> QuestBehavior {
    Behavior::constant(overwrites_to_value(overwrites)).then(
        Behavior::transform(apply_tiles)
            .then(Behavior::delay_ticks(apply_hold).aside())
            .then(Behavior::transform(apply_tiles))
            .then(Behavior::delay_ticks(restore_hold).aside())
            .repeat(),
    )
}

fn apply_tiles(payload: Payload, ctx: &QuestContext) -> Payload {
    let overwrites = match payload.as_value().map(overwrites_from_value) {
        Some(Ok(overwrites)) => overwrites,
        Some(Err(err)) => {
            warn!(error = %err, "malformed tile change set");
            return payload;
        }
        None => {
            warn!(?payload, "tile cycle expected a change set");
            return payload;
        }
    };

    let quest = ctx.state();
    let restore = quest.game_mut().apply_overwrites(&overwrites);
    let tiles = quest.game().tiles.clone();
    debug!(changed = overwrites.len(), "tiles changed");
    quest.notify(Notification::TilesSet(tiles));
    Payload::Value(overwrites_to_value(&restore))
}

// === Key and chest ===

/// Taking the key opens a short window in which the chest can be taken
///
/// ```text
/// Idle ──take key──► Open ──window ends──► Idle
///                      └───take chest────► Idle (fanfare)
/// ```
pub fn key_and_chest(sprites: &Sprites, window: Tick) -> QuestBehavior {
    let take_key = Behavior::wait_for(TAKE_PRIZE, "src", sprites.key.as_str())
        .then(Behavior::tap(|payload: &Payload, ctx: &QuestContext| {
            remove_taken_prize(payload, ctx);
            ctx.state().game_mut().can_take_chest = true;
            debug!("chest unlocked");
        }));

    let window_closes = Behavior::delay_ticks(window).then(Behavior::tap(
        |_: &Payload, ctx: &QuestContext| {
            ctx.state().game_mut().can_take_chest = false;
            debug!("chest window closed");
        },
    ));

    let take_chest = Behavior::wait_for(TAKE_PRIZE, "src", sprites.chest.as_str())
        .then(Behavior::tap(|payload: &Payload, ctx: &QuestContext| {
            remove_taken_prize(payload, ctx);
            took_chest(ctx);
        }));

    take_key.then(window_closes.either(take_chest)).repeat()
}

fn remove_taken_prize(payload: &Payload, ctx: &QuestContext) {
    let Some(prize) = payload.as_event().and_then(Prize::from_event) else {
        return;
    };
    let quest = ctx.state();
    quest.game_mut().remove_prize_at(prize.rank, prize.file);
    quest.notify(Notification::PrizeRemoved(prize));
}

fn took_chest(ctx: &QuestContext) {
    let quest = ctx.state();
    let could_take = std::mem::replace(&mut quest.game_mut().can_take_chest, false);
    if could_take {
        info!("chest opened");
        quest.sound(CHEST_SOUND, 0.5);
    }
}
