use std::ops::RangeInclusive;

use anyhow::{bail, Context, Result};
use kyra_timer::{callback, TimerControl, TimerId, TimerTable, ONE_SHOT};

use crate::game::KyraGame;

pub type KyraTimers = TimerTable<KyraGame>;

pub const TIMER_COUNT: usize = 34;

pub const TIMER_WALK: TimerId = 5;
pub const TIMER_CHECK_ANIM_FLAG2: TimerId = 14;
pub const TIMER_HEAD_ANIMS: TimerId = 15;
pub const TIMER_SET_FLAGS1: TimerId = 16;
pub const TIMER_CHECK_ANIM_FLAG1: TimerId = 18;
pub const TIMER_REDRAW_AMULET: TimerId = 19;
pub const TIMER_FADE_TEXT: TimerId = 31;
pub const TIMER_ANIM_FLAG1: TimerId = 32;
pub const TIMER_ANIM_FLAG2: TimerId = 33;

/// Walk timer delay for each speed setting, slowest first.
const WALK_SPEEDS: [i32; 5] = [11, 9, 6, 5, 3];

/// Seconds used when dialogue asks for a text fade that "never" happens.
const TEXT_FADE_NEVER: i32 = 32000;

const TICKS_PER_SECOND: i32 = 60;

type Handler = fn(&mut KyraGame, &mut TimerControl<'_, KyraGame>, TimerId) -> Result<()>;

/// Bookkeeping slots with no game callback: (ids, delay).
const PLAIN_SLOTS: &[(RangeInclusive<TimerId>, i32)] = &[
    (0..=4, ONE_SHOT),
    (TIMER_WALK..=TIMER_WALK, 5),
    (6..=6, 7),
    (7..=7, 8),
    (8..=8, 9),
    (9..=9, 7),
    (10..=13, 420),
    (17..=17, 7200),
    (20..=20, 7200),
    (21..=21, 18000),
    (22..=22, 7200),
    (23..=27, 10800),
    (28..=28, 21600),
    (29..=29, 7200),
    (30..=30, 10800),
];

/// Slots driving game logic: (id, callback, delay).
const CALLBACK_SLOTS: &[(TimerId, Handler, i32)] = &[
    (TIMER_CHECK_ANIM_FLAG2, KyraGame::timer_check_anim_flag2, 600),
    (TIMER_HEAD_ANIMS, KyraGame::timer_update_head_anims, 11),
    (TIMER_SET_FLAGS1, KyraGame::timer_set_flags1, 7200),
    (TIMER_CHECK_ANIM_FLAG1, KyraGame::timer_check_anim_flag1, 600),
    (TIMER_REDRAW_AMULET, KyraGame::timer_redraw_amulet, 600),
    (TIMER_FADE_TEXT, KyraGame::timer_fade_text, ONE_SHOT),
    (TIMER_ANIM_FLAG1, KyraGame::update_anim_flag1, 9),
    (TIMER_ANIM_FLAG2, KyraGame::update_anim_flag2, 3),
];

/// Builds the Kyrandia 1 timer table with every slot registered and
/// enabled.
pub fn setup_timers() -> Result<KyraTimers> {
    let mut timers = KyraTimers::new(TIMER_COUNT);
    for (ids, delay) in PLAIN_SLOTS {
        for id in ids.clone() {
            timers
                .add_timer(id, None, *delay, true)
                .with_context(|| format!("registering timer {id}"))?;
        }
    }
    for &(id, handler, delay) in CALLBACK_SLOTS {
        timers
            .add_timer(id, Some(callback(handler)), delay, true)
            .with_context(|| format!("registering timer {id}"))?;
    }
    log::debug!("registered {} Kyrandia timers", timers.capacity());
    Ok(timers)
}

/// Re-registers slot `id` to raise its own timer flag every `delay` ticks.
pub fn bind_flag_timer(timers: &mut KyraTimers, id: TimerId, delay: i32) -> Result<()> {
    timers
        .add_timer(id, Some(callback(KyraGame::timer_set_flags2)), delay, true)
        .with_context(|| format!("binding flag timer {id}"))?;
    Ok(())
}

/// Retunes the walk animation cadence; `speed` indexes slowest (0) to
/// fastest (4).
pub fn set_walkspeed(timers: &mut KyraTimers, speed: u8) -> Result<()> {
    let Some(&delay) = WALK_SPEEDS.get(usize::from(speed)) else {
        bail!(
            "walk speed {speed} out of range (0..={})",
            WALK_SPEEDS.len() - 1
        );
    };
    log::debug!("set_walkspeed({speed}) -> delay {delay}");
    timers.set_delay(TIMER_WALK, delay)?;
    Ok(())
}

/// Arms the dialogue text fade `seconds` from now; `-1` postpones it
/// indefinitely.
pub fn set_text_fade_timer_countdown(timers: &mut KyraTimers, seconds: i16) -> Result<()> {
    let seconds = if seconds == -1 {
        TEXT_FADE_NEVER
    } else {
        i32::from(seconds)
    };
    log::debug!("set_text_fade_timer_countdown({seconds})");
    timers.set_countdown(TIMER_FADE_TEXT, seconds * TICKS_PER_SECOND)?;
    Ok(())
}
