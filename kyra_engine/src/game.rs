use std::collections::BTreeSet;

use anyhow::Result;
use kyra_timer::{TimerControl, TimerId, PAUSED};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::timers::{TIMER_CHECK_ANIM_FLAG1, TIMER_CHECK_ANIM_FLAG2, TIMER_REDRAW_AMULET};

/// Scene where the random flag timer is suppressed.
pub const SCENE_NO_RANDOM_FLAGS: u16 = 0x1C;

/// Game flag that unlocks the amulet redraw.
pub const FLAG_AMULET: u16 = 0xF1;

/// First of the four flags raised by the random flag timer.
pub const FLAG_RANDOM_BASE: u16 = 17;

pub const STATUS_BIT_0X02: u16 = 0x02;
pub const STATUS_BIT_0X20: u16 = 0x20;

/// Ticks before the amulet redraw check runs after Brandon is reset.
const AMULET_REDRAW_DELAY: i32 = 300;

const HEAD_FRAMES: [i8; 18] = [4, 5, 4, 5, 4, 5, 0, 1, 4, 5, 4, 4, 6, 4, 8, 1, 9, 4];

/// Things the renderer/animator would be asked to do; recorded instead of
/// executed so sessions can be inspected and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    RefreshNpc { character: i8 },
    HeadShape { shape: i8 },
    FlagSet { flag: u16 },
    BrandonNormal { status_bit: u16 },
    AmuletRedrawn,
    TextFade,
    StatusLatched { status_bit: u16 },
    TimerFlagSet { timer: TimerId },
}

/// Game state the Kyrandia timer callbacks operate on.
pub struct KyraGame {
    flags: BTreeSet<u16>,
    /// Per-timer flags raised by `timer_set_flags2`, keyed by timer id.
    timer_flags: BTreeSet<TimerId>,
    pub scene_id: u16,
    pub talking_char: Option<i8>,
    head_frame: usize,
    pub head_shape: i8,
    pub brandon_status: u16,
    pub brandon_0x02_latched: bool,
    pub brandon_0x20_latched: bool,
    pub fade_text: bool,
    rng: StdRng,
    events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub scene_id: u16,
    pub flags: Vec<u16>,
    pub timer_flags: Vec<TimerId>,
    pub head_shape: i8,
    pub brandon_status: u16,
    pub brandon_0x02_latched: bool,
    pub brandon_0x20_latched: bool,
    pub fade_text: bool,
}

impl KyraGame {
    pub fn new(seed: u64) -> Self {
        KyraGame {
            flags: BTreeSet::new(),
            timer_flags: BTreeSet::new(),
            scene_id: 0,
            talking_char: None,
            head_frame: 0,
            head_shape: 0,
            brandon_status: 0,
            brandon_0x02_latched: false,
            brandon_0x20_latched: false,
            fade_text: false,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn query_flag(&self, flag: u16) -> bool {
        self.flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: u16) {
        if self.flags.insert(flag) {
            self.events.push(GameEvent::FlagSet { flag });
        }
    }

    pub fn reset_flag(&mut self, flag: u16) {
        self.flags.remove(&flag);
    }

    /// Takes the events logged since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            scene_id: self.scene_id,
            flags: self.flags.iter().copied().collect(),
            timer_flags: self.timer_flags.iter().copied().collect(),
            head_shape: self.head_shape,
            brandon_status: self.brandon_status,
            brandon_0x02_latched: self.brandon_0x02_latched,
            brandon_0x20_latched: self.brandon_0x20_latched,
            fade_text: self.fade_text,
        }
    }

    /// Resets Brandon out of either amulet animation state and schedules the
    /// amulet redraw check.
    pub fn check_amulet_anim_flags(
        &mut self,
        timers: &mut TimerControl<'_, Self>,
    ) -> Result<()> {
        for bit in [STATUS_BIT_0X02, STATUS_BIT_0X20] {
            if self.brandon_status & bit != 0 {
                self.brandon_status &= !bit;
                self.events.push(GameEvent::BrandonNormal { status_bit: bit });
                timers.set_countdown(TIMER_REDRAW_AMULET, AMULET_REDRAW_DELAY)?;
            }
        }
        Ok(())
    }

    pub fn timer_check_anim_flag1(
        &mut self,
        timers: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_check_anim_flag1({id})");
        if self.brandon_status & STATUS_BIT_0X20 != 0 {
            self.check_amulet_anim_flags(timers)?;
            timers.set_countdown(TIMER_CHECK_ANIM_FLAG1, PAUSED)?;
        }
        Ok(())
    }

    pub fn timer_check_anim_flag2(
        &mut self,
        timers: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_check_anim_flag2({id})");
        if self.brandon_status & STATUS_BIT_0X02 != 0 {
            self.check_amulet_anim_flags(timers)?;
            timers.set_countdown(TIMER_CHECK_ANIM_FLAG2, PAUSED)?;
        }
        Ok(())
    }

    pub fn timer_update_head_anims(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::trace!("timer_update_head_anims({id})");
        let Some(talker) = self.talking_char else {
            return Ok(());
        };

        self.head_shape = HEAD_FRAMES[self.head_frame];
        self.head_frame = (self.head_frame + 1) % HEAD_FRAMES.len();
        self.events.push(GameEvent::HeadShape {
            shape: self.head_shape,
        });
        self.events.push(GameEvent::RefreshNpc { character: 0 });
        self.events.push(GameEvent::RefreshNpc { character: talker });
        Ok(())
    }

    /// Raises one of flags 17..=20, starting at a random offset and taking
    /// the first that is still clear.
    pub fn timer_set_flags1(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_set_flags1({id})");
        if self.scene_id == SCENE_NO_RANDOM_FLAGS {
            return Ok(());
        }

        let start: u16 = self.rng.random_range(0..=3);
        for step in 0..4 {
            let flag = FLAG_RANDOM_BASE + (start + step) % 4;
            if !self.query_flag(flag) {
                self.set_flag(flag);
                break;
            }
        }
        Ok(())
    }

    /// Raises the flag belonging to the timer that fired. Not part of the
    /// default layout; scripts bind it to spare slots.
    pub fn timer_set_flags2(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_set_flags2({id})");
        if self.timer_flags.insert(id) {
            self.events.push(GameEvent::TimerFlagSet { timer: id });
        }
        Ok(())
    }

    pub fn query_timer_flag(&self, id: TimerId) -> bool {
        self.timer_flags.contains(&id)
    }

    pub fn timer_redraw_amulet(
        &mut self,
        timers: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_redraw_amulet({id})");
        if self.query_flag(FLAG_AMULET) {
            self.events.push(GameEvent::AmuletRedrawn);
            timers.set_countdown(TIMER_REDRAW_AMULET, PAUSED)?;
        }
        Ok(())
    }

    pub fn timer_fade_text(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::debug!("timer_fade_text({id})");
        self.fade_text = true;
        self.events.push(GameEvent::TextFade);
        Ok(())
    }

    pub fn update_anim_flag1(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::trace!("update_anim_flag1({id})");
        if self.brandon_status & STATUS_BIT_0X02 != 0 && !self.brandon_0x02_latched {
            self.brandon_0x02_latched = true;
            self.events.push(GameEvent::StatusLatched {
                status_bit: STATUS_BIT_0X02,
            });
        }
        Ok(())
    }

    pub fn update_anim_flag2(
        &mut self,
        _: &mut TimerControl<'_, Self>,
        id: TimerId,
    ) -> Result<()> {
        log::trace!("update_anim_flag2({id})");
        if self.brandon_status & STATUS_BIT_0X20 != 0 && !self.brandon_0x20_latched {
            self.brandon_0x20_latched = true;
            self.events.push(GameEvent::StatusLatched {
                status_bit: STATUS_BIT_0X20,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::{setup_timers, TIMER_SET_FLAGS1};

    #[test]
    fn head_anims_only_run_while_someone_talks() {
        let mut game = KyraGame::new(0);
        let mut timers = setup_timers().unwrap();
        game.timer_update_head_anims(&mut timers.control(), 15).unwrap();
        assert!(game.drain_events().is_empty());

        game.talking_char = Some(3);
        for _ in 0..HEAD_FRAMES.len() {
            game.timer_update_head_anims(&mut timers.control(), 15).unwrap();
        }
        assert_eq!(game.head_shape, 4);
        game.timer_update_head_anims(&mut timers.control(), 15).unwrap();
        assert_eq!(game.head_shape, HEAD_FRAMES[0]);

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::RefreshNpc { character: 3 }));
        assert!(events.contains(&GameEvent::RefreshNpc { character: 0 }));
    }

    #[test]
    fn random_flags_fill_all_four_then_stop() {
        let mut game = KyraGame::new(7);
        let mut timers = setup_timers().unwrap();
        for _ in 0..6 {
            game.timer_set_flags1(&mut timers.control(), TIMER_SET_FLAGS1).unwrap();
        }
        for flag in FLAG_RANDOM_BASE..FLAG_RANDOM_BASE + 4 {
            assert!(game.query_flag(flag), "flag {flag} not raised");
        }
        let raised = game
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::FlagSet { .. }))
            .count();
        assert_eq!(raised, 4);
    }

    #[test]
    fn random_flags_skip_the_excluded_scene() {
        let mut game = KyraGame::new(7);
        let mut timers = setup_timers().unwrap();
        game.scene_id = SCENE_NO_RANDOM_FLAGS;
        game.timer_set_flags1(&mut timers.control(), TIMER_SET_FLAGS1).unwrap();
        assert!(game.summary().flags.is_empty());
    }

    #[test]
    fn amulet_check_resets_brandon_and_schedules_redraw() {
        let mut game = KyraGame::new(0);
        let mut timers = setup_timers().unwrap();
        game.brandon_status = STATUS_BIT_0X02 | STATUS_BIT_0X20;

        game.timer_check_anim_flag2(&mut timers.control(), TIMER_CHECK_ANIM_FLAG2)
            .unwrap();
        assert_eq!(game.brandon_status, 0);
        assert_eq!(timers.countdown(TIMER_CHECK_ANIM_FLAG2).unwrap(), -1);
        assert_eq!(timers.countdown(TIMER_REDRAW_AMULET).unwrap(), 300);
        assert_eq!(
            game.drain_events(),
            vec![
                GameEvent::BrandonNormal { status_bit: 0x02 },
                GameEvent::BrandonNormal { status_bit: 0x20 },
            ]
        );
    }

    #[test]
    fn amulet_redraw_waits_for_its_flag() {
        let mut game = KyraGame::new(0);
        let mut timers = setup_timers().unwrap();
        game.timer_redraw_amulet(&mut timers.control(), TIMER_REDRAW_AMULET)
            .unwrap();
        assert_eq!(timers.countdown(TIMER_REDRAW_AMULET).unwrap(), 600);

        game.set_flag(FLAG_AMULET);
        game.timer_redraw_amulet(&mut timers.control(), TIMER_REDRAW_AMULET)
            .unwrap();
        assert_eq!(timers.countdown(TIMER_REDRAW_AMULET).unwrap(), -1);
        assert!(game.drain_events().contains(&GameEvent::AmuletRedrawn));
    }

    #[test]
    fn timer_flags_are_keyed_by_the_firing_timer() {
        let mut game = KyraGame::new(0);
        let mut timers = setup_timers().unwrap();
        game.timer_set_flags2(&mut timers.control(), 3).unwrap();
        game.timer_set_flags2(&mut timers.control(), 3).unwrap();

        assert!(game.query_timer_flag(3));
        assert!(!game.query_timer_flag(4));
        assert_eq!(game.drain_events(), vec![GameEvent::TimerFlagSet { timer: 3 }]);
        assert_eq!(game.summary().timer_flags, vec![3]);
        assert!(game.summary().flags.is_empty());
    }
}
