use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kyra_timer::{TimerId, TimerSnapshot};
use serde::{Deserialize, Serialize};

use crate::game::{GameEvent, GameSummary, KyraGame};
use crate::timers::{self, KyraTimers};

/// Game-logic change applied between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptAction {
    Walkspeed { speed: u8 },
    TextFade { seconds: i16 },
    StatusBits {
        #[serde(default)]
        set: u16,
        #[serde(default)]
        clear: u16,
    },
    GameFlag {
        flag: u16,
        #[serde(default = "default_true")]
        value: bool,
    },
    Talk { character: Option<i8> },
    Scene { id: u16 },
    EnableTimer { id: TimerId },
    DisableTimer { id: TimerId },
    FlagTimer { id: TimerId, delay: i32 },
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub tick: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

/// Ticks where something observable happened.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub tick: u64,
    pub fired: Vec<TimerId>,
    pub events: Vec<GameEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub seed: u64,
    pub ticks_run: u64,
    pub timeline: Vec<TimelineEntry>,
    pub timers: TimerSnapshot,
    pub game: GameSummary,
}

/// Drives the Kyrandia timers from a deterministic tick loop.
pub struct Session {
    seed: u64,
    game: KyraGame,
    timers: KyraTimers,
    script: VecDeque<ScriptedEvent>,
    timeline: Vec<TimelineEntry>,
    ticks_run: u64,
}

impl Session {
    pub fn new(seed: u64) -> Result<Self> {
        Ok(Session {
            seed,
            game: KyraGame::new(seed),
            timers: timers::setup_timers()?,
            script: VecDeque::new(),
            timeline: Vec::new(),
            ticks_run: 0,
        })
    }

    /// Queues script events; they are applied in tick order, ties keeping
    /// their listed order.
    pub fn schedule<S>(&mut self, events: S)
    where
        S: IntoIterator<Item = ScriptedEvent>,
    {
        let mut pending: Vec<ScriptedEvent> = self.script.drain(..).collect();
        pending.extend(events);
        pending.sort_by_key(|event| event.tick);
        self.script = pending.into();
    }

    pub fn game(&self) -> &KyraGame {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut KyraGame {
        &mut self.game
    }

    pub fn timers(&self) -> &KyraTimers {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut KyraTimers {
        &mut self.timers
    }

    pub fn apply(&mut self, action: &ScriptAction) -> Result<()> {
        match *action {
            ScriptAction::Walkspeed { speed } => timers::set_walkspeed(&mut self.timers, speed)?,
            ScriptAction::TextFade { seconds } => {
                self.game.fade_text = false;
                timers::set_text_fade_timer_countdown(&mut self.timers, seconds)?;
            }
            ScriptAction::StatusBits { set, clear } => {
                self.game.brandon_status = (self.game.brandon_status | set) & !clear;
            }
            ScriptAction::GameFlag { flag, value } => {
                if value {
                    self.game.set_flag(flag);
                } else {
                    self.game.reset_flag(flag);
                }
            }
            ScriptAction::Talk { character } => self.game.talking_char = character,
            ScriptAction::Scene { id } => self.game.scene_id = id,
            ScriptAction::EnableTimer { id } => self.timers.enable(id)?,
            ScriptAction::DisableTimer { id } => self.timers.disable(id)?,
            ScriptAction::FlagTimer { id, delay } => {
                timers::bind_flag_timer(&mut self.timers, id, delay)?
            }
        }
        Ok(())
    }

    /// Applies due script events, then advances the timer table once.
    pub fn step(&mut self) -> Result<Option<&TimelineEntry>> {
        let tick = self.timers.ticks_elapsed();
        while let Some(event) = self.script.front() {
            if event.tick > tick {
                break;
            }
            let event = self.script.pop_front().context("script queue emptied")?;
            log::debug!("tick {tick}: applying {:?}", event.action);
            self.apply(&event.action)
                .with_context(|| format!("applying script event at tick {}", event.tick))?;
        }

        let fired = self
            .timers
            .advance(&mut self.game)
            .with_context(|| format!("advancing timers at tick {tick}"))?;
        self.ticks_run += 1;

        let events = self.game.drain_events();
        if fired.is_empty() && events.is_empty() {
            return Ok(None);
        }
        self.timeline.push(TimelineEntry {
            tick,
            fired,
            events,
        });
        Ok(self.timeline.last())
    }

    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            seed: self.seed,
            ticks_run: self.ticks_run,
            timeline: self.timeline.clone(),
            timers: self.timers.snapshot(),
            game: self.game.summary(),
        }
    }

    pub fn load_state(&mut self, path: &Path) -> Result<()> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading timer state from {}", path.display()))?;
        let snapshot: TimerSnapshot = serde_json::from_str(&data)
            .with_context(|| format!("parsing timer state {}", path.display()))?;
        self.timers
            .restore(&snapshot)
            .with_context(|| format!("restoring timer state from {}", path.display()))?;
        Ok(())
    }

    pub fn save_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.timers.snapshot())
            .context("serializing timer state to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing timer state to {}", path.display()))?;
        Ok(())
    }
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptedEvent>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading script from {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{FLAG_AMULET, STATUS_BIT_0X02};
    use crate::timers::{TIMER_CHECK_ANIM_FLAG2, TIMER_REDRAW_AMULET, TIMER_WALK};

    fn event(tick: u64, action: ScriptAction) -> ScriptedEvent {
        ScriptedEvent { tick, action }
    }

    #[test]
    fn walk_timer_follows_speed_changes() {
        let mut session = Session::new(0).unwrap();
        session.schedule([event(10, ScriptAction::Walkspeed { speed: 4 })]);
        session.run(30).unwrap();

        let walk_ticks: Vec<u64> = session
            .timeline()
            .iter()
            .filter(|entry| entry.fired.contains(&TIMER_WALK))
            .map(|entry| entry.tick)
            .collect();
        // The running countdown is kept; the new delay applies from tick 14.
        assert_eq!(walk_ticks, vec![4, 9, 14, 17, 20, 23, 26, 29]);
    }

    #[test]
    fn amulet_sequence_runs_end_to_end() {
        let mut session = Session::new(0).unwrap();
        session.schedule([
            event(
                0,
                ScriptAction::StatusBits {
                    set: STATUS_BIT_0X02,
                    clear: 0,
                },
            ),
            event(
                100,
                ScriptAction::GameFlag {
                    flag: FLAG_AMULET,
                    value: true,
                },
            ),
        ]);
        session.run(600).unwrap();
        assert_eq!(session.timers().countdown(TIMER_CHECK_ANIM_FLAG2).unwrap(), -1);
        assert_eq!(session.game().brandon_status, 0);
        assert!(session.game().brandon_0x02_latched);

        // The check at tick 599 re-arms the redraw for 300 ticks later.
        session.run(300).unwrap();
        assert_eq!(session.timers().countdown(TIMER_REDRAW_AMULET).unwrap(), -1);
        let redraws = session
            .timeline()
            .iter()
            .flat_map(|entry| entry.events.iter())
            .filter(|event| **event == GameEvent::AmuletRedrawn)
            .count();
        assert_eq!(redraws, 1);
    }

    #[test]
    fn same_seed_gives_same_timeline() {
        let script = vec![
            event(0, ScriptAction::Talk { character: Some(2) }),
            event(50, ScriptAction::TextFade { seconds: 1 }),
        ];
        let mut first = Session::new(42).unwrap();
        first.schedule(script.clone());
        first.run(7300).unwrap();
        let mut second = Session::new(42).unwrap();
        second.schedule(script);
        second.run(7300).unwrap();

        let first = serde_json::to_value(first.report()).unwrap();
        let second = serde_json::to_value(second.report()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["game"]["fade_text"], true);
        assert_eq!(first["game"]["flags"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn script_events_parse_from_json() {
        let json = r#"[
            {"tick": 5, "kind": "walkspeed", "speed": 1},
            {"tick": 2, "kind": "status_bits", "set": 32},
            {"tick": 9, "kind": "game_flag", "flag": 241},
            {"tick": 9, "kind": "disable_timer", "id": 15},
            {"tick": 0, "kind": "flag_timer", "id": 1, "delay": 3}
        ]"#;
        let events: Vec<ScriptedEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(
            events[1].action,
            ScriptAction::StatusBits { set: 32, clear: 0 }
        );
        assert_eq!(
            events[2].action,
            ScriptAction::GameFlag {
                flag: 241,
                value: true
            }
        );

        let mut session = Session::new(0).unwrap();
        session.schedule(events);
        session.run(10).unwrap();
        assert!(!session.timers().is_enabled(15).unwrap());
        assert!(session.game().query_timer_flag(1));
        assert_eq!(session.game().summary().timer_flags, vec![1]);
        assert_eq!(session.timers().delay(TIMER_WALK).unwrap(), 9);
    }

    #[test]
    fn bad_script_event_reports_its_tick() {
        let mut session = Session::new(0).unwrap();
        session.schedule([event(3, ScriptAction::EnableTimer { id: 99 })]);
        let err = session.run(5).unwrap_err();
        assert!(format!("{err:#}").contains("tick 3"), "{err:#}");
    }
}
