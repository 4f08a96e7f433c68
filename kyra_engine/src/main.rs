use std::fs;

use anyhow::{Context, Result};

mod cli;
mod game;
mod session;
mod timers;

use cli::RunArgs;
use session::{load_script, ScriptAction, ScriptedEvent, Session, TimelineEntry};

fn main() -> Result<()> {
    let args = cli::parse()?;

    env_logger::init();

    run(args)
}

fn run(args: RunArgs) -> Result<()> {
    let mut session = Session::new(args.seed).context("setting up Kyrandia timers")?;
    session.game_mut().scene_id = args.scene;

    if let Some(path) = args.load_state.as_ref() {
        session.load_state(path)?;
        println!(
            "Restored timer state from {} (tick {})",
            path.display(),
            session.timers().ticks_elapsed()
        );
    }

    let start = session.timers().ticks_elapsed();
    if let Some(speed) = args.walkspeed {
        timers::set_walkspeed(session.timers_mut(), speed)?;
    }
    if let Some(seconds) = args.text_fade {
        session.schedule([ScriptedEvent {
            tick: start,
            action: ScriptAction::TextFade { seconds },
        }]);
    }
    if let Some(path) = args.script.as_ref() {
        let events = load_script(path)?;
        println!("Loaded {} scripted events from {}", events.len(), path.display());
        session.schedule(events);
    }

    if args.verbose {
        for _ in 0..args.ticks {
            if let Some(entry) = session.step()? {
                describe_entry(entry);
            }
        }
    } else {
        session.run(args.ticks)?;
    }

    let report = session.report();
    println!(
        "Ran {} ticks (seed {}), {} ticks with activity",
        report.ticks_run,
        report.seed,
        report.timeline.len()
    );
    let firings: usize = session
        .timeline()
        .iter()
        .map(|entry| entry.fired.len())
        .sum();
    println!("Timer firings: {firings}");
    println!(
        "Game flags set: {:?} | fade text: {} | head shape: {}",
        report.game.flags,
        session.game().fade_text,
        session.game().head_shape
    );

    if let Some(path) = args.timeline_json.as_ref() {
        let json = serde_json::to_string_pretty(&report)
            .context("serializing session timeline to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing timeline JSON to {}", path.display()))?;
        println!("Saved session timeline JSON to {}", path.display());
    }

    if let Some(path) = args.save_state.as_ref() {
        session.save_state(path)?;
        println!("Saved timer state to {}", path.display());
    }

    Ok(())
}

fn describe_entry(entry: &TimelineEntry) {
    let fired: Vec<String> = entry.fired.iter().map(|id| id.to_string()).collect();
    println!("  tick {:>6}: timers [{}]", entry.tick, fired.join(", "));
    for event in &entry.events {
        println!("      - {event:?}");
    }
}
