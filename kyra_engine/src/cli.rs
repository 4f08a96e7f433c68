use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Drives the Kyrandia 1 timer table through a deterministic tick loop",
    version
)]
pub struct Args {
    /// Number of game ticks to run (60 ticks per second of game time)
    #[arg(long, default_value_t = 3600)]
    pub ticks: u64,

    /// Seed for the game's random number source
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Scene the session starts in
    #[arg(long, default_value_t = 0)]
    pub scene: u16,

    /// Initial walk speed setting (0 = slowest, 4 = fastest)
    #[arg(long)]
    pub walkspeed: Option<u8>,

    /// Arm the dialogue text fade this many seconds into the session (-1 = never)
    #[arg(long, allow_negative_numbers = true)]
    pub text_fade: Option<i16>,

    /// JSON file listing scripted game events keyed by tick
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Path to write the session timeline report as JSON
    #[arg(long)]
    pub timeline_json: Option<PathBuf>,

    /// Timer state JSON to restore before the first tick
    #[arg(long)]
    pub load_state: Option<PathBuf>,

    /// Path to write the timer state after the last tick
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// Print every tick where timers fired instead of the summary only
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub struct RunArgs {
    pub ticks: u64,
    pub seed: u64,
    pub scene: u16,
    pub walkspeed: Option<u8>,
    pub text_fade: Option<i16>,
    pub script: Option<PathBuf>,
    pub timeline_json: Option<PathBuf>,
    pub load_state: Option<PathBuf>,
    pub save_state: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<RunArgs> {
    let args = Args::parse();
    args.into_run_args()
}

impl Args {
    fn into_run_args(self) -> Result<RunArgs> {
        if self.ticks == 0 && self.timeline_json.is_some() {
            bail!("--timeline-json requires --ticks greater than zero");
        }
        if let (Some(load), Some(save)) = (self.load_state.as_ref(), self.save_state.as_ref()) {
            if load == save {
                eprintln!(
                    "[kyra_engine] warning: --save-state overwrites the restored file {}",
                    save.display()
                );
            }
        }

        Ok(RunArgs {
            ticks: self.ticks,
            seed: self.seed,
            scene: self.scene,
            walkspeed: self.walkspeed,
            text_fade: self.text_fade,
            script: self.script,
            timeline_json: self.timeline_json,
            load_state: self.load_state,
            save_state: self.save_state,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn defaults_run_one_minute() {
        let args = Args::try_parse_from(["kyra_engine"]).unwrap();
        let run = args.into_run_args().unwrap();
        assert_eq!(run.ticks, 3600);
        assert_eq!(run.seed, 0);
        assert!(run.walkspeed.is_none());
    }

    #[test]
    fn negative_text_fade_is_accepted() {
        let args = Args::try_parse_from(["kyra_engine", "--text-fade", "-1"]).unwrap();
        assert_eq!(args.text_fade, Some(-1));
    }

    #[test]
    fn empty_run_cannot_write_a_timeline() {
        let args =
            Args::try_parse_from(["kyra_engine", "--ticks", "0", "--timeline-json", "out.json"])
                .unwrap();
        assert!(args.into_run_args().is_err());
    }
}
