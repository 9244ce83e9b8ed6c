use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Play the configured number of tower runs
    Run,
    /// Save one capture of the emulator window
    Screenshot,
    /// Report every token's best match on one capture
    Probe,
}

/// Automates the Star Tower climb inside a MuMu emulator window.
///
/// Hotkeys while running (desktop builds): P pause/resume, S skip the initial
/// button waits, Q stop. Ctrl-C always stops.
#[derive(Parser, Debug)]
#[command(author, version = env!("APP_VERSION_DISPLAY"), about)]
pub struct Args {
    /// Directory holding the template PNGs
    #[arg(long, value_name = "DIR", default_value = "resources")]
    pub templates: PathBuf,

    /// JSON file overriding thresholds, timings, layout and limits
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of runs (defaults to the configured maximum)
    #[arg(long, value_name = "N")]
    pub runs: Option<u32>,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Serve screenshots from DIR instead of the live emulator (clicks are only logged)
    #[arg(long, value_name = "DIR")]
    pub replay: Option<PathBuf>,

    /// Capture the emulator window once and save it to tower-screenshot.png
    #[arg(long, short = 's', conflicts_with = "probe")]
    pub screenshot: bool,

    /// Capture once and log the best match of every template
    #[arg(long)]
    pub probe: bool,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.screenshot {
            Mode::Screenshot
        } else if self.probe {
            Mode::Probe
        } else {
            Mode::Run
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["auto-tower-run"]).unwrap();
        assert_eq!(args.mode(), Mode::Run);
        assert_eq!(args.templates, PathBuf::from("resources"));
        assert!(args.runs.is_none());
        assert!(!args.debug);
    }

    #[test]
    fn test_modes_and_flags() {
        let args = Args::try_parse_from([
            "auto-tower-run",
            "--probe",
            "--replay",
            "shots",
            "--runs",
            "3",
        ])
        .unwrap();
        assert_eq!(args.mode(), Mode::Probe);
        assert_eq!(args.replay, Some(PathBuf::from("shots")));
        assert_eq!(args.runs, Some(3));

        assert!(Args::try_parse_from(["auto-tower-run", "--screenshot", "--probe"]).is_err());
    }
}
