use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Pick a project directory or a running tmux session and land in it.
///
/// From a terminal: no arguments opens the fuzzy picker over project
/// directories; `<name>` attaches to that session or picks a directory for
/// it; `<name> <path>` creates or attaches directly. As a rofi script the
/// arguments are the menu selection.
#[derive(Parser, Debug)]
#[command(name = "muxpick", version)]
pub struct Cli {
    /// Config file (defaults to $MUXPICK_CONFIG, then <config dir>/muxpick/config.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print sessions and project directories, one per line, and exit
    #[arg(long)]
    pub list: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// [NAME] [PATH], or the menu selection
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}
