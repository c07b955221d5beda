//! Workshop CLI
//!
//! Main entry point for running a terminal workshop from its application
//! directory.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;
use workshop_core::{ExerciseRegistry, Mode, Outcome, SelectMenu, Workshop, WorkshopConfig};

/// Workshop - exercise-based terminal tutorials
///
/// Without a mode, shows the interactive exercise menu.
#[derive(Parser, Debug)]
#[command(name = "workshop")]
#[command(about, long_about = None, disable_version_flag = true, disable_help_flag = true)]
struct Args {
    /// Mode and its arguments: list, current, select NAME, print, run FILE,
    /// verify FILE, reset, help, version, or a workshop command
    #[arg(value_name = "MODE", trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,

    /// Print the workshop version
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Print usage and help
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Workshop application directory containing workshop.json
    #[arg(long, value_name = "DIR", default_value = ".")]
    app_dir: PathBuf,

    /// Directory for progress files (default: ~/.config/<name>)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn mode(&self) -> Mode {
        if self.version {
            Mode::Version
        } else if self.help {
            Mode::Help
        } else {
            Mode::from_args(&self.words)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    tracing::debug!(app_dir = %args.app_dir.display(), "Application directory");
    tracing::debug!(data_dir = ?args.data_dir, "Data directory override");

    match run_workshop(args).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            println!("{}", format!("{e:#}").red().bold());
            ExitCode::from(1)
        }
    }
}

/// Loads the workshop and runs one invocation.
async fn run_workshop(args: Args) -> anyhow::Result<Outcome> {
    let app_dir = args
        .app_dir
        .canonicalize()
        .with_context(|| format!("Workshop directory not found: {}", args.app_dir.display()))?;
    let mut config = WorkshopConfig::load_from_dir(&app_dir)?;
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = Some(data_dir.to_string_lossy().into_owned());
    }

    let width = config.width;
    let mut workshop = Workshop::open(config, ExerciseRegistry::with_builtins())?;
    let mut menu = SelectMenu::new(io::stdout(), width);

    let outcome = if args.version || args.help {
        workshop.dispatch(args.mode(), &mut menu).await?
    } else {
        workshop.dispatch_args(&args.words, &mut menu).await?
    };
    tracing::debug!(?outcome, phase = %workshop.lifecycle().phase(), "Invocation finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_and_help_flags() {
        let args = Args::parse_from(["workshop", "-v"]);
        assert_eq!(args.mode(), Mode::Version);

        let args = Args::parse_from(["workshop", "--help"]);
        assert_eq!(args.mode(), Mode::Help);
    }

    #[test]
    fn test_positional_mode() {
        let args = Args::parse_from(["workshop", "--app-dir", "/opt/w", "verify", "solution.sh"]);
        assert_eq!(args.mode(), Mode::Verify(vec!["solution.sh".to_string()]));
        assert_eq!(args.app_dir, PathBuf::from("/opt/w"));
    }

    #[test]
    fn test_no_mode_is_menu() {
        let args = Args::parse_from(["workshop"]);
        assert_eq!(args.mode(), Mode::Menu);
        assert!(!args.verbose);
    }

    #[test]
    fn test_select_joins_name() {
        let args = Args::parse_from(["workshop", "select", "Baby", "Steps"]);
        assert_eq!(args.mode(), Mode::Select(Some("Baby Steps".to_string())));
    }
}
