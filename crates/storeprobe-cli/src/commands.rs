//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Storeprobe: run storefront user journeys (search, sign-in, cart, checkout)
#[derive(Parser, Debug)]
#[command(name = "storeprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "STOREPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run journeys against the storefront
    Run(RunArgs),

    /// List the available journeys
    List(ListArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Only journeys whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only journeys carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Retries per failed journey
    #[arg(long)]
    pub retries: Option<u32>,

    /// Journeys run concurrently
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Storefront root URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Run against the built-in demo storefront (no browser, no network)
    #[arg(long)]
    pub offline: bool,

    /// Directory for failure screenshots
    #[arg(long)]
    pub screenshots: Option<PathBuf>,

    /// Summary format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Only journeys whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only journeys carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Summary format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable lines on stderr
    #[default]
    Text,
    /// JSON summary on stdout
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("storeprobe").chain(args.iter().copied())).unwrap()
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = parse(&["run"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert!(args.filter.is_none());
            assert!(args.retries.is_none());
            assert!(!args.offline);
            assert!(!args.headed);
            assert_eq!(args.format, FormatArg::Text);
        }

        #[test]
        fn test_run_all_flags() {
            let cli = parse(&[
                "run",
                "--filter",
                "cart/",
                "--tag",
                "smoke",
                "--retries",
                "2",
                "-j",
                "4",
                "--base-url",
                "https://shop.test/",
                "--headed",
                "--offline",
                "--format",
                "json",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.filter.as_deref(), Some("cart/"));
            assert_eq!(args.tag.as_deref(), Some("smoke"));
            assert_eq!(args.retries, Some(2));
            assert_eq!(args.workers, Some(4));
            assert_eq!(args.base_url.as_deref(), Some("https://shop.test/"));
            assert!(args.headed);
            assert!(args.offline);
            assert_eq!(args.format, FormatArg::Json);
        }

        #[test]
        fn test_invalid_retries_rejected() {
            assert!(Cli::try_parse_from(["storeprobe", "run", "--retries", "many"]).is_err());
        }
    }

    mod global_tests {
        use super::*;

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = parse(&["list", "-vv", "--color", "never", "--config", "probe.yaml"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(ColorChoice::from(cli.color), ColorChoice::Never);
            assert_eq!(cli.config, Some(PathBuf::from("probe.yaml")));
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["storeprobe"]).is_err());
        }
    }
}
