//! Storeprobe CLI: run storefront user journeys
//!
//! ## Usage
//!
//! ```bash
//! storeprobe run                          # Every journey against the configured store
//! storeprobe run --tag smoke -j 4         # Smoke journeys, four at a time
//! storeprobe run --offline                # Against the built-in demo storefront
//! storeprobe list --filter cart/          # What would run
//! storeprobe config --show                # Resolved configuration as YAML
//! ```

use clap::Parser;
use std::process::ExitCode;
use storeprobe::{select, ProbeConfig};
use storeprobe_cli::{
    logging, render_journey_list, resolve_config, selected, Cli, CliConfig, CliError, CliResult,
    Commands, ConfigArgs, ListArgs, RunArgs, RunCommand, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::JourneysFailed { failed, total }) => {
            eprintln!("{failed} of {total} journeys failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init_logging(&config);

    match cli.command {
        Commands::Run(ref args) => run_journeys(config, &cli, args),
        Commands::List(ref args) => {
            run_list(args);
            Ok(())
        }
        Commands::Config(ref args) => run_config(&cli, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_json_logs(cli.log_json)
}

fn run_journeys(config: CliConfig, cli: &Cli, args: &RunArgs) -> CliResult<()> {
    let probe = resolve_config(cli.config.as_deref(), args)?;
    let journeys = selected(args);
    RunCommand::new(config, probe, args)
        .execute(&journeys)
        .map(|_| ())
}

fn run_list(args: &ListArgs) {
    let journeys = select(args.filter.as_deref(), args.tag.as_deref());
    print!("{}", render_journey_list(&journeys));
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> CliResult<()> {
    let config = ProbeConfig::load(cli.config.as_deref())?;
    if args.show {
        print!("{}", config.to_yaml()?);
    } else {
        println!("Use --show to print the resolved configuration");
    }
    Ok(())
}
