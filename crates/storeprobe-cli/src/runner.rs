//! `storeprobe run`: resolve configuration, pick a session source, run.

use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_summary_json, OutputFormat, ProgressReporter};
use std::path::Path;
use std::sync::Arc;
use storeprobe::{
    demo, select, Journey, JourneyRunner, ProbeConfig, ProbeResult, RunSummary, Session,
    SessionFactory,
};
use tracing::info;

/// Layer `args` over the configuration loaded from file and environment
pub fn resolve_config(path: Option<&Path>, args: &RunArgs) -> CliResult<ProbeConfig> {
    let mut config = ProbeConfig::load(path)?;
    if let Some(ref url) = args.base_url {
        config = config.with_base_url(url.clone());
    }
    if args.offline {
        config = config.with_base_url(demo::DEMO_ORIGIN);
    }
    if let Some(retries) = args.retries {
        config = config.with_retries(retries);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if args.headed {
        config = config.with_headless(false);
    }
    if let Some(ref dir) = args.screenshots {
        config = config.with_screenshot_dir(dir.clone());
    }
    Ok(config.validated()?)
}

/// Sessions on the scripted demo storefront
fn demo_session(config: &ProbeConfig) -> ProbeResult<Session> {
    Ok(Session::new(
        Arc::new(demo::storefront_at(&config.base_url)),
        config.clone(),
    ))
}

/// Executes `storeprobe run`
#[derive(Debug)]
pub struct RunCommand {
    cli: CliConfig,
    config: ProbeConfig,
    format: OutputFormat,
    offline: bool,
}

impl RunCommand {
    /// Command for an already resolved configuration
    #[must_use]
    pub fn new(cli: CliConfig, config: ProbeConfig, args: &RunArgs) -> Self {
        Self {
            cli,
            config,
            format: args.format.into(),
            offline: args.offline,
        }
    }

    /// Run the selected journeys; fails with [`CliError::JourneysFailed`]
    /// when any of them failed
    pub fn execute(&self, journeys: &[Journey]) -> CliResult<RunSummary> {
        if journeys.is_empty() {
            return Err(CliError::invalid_argument("no journeys match the filter"));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let summary = runtime.block_on(self.run(journeys))?;

        if self.format == OutputFormat::Json {
            println!("{}", render_summary_json(&summary)?);
        }
        if summary.all_passed() {
            Ok(summary)
        } else {
            Err(CliError::JourneysFailed {
                failed: summary.failed_count(),
                total: summary.total(),
            })
        }
    }

    async fn run(&self, journeys: &[Journey]) -> CliResult<RunSummary> {
        if self.offline {
            info!(origin = %self.config.base_url, "offline run against the demo storefront");
            return Ok(self.run_on(demo_session, journeys).await);
        }
        self.run_live(journeys).await
    }

    #[cfg(feature = "browser")]
    async fn run_live(&self, journeys: &[Journey]) -> CliResult<RunSummary> {
        info!(base_url = %self.config.base_url, headless = self.config.headless, "live run");
        Ok(self.run_on(storeprobe::ChromiumSessions, journeys).await)
    }

    #[cfg(not(feature = "browser"))]
    async fn run_live(&self, _journeys: &[Journey]) -> CliResult<RunSummary> {
        Err(CliError::config(
            "built without browser support; rebuild with --features browser or pass --offline",
        ))
    }

    async fn run_on<F: SessionFactory>(&self, factory: F, journeys: &[Journey]) -> RunSummary {
        let mut reporter = ProgressReporter::new(
            self.cli.color.should_color(),
            self.cli.verbosity.is_quiet(),
        );
        reporter.header(&format!("Running {} journeys", journeys.len()));
        reporter.start_progress(journeys.len() as u64, &self.config.base_url);

        let runner = JourneyRunner::new(factory, self.config.clone());
        let summary = runner
            .run_with(journeys, |report| reporter.journey(report))
            .await;

        reporter.finish();
        reporter.summary(&summary);
        summary
    }
}

/// Journeys selected by `--filter` and `--tag`
#[must_use]
pub fn selected(args: &RunArgs) -> Vec<Journey> {
    select(args.filter.as_deref(), args.tag.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};

    fn quiet() -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_flags_override_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("probe.yaml");
            std::fs::write(&path, "base_url: https://file.test/\nretries: 5\nworkers: 2\n").unwrap();

            let args = RunArgs {
                retries: Some(0),
                headed: true,
                ..RunArgs::default()
            };
            let config = resolve_config(Some(&path), &args).unwrap();
            assert_eq!(config.retries, 0);
            assert_eq!(config.workers, 2);
            assert!(!config.headless);
        }

        #[test]
        fn test_offline_targets_demo_origin() {
            let args = RunArgs {
                offline: true,
                base_url: Some("https://ignored.test/".into()),
                ..RunArgs::default()
            };
            let config = resolve_config(None, &args).unwrap();
            assert_eq!(config.base_url, demo::DEMO_ORIGIN);
        }

        #[test]
        fn test_zero_workers_rejected() {
            let args = RunArgs {
                workers: Some(0),
                ..RunArgs::default()
            };
            let err = resolve_config(None, &args).unwrap_err();
            assert!(matches!(err, CliError::Probe(_)));
        }
    }

    mod execute_tests {
        use super::*;

        fn offline(filter: &str) -> (RunArgs, RunCommand) {
            let args = RunArgs {
                filter: Some(filter.to_string()),
                offline: true,
                ..RunArgs::default()
            };
            let config = resolve_config(None, &args)
                .unwrap()
                .with_network_quiet(20)
                .with_screenshot_on_failure(false);
            let command = RunCommand::new(quiet(), config, &args);
            (args, command)
        }

        #[test]
        fn test_offline_run_passes() {
            let (args, command) = offline("search/no-results");
            let summary = command.execute(&selected(&args)).unwrap();
            assert_eq!(summary.total(), 1);
            assert!(summary.all_passed());
        }

        #[test]
        fn test_empty_selection_is_invalid() {
            let (args, command) = offline("no-such-journey");
            let err = command.execute(&selected(&args)).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
        }
    }
}
