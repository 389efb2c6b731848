//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use storeprobe::{Journey, JourneyReport, RunSummary};

/// Output format for run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Progress reporter for journey runs.
///
/// Everything goes to stderr so stdout stays clean for `--format json`.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` journeys
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            // A hidden bar (stderr not a terminal) swallows println.
            Some(ref pb) if !pb.is_finished() && !pb.is_hidden() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, paint: Style, message: &str) -> String {
        let prefix = if self.use_color {
            paint.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefixed("✓", "PASS", Style::new().green(), message));
    }

    /// Print a failure message (also in quiet mode)
    pub fn failure(&self, message: &str) {
        self.line(&self.prefixed("✗", "FAIL", Style::new().red(), message));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefixed("⚠", "WARN", Style::new().yellow(), message));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line(&self.prefixed("ℹ", "INFO", Style::new().blue(), message));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line("");
        self.line(&styled);
    }

    /// Report one finished journey and advance the bar
    pub fn journey(&self, report: &JourneyReport) {
        let secs = report.duration.as_secs_f64();
        if report.passed {
            let note = if report.is_flaky() {
                format!(" (flaky, {} attempts)", report.attempts)
            } else {
                String::new()
            };
            self.success(&format!("{} [{secs:.2}s]{note}", report.name));
        } else {
            self.failure(&format!(
                "{} [{secs:.2}s]: {}",
                report.name,
                report.error.as_deref().unwrap_or("unknown error")
            ));
            if let Some(ref shot) = report.screenshot {
                self.info(&format!("  screenshot: {shot}"));
            }
        }
        self.increment(1);
    }

    /// Print the run summary line
    pub fn summary(&self, summary: &RunSummary) {
        let failed = summary.failed_count();
        if self.quiet && failed == 0 {
            return;
        }
        let passed = summary.passed_count();
        let flaky = summary.reports.iter().filter(|r| r.is_flaky()).count();
        let total = summary.total();
        let secs = summary.duration.as_secs_f64();

        let _ = self.term.write_line("");
        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} journeys in {secs:.2}s ({} passed, {} failed, {} flaky)",
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                Style::new().yellow().apply_to(flaky)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} journeys in {secs:.2}s ({passed} passed, {failed} failed, {flaky} flaky)"
            ));
        }
    }
}

/// One line per journey: name, tags, description
#[must_use]
pub fn render_journey_list(journeys: &[Journey]) -> String {
    let width = journeys.iter().map(|j| j.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for journey in journeys {
        let tags = journey.tags.join(",");
        out.push_str(&format!(
            "{:<width$}  [{tags}]  {}\n",
            journey.name, journey.description
        ));
    }
    out
}

/// Pretty JSON of a run summary
pub fn render_summary_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(name: &str, passed: bool, attempts: u32) -> JourneyReport {
        JourneyReport {
            name: name.to_string(),
            passed,
            attempts,
            duration: Duration::from_millis(1500),
            error: (!passed).then(|| "No element found for css=#qty".to_string()),
            screenshot: None,
        }
    }

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_quiet_reporter_never_starts_bar() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(3, "running");
            assert!(reporter.progress_bar.is_none());
            reporter.journey(&report("cart/subtotal", true, 1));
            reporter.finish();
        }

        #[test]
        fn test_plain_prefixes() {
            let reporter = ProgressReporter::new(false, false);
            let line = reporter.prefixed("✓", "PASS", Style::new().green(), "search/no-results");
            assert_eq!(line, "PASS search/no-results");
        }

        #[test]
        fn test_progress_advances_per_journey() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(2, "running");
            reporter.journey(&report("a", true, 1));
            reporter.journey(&report("b", false, 2));
            assert_eq!(reporter.progress_bar.as_ref().unwrap().position(), 2);
            reporter.finish();
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_journey_list_aligned() {
            let list = render_journey_list(&storeprobe::select(Some("search/"), None));
            let lines: Vec<_> = list.lines().collect();
            assert!(lines.len() >= 3);
            assert!(lines.iter().all(|l| l.starts_with("search/")));
            let column = lines[0].find('[').unwrap();
            assert!(lines.iter().all(|l| l.find('[') == Some(column)));
        }

        #[test]
        fn test_summary_json() {
            let summary = RunSummary {
                reports: vec![report("auth/login", true, 1), report("cart/remove-item", false, 2)],
                duration: Duration::from_secs(3),
            };
            let json = render_summary_json(&summary).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["reports"][1]["name"], "cart/remove-item");
            assert_eq!(value["reports"][1]["passed"], false);
            assert_eq!(value["reports"][1]["attempts"], 2);
        }
    }
}
