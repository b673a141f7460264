//! Coverage threshold policy and markdown report rendering

use colored::Colorize;
use std::fmt::Write as _;

use super::{CoverageReportResult, ReportFormat};
use crate::error::{Result, ShroudError};

pub const DEFAULT_THRESHOLD: f64 = 90.0;

const FOOTER: &str = "> Coverage checked by shroud 🧛";

/// Thresholds and whether breaching each one blocks the run
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    pub total_project_threshold: f64,
    pub modified_file_threshold: f64,
    pub fail_if_under_project_threshold: bool,
    pub fail_if_under_file_threshold: bool,
}

impl ThresholdPolicy {
    /// When `fail_if_under_file_threshold` is not given it follows the project flag
    pub fn new(
        total_project_threshold: f64,
        modified_file_threshold: f64,
        fail_if_under_project_threshold: bool,
        fail_if_under_file_threshold: Option<bool>,
    ) -> Self {
        Self {
            total_project_threshold,
            modified_file_threshold,
            fail_if_under_project_threshold,
            fail_if_under_file_threshold: fail_if_under_file_threshold
                .unwrap_or(fail_if_under_project_threshold),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("total project threshold", self.total_project_threshold),
            ("modified file threshold", self.modified_file_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ShroudError::configuration(format!(
                    "{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_THRESHOLD, true, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the run
    Fatal,
    /// Reported, but does not change the outcome
    Advisory,
}

impl Severity {
    fn from_flag(fail: bool) -> Self {
        if fail {
            Severity::Fatal
        } else {
            Severity::Advisory
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationScope {
    PerFile { file_name: String },
    Project,
}

/// A coverage figure strictly below its threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub scope: ViolationScope,
    pub actual: f64,
    pub threshold: f64,
    pub severity: Severity,
}

impl Violation {
    pub fn message(&self) -> String {
        match &self.scope {
            ViolationScope::PerFile { file_name } => format!(
                "{} is under {}% coverage ({:.2}%)",
                file_name, self.threshold, self.actual
            ),
            ViolationScope::Project => format!(
                "Project is under {}% coverage ({:.2}%)",
                self.threshold, self.actual
            ),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Advisory,
    Fatal,
}

impl Outcome {
    pub fn is_fatal(&self) -> bool {
        *self == Outcome::Fatal
    }
}

/// Rendered markdown report plus every threshold violation found
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub module_name: String,
    pub format: ReportFormat,
    pub project_percent: f64,
    pub policy: ThresholdPolicy,
    pub rendered_text: String,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    pub fn outcome(&self) -> Outcome {
        if self.violations.iter().any(Violation::is_fatal) {
            Outcome::Fatal
        } else if self.violations.is_empty() {
            Outcome::Clean
        } else {
            Outcome::Advisory
        }
    }

    pub fn fatal_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_fatal())
    }

    pub fn print_summary(&self) {
        let delta = self.project_percent - self.policy.total_project_threshold;
        let status = if delta >= 0.0 { "✓".green() } else { "✗".red() };
        let delta_str = if delta >= 0.0 {
            format!("+{:.2}%", delta).green()
        } else {
            format!("{:.2}%", delta).red()
        };

        println!(
            "  {} {} coverage: {:.2}% (threshold: {}%, {})",
            status,
            self.module_name.bold(),
            self.project_percent,
            self.policy.total_project_threshold,
            delta_str
        );

        for violation in &self.violations {
            let line = violation.message();
            if violation.is_fatal() {
                println!("  {} {}", "✗".red(), line.red());
            } else {
                println!("  {} {}", "!".yellow(), line.yellow());
            }
        }

        let verdict = match self.outcome() {
            Outcome::Clean => "PASSED".green().bold(),
            Outcome::Advisory => "PASSED WITH WARNINGS".yellow().bold(),
            Outcome::Fatal => "FAILED".red().bold(),
        };
        println!("  {}", verdict);
    }
}

/// Apply the policy to aggregated coverage and render the report
///
/// Every violation is collected; rendering never stops early.
pub fn evaluate(
    result: &CoverageReportResult,
    policy: &ThresholdPolicy,
    module_name: &str,
    format: ReportFormat,
) -> Evaluation {
    let project_percent = result.project_coverage.percent();
    let mut violations = Vec::new();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "## {} Code Coverage ({}): **`{:.2}%`**",
        module_name, format, project_percent
    );

    out.push_str("### Coverage of Modified Files\n\n");
    if result.file_results.is_empty() {
        out.push_str("_No modified files were found in the coverage report._\n");
    } else {
        out.push_str("| File | Coverage |\n");
        out.push_str("|:-----|:-----:|\n");

        // BTreeMap iteration is already sorted by file name
        for (file_name, coverage) in &result.file_results {
            match coverage.counters.percent() {
                Some(percent) => {
                    let _ = writeln!(out, "| `{}` | **`{:.2}%`** |", file_name, percent);
                    if percent < policy.modified_file_threshold {
                        violations.push(Violation {
                            scope: ViolationScope::PerFile {
                                file_name: file_name.clone(),
                            },
                            actual: percent,
                            threshold: policy.modified_file_threshold,
                            severity: Severity::from_flag(policy.fail_if_under_file_threshold),
                        });
                    }
                }
                None => {
                    let _ = writeln!(out, "| `{}` | **`n/a`** |", file_name);
                }
            }
        }
    }

    if !result.unreported_files.is_empty() {
        out.push_str("\n### Modified Files Not Found In Coverage Report\n\n");
        let mut unreported: Vec<&String> = result.unreported_files.iter().collect();
        unreported.sort();
        for file_name in unreported {
            let _ = writeln!(out, "- {}", file_name);
        }
    }

    if project_percent < policy.total_project_threshold {
        violations.push(Violation {
            scope: ViolationScope::Project,
            actual: project_percent,
            threshold: policy.total_project_threshold,
            severity: Severity::from_flag(policy.fail_if_under_project_threshold),
        });
    }

    if !violations.is_empty() {
        out.push_str("\n### Threshold Violations\n\n");
        for violation in &violations {
            let marker = if violation.is_fatal() { "❌" } else { "⚠️" };
            let _ = writeln!(out, "- {} {}", marker, violation.message());
        }
    }

    out.push('\n');
    out.push_str(FOOTER);
    out.push('\n');

    Evaluation {
        module_name: module_name.to_string(),
        format,
        project_percent,
        policy: policy.clone(),
        rendered_text: out,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{CounterEntry, FileCoverage, ProjectCoverage};
    use std::collections::BTreeMap;

    fn result(project: CounterEntry, files: &[(&str, u64, u64)], unreported: &[&str]) -> CoverageReportResult {
        let file_results: BTreeMap<String, FileCoverage> = files
            .iter()
            .map(|(name, missed, covered)| {
                (
                    name.to_string(),
                    FileCoverage {
                        file_name: name.to_string(),
                        counters: CounterEntry::new(*missed, *covered),
                    },
                )
            })
            .collect();
        CoverageReportResult {
            project_coverage: ProjectCoverage { counters: project },
            file_results,
            unreported_files: unreported.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_file_flag_follows_project_flag() {
        let policy = ThresholdPolicy::new(80.0, 95.0, false, None);
        assert!(!policy.fail_if_under_file_threshold);

        let policy = ThresholdPolicy::new(80.0, 95.0, true, None);
        assert!(policy.fail_if_under_file_threshold);

        let policy = ThresholdPolicy::new(80.0, 95.0, true, Some(false));
        assert!(!policy.fail_if_under_file_threshold);
        assert!(policy.fail_if_under_project_threshold);
    }

    #[test]
    fn test_default_policy() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.total_project_threshold, 90.0);
        assert_eq!(policy.modified_file_threshold, 90.0);
        assert!(policy.fail_if_under_project_threshold);
        assert!(policy.fail_if_under_file_threshold);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(ThresholdPolicy::new(101.0, 90.0, true, None).validate().is_err());
        assert!(ThresholdPolicy::new(90.0, -1.0, true, None).validate().is_err());
        assert!(ThresholdPolicy::new(0.0, 100.0, true, None).validate().is_ok());
    }

    #[test]
    fn test_clean_run_at_exact_threshold() {
        let r = result(CounterEntry::new(10, 90), &[("A.kt", 0, 5)], &["B.kt"]);
        let evaluation = evaluate(&r, &ThresholdPolicy::default(), "app", ReportFormat::Jacoco);

        assert!(evaluation.violations.is_empty());
        assert_eq!(evaluation.outcome(), Outcome::Clean);
        assert!(evaluation.rendered_text.contains("**`90.00%`**"));
        assert!(evaluation.rendered_text.contains("| `A.kt` | **`100.00%`** |"));
        assert!(evaluation.rendered_text.contains("- B.kt"));
        assert!(evaluation.rendered_text.trim_end().ends_with(FOOTER));
    }

    #[test]
    fn test_footer_follows_violations() {
        let r = result(CounterEntry::new(50, 50), &[], &[]);
        let text = evaluate(&r, &ThresholdPolicy::default(), "app", ReportFormat::Jacoco).rendered_text;
        assert!(text.find("### Threshold Violations").unwrap() < text.find(FOOTER).unwrap());
        assert!(text.trim_end().ends_with(FOOTER));
    }

    #[test]
    fn test_fatal_file_violation_still_renders_table() {
        let r = result(CounterEntry::new(10, 90), &[("C.kt", 5, 5)], &[]);
        let policy = ThresholdPolicy::new(90.0, 90.0, true, Some(true));
        let evaluation = evaluate(&r, &policy, "app", ReportFormat::Jacoco);

        assert_eq!(evaluation.violations.len(), 1);
        let violation = &evaluation.violations[0];
        assert_eq!(
            violation.scope,
            ViolationScope::PerFile {
                file_name: "C.kt".to_string()
            }
        );
        assert_eq!(violation.severity, Severity::Fatal);
        assert_eq!(evaluation.outcome(), Outcome::Fatal);
        assert!(evaluation.rendered_text.contains("| `C.kt` | **`50.00%`** |"));
    }

    #[test]
    fn test_advisory_violations_do_not_fail() {
        let r = result(CounterEntry::new(50, 50), &[("C.kt", 5, 5)], &[]);
        let policy = ThresholdPolicy::new(90.0, 90.0, false, None);
        let evaluation = evaluate(&r, &policy, "app", ReportFormat::Kover);

        assert_eq!(evaluation.violations.len(), 2);
        assert!(evaluation.violations.iter().all(|v| v.severity == Severity::Advisory));
        assert_eq!(evaluation.outcome(), Outcome::Advisory);
        assert!(evaluation.rendered_text.contains("(Kover)"));
    }

    #[test]
    fn test_severity_per_scope() {
        let r = result(CounterEntry::new(50, 50), &[("C.kt", 5, 5)], &[]);
        let policy = ThresholdPolicy::new(90.0, 90.0, true, Some(false));
        let evaluation = evaluate(&r, &policy, "app", ReportFormat::Jacoco);

        assert_eq!(evaluation.violations[0].severity, Severity::Advisory);
        assert_eq!(evaluation.violations[1].scope, ViolationScope::Project);
        assert_eq!(evaluation.violations[1].severity, Severity::Fatal);
        assert_eq!(evaluation.fatal_violations().count(), 1);
    }

    #[test]
    fn test_rows_and_unreported_sorted() {
        let r = result(
            CounterEntry::new(0, 10),
            &[("b.kt", 0, 1), ("A.kt", 0, 1), ("a.kt", 0, 1)],
            &["z.kt", "M.kt", "c.kt"],
        );
        let text = evaluate(&r, &ThresholdPolicy::default(), "app", ReportFormat::Jacoco).rendered_text;

        let pos = |needle: &str| text.find(needle).unwrap();
        assert!(pos("`A.kt`") < pos("`a.kt`"));
        assert!(pos("`a.kt`") < pos("`b.kt`"));
        assert!(pos("- M.kt") < pos("- c.kt"));
        assert!(pos("- c.kt") < pos("- z.kt"));
    }

    #[test]
    fn test_zero_instruction_file_is_not_evaluated() {
        let r = result(CounterEntry::new(0, 10), &[("Empty.kt", 0, 0)], &[]);
        let evaluation = evaluate(&r, &ThresholdPolicy::default(), "app", ReportFormat::Jacoco);
        assert!(evaluation.violations.is_empty());
        assert!(evaluation.rendered_text.contains("| `Empty.kt` | **`n/a`** |"));
    }
}
