//! Shroud - coverage gate for code review
//!
//! Reads a Jacoco or Kover XML report and checks it against the files a
//! change touches:
//! - Whole-project instruction coverage from the report's root counter
//! - Per-file coverage for every modified or added file found in the report
//! - Fatal or advisory threshold violations, rendered as a markdown report

pub mod config;
pub mod coverage;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod review;

pub use coverage::{
    aggregate, evaluate, CounterEntry, CoverageDocument, CoverageReportResult, Evaluation,
    Outcome, ReportFormat, Severity, ThresholdPolicy, TouchedFileSet, Violation, ViolationScope,
};
pub use error::{Result, ShroudError};
pub use git::{ChangeProvider, ChangeSet, GitDiff};
pub use pipeline::{report, ReportRequest};
pub use review::{ConsoleSurface, GithubCommentSurface, MarkdownFileSurface, ReviewSurface};
