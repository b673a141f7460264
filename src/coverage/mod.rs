//! Coverage module
//!
//! Provides:
//! - Jacoco/Kover XML parsing
//! - Aggregation over the files touched by a change
//! - Threshold policy evaluation and markdown rendering

mod aggregator;
mod policy;
mod parser;

pub use aggregator::*;
pub use policy::*;
pub use parser::*;

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::error::ShroudError;

/// Missed/covered instruction counts from a single `counter` element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterEntry {
    pub missed: u64,
    pub covered: u64,
}

impl CounterEntry {
    pub fn new(missed: u64, covered: u64) -> Self {
        Self { missed, covered }
    }

    pub fn total(&self) -> u64 {
        self.missed + self.covered
    }

    /// Covered share in percent, `None` when there is nothing to cover
    pub fn percent(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.covered as f64 * 100.0) / total as f64)
    }
}

impl Add for CounterEntry {
    type Output = CounterEntry;

    fn add(self, other: CounterEntry) -> CounterEntry {
        CounterEntry {
            missed: self.missed + other.missed,
            covered: self.covered + other.covered,
        }
    }
}

impl Sum for CounterEntry {
    fn sum<I: Iterator<Item = CounterEntry>>(iter: I) -> Self {
        iter.fold(CounterEntry::default(), Add::add)
    }
}

/// Coverage of one source file, summed over every class declared in it
#[derive(Debug, Clone, PartialEq)]
pub struct FileCoverage {
    pub file_name: String,
    pub counters: CounterEntry,
}

/// Whole-report coverage, read from the root instruction counter
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCoverage {
    pub counters: CounterEntry,
}

impl ProjectCoverage {
    /// Project percentage; construction guarantees a non-zero total
    pub fn percent(&self) -> f64 {
        self.counters.percent().unwrap_or(0.0)
    }
}

/// Tool that produced the report. Both share the same XML shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Jacoco,
    Kover,
}

impl ReportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ReportFormat::Jacoco => "Jacoco",
            ReportFormat::Kover => "Kover",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportFormat {
    type Err = ShroudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jacoco" => Ok(ReportFormat::Jacoco),
            "kover" => Ok(ReportFormat::Kover),
            _ => Err(ShroudError::configuration(format!(
                "Unknown coverage format: {}. Supported: jacoco, kover",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_percent() {
        let counter = CounterEntry::new(10, 90);
        assert_eq!(counter.total(), 100);
        assert!((counter.percent().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_counter_has_no_percent() {
        assert_eq!(CounterEntry::new(0, 0).percent(), None);
    }

    #[test]
    fn test_counters_sum() {
        let sum: CounterEntry = vec![CounterEntry::new(1, 2), CounterEntry::new(3, 4)]
            .into_iter()
            .sum();
        assert_eq!(sum, CounterEntry::new(4, 6));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("KOVER".parse::<ReportFormat>().unwrap(), ReportFormat::Kover);
        assert_eq!("jacoco".parse::<ReportFormat>().unwrap(), ReportFormat::Jacoco);
        assert!("lcov".parse::<ReportFormat>().is_err());
    }
}
