//! Terminal output

use anyhow::Result;
use colored::Colorize;

use super::ReviewSurface;
use crate::coverage::Evaluation;

/// Prints the markdown report followed by a colored verdict
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    /// Only print the summary, not the markdown body
    pub quiet: bool,
}

impl ReviewSurface for ConsoleSurface {
    fn publish(&mut self, evaluation: &Evaluation) -> Result<()> {
        if !self.quiet {
            println!("{}", evaluation.rendered_text);
        }

        println!("{}", "━".repeat(50).dimmed());
        evaluation.print_summary();
        Ok(())
    }
}
