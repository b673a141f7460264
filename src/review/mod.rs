//! Review surface module
//!
//! Provides:
//! - Console output
//! - Markdown file output
//! - GitHub pull-request comments

mod console;
mod github;
mod markdown;

pub use console::*;
pub use github::*;
pub use markdown::*;

use anyhow::Result;

use crate::coverage::Evaluation;

/// Where a rendered coverage report is delivered
pub trait ReviewSurface {
    fn publish(&mut self, evaluation: &Evaluation) -> Result<()>;
}

/// Publish to every surface, collecting failures instead of stopping at the first
pub fn publish_all(surfaces: &mut [Box<dyn ReviewSurface>], evaluation: &Evaluation) -> Result<()> {
    let mut errors = Vec::new();

    for surface in surfaces.iter_mut() {
        if let Err(e) = surface.publish(evaluation) {
            errors.push(e.to_string());
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Publishing errors: {}", errors.join(", "));
    }

    Ok(())
}
