//! Markdown file output

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::ReviewSurface;
use crate::coverage::Evaluation;

/// Writes the rendered report to a file, for CI steps that post it themselves
#[derive(Debug)]
pub struct MarkdownFileSurface {
    path: PathBuf,
}

impl MarkdownFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReviewSurface for MarkdownFileSurface {
    fn publish(&mut self, evaluation: &Evaluation) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, &evaluation.rendered_text)
            .with_context(|| format!("Failed to write report to {}", self.path.display()))?;
        log::info!("Coverage report written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{
        aggregate, evaluate, CoverageDocument, ReportFormat, ThresholdPolicy, TouchedFileSet,
    };
    use tempfile::tempdir;

    #[test]
    fn test_writes_rendered_text() {
        let doc = CoverageDocument::parse(
            r#"<report><counter type="INSTRUCTION" missed="1" covered="3"/></report>"#,
        )
        .unwrap();
        let result = aggregate(&doc, &TouchedFileSet::from_names(vec!["A.kt"])).unwrap();
        let evaluation = evaluate(&result, &ThresholdPolicy::default(), "app", ReportFormat::Jacoco);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out/coverage.md");
        MarkdownFileSurface::new(&path).publish(&evaluation).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, evaluation.rendered_text);
        assert!(written.contains("75.00%"));
    }
}
