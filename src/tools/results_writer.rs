use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use super::Tool;

const BANNER_WIDTH: usize = 80;

/// Saves the crew output to a plain-text results file.
pub struct ResultsWriter;

impl ResultsWriter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the crew output in the results file banners.
    pub fn format_results(output: &str, generated_at: DateTime<Local>) -> String {
        let rule = "=".repeat(BANNER_WIDTH);
        let mut text = String::new();

        text.push_str(&format!("{}\nTEACHER ASSISTANT CREW - RESULTS\n{}\n", rule, rule));
        text.push_str(&format!("Generated: {}\n\n", generated_at.format("%Y-%m-%d %H:%M:%S")));
        text.push_str(output);
        text.push_str(&format!("\n\n{}\nEnd of Results\n{}\n", rule, rule));

        text
    }
}

#[async_trait::async_trait]
impl Tool for ResultsWriter {
    type Input = (String, PathBuf);
    type Output = PathBuf;

    fn name(&self) -> &str {
        "results_writer"
    }

    async fn run(&self, input: (String, PathBuf)) -> Result<PathBuf> {
        let (output, path) = input;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }

        std::fs::write(&path, Self::format_results(&output, Local::now()))
            .with_context(|| format!("Failed to write results: {}", path.display()))?;

        log::info!("ResultsWriter: saved {}", path.display());
        Ok(absolute_or_given(&path))
    }
}

fn absolute_or_given(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
