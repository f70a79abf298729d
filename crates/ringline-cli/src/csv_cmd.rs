use std::path::Path;

use anyhow::Context;

use ringline_core::{summarize, BatchValidator, Config, Normalizer};

/// Validate a batch file locally and print the summary. No network access.
///
/// Fails when the file is malformed or contains invalid rows.
pub fn run(config: &Config, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let report = check(config, &content)?;
    print!("{report}");

    if report.invalid > 0 {
        anyhow::bail!("{} invalid row(s) in {}", report.invalid, path.display());
    }
    Ok(())
}

struct Report {
    summary: String,
    invalid: usize,
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary)
    }
}

fn check(config: &Config, content: &str) -> anyhow::Result<Report> {
    let validator = BatchValidator::new(Normalizer::from_config(config));
    let result = validator.parse_and_validate(content)?;
    Ok(Report {
        summary: summarize(&result),
        invalid: result.invalid_rows.len(),
    })
}
