use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use feruca::Collator;
use tracing::info;

use crate::models::{CompetitionResult, EventData};

/// Receives the full accumulator after every collected event.
pub trait Checkpoint {
    fn save(&mut self, events: &[EventData]) -> Result<()>;
}

/// Generated TypeScript module holding every scraped result.
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Checkpoint for ResultsFile {
    fn save(&mut self, events: &[EventData]) -> Result<()> {
        let source = render(events, Utc::now())?;
        write_replacing(&self.path, &source)?;
        info!(
            "Wrote {} results from {} events to {}",
            events.iter().map(|e| e.results.len()).sum::<usize>(),
            events.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Write to a sibling temp file then rename over the target, so a crash
/// mid-write leaves the previous checkpoint in place.
fn write_replacing(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// All results across events, ordered by lifter name under the CLDR root
/// collation. Identical names keep scrape order.
pub fn sorted_results(events: &[EventData]) -> Vec<&CompetitionResult> {
    let mut all: Vec<&CompetitionResult> = events.iter().flat_map(|e| &e.results).collect();
    let mut collator = Collator::default();
    all.sort_by(|a, b| collator.collate(a.lifter.as_str(), b.lifter.as_str()));
    all
}

pub fn render(events: &[EventData], generated_at: DateTime<Utc>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "// This file is auto-generated by lift_results. Do not edit by hand.")?;
    writeln!(
        out,
        "// Last updated: {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out)?;

    writeln!(out, "export interface CompetitionResult {{")?;
    writeln!(out, "  lifter: string;")?;
    for (name, _) in CompetitionResult::default().numeric_fields() {
        writeln!(out, "  {}: number;", name)?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "export const competitionResults: CompetitionResult[] = [")?;
    for result in sorted_results(events) {
        render_entry(&mut out, result)?;
    }
    writeln!(out, "];")?;
    Ok(out)
}

fn render_entry(out: &mut String, result: &CompetitionResult) -> Result<()> {
    writeln!(out, "  {{")?;
    writeln!(out, "    lifter: {},", serde_json::to_string(&result.lifter)?)?;
    for (name, value) in result.numeric_fields() {
        writeln!(out, "    {}: {},", name, value)?;
    }
    writeln!(out, "  }},")?;
    Ok(())
}
