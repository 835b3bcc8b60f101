//! Text and JSON rendering of a finished run.
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use shardsim_rebalance::{sample_evenly, AnalysisResult, BoxSummary, SimulationReport};

/// Initial and final snapshots plus box summaries of `samples` evenly spaced snapshots.
pub struct Summary<'a> {
    report: &'a SimulationReport,
    samples: usize,
}

/// Text summary of `report`, printed through [`fmt::Display`].
pub fn render(report: &SimulationReport, samples: usize) -> Summary<'_> {
    Summary { report, samples }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        if let Some(first) = report.history.first() {
            writeln!(f, "initial:\n{first}\n")?;
        }
        if let Some(last) = report.history.last() {
            writeln!(f, "final:\n{last}\n")?;
        }
        writeln!(f, "rounds applied: {}, skipped: {}", report.rounds_applied, report.rounds_skipped)?;

        let indexed: Vec<(usize, &AnalysisResult)> = report.history.iter().enumerate().collect();
        let picked = sample_evenly(&indexed, self.samples);
        writeln!(f, "\ningester loads    [min | q1 median q3 | max]")?;
        write_boxes(f, &picked, |a| a.ingester_loads.box_summary())?;
        writeln!(f, "ingester tenants  [min | q1 median q3 | max]")?;
        write_boxes(f, &picked, |a| a.ingester_tenant_counts.box_summary())
    }
}

fn write_boxes(
    f: &mut fmt::Formatter<'_>,
    picked: &[&(usize, &AnalysisResult)],
    summary: impl Fn(&AnalysisResult) -> Option<BoxSummary>,
) -> fmt::Result {
    for (idx, a) in picked {
        if let Some(b) = summary(*a) {
            writeln!(f, "  #{idx:<6} {b}")?;
        }
    }
    Ok(())
}

/// Write the full report as pretty JSON.
pub fn write_json(report: &SimulationReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
