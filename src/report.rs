//! Run summary, console rendering, and the persisted JSON report.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outcome::TestOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Percentage of passed outcomes; 0 for an empty run.
    pub success_rate: f64,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[TestOutcome]) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };
        Self {
            total,
            passed,
            failed: total - passed,
            success_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub results: Vec<TestOutcome>,
}

impl RunReport {
    pub fn from_outcomes(results: Vec<TestOutcome>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            summary: Summary::from_outcomes(&results),
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.results.iter().filter(|o| !o.passed)
    }

    /// 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.summary.failed == 0 {
            0
        } else {
            1
        }
    }

    /// Human-readable summary with every failure listed.
    pub fn render_summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = format!(
            "\n{rule}\n📊 TEST SUMMARY\n{rule}\nTotal Tests: {}\nPassed: {} ✅\nFailed: {} ❌\nSuccess Rate: {:.1}%\n",
            self.summary.total, self.summary.passed, self.summary.failed, self.summary.success_rate,
        );
        if self.summary.failed > 0 {
            out.push_str("\n❌ FAILED TESTS:\n");
            for f in self.failures() {
                out.push_str(&format!("  - {}: {}\n", f.name, f.detail));
            }
        }
        out.push_str(&format!("\n{rule}"));
        out
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create report directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}
