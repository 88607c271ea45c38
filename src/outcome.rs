//! Per-check outcomes and the append-only log that records them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a single validation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
    /// Payload excerpt kept for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<Value>,
}

impl TestOutcome {
    pub fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
            recorded_at: Utc::now(),
            sample: None,
        }
    }

    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, true, detail)
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, false, detail)
    }

    pub fn with_sample(mut self, sample: Value) -> Self {
        self.sample = Some(sample);
        self
    }

    /// One-line console rendering.
    pub fn line(&self) -> String {
        let status = if self.passed { "✅ PASS" } else { "❌ FAIL" };
        format!("{} {}: {}", status, self.name, self.detail)
    }
}

/// Ordered outcomes of one run. Each outcome is printed as it is
/// recorded and never modified afterwards.
#[derive(Debug, Default)]
pub struct OutcomeLog {
    outcomes: Vec<TestOutcome>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TestOutcome) {
        println!("{}", outcome.line());
        self.outcomes.push(outcome);
    }

    pub fn pass(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.record(TestOutcome::pass(name, detail));
    }

    pub fn fail(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.record(TestOutcome::fail(name, detail));
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn into_outcomes(self) -> Vec<TestOutcome> {
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_preserves_recording_order() {
        let mut log = OutcomeLog::new();
        log.pass("first", "ok");
        log.fail("second", "nope");
        log.record(TestOutcome::pass("third", "ok").with_sample(json!({"n": 3})));

        let outcomes = log.into_outcomes();
        let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert!(!outcomes[1].passed);
        assert_eq!(outcomes[2].sample, Some(json!({"n": 3})));
    }

    #[test]
    fn serializes_timestamp_as_rfc3339_and_omits_empty_sample() {
        let outcome = TestOutcome::fail("Health Endpoint Basic", "HTTP 500");
        let value = serde_json::to_value(&outcome).unwrap();

        let stamp = value["recordedAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(value["passed"], json!(false));
        assert!(value.get("sample").is_none());
    }

    #[test]
    fn line_marks_status() {
        assert!(TestOutcome::pass("a", "b").line().contains("PASS a: b"));
        assert!(TestOutcome::fail("a", "b").line().contains("FAIL a: b"));
    }
}
