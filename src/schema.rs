//! Typed response contracts for the dashboard endpoints.
//!
//! A body is first checked for every required key (all missing keys are
//! reported together), then deserialized into its typed schema. Extra keys
//! are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ContractError {
    #[error("expected HTTP {expected}, got {actual}: {body}")]
    Status {
        expected: String,
        actual: u16,
        body: String,
    },

    #[error("API returned error: {0}")]
    Unsuccessful(String),

    #[error("{context} missing required fields: {}", .fields.join(", "))]
    MissingFields {
        context: &'static str,
        fields: Vec<String>,
    },

    #[error("{context} has unexpected shape: {reason}")]
    Shape {
        context: &'static str,
        reason: String,
    },
}

/// A schema with a named set of keys that must be present.
pub trait Contract: DeserializeOwned {
    const NAME: &'static str;
    const REQUIRED: &'static [&'static str];
}

/// Keys from `required` absent from `value` (all of them when `value` is
/// not an object).
pub fn missing_fields(value: &Value, required: &[&str]) -> Vec<String> {
    match value.as_object() {
        Some(map) => required
            .iter()
            .filter(|k| !map.contains_key(**k))
            .map(|k| k.to_string())
            .collect(),
        None => required.iter().map(|k| k.to_string()).collect(),
    }
}

/// Validate `value` against `T`'s contract and return the typed value.
pub fn check<T: Contract>(value: &Value) -> Result<T, ContractError> {
    if !value.is_object() {
        return Err(ContractError::Shape {
            context: T::NAME,
            reason: format!("expected an object, got {}", kind_of(value)),
        });
    }
    let missing = missing_fields(value, T::REQUIRED);
    if !missing.is_empty() {
        return Err(ContractError::MissingFields {
            context: T::NAME,
            fields: missing,
        });
    }
    T::deserialize(value).map_err(|e| ContractError::Shape {
        context: T::NAME,
        reason: e.to_string(),
    })
}

pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// `{success, data, meta?, error?}` wrapper shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub meta: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Contract for Envelope {
    const NAME: &'static str = "envelope";
    const REQUIRED: &'static [&'static str] = &["success"];
}

impl Envelope {
    /// Parse and require `success == true`.
    pub fn successful(body: &Value) -> Result<Self, ContractError> {
        let envelope: Self = check(body)?;
        if !envelope.success {
            let msg = match &envelope.error {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "Unknown error".to_string(),
            };
            return Err(ContractError::Unsuccessful(msg));
        }
        Ok(envelope)
    }

    /// The `data` member, which must be present and non-null.
    pub fn data(&self) -> Result<&Value, ContractError> {
        match &self.data {
            Some(v) if !v.is_null() => Ok(v),
            _ => Err(ContractError::MissingFields {
                context: Self::NAME,
                fields: vec!["data".to_string()],
            }),
        }
    }

    /// The `meta` member, or an empty object.
    pub fn meta(&self) -> Value {
        self.meta.clone().unwrap_or_else(|| Value::Object(Default::default()))
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HealthData {
    #[serde(rename = "hasCoC")]
    pub has_coc: bool,
    #[serde(rename = "hasOpenAI")]
    pub has_openai: bool,
}

impl Contract for HealthData {
    const NAME: &'static str = "health data";
    const REQUIRED: &'static [&'static str] = &["hasCoC", "hasOpenAI"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct McpHealthData {
    pub tools: Vec<Value>,
}

impl Contract for McpHealthData {
    const NAME: &'static str = "MCP health data";
    const REQUIRED: &'static [&'static str] = &["tools"];
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RosterData {
    pub clan: ClanInfo,
    pub snapshot: Option<SnapshotInfo>,
    /// Kept raw so each member can be checked on its own.
    pub members: Vec<Value>,
}

impl Contract for RosterData {
    const NAME: &'static str = "roster data";
    const REQUIRED: &'static [&'static str] = &["clan", "snapshot", "members"];
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClanInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotInfo {
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub tag: String,
    pub name: String,
    pub trophies: i64,
    pub donations: i64,
    pub donations_received: i64,
    pub role: String,
}

impl Contract for RosterMember {
    const NAME: &'static str = "roster member";
    const REQUIRED: &'static [&'static str] =
        &["tag", "name", "trophies", "donations", "donationsReceived", "role"];
}

/// Optional member keys that indicate activity data is being collected.
pub const ACTIVITY_SIGNALS: &[&str] = &[
    "rankedLeagueId",
    "rankedTrophies",
    "bk",
    "aq",
    "gw",
    "rc",
    "mp",
];

pub fn activity_signals_present(member: &Value) -> Vec<&'static str> {
    ACTIVITY_SIGNALS
        .iter()
        .copied()
        .filter(|k| member.get(*k).is_some())
        .collect()
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: String,
    pub trophies: i64,
    pub donations: i64,
    pub donations_received: i64,
    #[serde(default)]
    pub deltas: Option<Value>,
}

impl Contract for HistoryPoint {
    const NAME: &'static str = "history entry";
    const REQUIRED: &'static [&'static str] = &["date", "trophies", "donations", "donationsReceived"];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMeta {
    pub snapshots_found: u64,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub player_tag: Option<String>,
}

impl Contract for HistoryMeta {
    const NAME: &'static str = "history meta";
    const REQUIRED: &'static [&'static str] = &["snapshotsFound"];
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// The six metrics every comparison must carry.
pub const COMPARISON_METRICS: &[&str] = &[
    "trophies",
    "donations",
    "donationsReceived",
    "warStars",
    "clanCapitalContributions",
    "donationRatio",
];

/// Every key must be present, but only `percentile` must carry a number.
/// The dashboard sends `null` for values it cannot compute, such as a
/// donation ratio with nothing received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub player_value: Option<f64>,
    pub clan_average: Option<f64>,
    pub clan_median: Option<f64>,
    pub percentile: f64,
    pub rank: Option<i64>,
    pub total_players: Option<i64>,
}

impl Contract for MetricComparison {
    const NAME: &'static str = "comparison metric";
    const REQUIRED: &'static [&'static str] = &[
        "playerValue",
        "clanAverage",
        "clanMedian",
        "percentile",
        "rank",
        "totalPlayers",
    ];
}

#[derive(Debug, Clone)]
pub struct ComparisonData {
    /// In [`COMPARISON_METRICS`] order.
    pub metrics: Vec<(&'static str, MetricComparison)>,
    pub town_hall_comparison: Option<Value>,
    pub role_comparison: Option<Value>,
}

impl ComparisonData {
    /// Checks every metric and reports all gaps as `metric.field` paths.
    pub fn from_value(data: &Value) -> Result<Self, ContractError> {
        const CONTEXT: &str = "comparison data";

        let missing = missing_fields(data, COMPARISON_METRICS);
        if !missing.is_empty() {
            return Err(ContractError::MissingFields {
                context: CONTEXT,
                fields: missing,
            });
        }

        let mut metrics = Vec::with_capacity(COMPARISON_METRICS.len());
        let mut gaps = Vec::new();
        for metric in COMPARISON_METRICS {
            match check::<MetricComparison>(&data[*metric]) {
                Ok(m) => metrics.push((*metric, m)),
                Err(ContractError::MissingFields { fields, .. }) => {
                    gaps.extend(fields.into_iter().map(|f| format!("{metric}.{f}")));
                }
                Err(ContractError::Shape { reason, .. }) => {
                    return Err(ContractError::Shape {
                        context: CONTEXT,
                        reason: format!("{metric}: {reason}"),
                    });
                }
                Err(other) => return Err(other),
            }
        }
        if !gaps.is_empty() {
            return Err(ContractError::MissingFields {
                context: CONTEXT,
                fields: gaps,
            });
        }

        Ok(Self {
            metrics,
            town_hall_comparison: data.get("townHallComparison").cloned(),
            role_comparison: data.get("roleComparison").cloned(),
        })
    }

    /// Metrics whose percentile falls outside `[0, 100]`.
    pub fn out_of_range_percentiles(&self) -> Vec<(&'static str, f64)> {
        self.metrics
            .iter()
            .filter(|(_, m)| !(0.0..=100.0).contains(&m.percentile))
            .map(|(name, m)| (*name, m.percentile))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMeta {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub clan_size: Option<i64>,
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsData {
    pub clan_tag: String,
    #[serde(default)]
    pub snapshot_date: Option<String>,
    pub smart_insights_payload: Option<Value>,
}

impl Contract for InsightsData {
    const NAME: &'static str = "insights data";
    const REQUIRED: &'static [&'static str] = &["clanTag", "smartInsightsPayload"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightsPayload {
    pub metadata: serde_json::Map<String, Value>,
}

impl Contract for InsightsPayload {
    const NAME: &'static str = "insights payload";
    const REQUIRED: &'static [&'static str] = &["metadata"];
}
