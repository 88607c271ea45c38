//! `/api/player/{tag}/history` across day windows, the window clamp, and
//! invalid tag rejection.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    fetch_status, fetch_success, section, CheckError, Scenario, INVALID_PLAYER_TAG,
};
use crate::context::RunContext;
use crate::outcome::{OutcomeLog, TestOutcome};
use crate::schema::{check, kind_of, ContractError, HistoryMeta, HistoryPoint};
use crate::transport::ApiClient;

/// Windows exercised in order.
pub const WINDOWS: [u32; 3] = [30, 60, 90];

/// Largest window the server may honour.
pub const MAX_DAYS: i64 = 90;

/// Requested to verify the server clamps to [`MAX_DAYS`].
const OVERSIZED_WINDOW: u32 = 200;

pub struct HistoryScenario;

pub fn history_path(tag: &str) -> String {
    format!("/api/player/{tag}/history")
}

#[async_trait]
impl Scenario for HistoryScenario {
    fn name(&self) -> &'static str {
        "history"
    }

    fn title(&self) -> &'static str {
        "Player History API"
    }

    async fn run(
        &self,
        ctx: RunContext,
        api: &ApiClient,
        log: &mut OutcomeLog,
    ) -> Result<RunContext> {
        section(self.title());

        let Some(tag) = ctx.discovered_player_tag.clone() else {
            log.fail(
                "Player History API",
                "No player tag available for testing (roster API may have failed)",
            );
            return Ok(ctx);
        };
        let path = history_path(&tag);

        for days in WINDOWS {
            let window = days.to_string();
            match fetch_series(api, &path, &window).await {
                Ok((series, meta)) => {
                    log.record(
                        TestOutcome::pass(
                            format!("Player History API ({days} days)"),
                            format!(
                                "History API returned {} data points for {days} days. Snapshots found: {}",
                                series.len(),
                                meta.snapshots_found
                            ),
                        )
                        .with_sample(json!({
                            "days_requested": days,
                            "data_points": series.len(),
                            "snapshots_found": meta.snapshots_found,
                            "player_tag": meta.player_tag,
                        })),
                    );
                    if !series.is_empty() {
                        log.record(series_structure(days, &series));
                    }
                }
                Err(e) => log.fail(format!("Player History API ({days} days)"), e.to_string()),
            }
        }

        let window = OVERSIZED_WINDOW.to_string();
        match fetch_series(api, &path, &window).await {
            Ok((_, meta)) => match meta.days {
                Some(d) if d <= MAX_DAYS => log.pass(
                    "Player History API Validation",
                    format!("API correctly limited days to {d} (max {MAX_DAYS})"),
                ),
                Some(d) => log.fail(
                    "Player History API Validation",
                    format!("API did not limit days parameter: {d}"),
                ),
                None => log.fail(
                    "Player History API Validation",
                    "meta.days missing, cannot confirm the window was clamped",
                ),
            },
            Err(e) => log.fail("Player History API Validation", e.to_string()),
        }

        match fetch_status(api, &history_path(INVALID_PLAYER_TAG), &[], &[400]).await {
            Ok(_) => log.pass(
                "Player History API Invalid Tag",
                "API correctly rejected invalid player tag",
            ),
            Err(e) => log.fail(
                "Player History API Invalid Tag",
                format!("API should reject invalid tags with 400: {e}"),
            ),
        }

        Ok(ctx)
    }
}

async fn fetch_series(
    api: &ApiClient,
    path: &str,
    days: &str,
) -> Result<(Vec<Value>, HistoryMeta), CheckError> {
    let (_, envelope) = fetch_success(api, path, &[("days", days)]).await?;
    let series = match envelope.data.clone().unwrap_or(Value::Null) {
        Value::Array(items) => items,
        other => {
            return Err(ContractError::Shape {
                context: "history data",
                reason: format!("expected a list, got {}", kind_of(&other)),
            }
            .into())
        }
    };
    let meta = check::<HistoryMeta>(&envelope.meta())?;
    Ok((series, meta))
}

/// Every entry needs the core fields; every entry after the first needs a
/// `deltas` object.
fn series_structure(days: u32, series: &[Value]) -> TestOutcome {
    let mut field_problems = Vec::new();
    let mut delta_problems = Vec::new();
    for (idx, entry) in series.iter().enumerate() {
        match check::<HistoryPoint>(entry) {
            Ok(point) if idx > 0 && !point.deltas.as_ref().is_some_and(Value::is_object) => {
                delta_problems.push(format!("entry {idx}: missing deltas"));
            }
            Ok(_) => {}
            Err(e) => field_problems.push(format!("entry {idx}: {e}")),
        }
    }

    let has_required = field_problems.is_empty();
    let has_deltas = series.len() > 1 && delta_problems.is_empty();
    let mut detail = format!(
        "History data structure check. Required fields: {has_required}, Has deltas: {has_deltas}"
    );
    if let Some(first) = field_problems.first().or(delta_problems.first()) {
        detail.push_str(&format!(". First problem: {first}"));
    }

    TestOutcome::new(
        format!("Player History Data Structure ({days} days)"),
        has_required && delta_problems.is_empty(),
        detail,
    )
    .with_sample(series[0].clone())
}
