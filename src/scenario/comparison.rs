//! `/api/player/{tag}/comparison`: six metrics, percentile bounds, optional
//! breakdowns, invalid tag rejection.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{
    fetch_status, fetch_success, section, CheckError, Scenario, INVALID_PLAYER_TAG,
};
use crate::context::RunContext;
use crate::outcome::{OutcomeLog, TestOutcome};
use crate::schema::{ComparisonData, ComparisonMeta};
use crate::transport::ApiClient;

pub struct ComparisonScenario;

pub fn comparison_path(tag: &str) -> String {
    format!("/api/player/{tag}/comparison")
}

#[async_trait]
impl Scenario for ComparisonScenario {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn title(&self) -> &'static str {
        "Player Comparison API"
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
                "Player Comparison API",
                "No player tag available for testing (roster API may have failed)",
            );
            return Ok(ctx);
        };

        match fetch_comparison(api, &tag).await {
            Ok((data, meta)) => record_comparison(log, &data, &meta),
            Err(e) => log.fail("Player Comparison API Structure", e.to_string()),
        }

        match fetch_status(api, &comparison_path(INVALID_PLAYER_TAG), &[], &[400]).await {
            Ok(_) => log.pass(
                "Player Comparison API Invalid Tag",
                "API correctly rejected invalid player tag",
            ),
            Err(e) => log.fail(
                "Player Comparison API Invalid Tag",
                format!("API should reject invalid tags with 400: {e}"),
            ),
        }

        Ok(ctx)
    }
}

async fn fetch_comparison(
    api: &ApiClient,
    tag: &str,
) -> Result<(ComparisonData, ComparisonMeta), CheckError> {
    let (_, envelope) = fetch_success(api, &comparison_path(tag), &[]).await?;
    let data = ComparisonData::from_value(envelope.data()?)?;
    // meta is informational only
    let meta: ComparisonMeta = serde_json::from_value(envelope.meta()).unwrap_or_default();
    Ok((data, meta))
}

fn record_comparison(log: &mut OutcomeLog, data: &ComparisonData, meta: &ComparisonMeta) {
    let sample_metric = &data.metrics[0].1;
    log.record(
        TestOutcome::pass(
            "Player Comparison API Structure",
            format!(
                "Comparison API returned all required metrics with proper structure. Player: {}",
                meta.player_name.as_deref().unwrap_or("Unknown")
            ),
        )
        .with_sample(json!({
            "player_name": meta.player_name,
            "clan_size": meta.clan_size,
            "sample_percentile": sample_metric.percentile,
            "sample_rank": sample_metric.rank,
        })),
    );

    let percentiles: Map<String, Value> = data
        .metrics
        .iter()
        .map(|(name, m)| (name.to_string(), json!(m.percentile)))
        .collect();
    let out_of_range = data.out_of_range_percentiles();
    let detail = if out_of_range.is_empty() {
        "Percentile calculations are within valid range (0-100)".to_string()
    } else {
        let listed: Vec<String> = out_of_range
            .iter()
            .map(|(name, p)| format!("{name}={p}"))
            .collect();
        format!("Percentiles outside 0-100: {}", listed.join(", "))
    };
    log.record(
        TestOutcome::new("Player Comparison Percentiles", out_of_range.is_empty(), detail)
            .with_sample(Value::Object(percentiles)),
    );

    log.record(
        TestOutcome::pass(
            "Player Comparison Additional Data",
            format!(
                "Additional comparisons - Town Hall: {}, Role: {}",
                data.town_hall_comparison.is_some(),
                data.role_comparison.is_some()
            ),
        )
        .with_sample(json!({
            "townHallComparison": data.town_hall_comparison,
            "roleComparison": data.role_comparison,
        })),
    );
}
