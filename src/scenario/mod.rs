//! Validation scenarios, one per API surface.
//!
//! A scenario takes the run context by value, records outcomes into the
//! run's log, and hands the context back. Contract violations and transport
//! failures become failed outcomes; an `Err` return is reserved for faults
//! the scenario did not anticipate.

use anyhow::{bail, Result};
use async_trait::async_trait;
use thiserror::Error;

use crate::context::RunContext;
use crate::outcome::OutcomeLog;
use crate::schema::{ContractError, Envelope};
use crate::transport::{ApiClient, ApiResponse, TransportError};

pub mod comparison;
pub mod errors;
pub mod health;
pub mod history;
pub mod insights;
pub mod roster;

/// Tag the server must reject as syntactically invalid.
pub const INVALID_PLAYER_TAG: &str = "INVALID123";

#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short selector used on the command line.
    fn name(&self) -> &'static str;

    /// Human-readable title used in section headers and fault outcomes.
    fn title(&self) -> &'static str;

    /// Outcomes recorded into `log` stay there even if the scenario later
    /// errors or panics.
    async fn run(
        &self,
        ctx: RunContext,
        api: &ApiClient,
        log: &mut OutcomeLog,
    ) -> Result<RunContext>;
}

/// Every scenario in execution order.
pub fn all() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(health::HealthScenario),
        Box::new(roster::RosterScenario),
        Box::new(history::HistoryScenario),
        Box::new(comparison::ComparisonScenario),
        Box::new(insights::InsightsScenario),
        Box::new(errors::ErrorHandlingScenario),
    ]
}

/// Scenarios named in `only`, in execution order. Empty `only` selects all.
pub fn select(only: &[String]) -> Result<Vec<Box<dyn Scenario>>> {
    let scenarios = all();
    if only.is_empty() {
        return Ok(scenarios);
    }

    let known: Vec<&str> = scenarios.iter().map(|s| s.name()).collect();
    let unknown: Vec<&str> = only
        .iter()
        .map(String::as_str)
        .filter(|n| !known.contains(n))
        .collect();
    if !unknown.is_empty() {
        bail!(
            "unknown scenario(s): {} (known: {})",
            unknown.join(", "),
            known.join(", ")
        );
    }

    Ok(scenarios
        .into_iter()
        .filter(|s| only.iter().any(|n| n == s.name()))
        .collect())
}

pub(crate) fn section(title: &str) {
    println!("\n=== Testing {title} ===");
}

/// Either side of a failed check: the call never completed, or it
/// completed and broke the contract.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub(crate) fn expect_status(resp: &ApiResponse, accepted: &[u16]) -> Result<(), ContractError> {
    if accepted.contains(&resp.status) {
        return Ok(());
    }
    let expected = accepted
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    Err(ContractError::Status {
        expected,
        actual: resp.status,
        body: resp.body_excerpt(),
    })
}

/// GET that must answer 200 with `success: true`.
pub(crate) async fn fetch_success(
    api: &ApiClient,
    path: &str,
    query: &[(&str, &str)],
) -> Result<(ApiResponse, Envelope), CheckError> {
    let resp = api.get(path, query).await?;
    expect_status(&resp, &[200])?;
    let envelope = Envelope::successful(resp.json()?)?;
    Ok((resp, envelope))
}

/// GET whose status must be one of `accepted`; the body is not inspected.
pub(crate) async fn fetch_status(
    api: &ApiClient,
    path: &str,
    query: &[(&str, &str)],
    accepted: &[u16],
) -> Result<u16, CheckError> {
    let resp = api.get(path, query).await?;
    expect_status(&resp, accepted)?;
    Ok(resp.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Body;

    #[test]
    fn execution_order_is_fixed() {
        let names: Vec<_> = all().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["health", "roster", "history", "comparison", "insights", "errors"]
        );
    }

    #[test]
    fn selection_keeps_execution_order() {
        let picked = select(&["comparison".to_string(), "roster".to_string()]).unwrap();
        let names: Vec<_> = picked.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["roster", "comparison"]);
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let Err(err) = select(&["leaderboard".to_string()]) else {
            panic!("expected an unknown scenario error");
        };
        assert!(err.to_string().contains("unknown scenario(s): leaderboard"));
    }

    #[test]
    fn status_mismatch_names_all_accepted_codes() {
        let resp = ApiResponse {
            url: "http://x/api/player//history".to_string(),
            status: 500,
            body: Body::Text("boom".to_string()),
        };
        let err = expect_status(&resp, &[400, 404]).unwrap_err();
        assert_eq!(err.to_string(), "expected HTTP 400 or 404, got 500: boom");
    }
}
