//! Routing-level error handling: undefined routes and empty identifiers.

use anyhow::Result;
use async_trait::async_trait;

use super::{fetch_status, section, Scenario};
use crate::context::RunContext;
use crate::outcome::OutcomeLog;
use crate::transport::ApiClient;

pub struct ErrorHandlingScenario;

#[async_trait]
impl Scenario for ErrorHandlingScenario {
    fn name(&self) -> &'static str {
        "errors"
    }

    fn title(&self) -> &'static str {
        "Error Handling"
    }

    async fn run(
        &self,
        ctx: RunContext,
        api: &ApiClient,
        log: &mut OutcomeLog,
    ) -> Result<RunContext> {
        section(self.title());

        match fetch_status(api, "/api/nonexistent", &[], &[404]).await {
            Ok(_) => log.pass("Error Handling - 404", "Non-existent endpoints return 404"),
            Err(e) => log.fail("Error Handling - 404", e.to_string()),
        }

        match fetch_status(api, "/api/player//history", &[], &[400, 404]).await {
            Ok(status) => log.pass(
                "Error Handling - Malformed",
                format!("Malformed requests handled properly ({status})"),
            ),
            Err(e) => log.fail("Error Handling - Malformed", e.to_string()),
        }

        Ok(ctx)
    }
}
