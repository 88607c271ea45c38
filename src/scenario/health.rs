//! `/api/health`, plain and with MCP diagnostics.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{fetch_success, section, CheckError, Scenario};
use crate::context::RunContext;
use crate::outcome::{OutcomeLog, TestOutcome};
use crate::schema::{check, HealthData, McpHealthData};
use crate::transport::ApiClient;

const PATH: &str = "/api/health";

pub struct HealthScenario;

#[async_trait]
impl Scenario for HealthScenario {
    fn name(&self) -> &'static str {
        "health"
    }

    fn title(&self) -> &'static str {
        "Health Endpoint"
    }

    async fn run(
        &self,
        ctx: RunContext,
        api: &ApiClient,
        log: &mut OutcomeLog,
    ) -> Result<RunContext> {
        section(self.title());

        match basic(api).await {
            Ok((health, body)) => log.record(
                TestOutcome::pass(
                    "Health Endpoint Basic",
                    format!(
                        "Health check successful. CoC API: {}, OpenAI: {}",
                        health.has_coc, health.has_openai
                    ),
                )
                .with_sample(body),
            ),
            Err(e) => {
                log.fail("Health Endpoint Basic", format!("Health endpoint check failed: {e}"));
                return Ok(ctx);
            }
        }

        match mcp(api).await {
            Ok((tools, _)) if tools.tools.is_empty() => {
                log.fail("Health Endpoint MCP", "MCP response has an empty tools list")
            }
            Ok((tools, body)) => log.record(
                TestOutcome::pass(
                    "Health Endpoint MCP",
                    format!("MCP health check successful with {} tools", tools.tools.len()),
                )
                .with_sample(body),
            ),
            Err(e) => log.fail("Health Endpoint MCP", format!("MCP health check failed: {e}")),
        }

        Ok(ctx)
    }
}

async fn basic(api: &ApiClient) -> Result<(HealthData, Value), CheckError> {
    let (resp, envelope) = fetch_success(api, PATH, &[]).await?;
    let health = check::<HealthData>(envelope.data()?)?;
    Ok((health, resp.json()?.clone()))
}

async fn mcp(api: &ApiClient) -> Result<(McpHealthData, Value), CheckError> {
    let (resp, envelope) = fetch_success(api, PATH, &[("mcp", "true")]).await?;
    let tools = check::<McpHealthData>(envelope.data()?)?;
    Ok((tools, resp.json()?.clone()))
}
