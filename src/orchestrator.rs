//! Runs scenarios in order against one context, one client and one log.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info};

use crate::context::RunContext;
use crate::outcome::{OutcomeLog, TestOutcome};
use crate::scenario::Scenario;
use crate::transport::ApiClient;

pub struct Orchestrator {
    api: ApiClient,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl Orchestrator {
    pub fn new(api: ApiClient, scenarios: Vec<Box<dyn Scenario>>) -> Self {
        Self { api, scenarios }
    }

    /// Run every scenario sequentially. A scenario that errors or panics
    /// keeps whatever it recorded and gains one failed outcome under its
    /// title; the context it was given carries on to the next scenario.
    pub async fn run(&self, mut ctx: RunContext) -> (Vec<TestOutcome>, RunContext) {
        let mut log = OutcomeLog::new();

        for scenario in &self.scenarios {
            info!(scenario = scenario.name(), "scenario starting");
            let before = ctx.clone();
            let start = log.len();
            let guarded = AssertUnwindSafe(scenario.run(ctx, &self.api, &mut log))
                .catch_unwind()
                .await;

            let fault = match guarded {
                Ok(Ok(next)) => {
                    let recorded = &log.outcomes()[start..];
                    info!(
                        scenario = scenario.name(),
                        outcomes = recorded.len(),
                        failed = recorded.iter().filter(|o| !o.passed).count(),
                        "scenario finished"
                    );
                    ctx = next;
                    continue;
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
            };

            error!(
                scenario = scenario.name(),
                kept = log.len() - start,
                %fault,
                "scenario aborted"
            );
            log.fail(
                scenario.title(),
                format!("{} test failed with unexpected error: {fault}", scenario.title()),
            );
            ctx = before;
        }

        (log.into_outcomes(), ctx)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
