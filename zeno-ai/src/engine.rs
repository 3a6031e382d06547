//! Tool execution loop for one exchange.
//!
//! `AwaitingModel` → (tool calls) `ExecutingTools` → `AwaitingModel` … until a response carries no tool calls or
//! the iteration cap is hit. Tool calls run strictly in order; each batch of results is appended as one turn
//! before the next model call. The latest non-empty text wins. Grounding links from every iteration are merged
//! (first occurrence of a URI wins) and stored as one record when the exchange ends.

use std::sync::Arc;

use async_trait::async_trait;
use llm_client::{GenerationRequest, GroundingLink, ProviderGateway, Turn};
use storage::LinkStore;
use tracing::{info, instrument, warn};

use crate::error::AiError;
use crate::tools::{Tool, ToolExecutor, ToolTarget};

pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Receives interim status while tools run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn on_tool(&self, tool: &str, status: &str);
}

/// Sink that drops every update.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn on_tool(&self, _tool: &str, _status: &str) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// Best final answer; may be empty when the cap is hit before any text arrived.
    pub text: String,
    /// Id of the persisted grounding-link record, when one was stored.
    pub sources_id: Option<String>,
    pub iterations: usize,
    pub tool_calls: usize,
}

pub struct ToolLoop {
    gateway: Arc<dyn ProviderGateway>,
    executor: Arc<ToolExecutor>,
    links: Arc<dyn LinkStore>,
    max_iterations: usize,
}

impl ToolLoop {
    pub fn new(gateway: Arc<dyn ProviderGateway>, executor: Arc<ToolExecutor>, links: Arc<dyn LinkStore>) -> Self {
        Self {
            gateway,
            executor,
            links,
            max_iterations: MAX_TOOL_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    async fn store_links(&self, links: &[GroundingLink]) -> Option<String> {
        let records: Vec<storage::GroundingLink> = links
            .iter()
            .map(|l| storage::GroundingLink::new(l.title.clone(), l.uri.clone()))
            .collect();
        match self.links.insert_links(&records).await {
            Ok(id) => {
                info!(sources_id = %id, count = records.len(), "Grounding links stored");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to store grounding links, answering without sources");
                None
            }
        }
    }

    /// Persists the merged links, if any, and attaches the record id.
    async fn conclude(&self, mut outcome: ExchangeOutcome, links: &[GroundingLink]) -> ExchangeOutcome {
        if !links.is_empty() {
            outcome.sources_id = self.store_links(links).await;
        }
        outcome
    }

    #[instrument(skip(self, request, progress), fields(chat_id = target.chat_id, model = %request.model))]
    pub async fn run(
        &self,
        mut request: GenerationRequest,
        target: ToolTarget,
        progress: &dyn ProgressSink,
    ) -> Result<ExchangeOutcome, AiError> {
        let mut outcome = ExchangeOutcome::default();
        let mut links: Vec<GroundingLink> = Vec::new();

        for iteration in 1..=self.max_iterations {
            outcome.iterations = iteration;
            let response = match self.gateway.generate(&request).await {
                Ok(response) => response,
                Err(e) if iteration > 1 && !outcome.text.is_empty() => {
                    warn!(iteration, error = %e, "Follow-up model call failed, keeping earlier answer");
                    return Ok(self.conclude(outcome, &links).await);
                }
                Err(e) => return Err(e.into()),
            };

            if !response.text.trim().is_empty() {
                outcome.text = response.text.clone();
            }
            for link in &response.grounding_links {
                if !links.iter().any(|l| l.uri == link.uri) {
                    links.push(link.clone());
                }
            }
            if response.tool_calls.is_empty() {
                info!(iteration, tool_calls = outcome.tool_calls, "Exchange done");
                return Ok(self.conclude(outcome, &links).await);
            }

            request.exchange.push(response.turn.clone());
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                let status = Tool::parse(call).map(|t| t.status_text()).unwrap_or("Working...");
                progress.on_tool(&call.name, status).await;
                let result = self.executor.dispatch(call, target).await;
                info!(iteration, tool = %call.name, success = result.success, "Tool executed");
                outcome.tool_calls += 1;
                results.push((call.name.clone(), result));
            }
            request.exchange.push(Turn::tool_results(results));
        }

        warn!(max = self.max_iterations, "Tool loop hit iteration cap");
        Ok(self.conclude(outcome, &links).await)
    }
}
