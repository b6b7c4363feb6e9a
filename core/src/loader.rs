//! Batch orchestration: create, then update, then delete.
//!
//! # Design
//! `load` works in two stages. Planning is synchronous and pure: every record
//! of every phase is turned into its `HttpRequest` up front, so configuration
//! problems fail the batch before a single request is sent. Execution then
//! walks the phases in fixed order through the `SequentialExecutor`, and the
//! first failing phase ends the batch without running the rest. Results of
//! completed phases are dropped on failure.
//!
//! The loader only reads its endpoint and transport, so concurrent `load`
//! calls on one instance are independent of each other.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::builder::{Operation, RequestBuilder};
use crate::endpoint::EndpointConfig;
use crate::error::{ConfigError, LoadError};
use crate::executor::SequentialExecutor;
use crate::http::{HttpRequest, Transport};
use crate::types::{Batch, BatchResult, Phase, Records};

/// Progress of one `load` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Creating,
    Updating,
    Deleting,
    Done,
    Failed,
}

impl LoadState {
    fn running(phase: Phase) -> Self {
        match phase {
            Phase::Create => LoadState::Creating,
            Phase::Update => LoadState::Updating,
            Phase::Delete => LoadState::Deleting,
        }
    }
}

/// Every request a batch will send, grouped by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPlan {
    pub create: Vec<HttpRequest>,
    pub update: Vec<HttpRequest>,
    pub delete: Vec<HttpRequest>,
}

impl LoadPlan {
    pub fn requests(&self, phase: Phase) -> &[HttpRequest] {
        match phase {
            Phase::Create => &self.create,
            Phase::Update => &self.update,
            Phase::Delete => &self.delete,
        }
    }

    /// Total number of requests across all phases.
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&mut self, phase: Phase) -> Vec<HttpRequest> {
        std::mem::take(match phase {
            Phase::Create => &mut self.create,
            Phase::Update => &mut self.update,
            Phase::Delete => &mut self.delete,
        })
    }

    /// Run the phases in order, stopping at the first failure.
    pub async fn execute<T: Transport + ?Sized>(
        mut self,
        transport: &T,
    ) -> Result<BatchResult, LoadError> {
        let executor = SequentialExecutor::new(transport);
        let mut state = LoadState::Idle;
        let mut result = BatchResult::default();

        for phase in Phase::ORDER {
            let requests = self.take(phase);
            let next = LoadState::running(phase);
            debug!(from = ?state, to = ?next, requests = requests.len(), "phase starting");
            state = next;

            match executor.run(phase, requests).await {
                Ok(bodies) => {
                    info!(%phase, responses = bodies.len(), "phase complete");
                    *result.results_mut(phase) = bodies;
                }
                Err(err) => {
                    warn!(from = ?state, to = ?LoadState::Failed, tag = err.tag(), "batch failed");
                    return Err(err);
                }
            }
        }

        debug!(from = ?state, to = ?LoadState::Done, "batch complete");
        Ok(result)
    }
}

/// Loads batches of records into one HTTP endpoint through a transport.
#[derive(Debug, Clone)]
pub struct RestLoader<T> {
    builder: RequestBuilder,
    transport: T,
}

impl<T: Transport> RestLoader<T> {
    pub fn new(endpoint: EndpointConfig, transport: T) -> Self {
        Self {
            builder: RequestBuilder::new(endpoint),
            transport,
        }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        self.builder.endpoint()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build every request of `batch` without sending anything.
    ///
    /// Fails when update or delete records are present but no identifier is
    /// configured, or when one of those records cannot be addressed.
    pub fn plan(&self, batch: &Batch) -> Result<LoadPlan, ConfigError> {
        let plan = LoadPlan {
            create: self.build_phase(Phase::Create, Some(&batch.create))?,
            update: self.build_phase(Phase::Update, batch.update.as_ref())?,
            delete: self.build_phase(Phase::Delete, batch.delete.as_ref())?,
        };
        debug!(
            create = plan.create.len(),
            update = plan.update.len(),
            delete = plan.delete.len(),
            "batch planned"
        );
        Ok(plan)
    }

    fn build_phase(
        &self,
        phase: Phase,
        records: Option<&Records>,
    ) -> Result<Vec<HttpRequest>, ConfigError> {
        let operation = Operation::from(phase);
        records
            .into_iter()
            .flatten()
            .map(|record| self.builder.build(operation, record))
            .collect()
    }

    /// Send `batch` to the endpoint: creates, then updates, then deletes.
    ///
    /// Configuration errors are returned before any request is sent. On an
    /// HTTP failure the whole batch fails with that error alone.
    pub async fn load(&self, batch: &Batch) -> Result<BatchResult, LoadError> {
        let plan = self.plan(batch)?;
        let total = plan.len();
        let result = plan.execute(&self.transport).await?;
        info!(requests = total, url = self.endpoint().base_url(), "batch loaded");
        Ok(result)
    }

    /// `load` for an untyped batch. A value without a `create` key fails with
    /// `ConfigError::MissingCreate`.
    pub async fn load_value(&self, batch: Value) -> Result<BatchResult, LoadError> {
        let batch = Batch::from_value(batch)?;
        self.load(&batch).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::http::{HttpMethod, HttpResponse, TransportError};

    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<(HttpMethod, String)>>,
    }

    #[async_trait]
    impl Transport for Echo {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push((request.method, request.url.clone()));
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: request.body.unwrap_or_default(),
            })
        }
    }

    fn loader() -> RestLoader<Echo> {
        let endpoint = EndpointConfig::from_url("http://example.com/items")
            .unwrap()
            .with_identifier("_id");
        RestLoader::new(endpoint, Echo::default())
    }

    #[test]
    fn plan_groups_requests_by_phase() {
        let batch = Batch::from_value(json!({
            "create": [{"a": 1}, {"a": 2}],
            "delete": {"_id": "9"}
        }))
        .unwrap();
        let plan = loader().plan(&batch).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.requests(Phase::Create).len(), 2);
        assert!(plan.requests(Phase::Update).is_empty());
        assert_eq!(plan.requests(Phase::Delete)[0].url, "http://example.com/items/9");
    }

    #[test]
    fn plan_fails_on_unaddressable_record() {
        let batch = Batch::from_value(json!({"create": [], "update": [{"x": 1}]})).unwrap();
        let err = loader().plan(&batch).unwrap_err();
        assert!(matches!(err, ConfigError::MissingIdentifierValue(_)));
    }

    #[tokio::test]
    async fn load_runs_phases_in_order() {
        let loader = loader();
        let result = loader
            .load_value(json!({
                "create": {"_id": "1"},
                "update": [{"_id": "2"}],
                "delete": [{"_id": "3"}]
            }))
            .await
            .unwrap();
        assert_eq!(result.create_results, vec![r#"{"_id":"1"}"#]);
        assert_eq!(result.update_results, vec![r#"{"_id":"2"}"#]);
        assert_eq!(result.delete_results, vec![String::new()]);
        assert_eq!(
            *loader.transport().seen.lock().unwrap(),
            vec![
                (HttpMethod::Post, "http://example.com/items".to_string()),
                (HttpMethod::Post, "http://example.com/items/2".to_string()),
                (HttpMethod::Delete, "http://example.com/items/3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn load_value_without_create_sends_nothing() {
        let loader = loader();
        let err = loader.load_value(json!({"update": []})).await.unwrap_err();
        assert!(matches!(err, LoadError::Config(ConfigError::MissingCreate)));
        assert!(loader.transport().seen.lock().unwrap().is_empty());
    }
}
