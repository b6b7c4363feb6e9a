//! Strictly sequential request dispatch.
//!
//! Request `i + 1` is handed to the transport only after request `i` has
//! produced a response or failed. The first transport error or non-2xx status
//! stops the run; nothing is retried or reordered.

use tracing::{debug, warn};

use crate::error::LoadError;
use crate::http::{HttpRequest, Transport};
use crate::types::{Phase, PhaseResult};

/// Runs one phase's requests one at a time over a borrowed transport.
pub struct SequentialExecutor<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> SequentialExecutor<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Send `requests` in order and collect the response bodies,
    /// index-aligned with the input.
    pub async fn run(
        &self,
        phase: Phase,
        requests: Vec<HttpRequest>,
    ) -> Result<PhaseResult, LoadError> {
        let mut results = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            debug!(%phase, index, method = %request.method, url = %request.url, "sending request");
            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(source) => {
                    warn!(%phase, index, error = %source, "transport failed");
                    return Err(LoadError::Transport { phase, index, source });
                }
            };
            if !response.is_success() {
                warn!(%phase, index, status = response.status, "unexpected status code");
                return Err(LoadError::Status {
                    phase,
                    index,
                    response,
                });
            }
            results.push(response.body);
        }
        Ok(results)
    }
}
