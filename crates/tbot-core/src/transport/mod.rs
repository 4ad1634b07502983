//! Authenticated calls to the Bot API.
//!
//! [`Transport`] sits on top of an [`ApiBackend`] and adds what every call
//! needs: one request in flight at a time, unbounded exponential retry on
//! timeouts and connection failures, and mapping of `ok: false` bodies to
//! [`Error::Query`].

pub mod port;
pub mod retry;

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::Value;
use tokio::{sync::Mutex, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{errors::Error, Result};

pub use port::{ApiBackend, ApiRequest, InputFile, ParamValue, Params};
pub use retry::{Backoff, RetryPolicy};

/// Description the platform uses when an edit changes nothing.
const NOT_MODIFIED: &str = "message is not modified";

/// Top-level Bot API response body.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

impl ApiResponse {
    pub fn is_not_modified(&self) -> bool {
        !self.ok
            && self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(NOT_MODIFIED))
    }
}

pub struct Transport {
    backend: Arc<dyn ApiBackend>,
    slot: Mutex<()>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl Transport {
    pub fn new(
        backend: Arc<dyn ApiBackend>,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            slot: Mutex::new(()),
            retry,
            request_timeout,
        }
    }

    /// Call `method`, retrying transient failures until they succeed.
    ///
    /// Returns the response for `ok: true`, and also for the tolerated
    /// "message is not modified" rejection. Any other rejection is an
    /// [`Error::Query`].
    pub async fn call(&self, method: &str, params: &Params) -> Result<ApiResponse> {
        self.call_with(method, params, self.request_timeout, None).await
    }

    /// Like [`Transport::call`], with an explicit per-attempt timeout and an
    /// optional token that stops further retries once cancelled.
    pub async fn call_with(
        &self,
        method: &str,
        params: &Params,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<ApiResponse> {
        let body = self.send_with_retry(method, params, timeout, cancel).await?;
        let resp: ApiResponse = serde_json::from_value(body)?;

        if resp.ok {
            return Ok(resp);
        }
        if resp.is_not_modified() {
            tracing::debug!(method, "platform reports message not modified");
            return Ok(resp);
        }
        Err(Error::Query {
            code: resp.error_code,
            description: resp.description.unwrap_or_default(),
        })
    }

    async fn send_with_retry(
        &self,
        method: &str,
        params: &Params,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        let mut backoff = self.retry.backoff();
        let mut attempt = 1u64;
        loop {
            let res = {
                let _slot = self.slot.lock().await;
                self.backend
                    .post(ApiRequest {
                        method,
                        params,
                        timeout,
                    })
                    .await
            };

            let err = match res {
                Err(e) if e.is_transient() => e,
                other => return other,
            };

            let delay = backoff.next().unwrap_or(self.retry.max);
            tracing::warn!(method, attempt, ?delay, error = %err, "transient failure, retrying");
            attempt += 1;

            match cancel {
                Some(tok) => {
                    tokio::select! {
                        _ = tok.cancelled() => return Err(err),
                        _ = sleep(delay) => {}
                    }
                }
                None => sleep(delay).await,
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backend shared by the transport, poller and command tests.

    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::time::Instant;

    use super::*;

    #[derive(Clone, Debug)]
    pub struct Recorded {
        pub method: String,
        pub params: Params,
        pub at: Instant,
    }

    /// Replies are consumed in order; once exhausted every call returns an
    /// empty successful `getUpdates` page.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<VecDeque<Result<Value>>>,
        calls: Mutex<Vec<Recorded>>,
    }

    impl FakeBackend {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push(&self, reply: Result<Value>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        pub fn push_ok(&self, result: Value) {
            self.push(Ok(json!({"ok": true, "result": result})));
        }

        pub fn push_timeout(&self) {
            self.push(Err(Error::Transient("operation timed out".to_string())));
        }

        pub fn calls(&self) -> Vec<Recorded> {
            self.calls.lock().unwrap().clone()
        }

        pub fn methods(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.method).collect()
        }

        pub fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ApiBackend for FakeBackend {
        async fn post(&self, req: ApiRequest<'_>) -> Result<Value> {
            self.calls.lock().unwrap().push(Recorded {
                method: req.method.to_string(),
                params: req.params.clone(),
                at: Instant::now(),
            });
            let next = self.replies.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(json!({"ok": true, "result": []})))
        }
    }

    pub fn text_param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        match params.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
