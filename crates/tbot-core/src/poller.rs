//! Background `getUpdates` loop.
//!
//! States: `Stopped -> Bootstrapping -> Running <-> Paused -> Stopped`.
//! The loop runs on its own tokio task, supervised by a child of the bot's
//! cancellation token. Cancellation is honoured between cycles and during the
//! inter-cycle sleep, never in the middle of a fetch.

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use serde_json::Value;
use tokio::{sync::Mutex, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{
    cursor::Cursor,
    decode::decode_batch,
    errors::Error,
    store::UpdateStore,
    transport::{Params, Transport},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Bootstrapping,
    Running,
    Paused,
}

/// Fetch, decode, store, advance: one poll cycle's worth of state.
pub(crate) struct Ingest {
    pub transport: Arc<Transport>,
    pub store: Arc<UpdateStore>,
    pub cursor: Arc<Cursor>,
    pub safe_mode: bool,
    pub long_poll_timeout: Duration,
    pub request_timeout: Duration,
}

impl Ingest {
    /// Raw `getUpdates` page starting at `offset`.
    pub async fn fetch(
        &self,
        offset: i64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Value>> {
        let mut params = Params::new().text("offset", offset);
        if !self.long_poll_timeout.is_zero() {
            params = params.text("timeout", self.long_poll_timeout.as_secs());
        }
        // The platform holds long polls open; the attempt timeout must cover it.
        let timeout = self.request_timeout + self.long_poll_timeout;

        let resp = self
            .transport
            .call_with("getUpdates", &params, timeout, cancel)
            .await?;
        match resp.result {
            Some(Value::Array(items)) => Ok(items),
            other => Err(Error::malformed(format!(
                "getUpdates: expected an array result, got {}",
                other.unwrap_or(Value::Null)
            ))),
        }
    }

    /// Run one cycle. Returns how many updates were stored.
    ///
    /// Without safe mode a decode failure is returned after the updates that
    /// decoded before it were stored and acknowledged.
    pub async fn poll_once(&self, cancel: Option<&CancellationToken>) -> Result<usize> {
        let offset = self.cursor.get();
        let raws = self.fetch(offset, cancel).await?;
        if raws.is_empty() {
            return Ok(0);
        }

        let outcome = decode_batch(raws, self.safe_mode);
        let next = outcome.next_offset();

        let stored = self.store.append(outcome.decoded);
        if let Some(next) = next {
            if self.cursor.advance_to(next) {
                tracing::debug!(from = offset, to = next, stored, "cursor advanced");
            }
        }

        match outcome.failure {
            Some(e) => Err(e),
            None => Ok(stored),
        }
    }
}

#[derive(Default)]
struct Status {
    state: Option<PollerState>,
    last_error: Option<Error>,
}

struct Task {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub(crate) struct Poller {
    ingest: Arc<Ingest>,
    owner: CancellationToken,
    status: Arc<StdMutex<Status>>,
    task: Mutex<Option<Task>>,
}

impl Poller {
    pub fn new(ingest: Arc<Ingest>, owner: CancellationToken) -> Self {
        Self {
            ingest,
            owner,
            status: Arc::new(StdMutex::new(Status::default())),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollerState {
        lock(&self.status).state.unwrap_or(PollerState::Stopped)
    }

    pub fn set_state(&self, state: PollerState) {
        lock(&self.status).state = Some(state);
    }

    pub fn take_last_error(&self) -> Option<Error> {
        lock(&self.status).last_error.take()
    }

    /// (Re)start the loop with `delay` between cycles. Any running loop is
    /// stopped and awaited first.
    ///
    /// `Running` is published before the task is spawned: the new loop may
    /// fail on its first cycle, and its `Stopped` must not be overwritten.
    pub async fn start(&self, delay: Duration) {
        let mut slot = self.task.lock().await;
        lock(&self.status).last_error = None;
        Self::stop_task(slot.take()).await;

        lock(&self.status).state = Some(PollerState::Running);
        let cancel = self.owner.child_token();
        let handle = tokio::spawn(run(
            self.ingest.clone(),
            self.status.clone(),
            cancel.clone(),
            delay,
        ));
        *slot = Some(Task { cancel, handle });
    }

    pub async fn pause(&self) {
        self.halt(PollerState::Paused).await;
    }

    pub async fn shutdown(&self) {
        self.halt(PollerState::Stopped).await;
    }

    async fn halt(&self, state: PollerState) {
        let mut slot = self.task.lock().await;
        Self::stop_task(slot.take()).await;
        self.set_state(state);
    }

    async fn stop_task(task: Option<Task>) {
        let Some(task) = task else {
            return;
        };
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            tracing::error!(error = %e, "poller task panicked");
        }
    }
}

fn lock(status: &StdMutex<Status>) -> std::sync::MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(|e| e.into_inner())
}

async fn run(
    ingest: Arc<Ingest>,
    status: Arc<StdMutex<Status>>,
    cancel: CancellationToken,
    delay: Duration,
) {
    tracing::info!(?delay, offset = ingest.cursor.get(), "poller started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match ingest.poll_once(Some(&cancel)).await {
            Ok(n) if n > 0 => tracing::debug!(stored = n, "poll cycle"),
            Ok(_) => {}
            // Gave up retrying because we are shutting down.
            Err(e) if cancel.is_cancelled() && e.is_transient() => {
                tracing::debug!(error = %e, "poll interrupted by shutdown");
                break;
            }
            // Whoever cancelled us sets the state; the error is still kept.
            Err(e) if cancel.is_cancelled() => {
                tracing::warn!(error = %e, "poll failed while stopping");
                lock(&status).last_error = Some(e);
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "poller stopped");
                let mut st = lock(&status);
                st.state = Some(PollerState::Stopped);
                st.last_error = Some(e);
                return;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(delay) => {}
        }
    }

    tracing::info!("poller exited");
}
