//! The bot handle: bootstrap, polling control and mailbox access.
//!
//! A [`Bot`] is cheap to clone. The background poller is tied to the handle:
//! when the last clone is dropped the owning cancellation token fires and the
//! loop exits at its next boundary.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::Duration,
};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    cursor::{Cursor, CursorFile},
    decode::update_id,
    domain::BotCredential,
    errors::Error,
    poller::{Ingest, Poller, PollerState},
    store::{Consume, ConsumeFilter, UpdateStore},
    transport::{ApiBackend, RetryPolicy, Transport},
    Result,
};

#[derive(Clone)]
pub struct Bot {
    pub(crate) inner: Arc<BotInner>,
}

pub(crate) struct BotInner {
    credential: BotCredential,
    name: Option<String>,
    pub(crate) ingest: Arc<Ingest>,
    poller: Poller,
    cursor_file: Option<CursorFile>,
    bootstrapped: AtomicBool,
    bootstrap_lock: Mutex<()>,
    poll_delay: StdMutex<Duration>,
    owner: CancellationToken,
}

impl Drop for BotInner {
    fn drop(&mut self) {
        self.owner.cancel();
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("credential", &self.inner.credential)
            .field("name", &self.inner.name)
            .field("state", &self.poller_state())
            .field("cursor", &self.cursor())
            .finish()
    }
}

impl Bot {
    /// Build a bot over `backend`. Fails on a malformed token or an invalid
    /// configuration; no network traffic happens until [`Bot::bootstrap`].
    pub fn new(cfg: Config, backend: Arc<dyn ApiBackend>) -> Result<Self> {
        let credential = BotCredential::new(cfg.token.as_str())?;
        cfg.validate()?;

        let transport = Transport::new(
            backend,
            RetryPolicy::new(cfg.backoff_base, cfg.backoff_max),
            cfg.request_timeout,
        );
        let ingest = Arc::new(Ingest {
            transport: Arc::new(transport),
            store: Arc::new(UpdateStore::new()),
            cursor: Arc::new(Cursor::default()),
            safe_mode: cfg.safe_mode,
            long_poll_timeout: cfg.long_poll_timeout,
            request_timeout: cfg.request_timeout,
        });
        let owner = CancellationToken::new();

        Ok(Self {
            inner: Arc::new(BotInner {
                credential,
                name: cfg.name,
                poller: Poller::new(ingest.clone(), owner.clone()),
                ingest,
                cursor_file: cfg.cursor_file.map(CursorFile::new),
                bootstrapped: AtomicBool::new(false),
                bootstrap_lock: Mutex::new(()),
                poll_delay: StdMutex::new(cfg.poll_delay),
                owner,
            }),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn credential(&self) -> &BotCredential {
        &self.inner.credential
    }

    /// Determine the starting cursor and start the poller.
    ///
    /// A platform rejection of the initial fetch is returned and leaves the
    /// bot un-bootstrapped. Calling this again after success is a no-op that
    /// returns the current cursor.
    pub async fn bootstrap(&self) -> Result<i64> {
        let inner = &self.inner;
        let _guard = inner.bootstrap_lock.lock().await;
        if inner.bootstrapped.load(Ordering::SeqCst) {
            return Ok(inner.ingest.cursor.get());
        }

        inner.poller.set_state(PollerState::Bootstrapping);
        let offset = match self.initial_offset().await {
            Ok(offset) => offset,
            Err(e) => {
                inner.poller.set_state(PollerState::Stopped);
                tracing::error!(error = %e, "bootstrap failed");
                return Err(e);
            }
        };

        inner.ingest.cursor.reset(offset);
        inner.bootstrapped.store(true, Ordering::SeqCst);
        tracing::info!(bot = ?inner.name, offset, "bootstrapped");

        inner.poller.start(self.poll_delay()).await;
        Ok(offset)
    }

    async fn initial_offset(&self) -> Result<i64> {
        let inner = &self.inner;
        let page = inner.ingest.fetch(inner.ingest.cursor.get(), None).await?;
        let reported = page.first().and_then(update_id).unwrap_or(0);

        let Some(file) = &inner.cursor_file else {
            return Ok(reported);
        };
        let persisted = file.load().unwrap_or_else(|e| {
            tracing::warn!(path = %file.path().display(), error = %e, "cannot read cursor file");
            None
        });
        if let Some(offset) = persisted {
            return Ok(offset);
        }
        if let Err(e) = file.save(reported) {
            tracing::warn!(path = %file.path().display(), error = %e, "cannot write cursor file");
        }
        Ok(reported)
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.inner.bootstrapped.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_bootstrapped(&self) -> Result<()> {
        if self.is_bootstrapped() {
            Ok(())
        } else {
            Err(Error::BootstrapRequired)
        }
    }

    /// Next update id the poller will request.
    pub fn cursor(&self) -> i64 {
        self.inner.ingest.cursor.get()
    }

    pub fn poller_state(&self) -> PollerState {
        self.inner.poller.state()
    }

    /// The error that stopped the poller, if any. Cleared by reading it and by
    /// restarting the poller.
    pub fn take_last_error(&self) -> Option<Error> {
        self.inner.poller.take_last_error()
    }

    pub fn poll_delay(&self) -> Duration {
        *self
            .inner
            .poll_delay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Pause or resume the poller, optionally changing the delay between
    /// cycles. Resuming restarts the loop when it is not running or when the
    /// delay changed.
    pub async fn set_polling(&self, active: bool, delay: Option<Duration>) -> Result<()> {
        self.ensure_bootstrapped()?;

        let mut changed = false;
        if let Some(delay) = delay {
            let mut current = self
                .inner
                .poll_delay
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            changed = *current != delay;
            *current = delay;
        }

        if !active {
            if self.poller_state() == PollerState::Running {
                self.inner.poller.pause().await;
            }
            return Ok(());
        }

        if changed || self.poller_state() != PollerState::Running {
            self.inner.poller.start(self.poll_delay()).await;
        }
        Ok(())
    }

    /// Stop the current loop, wait for it, and start a fresh one.
    pub async fn restart_polling(&self) -> Result<()> {
        self.ensure_bootstrapped()?;
        self.inner.poller.start(self.poll_delay()).await;
        Ok(())
    }

    /// Stop polling and wait for the loop to exit. Safe to call at any time.
    pub async fn shutdown(&self) {
        self.inner.poller.shutdown().await;
        tracing::info!(bot = ?self.inner.name, cursor = self.cursor(), "shut down");
    }

    pub fn has_updates(&self) -> Result<bool> {
        self.ensure_bootstrapped()?;
        Ok(self.inner.ingest.store.has_pending())
    }

    /// Number of updates waiting to be consumed.
    pub fn pending(&self) -> Result<usize> {
        self.ensure_bootstrapped()?;
        Ok(self.inner.ingest.store.len())
    }

    /// True once after any poll cycle stored updates.
    pub fn news(&self) -> Result<bool> {
        self.ensure_bootstrapped()?;
        Ok(self.inner.ingest.store.take_news())
    }

    /// Drain stored updates matching `filter`; see [`UpdateStore::consume`].
    pub fn updates(&self, filter: ConsumeFilter) -> Result<Consume<'_>> {
        self.ensure_bootstrapped()?;
        Ok(self.inner.ingest.store.consume(filter))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::{domain::TEST_TOKEN, transport::testing::FakeBackend};

    pub fn bot(backend: Arc<FakeBackend>) -> Bot {
        Bot::new(Config::new(TEST_TOKEN), backend).unwrap()
    }

    /// Bootstrapped on an empty page with polling paused, so only the calls a
    /// test makes reach the backend.
    pub async fn idle_bot(backend: Arc<FakeBackend>) -> Bot {
        let bot = bot(backend);
        bot.bootstrap().await.unwrap();
        bot.set_polling(false, None).await.unwrap();
        bot
    }
}
