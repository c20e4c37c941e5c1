//! The updater: feeds updates from one source into a [`Dispatcher`].
//!
//! An [`Updater`] owns one producer task (the long-poll loop or a webhook
//! listener) and one consumer task running [`Dispatcher::run`]. The two are
//! joined by a rendezvous [`channel`], so the producer waits for the
//! dispatcher to take each update before it moves on.
//!
//! ```rust,ignore
//! use gott_runtime::{Updater, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let updater = Updater::from_config(&config)?;
//! updater.dispatcher().add_handler(my_handler);
//! updater.start(&config).await?;
//! updater.idle().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gott_core::{BoxedBot, GetUpdatesOpts, Update, UpdateReceiver, UpdateSender, channel};
use gott_framework::Dispatcher;
use gott_transport::{HttpBot, ListenerHandle, serve_webhook};

use crate::config::{GottConfig, PollingConfig, UpdateMode, WebhookConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::retry::RetryPolicy;

// =============================================================================
// Options
// =============================================================================

/// Settings of the long-poll loop.
#[derive(Debug, Clone)]
pub struct PollingOptions {
    /// Request options; `marker` is advanced as pages arrive.
    pub opts: GetUpdatesOpts,
    /// Delay policy after a failed request.
    pub retry: RetryPolicy,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

impl PollingOptions {
    pub fn from_config(config: &PollingConfig) -> Self {
        let types = (!config.types.is_empty()).then(|| config.types.clone());
        Self {
            opts: GetUpdatesOpts {
                limit: Some(config.limit),
                timeout: Some(config.timeout_secs),
                marker: config.marker,
                types,
            },
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Settings of the webhook listener.
#[derive(Debug, Clone)]
pub struct WebhookOptions {
    /// `host:port` to bind.
    pub addr: String,
    /// Route that accepts deliveries.
    pub path: String,
    /// Time a delivery body may take to arrive.
    pub read_timeout: Option<Duration>,
}

impl Default for WebhookOptions {
    fn default() -> Self {
        Self::from_config(&WebhookConfig::default())
    }
}

impl WebhookOptions {
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            addr: config.addr(),
            path: config.path.clone(),
            read_timeout: config.read_timeout_secs.map(Duration::from_secs),
        }
    }
}

// =============================================================================
// Updater
// =============================================================================

/// Drives a [`Dispatcher`] from a single update source.
///
/// Only one source can be started per updater; a second `start_*` call
/// fails with [`RuntimeError::AlreadyStarted`].
pub struct Updater {
    bot: BoxedBot,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
    started: Mutex<Option<UpdateMode>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Updater {
    /// Creates an updater with an empty dispatcher.
    pub fn new(bot: BoxedBot) -> Self {
        Self::with_dispatcher(bot, Arc::new(Dispatcher::new()))
    }

    /// Creates an updater around an existing dispatcher.
    pub fn with_dispatcher(bot: BoxedBot, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            bot,
            dispatcher,
            shutdown: CancellationToken::new(),
            started: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    /// Creates an updater with an [`HttpBot`] built from the configuration.
    pub fn from_config(config: &GottConfig) -> RuntimeResult<Self> {
        if config.bot.token.trim().is_empty() {
            return Err(RuntimeError::MissingToken);
        }
        let bot = HttpBot::new(
            config.bot.token.clone(),
            &config.bot.api_url,
            Duration::from_secs(config.bot.request_timeout_secs),
        )?;
        Ok(Self::new(Arc::new(bot)))
    }

    pub fn bot(&self) -> &BoxedBot {
        &self.bot
    }

    /// Returns the dispatcher; handlers may be registered at any time.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Starts the source selected by `config.mode`.
    pub async fn start(&self, config: &GottConfig) -> RuntimeResult<()> {
        match config.mode {
            UpdateMode::Polling => self.start_polling(PollingOptions::from_config(&config.polling)),
            UpdateMode::Webhook => self
                .start_webhook(WebhookOptions::from_config(&config.webhook))
                .await
                .map(|_| ()),
        }
    }

    /// Starts long-polling in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_polling(&self, options: PollingOptions) -> RuntimeResult<()> {
        self.claim(UpdateMode::Polling)?;

        let (tx, rx) = channel();
        self.spawn_dispatcher(rx);

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.bot),
            tx,
            options,
            self.shutdown.clone(),
        ));
        self.tasks.lock().push(task);
        Ok(())
    }

    /// Starts the webhook listener and returns the bound address.
    pub async fn start_webhook(&self, options: WebhookOptions) -> RuntimeResult<SocketAddr> {
        self.claim(UpdateMode::Webhook)?;

        let (tx, rx) = channel();
        let listener = match serve_webhook(&options.addr, &options.path, options.read_timeout, tx)
            .await
        {
            Ok(listener) => listener,
            Err(e) => {
                *self.started.lock() = None;
                return Err(e.into());
            }
        };
        self.spawn_dispatcher(rx);

        let addr = listener.local_addr();
        if self.shutdown.is_cancelled() {
            listener.shutdown().await;
        } else {
            *self.listener.lock() = Some(listener);
        }
        Ok(addr)
    }

    /// Waits until [`stop`](Self::stop) is called or the process receives
    /// Ctrl+C or SIGTERM, then waits for the background tasks to finish.
    pub async fn idle(&self) {
        info!(bot_id = self.bot.id(), "Updater is running, press Ctrl+C to stop");

        tokio::select! {
            _ = self.shutdown.cancelled() => debug!("Stop requested"),
            _ = wait_for_signal() => {}
        }
        self.stop();

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.shutdown().await;
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!(error = %e, "Updater task failed");
            }
        }
        info!("Updater stopped");
    }

    /// Stops the update source. The dispatcher finishes once the channel
    /// is drained and closed.
    ///
    /// A poll loop stopped mid-page still forwards the rest of that page
    /// before it exits, since the marker was already advanced past it.
    /// Updates are never dropped, but handlers may run after `stop` returns.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Stopping updater");
            self.shutdown.cancel();
        }
        if let Some(listener) = self.listener.lock().as_mut() {
            listener.stop();
        }
    }

    /// Returns the running mode, if any.
    pub fn mode(&self) -> Option<UpdateMode> {
        *self.started.lock()
    }

    fn claim(&self, mode: UpdateMode) -> RuntimeResult<()> {
        let mut started = self.started.lock();
        if let Some(current) = *started {
            return Err(RuntimeError::AlreadyStarted(current));
        }
        *started = Some(mode);
        info!(%mode, bot_id = self.bot.id(), "Starting updater");
        Ok(())
    }

    fn spawn_dispatcher(&self, updates: UpdateReceiver) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let bot = Arc::clone(&self.bot);
        let task = tokio::spawn(async move { dispatcher.run(bot, updates).await });
        self.tasks.lock().push(task);
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("bot_id", &self.bot.id())
            .field("mode", &self.mode())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Fetches pages until cancelled or until the dispatcher goes away.
///
/// The marker only moves when the server returns one. Failed requests are
/// retried unchanged after the policy's delay.
async fn poll_loop(
    bot: BoxedBot,
    updates: UpdateSender,
    options: PollingOptions,
    shutdown: CancellationToken,
) {
    let PollingOptions { mut opts, retry } = options;
    let mut backoff = retry.backoff();
    info!(bot_id = bot.id(), marker = ?opts.marker, "Polling started");

    loop {
        let page = tokio::select! {
            _ = shutdown.cancelled() => break,
            page = bot.get_updates(&opts) => page,
        };

        let page = match page {
            Ok(page) => {
                backoff.reset();
                page
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(error = %e, retry_in = ?delay, "Failed to fetch updates");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
                continue;
            }
        };

        if let Some(marker) = page.marker {
            opts.marker = Some(marker);
        }
        debug!(count = page.updates.len(), marker = ?opts.marker, "Fetched updates");

        for raw in page.updates {
            let update = match Update::from_value(raw) {
                Ok(update) => update,
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable update");
                    continue;
                }
            };
            if updates.send(update).await.is_err() {
                warn!("Dispatcher is gone, stopping polling");
                return;
            }
        }
    }

    info!(bot_id = bot.id(), "Polling stopped");
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
///
/// A signal that cannot be listened for is logged and never fires.
async fn wait_for_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
