//! Orchestrator for the journal scan:
//! 1) replay a fixed backlog window ending at the current tip,
//! 2) follow the tip, polling on a fixed interval,
//! 3) for every block, decode OP_RETURN outputs, display them and persist `/BJ` messages.
use std::ops::RangeInclusive;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::{
    chain_source::{Block, ChainSource, Transaction},
    classifier::{classify, MessageKind},
    decoder,
    error::FetchError,
    ledger::Ledger,
    presenter::{Pacing, Presenter},
};

/// Blocks replayed on startup, tip included.
pub const DEFAULT_WINDOW: u32 = 30;
/// Idle wait between tip polls while following.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Wait after a failed provider query before retrying it.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Tunables for [`BlockWalker`].
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Backlog size in blocks.
    pub window: u32,
    /// Sleep between tip polls when nothing new was mined.
    pub poll_interval: Duration,
    /// Sleep before retrying a failed fetch.
    pub error_backoff: Duration,
    /// Block fetches kept in flight ahead of the one being applied.
    /// `1` is strictly sequential.
    pub prefetch: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
            prefetch: 1,
        }
    }
}

/// Heights replayed on startup: `max(0, tip - window + 1) ..= tip`.
///
/// A zero window gives an empty range.
pub fn backfill_range(tip: u32, window: u32) -> RangeInclusive<u32> {
    let start = (i64::from(tip) - i64::from(window) + 1).max(0);
    let start = u32::try_from(start).unwrap_or(u32::MAX);
    start..=tip
}

/// Last height whose block was fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkerCursor {
    last_checked_height: Option<u32>,
}

impl WalkerCursor {
    /// Cursor positioned just before `start` (nothing processed if `start == 0`).
    pub fn before(start: u32) -> Self {
        Self {
            last_checked_height: start.checked_sub(1),
        }
    }

    /// Last fully processed height, if any.
    pub fn last_checked_height(&self) -> Option<u32> {
        self.last_checked_height
    }

    /// Next height to process.
    pub fn next_height(&self) -> u32 {
        self.last_checked_height.map_or(0, |h| h.saturating_add(1))
    }

    /// Record `height` as processed. Never moves backwards.
    pub fn advance(&mut self, height: u32) {
        self.last_checked_height = Some(match self.last_checked_height {
            Some(prev) => prev.max(height),
            None => height,
        });
    }
}

/// Walker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerState {
    /// Constructed, tip not queried yet.
    Idle,
    /// Replaying heights up to `tip`.
    Backfilling {
        /// Tip observed at startup; last height of the backlog.
        tip: u32,
    },
    /// Polling for new blocks.
    LiveFollowing,
    /// Stopped for good.
    Terminated,
}

/// What one live-follow poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Tip query failed; backed off, cursor untouched.
    FetchFailed,
    /// No new block; slept for the poll interval.
    Idle,
    /// Processed every height up to `to`.
    Advanced {
        /// New last checked height.
        to: u32,
    },
    /// Quit was requested; the walker is terminated.
    Terminated,
}

/// Quit flag shared with the process signal handler, checked at block
/// boundaries and while sleeping.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    rx: Option<watch::Receiver<bool>>,
}

impl Shutdown {
    /// A flag that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// `true` once the sender published `true`.
    pub fn is_set(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once shutdown fires. Never resolves for [`Shutdown::never`].
    pub async fn wait(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        // a dropped sender can no longer ask us to stop
        if rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `d`. Returns `false` if shutdown fired first.
    pub async fn sleep(&self, d: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(d) => true,
            _ = self.wait() => false,
        }
    }
}

impl From<watch::Receiver<bool>> for Shutdown {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }
}

/// Core walker. `C` = chain provider, `L` = journal ledger, `P` = operator presenter.
pub struct BlockWalker<C, L, P> {
    source: C,
    ledger: L,
    presenter: P,
    config: WalkerConfig,
    cursor: WalkerCursor,
    state: WalkerState,
    shutdown: Shutdown,
}

impl<C, L, P> BlockWalker<C, L, P>
where
    C: ChainSource,
    L: Ledger,
    P: Presenter,
{
    /// Create a walker with default tunables and no external quit flag.
    pub fn new(source: C, ledger: L, presenter: P) -> Self {
        Self {
            source,
            ledger,
            presenter,
            config: WalkerConfig::default(),
            cursor: WalkerCursor::default(),
            state: WalkerState::Idle,
            shutdown: Shutdown::never(),
        }
    }

    /// Override the tunables.
    pub fn with_config(mut self, config: WalkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: impl Into<Shutdown>) -> Self {
        self.shutdown = shutdown.into();
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WalkerState {
        self.state
    }

    /// Current position.
    pub fn cursor(&self) -> WalkerCursor {
        self.cursor
    }

    /// The ledger records are written to.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The presenter events are sent to.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Drive the walker until the operator quits or shutdown fires.
    ///
    /// # Errors
    /// Only presenter failures end the run with an error; provider failures are
    /// retried and ledger failures are reported and skipped.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match self.state {
                WalkerState::Idle => self.start().await?,
                WalkerState::Backfilling { .. } => self.backfill().await?,
                WalkerState::LiveFollowing => {
                    self.poll_once().await?;
                }
                WalkerState::Terminated => return Ok(()),
            }
        }
    }

    /// Query the tip and position the cursor before the backlog window.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let Some(tip) = self.fetch_tip().await? else {
            return self.terminate().await;
        };
        let range = backfill_range(tip, self.config.window);
        tracing::info!(
            tip,
            from = range.start(),
            window = self.config.window,
            "starting backlog replay"
        );
        self.cursor = WalkerCursor::before(*range.start());
        self.state = WalkerState::Backfilling { tip };
        Ok(())
    }

    /// Replay the remaining backlog, then switch to following the tip.
    pub async fn backfill(&mut self) -> anyhow::Result<()> {
        let WalkerState::Backfilling { tip } = self.state else {
            return Ok(());
        };
        let from = self.cursor.next_height();
        match self.process_range(from, tip).await? {
            Pacing::Quit => self.terminate().await,
            Pacing::Continue => {
                self.cursor.advance(tip);
                tracing::info!(at = tip, "backlog complete, following tip");
                self.state = WalkerState::LiveFollowing;
                self.presenter.on_live().await
            }
        }
    }

    /// One live-follow iteration: poll the tip, process anything new, or sleep.
    pub async fn poll_once(&mut self) -> anyhow::Result<PollOutcome> {
        if self.shutdown.is_set() {
            self.terminate().await?;
            return Ok(PollOutcome::Terminated);
        }

        let current = match self.source.tip_height().await {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "tip poll failed, backing off");
                self.presenter.on_error(&e.to_string()).await?;
                if !self.shutdown.sleep(self.config.error_backoff).await {
                    self.terminate().await?;
                    return Ok(PollOutcome::Terminated);
                }
                return Ok(PollOutcome::FetchFailed);
            }
        };

        let next = self.cursor.next_height();
        if self.cursor.last_checked_height().is_some_and(|last| current <= last) {
            tracing::trace!(current, "no new block");
            if !self.shutdown.sleep(self.config.poll_interval).await {
                self.terminate().await?;
                return Ok(PollOutcome::Terminated);
            }
            return Ok(PollOutcome::Idle);
        }

        match self.process_range(next, current).await? {
            Pacing::Quit => {
                self.terminate().await?;
                Ok(PollOutcome::Terminated)
            }
            Pacing::Continue => Ok(PollOutcome::Advanced { to: current }),
        }
    }

    async fn terminate(&mut self) -> anyhow::Result<()> {
        if self.state == WalkerState::Terminated {
            return Ok(());
        }
        tracing::info!(last = ?self.cursor.last_checked_height(), "walker terminated");
        self.state = WalkerState::Terminated;
        self.presenter.on_exit().await
    }

    /// Tip height, retried with backoff. `None` if shutdown fired meanwhile.
    async fn fetch_tip(&self) -> anyhow::Result<Option<u32>> {
        loop {
            match self.source.tip_height().await {
                Ok(tip) => return Ok(Some(tip)),
                Err(e) => {
                    tracing::warn!(error = %e, "tip query failed, retrying");
                    self.presenter.on_error(&e.to_string()).await?;
                    if !self.shutdown.sleep(self.config.error_backoff).await {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Process `from..=to` in height order, pacing after every block.
    ///
    /// Fetches may run ahead (`prefetch`), but ledger writes and presenter
    /// calls happen strictly in height order.
    async fn process_range(&mut self, from: u32, to: u32) -> anyhow::Result<Pacing> {
        if from > to {
            return Ok(Pacing::Continue);
        }

        let source = &self.source;
        let presenter = &self.presenter;
        let ledger = &self.ledger;
        let shutdown = &self.shutdown;
        let backoff = self.config.error_backoff;

        let mut blocks = stream::iter(from..=to)
            .map(|height| fetch_block(source, presenter, shutdown, height, backoff))
            .buffered(self.config.prefetch.max(1));

        loop {
            if shutdown.is_set() {
                return Ok(Pacing::Quit);
            }
            let Some(fetched) = blocks.next().await else {
                return Ok(Pacing::Continue);
            };
            let Some((block, txs)) = fetched? else {
                return Ok(Pacing::Quit);
            };
            // the flag may have fired while the block was in flight
            if shutdown.is_set() {
                return Ok(Pacing::Quit);
            }
            apply_block(ledger, presenter, block, &txs).await?;
            self.cursor.advance(block.height);

            let pacing = tokio::select! {
                pacing = presenter.pace() => pacing?,
                () = shutdown.wait() => Pacing::Quit,
            };
            if pacing == Pacing::Quit {
                return Ok(Pacing::Quit);
            }
        }
    }
}

/// Fetch hash and transactions for `height` as one unit, retrying with backoff.
async fn fetch_block<C, P>(
    source: &C,
    presenter: &P,
    shutdown: &Shutdown,
    height: u32,
    backoff: Duration,
) -> anyhow::Result<Option<(Block, Vec<Transaction>)>>
where
    C: ChainSource,
    P: Presenter,
{
    loop {
        let attempt = async {
            let hash = source.block_hash(height).await?;
            let txs = source.block_transactions(hash).await?;
            Ok::<_, FetchError>((Block { height, hash }, txs))
        }
        .await;

        match attempt {
            Ok(fetched) => return Ok(Some(fetched)),
            Err(e) => {
                tracing::warn!(height, error = %e, "block fetch failed, retrying");
                presenter.on_error(&e.to_string()).await?;
                if !shutdown.sleep(backoff).await {
                    return Ok(None);
                }
            }
        }
    }
}

/// Decode, classify, display and persist every output of `block`, in order.
async fn apply_block<L, P>(
    ledger: &L,
    presenter: &P,
    block: Block,
    txs: &[Transaction],
) -> anyhow::Result<()>
where
    L: Ledger,
    P: Presenter,
{
    presenter.on_block(&block).await?;

    let mut saved = 0usize;
    for tx in txs {
        for msg in decoder::extract(block.height, tx) {
            match classify(&msg.text) {
                MessageKind::Journal => {
                    presenter.on_journal(&msg).await?;
                    match ledger.append(msg.height, msg.txid, &msg.text).await {
                        Ok(id) => {
                            saved += 1;
                            presenter.on_saved(&msg, id).await?;
                        }
                        Err(e) => {
                            tracing::error!(height = msg.height, txid = %msg.txid, error = %e, "journal record dropped");
                            presenter.on_error(&e.to_string()).await?;
                        }
                    }
                }
                MessageKind::Note => presenter.on_note(&msg).await?,
            }
        }
    }

    tracing::info!(
        height = block.height,
        hash = %block.hash,
        txs = txs.len(),
        saved,
        "block processed"
    );
    Ok(())
}
