//! Ticker-driven sweep loops.

use crate::{SweepKind, Sweeper};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

/// Messages understood by a [`SweepBot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMessage {
    /// Run one pass now.
    Run,
    /// Stop the loop.
    Shutdown,
}

/// Runs one kind of sweep whenever asked.
#[derive(Debug)]
pub struct SweepBot {
    kind: SweepKind,
    sweeper: Arc<Sweeper>,
    rx: mpsc::Receiver<SweepMessage>,
}

impl SweepBot {
    /// Creates a bot for `kind`.
    pub fn new(kind: SweepKind, sweeper: Arc<Sweeper>, rx: mpsc::Receiver<SweepMessage>) -> Self {
        Self { kind, sweeper, rx }
    }

    /// Processes messages until shutdown or until every sender is gone.
    #[instrument(skip(self), fields(sweep = %self.kind))]
    pub async fn run(mut self) {
        info!("Sweep bot started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                SweepMessage::Run => {
                    // Failures are logged and counted by the sweeper.
                    let _ = self.sweeper.run(self.kind).await;
                }
                SweepMessage::Shutdown => {
                    info!("Sweep bot shutting down");
                    break;
                }
            }
        }
    }
}

/// Owns every sweep bot and its ticker.
#[derive(Debug)]
pub struct SweepRunner {
    senders: HashMap<SweepKind, mpsc::Sender<SweepMessage>>,
    bots: Vec<JoinHandle<()>>,
    tickers: Vec<JoinHandle<()>>,
}

impl SweepRunner {
    /// Spawns a bot and a ticker per sweep kind.
    pub fn spawn(sweeper: Arc<Sweeper>) -> Self {
        let mut senders = HashMap::new();
        let mut bots = Vec::new();
        let mut tickers = Vec::new();

        for kind in SweepKind::iter() {
            let (tx, rx) = mpsc::channel(8);
            let bot = SweepBot::new(kind, Arc::clone(&sweeper), rx);
            bots.push(tokio::spawn(async move {
                bot.run().await;
            }));
            tickers.push(Self::spawn_ticker(
                kind,
                sweeper.settings().interval(kind),
                tx.clone(),
            ));
            senders.insert(kind, tx);
        }

        info!(sweeps = senders.len(), "Sweep runner started");
        Self {
            senders,
            bots,
            tickers,
        }
    }

    fn spawn_ticker(
        kind: SweepKind,
        period: Duration,
        tx: mpsc::Sender<SweepMessage>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tx.send(SweepMessage::Run).await.is_err() {
                    error!(sweep = %kind, "Sweep bot channel closed");
                    break;
                }
            }
        })
    }

    /// Asks `kind` for an immediate pass.
    pub async fn trigger(&self, kind: SweepKind) -> bool {
        match self.senders.get(&kind) {
            Some(tx) => tx.send(SweepMessage::Run).await.is_ok(),
            None => false,
        }
    }

    /// Stops tickers, then lets each bot finish its current pass.
    pub async fn shutdown(self) {
        for ticker in &self.tickers {
            ticker.abort();
        }
        for (kind, tx) in &self.senders {
            if tx.send(SweepMessage::Shutdown).await.is_err() {
                warn!(sweep = %kind, "Sweep bot already stopped");
            }
        }
        for bot in self.bots {
            if let Err(e) = bot.await {
                error!(error = %e, "Sweep bot task failed");
            }
        }
        info!("Sweep runner stopped");
    }
}
