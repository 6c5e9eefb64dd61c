//! Wires services, sweeps and the metrics API into one process.

use crate::{ApiState, BotConfig, CommandRouter, create_router};
use patisserie_error::{ConfigError, PatisserieResult};
use patisserie_interface::Backends;
use patisserie_kitchen::{KitchenSettings, OrderService, PremiumService, VacationService};
use patisserie_quota::QuotaEngine;
use patisserie_sweep::{SweepRunner, SweepSettings, Sweeper};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};

/// Bot server owning the sweeper and the command router.
#[derive(Debug)]
pub struct BotServer {
    config: BotConfig,
    sweeper: Arc<Sweeper>,
    router: CommandRouter,
}

impl BotServer {
    /// Builds every service over `backends`.
    ///
    /// # Errors
    ///
    /// Fails when the quota schedule does not parse.
    pub fn new(config: BotConfig, backends: Backends) -> PatisserieResult<Self> {
        let kitchen = KitchenSettings::from(&config);
        let orders = OrderService::new(backends.clone(), kitchen.clone());
        let premium = PremiumService::new(backends.clone(), kitchen);
        let vacations = VacationService::new(backends.clone());
        let quota = QuotaEngine::new(backends.clone(), config.quota.clone())?;

        let sweeper = Sweeper::new(
            backends.clone(),
            orders.clone(),
            premium.clone(),
            vacations.clone(),
            quota.clone(),
            SweepSettings::from(&config),
        );
        let router = CommandRouter::new(
            orders,
            premium,
            vacations,
            quota,
            Arc::clone(&backends.directory),
            config.discord.owners(),
        );

        Ok(Self {
            config,
            sweeper: Arc::new(sweeper),
            router,
        })
    }

    /// Command router sharing this server's services.
    pub fn router(&self) -> CommandRouter {
        self.router.clone()
    }

    /// The sweeper, for metrics and manual passes.
    pub fn sweeper(&self) -> &Arc<Sweeper> {
        &self.sweeper
    }

    /// Runs until Ctrl+C.
    pub async fn start(self) -> PatisserieResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
        })
        .await
    }

    /// Runs sweeps and the API until `shutdown` resolves, then drains the
    /// sweep bots.
    #[instrument(skip_all)]
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> PatisserieResult<()> {
        info!("Starting bot server");
        let runner = SweepRunner::spawn(Arc::clone(&self.sweeper));

        let api = if self.config.api.enabled {
            let bind = &self.config.api.bind;
            let listener = TcpListener::bind(bind)
                .await
                .map_err(|e| ConfigError::new(format!("Failed to bind API on {}: {}", bind, e)))?;
            info!(bind = %bind, "Metrics API listening");
            let app = create_router(ApiState::new(self.sweeper.metrics().clone()));
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    error!(error = %e, "Metrics API stopped");
                }
            }))
        } else {
            None
        };

        shutdown.await;
        info!("Shutdown signal received, stopping gracefully");

        if let Some(api) = api {
            api.abort();
        }
        runner.shutdown().await;
        if self.sweeper.metrics().overall_success_rate() < 1.0 {
            warn!(
                success_rate = self.sweeper.metrics().overall_success_rate(),
                "Some sweep passes failed during this run"
            );
        }
        info!("Bot server stopped");
        Ok(())
    }
}
