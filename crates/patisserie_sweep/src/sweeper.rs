//! The sweep bodies.

use crate::{SweepMetrics, SweepSettings};
use patisserie_core::{Order, OrderStatus};
use patisserie_error::PatisserieResult;
use patisserie_interface::{Backends, OrderFilter};
use patisserie_kitchen::{OrderService, PremiumService, VacationService};
use patisserie_quota::QuotaEngine;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// The periodic sweeps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SweepKind {
    /// Release stale claims.
    Unclaim,
    /// Finish cooking whose timer was lost.
    Cooking,
    /// Deliver overdue ready orders.
    Delivery,
    /// Revoke lapsed VIP grants.
    PremiumExpiry,
    /// End finished vacations.
    VacationExpiry,
    /// Weekly quota run when due.
    Quota,
}

/// Tally of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    /// Records that looked due.
    pub examined: usize,
    /// Records actually changed by this pass.
    pub changed: usize,
    /// Records skipped after an error.
    pub failed: usize,
}

/// Runs sweeps against the services.
#[derive(Debug, Clone)]
pub struct Sweeper {
    backends: Backends,
    orders: OrderService,
    premium: PremiumService,
    vacations: VacationService,
    quota: QuotaEngine,
    settings: SweepSettings,
    metrics: SweepMetrics,
}

impl Sweeper {
    /// Create a sweeper over already-built services.
    pub fn new(
        backends: Backends,
        orders: OrderService,
        premium: PremiumService,
        vacations: VacationService,
        quota: QuotaEngine,
        settings: SweepSettings,
    ) -> Self {
        Self {
            backends,
            orders,
            premium,
            vacations,
            quota,
            settings,
            metrics: SweepMetrics::new(),
        }
    }

    /// Settings in use.
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// Runs one pass of `kind` and records it.
    #[instrument(skip(self), fields(sweep = %kind))]
    pub async fn run(&self, kind: SweepKind) -> PatisserieResult<SweepOutcome> {
        let result = match kind {
            SweepKind::Unclaim => self.unclaim_stale().await,
            SweepKind::Cooking => self.finish_stale_cooking().await,
            SweepKind::Delivery => self.deliver_overdue().await,
            SweepKind::PremiumExpiry => self.expire_premium().await,
            SweepKind::VacationExpiry => self.expire_vacations().await,
            SweepKind::Quota => self.check_quota().await,
        };
        match &result {
            Ok(outcome) => {
                self.metrics.record_success(kind, outcome);
                if outcome.changed > 0 || outcome.failed > 0 {
                    info!(
                        examined = outcome.examined,
                        changed = outcome.changed,
                        failed = outcome.failed,
                        "Sweep pass"
                    );
                } else {
                    debug!(examined = outcome.examined, "Sweep pass found nothing");
                }
            }
            Err(e) => {
                self.metrics.record_failure(kind);
                warn!(error = %e, "Sweep pass failed");
            }
        }
        result
    }

    /// Claims older than the threshold go back to `pending`.
    pub async fn unclaim_stale(&self) -> PatisserieResult<SweepOutcome> {
        let after = self.settings.unclaim_after();
        let now = self.backends.clock.now();
        let due: Vec<_> = self
            .orders_in(OrderStatus::Claimed)
            .await?
            .into_iter()
            .filter(|order| order.claim_expired(now, after))
            .collect();

        let mut outcome = SweepOutcome {
            examined: due.len(),
            ..SweepOutcome::default()
        };
        for order in due {
            let id = order.order_id();
            match self.orders.auto_unclaim(id, after).await {
                Ok(true) => outcome.changed += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failed += 1;
                    warn!(order_id = %id, error = %e, "Auto-unclaim failed");
                }
            }
        }
        Ok(outcome)
    }

    /// Orders cooking for longer than the cook time become ready.
    pub async fn finish_stale_cooking(&self) -> PatisserieResult<SweepOutcome> {
        let after = self.settings.cook_after();
        let now = self.backends.clock.now();
        let due: Vec<_> = self
            .orders_in(OrderStatus::Cooking)
            .await?
            .into_iter()
            .filter(|order| order.cooking_overdue(now, after))
            .collect();

        let mut outcome = SweepOutcome {
            examined: due.len(),
            ..SweepOutcome::default()
        };
        for order in due {
            let id = order.order_id();
            match self.orders.finish_overdue_cooking(id, after).await {
                Ok(true) => outcome.changed += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failed += 1;
                    warn!(order_id = %id, error = %e, "Finishing stale cooking failed");
                }
            }
        }
        Ok(outcome)
    }

    /// Ready orders older than the threshold are delivered by the system.
    pub async fn deliver_overdue(&self) -> PatisserieResult<SweepOutcome> {
        let after = self.settings.deliver_after();
        let now = self.backends.clock.now();
        let due: Vec<_> = self
            .orders_in(OrderStatus::Ready)
            .await?
            .into_iter()
            .filter(|order| order.delivery_overdue(now, after))
            .collect();

        let mut outcome = SweepOutcome {
            examined: due.len(),
            ..SweepOutcome::default()
        };
        for order in due {
            let id = order.order_id();
            match self.orders.auto_deliver(id, after).await {
                Ok(true) => outcome.changed += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failed += 1;
                    warn!(order_id = %id, error = %e, "Auto-delivery failed");
                }
            }
        }
        Ok(outcome)
    }

    /// Lapsed VIP grants are revoked.
    pub async fn expire_premium(&self) -> PatisserieResult<SweepOutcome> {
        let changed = self.premium.expire_lapsed().await?;
        Ok(SweepOutcome {
            examined: changed,
            changed,
            failed: 0,
        })
    }

    /// Vacations past their end date are closed.
    pub async fn expire_vacations(&self) -> PatisserieResult<SweepOutcome> {
        let changed = self.vacations.expire_overdue().await?;
        Ok(SweepOutcome {
            examined: changed,
            changed,
            failed: 0,
        })
    }

    /// Runs the weekly quota when its boundary is due.
    pub async fn check_quota(&self) -> PatisserieResult<SweepOutcome> {
        let report = self.quota.run_if_due().await?;
        let evaluated = report
            .map(|r| r.groups.iter().map(|g| g.lines.len()).sum::<usize>())
            .unwrap_or_default();
        Ok(SweepOutcome {
            examined: evaluated,
            changed: evaluated,
            failed: 0,
        })
    }

    async fn orders_in(&self, status: OrderStatus) -> PatisserieResult<Vec<Order>> {
        self.backends
            .orders
            .list(&OrderFilter::new().with_statuses([status]))
            .await
    }
}

