//! Strikes, cancellations and bans.

use crate::OrderService;
use patisserie_core::{MemberId, Order, OrderAction, OrderId, Sanction};
use patisserie_error::PatisserieResult;
use patisserie_interface::{Recipient, StaffChannel};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Result of a cancelling strike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningIssued {
    /// The cancelled order.
    pub order: Order,
    /// What the strike cost the customer.
    pub sanction: Sanction,
}

impl OrderService {
    /// Cancels an order that has not reached `ready` and strikes its
    /// customer.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidState`.
    #[instrument(skip(self, reason), fields(order_id = %id, actor = %actor))]
    pub async fn warn(
        &self,
        id: &OrderId,
        actor: MemberId,
        reason: &str,
    ) -> PatisserieResult<WarningIssued> {
        let order = self.apply(id, &OrderAction::Warn).await?;
        let sanction = self.escalate(&order, actor, reason, "WARN").await?;
        Ok(WarningIssued { order, sanction })
    }

    /// Cancels a ready or delivered order and strikes its customer.
    ///
    /// # Errors
    ///
    /// `NotFound` or `InvalidState`.
    #[instrument(skip(self, reason), fields(order_id = %id, actor = %actor))]
    pub async fn force_cancel(
        &self,
        id: &OrderId,
        actor: MemberId,
        reason: &str,
    ) -> PatisserieResult<WarningIssued> {
        let order = self.apply(id, &OrderAction::ForceCancel).await?;
        let sanction = self.escalate(&order, actor, reason, "FDO").await?;
        Ok(WarningIssued { order, sanction })
    }

    /// Clears a member's ban and suspension.
    #[instrument(skip(self), fields(member = %member, actor = %actor))]
    pub async fn unban(&self, member: MemberId, actor: MemberId) -> PatisserieResult<()> {
        self.backends.ledger.lift_ban(member).await?;
        info!("Member unbanned");

        self.notify(
            Recipient::Staff(StaffChannel::Moderation),
            &format!(
                "🛡️ **User Unbanned** | User: {} | By: {}",
                member.mention(),
                actor.mention()
            ),
        )
        .await;
        Ok(())
    }

    async fn escalate(
        &self,
        order: &Order,
        actor: MemberId,
        reason: &str,
        label: &str,
    ) -> PatisserieResult<Sanction> {
        let customer = *order.customer_id();
        let warnings = self.backends.ledger.add_warning(customer).await?;
        let sanction = self
            .settings
            .escalation()
            .evaluate(warnings, self.backends.clock.now());

        let ban_line = match sanction {
            Sanction::Strike { .. } => None,
            Sanction::Suspended { until, .. } => {
                self.backends.ledger.suspend_until(customer, until).await?;
                Some(format!("⏳ **SUSPENDED UNTIL {}**", until.format("%Y-%m-%d %H:%M UTC")))
            }
            Sanction::PermanentBan { .. } => {
                self.backends.ledger.ban(customer).await?;
                Some("🛑 **PERMANENT BAN APPLIED**".to_string())
            }
        };
        warn!(customer = %customer, warnings, sanction = ?sanction, "Strike recorded");

        let mut notice = format!(
            "⚠️ **Warning Issued**\nReason: {}\nStrikes: {}",
            reason, warnings
        );
        if let Some(line) = &ban_line {
            notice.push('\n');
            notice.push_str(line);
            if let Some(appeal) = self.settings.appeal_notice() {
                notice.push_str("\n\n🛡️ **Appeal:** ");
                notice.push_str(appeal);
            }
        }
        self.notify(Recipient::Member(customer), &notice).await;

        self.notify(
            Recipient::Staff(StaffChannel::Moderation),
            &format!(
                "⚠️ **User Warned ({})** | Order: `{}` | User: {} | By: {} | Reason: {} | Strikes: {} {}",
                label,
                order.order_id(),
                customer.mention(),
                actor.mention(),
                reason,
                warnings,
                ban_line.unwrap_or_default()
            ),
        )
        .await;
        Ok(sanction)
    }
}
