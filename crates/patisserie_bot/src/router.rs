//! Routes parsed commands to the services.

use crate::{Actor, Command};
use patisserie_core::{MemberId, NewOrder, Order, Sanction, chef_label};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::DirectoryService;
use patisserie_kitchen::{CookStarted, OrderService, PremiumService, VacationService};
use patisserie_quota::QuotaEngine;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Answer to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    /// Message text.
    pub content: String,
    /// Only the actor should see it.
    pub private: bool,
}

impl Reply {
    /// Visible in the channel.
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            private: false,
        }
    }

    /// Visible to the actor only.
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            private: true,
        }
    }
}

/// Checks capabilities and calls the matching service.
#[derive(Clone)]
pub struct CommandRouter {
    orders: OrderService,
    premium: PremiumService,
    vacations: VacationService,
    quota: QuotaEngine,
    directory: Arc<dyn DirectoryService>,
    owners: Vec<MemberId>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("owners", &self.owners)
            .finish_non_exhaustive()
    }
}

impl CommandRouter {
    /// Create a router over built services.
    pub fn new(
        orders: OrderService,
        premium: PremiumService,
        vacations: VacationService,
        quota: QuotaEngine,
        directory: Arc<dyn DirectoryService>,
        owners: Vec<MemberId>,
    ) -> Self {
        Self {
            orders,
            premium,
            vacations,
            quota,
            directory,
            owners,
        }
    }

    /// Resolves `member` into an actor with current roles.
    pub async fn actor(&self, member: MemberId) -> PatisserieResult<Actor> {
        Actor::resolve(self.directory.as_ref(), member, &self.owners).await
    }

    /// Runs `command` for `actor`. Failures come back as a private reply.
    #[instrument(skip(self, actor, command), fields(actor = %actor.id(), capability = %command.capability()))]
    pub async fn dispatch(&self, actor: &Actor, command: Command) -> Reply {
        match self.execute(actor, command).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.action_kind().is_some() {
                    debug!(error = %e, "Command rejected");
                } else {
                    warn!(error = %e, "Command failed");
                }
                Reply::private(format!("❌ {}", e.user_message()))
            }
        }
    }

    async fn execute(&self, actor: &Actor, command: Command) -> PatisserieResult<Reply> {
        actor.require(command.capability())?;
        let me = actor.id();
        let privileged = actor.is_manager();

        let reply = match command {
            Command::Order { origin, item } => {
                let order = self
                    .orders
                    .create(NewOrder::new(me, origin.guild_id, origin.channel_id, item))
                    .await?;
                let vip = if *order.is_vip() { " 💎 VIP priority." } else { "" };
                Reply::public(format!(
                    "✅ Order placed! ID: `{}`.{}",
                    order.order_id(),
                    vip
                ))
            }
            Command::Claim { order_id } => {
                self.orders.claim(&order_id, me).await?;
                Reply::public(format!("👨‍🍳 You claimed `{order_id}`."))
            }
            Command::Unclaim { order_id } => {
                self.orders.unclaim(&order_id, me, privileged).await?;
                Reply::public(format!("↩️ `{order_id}` is back in the queue."))
            }
            Command::Cook { order_id, images } => {
                let CookStarted { order, timer } =
                    self.orders.cook(&order_id, me, privileged, images).await?;
                tokio::spawn(async move {
                    match timer.await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => warn!(order_id = %order_id, error = %e, "Cook timer failed"),
                        Err(e) => warn!(order_id = %order_id, error = %e, "Cook timer aborted"),
                    }
                });
                let minutes = self.orders.settings().cook_duration().as_secs().div_ceil(60);
                Reply::public(format!(
                    "🍳 Cooking `{}`. Ready in about {} minute(s).",
                    order.order_id(),
                    minutes
                ))
            }
            Command::Deliver { order_id } => {
                let ticket = self.orders.deliver(&order_id, me).await?;
                Reply::private(format!(
                    "🚴 Delivered `{}`. Post this:\n```\n{}\n```",
                    order_id, ticket.message
                ))
            }
            Command::Rate { order_id, stars } => {
                self.orders.rate(&order_id, me, stars).await?;
                Reply::private(format!("⭐ Thanks for rating `{order_id}`!"))
            }
            Command::Complain { order_id, text } => {
                self.orders.complain(&order_id, me, text).await?;
                Reply::private("📨 Complaint sent to management.")
            }
            Command::Warn { order_id, reason } => {
                let issued = self.orders.warn(&order_id, me, &reason).await?;
                Reply::public(describe_sanction(&issued.order, &issued.sanction))
            }
            Command::Fdo { order_id, reason } => {
                let issued = self.orders.force_cancel(&order_id, me, &reason).await?;
                Reply::public(describe_sanction(&issued.order, &issued.sanction))
            }
            Command::Unban { member } => {
                self.orders.unban(member, me).await?;
                Reply::public(format!("🛡️ {} unbanned.", member.mention()))
            }
            Command::Queue => Reply::private(render_queue(&self.orders.queue().await?)),
            Command::OrderInfo { order_id } => {
                Reply::private(render_order(&self.orders.info(&order_id).await?))
            }
            Command::Stats { member } => {
                let member = member.unwrap_or(me);
                let stats = self.orders.stats(member).await?;
                let record = stats.record();
                let rating = stats
                    .average_rating()
                    .map(|avg| format!("{avg:.1} ⭐ over {} order(s)", stats.rated_orders()))
                    .unwrap_or_else(|| "no ratings yet".to_string());
                Reply::private(format!(
                    "📊 **Stats for {}**\nCooked: {} this week, {} total\nDelivered: {} this week, {} total\nRating: {}",
                    member.mention(),
                    record.cook_count_week(),
                    record.cook_count_total(),
                    record.deliver_count_week(),
                    record.deliver_count_total(),
                    rating
                ))
            }
            Command::SetScript { script } => {
                self.orders.set_script(me, &script).await?;
                Reply::private("📝 Delivery message saved.")
            }
            Command::Redeem { code } => {
                let grant = self.premium.redeem(me, &code).await?;
                let until = grant
                    .expires_at()
                    .map(|at| format!(" until {}", at.format("%Y-%m-%d")))
                    .unwrap_or_default();
                Reply::private(format!("💎 VIP active{until}!"))
            }
            Command::GenerateCodes { amount } => {
                let codes = self.premium.generate_codes(me, amount).await?;
                info!(count = codes.len(), "Codes issued");
                Reply::private(format!(
                    "🎟️ {} code(s):\n```\n{}\n```",
                    codes.len(),
                    codes.join("\n")
                ))
            }
            Command::AddVip { member } => {
                self.premium.add_vip(member).await?;
                Reply::private(format!("💎 {} is now VIP.", member.mention()))
            }
            Command::RemoveVip { member } => {
                self.premium.remove_vip(member).await?;
                Reply::private(format!("{} is no longer VIP.", member.mention()))
            }
            Command::Vacation { days, reason } => {
                self.vacations.request(me, days, &reason).await?;
                Reply::private(format!("🌴 Requested {days} day(s) off. Management will review it."))
            }
            Command::ApproveVacation { member, days } => {
                let request = self.vacations.approve(member, me, days).await?;
                Reply::public(format!(
                    "✅ Vacation for {} approved ({} days).",
                    member.mention(),
                    request.days()
                ))
            }
            Command::DenyVacation { member, reason } => {
                self.vacations.deny(member, me, &reason).await?;
                Reply::public(format!("❌ Vacation for {} denied.", member.mention()))
            }
            Command::RunQuota => {
                let report = self.quota.run_forced(me).await?;
                Reply::public(report.render(*self.quota.settings().report_limit()))
            }
            Command::QuotaStatus => Reply::private(self.quota.status(me).await?.render()),
        };
        Ok(reply)
    }
}

fn describe_sanction(order: &Order, sanction: &Sanction) -> String {
    let consequence = match sanction {
        Sanction::Strike { .. } => String::new(),
        Sanction::Suspended { until, .. } => {
            format!(" Suspended until {}.", until.format("%Y-%m-%d %H:%M UTC"))
        }
        Sanction::PermanentBan { .. } => " Permanently banned.".to_string(),
    };
    format!(
        "⚠️ `{}` cancelled. {} now has {} warning(s).{}",
        order.order_id(),
        order.customer_id().mention(),
        sanction.warnings(),
        consequence
    )
}

fn render_queue(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "📭 The queue is empty.".to_string();
    }
    let mut text = format!("📋 **Queue** ({} active)\n", orders.len());
    for order in orders {
        let vip = if *order.is_vip() { "💎 " } else { "" };
        let _ = writeln!(
            text,
            "{}`{}` {} | {} | {}",
            vip,
            order.order_id(),
            order.status(),
            order.item(),
            chef_label(order)
        );
    }
    text
}

fn render_order(order: &Order) -> String {
    let mut text = format!(
        "🔎 **Order** `{}`\nStatus: {}\nItem: {}\nCustomer: {}\nChef: {}\nPlaced: {}\n",
        order.order_id(),
        order.status(),
        order.item(),
        order.customer_id().mention(),
        chef_label(order),
        order.created_at().format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(stars) = order.rating() {
        let _ = writeln!(text, "Rating: {}", "⭐".repeat(usize::from(*stars)));
    }
    if let Some(complaint) = order.complaint() {
        let _ = writeln!(text, "Complaint: {complaint}");
    }
    if !order.images().is_empty() {
        let _ = writeln!(text, "Images: {}", order.images().join(" "));
    }
    text
}

/// Rejects text that is not a command for this bot.
///
/// # Errors
///
/// [`ActionErrorKind::InvalidInput`] when `text` lacks `prefix`.
pub fn strip_prefix<'a>(text: &'a str, prefix: &str) -> Result<&'a str, ActionError> {
    text.trim_start()
        .strip_prefix(prefix)
        .ok_or_else(|| ActionError::new(ActionErrorKind::InvalidInput("not a command".to_string())))
}
