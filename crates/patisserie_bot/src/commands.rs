//! Typed commands and the capability each one needs.

use patisserie_core::{ChannelId, GuildId, MemberId, OrderId, StaffRole};
use patisserie_error::{ActionError, ActionErrorKind, PatisserieResult};
use patisserie_interface::DirectoryService;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::IntoEnumIterator;

/// What an actor must be to run a command.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Anyone.
    Customer,
    /// Kitchen staff or management.
    Kitchen,
    /// Delivery staff or management.
    Delivery,
    /// Any staff role.
    Staff,
    /// Management or an owner.
    Manager,
    /// An owner.
    Owner,
}

/// The member issuing a command, with the roles resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    id: MemberId,
    roles: HashSet<StaffRole>,
    is_owner: bool,
}

impl Actor {
    /// Actor holding `roles`.
    pub fn new(id: MemberId, roles: impl IntoIterator<Item = StaffRole>, is_owner: bool) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
            is_owner,
        }
    }

    /// Looks up every role `id` holds.
    pub async fn resolve(
        directory: &dyn DirectoryService,
        id: MemberId,
        owners: &[MemberId],
    ) -> PatisserieResult<Self> {
        let mut roles = HashSet::new();
        for role in StaffRole::iter() {
            if directory.has_role(id, role).await? {
                roles.insert(role);
            }
        }
        Ok(Self {
            id,
            roles,
            is_owner: owners.contains(&id),
        })
    }

    /// Member id.
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Management override applies.
    pub fn is_manager(&self) -> bool {
        self.is_owner || self.roles.contains(&StaffRole::Manager)
    }

    /// Whether the actor has `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        let holds = |role: StaffRole| self.roles.contains(&role);
        match capability {
            Capability::Customer => true,
            Capability::Kitchen => {
                self.is_manager() || holds(StaffRole::Cook) || holds(StaffRole::SeniorCook)
            }
            Capability::Delivery => {
                self.is_manager()
                    || holds(StaffRole::Delivery)
                    || holds(StaffRole::SeniorDelivery)
            }
            Capability::Staff => self.has(Capability::Kitchen) || self.has(Capability::Delivery),
            Capability::Manager => self.is_manager(),
            Capability::Owner => self.is_owner,
        }
    }

    /// Refuses actors without `capability`.
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::Unauthorized`].
    pub fn require(&self, capability: Capability) -> Result<(), ActionError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(ActionError::new(ActionErrorKind::Unauthorized(format!(
                "{capability} only"
            ))))
        }
    }
}

/// Where a command was typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// Community.
    pub guild_id: GuildId,
    /// Channel.
    pub channel_id: ChannelId,
}

/// Every action the bot accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    /// Place an order.
    Order {
        /// Where the order was placed.
        origin: Origin,
        /// What to make.
        item: String,
    },
    /// Take a pending order.
    Claim {
        /// Target order.
        order_id: OrderId,
    },
    /// Release a claim.
    Unclaim {
        /// Target order.
        order_id: OrderId,
    },
    /// Start cooking with photos.
    Cook {
        /// Target order.
        order_id: OrderId,
        /// Attachment urls.
        images: Vec<String>,
    },
    /// Hand a ready order to the customer.
    Deliver {
        /// Target order.
        order_id: OrderId,
    },
    /// Rate a delivered order.
    Rate {
        /// Target order.
        order_id: OrderId,
        /// Stars, 1 to 5.
        stars: i64,
    },
    /// File a complaint.
    Complain {
        /// Target order.
        order_id: OrderId,
        /// Complaint text.
        text: String,
    },
    /// Cancel an unfinished order with a strike.
    Warn {
        /// Target order.
        order_id: OrderId,
        /// Shown to the customer.
        reason: String,
    },
    /// Cancel a finished order with a strike.
    Fdo {
        /// Target order.
        order_id: OrderId,
        /// Shown to the customer.
        reason: String,
    },
    /// Lift a ban.
    Unban {
        /// Banned member.
        member: MemberId,
    },
    /// Active orders.
    Queue,
    /// One order in detail.
    OrderInfo {
        /// Target order.
        order_id: OrderId,
    },
    /// Counters and rating.
    Stats {
        /// Defaults to the actor.
        member: Option<MemberId>,
    },
    /// Custom delivery message.
    SetScript {
        /// Message body.
        script: String,
    },
    /// Redeem a premium code.
    Redeem {
        /// Code text.
        code: String,
    },
    /// Issue premium codes.
    GenerateCodes {
        /// How many.
        amount: i64,
    },
    /// Grant permanent VIP.
    AddVip {
        /// Recipient.
        member: MemberId,
    },
    /// Revoke VIP.
    RemoveVip {
        /// Holder.
        member: MemberId,
    },
    /// Ask for time off.
    Vacation {
        /// Requested days.
        days: i64,
        /// Why.
        reason: String,
    },
    /// Approve a vacation, optionally changing its length.
    ApproveVacation {
        /// Requesting member.
        member: MemberId,
        /// Replacement length.
        days: Option<i64>,
    },
    /// Refuse a vacation.
    DenyVacation {
        /// Requesting member.
        member: MemberId,
        /// Why.
        reason: String,
    },
    /// Run the weekly quota now.
    RunQuota,
    /// Own quota progress.
    QuotaStatus,
}

impl Command {
    /// Capability checked before the command runs.
    pub fn capability(&self) -> Capability {
        match self {
            Command::Order { .. }
            | Command::Rate { .. }
            | Command::Complain { .. }
            | Command::Redeem { .. } => Capability::Customer,
            Command::Claim { .. }
            | Command::Unclaim { .. }
            | Command::Cook { .. }
            | Command::OrderInfo { .. }
            | Command::Warn { .. } => Capability::Kitchen,
            Command::Deliver { .. } | Command::SetScript { .. } => Capability::Delivery,
            Command::Queue
            | Command::Stats { .. }
            | Command::Vacation { .. }
            | Command::QuotaStatus => Capability::Staff,
            Command::Fdo { .. }
            | Command::Unban { .. }
            | Command::ApproveVacation { .. }
            | Command::DenyVacation { .. }
            | Command::RunQuota => Capability::Manager,
            Command::GenerateCodes { .. } | Command::AddVip { .. } | Command::RemoveVip { .. } => {
                Capability::Owner
            }
        }
    }

    /// Parses a text command with its prefix already removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use patisserie_bot::{Command, Origin};
    /// use patisserie_core::{ChannelId, GuildId, OrderId};
    ///
    /// let origin = Origin { guild_id: GuildId(1), channel_id: ChannelId(2) };
    /// let cmd = Command::parse("rate abc123 5", origin, &[]).unwrap();
    /// assert_eq!(cmd, Command::Rate { order_id: OrderId::new("ABC123"), stars: 5 });
    /// ```
    ///
    /// # Errors
    ///
    /// [`ActionErrorKind::InvalidInput`] for unknown commands and missing or
    /// malformed arguments.
    pub fn parse(text: &str, origin: Origin, attachments: &[String]) -> Result<Self, ActionError> {
        let text = text.trim();
        let (name, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let mut args = Args::new(rest);

        let command = match name.to_lowercase().as_str() {
            "order" => Command::Order {
                origin,
                item: args.rest("item")?,
            },
            "claim" => Command::Claim {
                order_id: args.order_id()?,
            },
            "unclaim" => Command::Unclaim {
                order_id: args.order_id()?,
            },
            "cook" => Command::Cook {
                order_id: args.order_id()?,
                images: attachments.to_vec(),
            },
            "deliver" => Command::Deliver {
                order_id: args.order_id()?,
            },
            "rate" => Command::Rate {
                order_id: args.order_id()?,
                stars: args.number("stars")?,
            },
            "complain" => Command::Complain {
                order_id: args.order_id()?,
                text: args.rest("reason")?,
            },
            "warn" => Command::Warn {
                order_id: args.order_id()?,
                reason: args.rest("reason")?,
            },
            "fdo" => Command::Fdo {
                order_id: args.order_id()?,
                reason: args.rest("reason")?,
            },
            "unban" => Command::Unban {
                member: args.member()?,
            },
            "queue" => Command::Queue,
            "orderinfo" => Command::OrderInfo {
                order_id: args.order_id()?,
            },
            "stats" => Command::Stats {
                member: args.optional_member()?,
            },
            "setscript" => Command::SetScript {
                script: args.rest("message")?,
            },
            "redeem" => Command::Redeem {
                code: args.word("code")?.to_string(),
            },
            "generate" => Command::GenerateCodes {
                amount: args.number("amount")?,
            },
            "addvip" => Command::AddVip {
                member: args.member()?,
            },
            "removevip" => Command::RemoveVip {
                member: args.member()?,
            },
            "vacation" => Command::Vacation {
                days: args.number("days")?,
                reason: args.rest("reason")?,
            },
            "approve" => Command::ApproveVacation {
                member: args.member()?,
                days: args.optional_number("days")?,
            },
            "deny" => Command::DenyVacation {
                member: args.member()?,
                reason: args.rest("reason")?,
            },
            "runquota" => Command::RunQuota,
            "quotastatus" => Command::QuotaStatus,
            other => return Err(invalid(format!("unknown command `{other}`"))),
        };
        Ok(command)
    }
}

#[track_caller]
fn invalid(reason: String) -> ActionError {
    ActionError::new(ActionErrorKind::InvalidInput(reason))
}

/// Whitespace-separated argument cursor.
struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest: rest.trim() }
    }

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let (word, rest) = self
            .rest
            .split_once(char::is_whitespace)
            .unwrap_or((self.rest, ""));
        self.rest = rest.trim_start();
        Some(word)
    }

    fn word(&mut self, name: &str) -> Result<&'a str, ActionError> {
        self.next().ok_or_else(|| invalid(format!("missing {name}")))
    }

    fn order_id(&mut self) -> Result<OrderId, ActionError> {
        self.word("order id").map(OrderId::new)
    }

    fn number(&mut self, name: &str) -> Result<i64, ActionError> {
        let word = self.word(name)?;
        word.parse()
            .map_err(|_| invalid(format!("{name} must be a number, got `{word}`")))
    }

    fn optional_number(&mut self, name: &str) -> Result<Option<i64>, ActionError> {
        if self.rest.is_empty() {
            Ok(None)
        } else {
            self.number(name).map(Some)
        }
    }

    fn member(&mut self) -> Result<MemberId, ActionError> {
        let word = self.word("member")?;
        parse_member(word).ok_or_else(|| invalid(format!("`{word}` is not a member")))
    }

    fn optional_member(&mut self) -> Result<Option<MemberId>, ActionError> {
        if self.rest.is_empty() {
            Ok(None)
        } else {
            self.member().map(Some)
        }
    }

    fn rest(&mut self, name: &str) -> Result<String, ActionError> {
        let rest = std::mem::take(&mut self.rest).trim();
        if rest.is_empty() {
            Err(invalid(format!("missing {name}")))
        } else {
            Ok(rest.to_string())
        }
    }
}

/// Accepts `<@123>`, `<@!123>` or a bare id.
fn parse_member(word: &str) -> Option<MemberId> {
    let digits = word
        .strip_prefix("<@")
        .and_then(|w| w.strip_suffix('>'))
        .map(|w| w.trim_start_matches('!'))
        .unwrap_or(word);
    digits.parse().ok().map(MemberId)
}
