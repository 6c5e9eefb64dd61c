//! Discord adapters: notifications, role lookups and the message handler.

use crate::{BotConfig, Command, CommandRouter, DiscordConfig, Origin, Reply, strip_prefix};
use async_trait::async_trait;
use patisserie_core::{ChannelId, GuildId, MemberId, StaffRole};
use patisserie_error::{NotifyError, NotifyErrorKind, PatisserieResult};
use patisserie_interface::{DirectoryService, NotificationSink, Recipient, RoleAdministrator};
use serenity::Client;
use serenity::all::{
    ChannelId as SerenityChannelId, Context, EventHandler, GatewayIntents,
    GuildId as SerenityGuildId, Member, Message, Ready, RoleId, UserId,
};
use serenity::http::Http;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Page size of guild member listings.
const MEMBER_PAGE: u64 = 1000;

#[track_caller]
fn transport(context: &str, e: serenity::Error) -> NotifyError {
    NotifyError::new(NotifyErrorKind::Transport(format!("{context}: {e}")))
}

#[track_caller]
fn unreachable_recipient(what: String) -> NotifyError {
    NotifyError::new(NotifyErrorKind::Unreachable(what))
}

/// Sink, directory and role administrator over the Discord REST API.
#[derive(Clone)]
pub struct DiscordAdapter {
    http: Arc<Http>,
    config: DiscordConfig,
}

impl std::fmt::Debug for DiscordAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordAdapter")
            .field("guild_id", &self.config.guild_id)
            .finish_non_exhaustive()
    }
}

impl DiscordAdapter {
    /// Adapter for the bot behind `token`.
    pub fn new(token: &str, config: DiscordConfig) -> Self {
        Self::with_http(Arc::new(Http::new(token)), config)
    }

    /// Adapter over an existing client.
    pub fn with_http(http: Arc<Http>, config: DiscordConfig) -> Self {
        Self { http, config }
    }

    /// Guild and platform role behind `role`. The VIP role lives in the
    /// support server.
    fn locate(&self, role: StaffRole) -> Result<(SerenityGuildId, RoleId), NotifyError> {
        let guild = match role {
            StaffRole::Vip => self.config.support_guild_id.or(self.config.guild_id),
            _ => self.config.guild_id,
        }
        .ok_or_else(|| unreachable_recipient("no guild configured".to_string()))?;
        let role_id = self
            .config
            .roles
            .get(role)
            .ok_or_else(|| unreachable_recipient(format!("no role id configured for {role}")))?;
        Ok((SerenityGuildId::new(guild), RoleId::new(role_id)))
    }

    async fn member(
        &self,
        guild: SerenityGuildId,
        member: MemberId,
    ) -> Result<Option<Member>, NotifyError> {
        match self.http.get_member(guild, UserId::new(member.0)).await {
            Ok(found) => Ok(Some(found)),
            Err(serenity::Error::Http(e)) if e.status_code().is_some_and(|s| s.as_u16() == 404) => {
                Ok(None)
            }
            Err(e) => Err(transport("get member", e)),
        }
    }

    async fn send(&self, channel: SerenityChannelId, message: &str) -> Result<(), NotifyError> {
        channel
            .say(&*self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| transport("send message", e))
    }
}

#[async_trait]
impl NotificationSink for DiscordAdapter {
    #[instrument(skip(self, message), fields(recipient = ?to))]
    async fn notify(&self, to: &Recipient, message: &str) -> PatisserieResult<()> {
        let channel = match to {
            Recipient::Member(member) => {
                let dm = UserId::new(member.0)
                    .create_dm_channel(&*self.http)
                    .await
                    .map_err(|e| transport("open direct message", e))?;
                dm.id
            }
            Recipient::Staff(staff) => {
                let ChannelId(id) = self
                    .config
                    .channels
                    .get(*staff)
                    .ok_or_else(|| unreachable_recipient(format!("no channel configured for {staff}")))?;
                SerenityChannelId::new(id)
            }
            Recipient::Origin { channel_id, .. } => SerenityChannelId::new(channel_id.0),
        };
        self.send(channel, message).await?;
        debug!("Notification sent");
        Ok(())
    }
}

#[async_trait]
impl DirectoryService for DiscordAdapter {
    async fn members_with_role(&self, role: StaffRole) -> PatisserieResult<Vec<MemberId>> {
        let (guild, role_id) = self.locate(role)?;
        let mut holders = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .http
                .get_guild_members(guild, Some(MEMBER_PAGE), after)
                .await
                .map_err(|e| transport("list members", e))?;
            let Some(last) = page.last().map(|m| m.user.id.get()) else {
                break;
            };
            holders.extend(
                page.iter()
                    .filter(|m| m.roles.contains(&role_id))
                    .map(|m| MemberId(m.user.id.get())),
            );
            if (page.len() as u64) < MEMBER_PAGE {
                break;
            }
            after = Some(last);
        }
        debug!(role = %role, count = holders.len(), "Listed role holders");
        Ok(holders)
    }

    async fn has_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<bool> {
        let Ok((guild, role_id)) = self.locate(role) else {
            return Ok(false);
        };
        Ok(self
            .member(guild, member)
            .await?
            .is_some_and(|m| m.roles.contains(&role_id)))
    }

    async fn display_name(&self, member: MemberId) -> PatisserieResult<String> {
        if let Some(guild) = self.config.guild_id
            && let Some(found) = self.member(SerenityGuildId::new(guild), member).await?
        {
            return Ok(found.display_name().to_string());
        }
        let user = UserId::new(member.0)
            .to_user(&*self.http)
            .await
            .map_err(|e| transport("get user", e))?;
        Ok(user.name)
    }
}

#[async_trait]
impl RoleAdministrator for DiscordAdapter {
    #[instrument(skip(self), fields(member = %member, role = %role))]
    async fn grant_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()> {
        let (guild, role_id) = self.locate(role)?;
        self.http
            .add_member_role(guild, UserId::new(member.0), role_id, Some("patisserie"))
            .await
            .map_err(|e| transport("add role", e))?;
        info!("Role granted");
        Ok(())
    }

    #[instrument(skip(self), fields(member = %member, role = %role))]
    async fn revoke_role(&self, member: MemberId, role: StaffRole) -> PatisserieResult<()> {
        let (guild, role_id) = self.locate(role)?;
        self.http
            .remove_member_role(guild, UserId::new(member.0), role_id, Some("patisserie"))
            .await
            .map_err(|e| transport("remove role", e))?;
        info!("Role revoked");
        Ok(())
    }
}

/// Turns prefixed messages into commands.
pub struct DiscordHandler {
    router: CommandRouter,
    prefix: String,
    home_guild: Option<GuildId>,
}

impl DiscordHandler {
    /// Handler routing through `router`.
    pub fn new(router: CommandRouter, config: &BotConfig) -> Self {
        Self {
            router,
            prefix: config.discord.prefix().to_string(),
            home_guild: config.discord.guild(),
        }
    }

    /// Gateway intents the handler needs.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS
    }

    async fn answer(&self, ctx: &Context, msg: &Message, reply: Reply) {
        let sent = if reply.private {
            match msg.author.create_dm_channel(&ctx.http).await {
                Ok(dm) => dm.id.say(&ctx.http, &reply.content).await.map(|_| ()),
                Err(e) => Err(e),
            }
        } else {
            msg.reply(&ctx.http, &reply.content).await.map(|_| ())
        };
        if let Err(e) = sent {
            warn!(error = %e, "Failed to send reply");
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Ok(text) = strip_prefix(&msg.content, &self.prefix) else {
            return;
        };

        let Some(guild_id) = msg.guild_id.map(|g| GuildId(g.get())).or(self.home_guild) else {
            debug!("Command outside any guild ignored");
            return;
        };
        let origin = Origin {
            guild_id,
            channel_id: ChannelId(msg.channel_id.get()),
        };
        let attachments: Vec<String> = msg.attachments.iter().map(|a| a.url.clone()).collect();

        let reply = match Command::parse(text, origin, &attachments) {
            Ok(command) => match self.router.actor(MemberId(msg.author.id.get())).await {
                Ok(actor) => self.router.dispatch(&actor, command).await,
                Err(e) => {
                    error!(error = %e, "Failed to resolve actor");
                    Reply::private(format!("❌ {}", e.user_message()))
                }
            },
            Err(e) => Reply::private(format!("❌ {}", e.reason())),
        };
        self.answer(&ctx, &msg, reply).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected to Discord");
    }
}

/// Builds the gateway client.
///
/// # Errors
///
/// Transport error when the client cannot be created.
pub async fn build_client(token: &str, handler: DiscordHandler) -> PatisserieResult<Client> {
    let client = Client::builder(token, DiscordHandler::intents())
        .event_handler(handler)
        .await
        .map_err(|e| transport("build client", e))?;
    Ok(client)
}
