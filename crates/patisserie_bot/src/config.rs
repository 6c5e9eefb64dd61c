//! TOML configuration for the bot server.

use patisserie_core::{ChannelId, EscalationPolicy, GuildId, MemberId, StaffRole};
use patisserie_error::{ConfigError, PatisserieResult};
use patisserie_interface::StaffChannel;
use patisserie_kitchen::KitchenSettings;
use patisserie_quota::QuotaSettings;
use patisserie_sweep::SweepSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the bot server.
///
/// Every section is optional; missing keys take the defaults below.
/// Secrets (bot token, database URL) never live here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Order timers and sweep cadence
    #[serde(default)]
    pub timers: TimersConfig,
    /// Weekly quota job
    #[serde(default)]
    pub quota: QuotaSettings,
    /// Strike thresholds
    #[serde(default)]
    pub escalation: EscalationPolicy,
    /// Premium codes
    #[serde(default)]
    pub premium: PremiumConfig,
    /// Platform ids
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Customer-facing text
    #[serde(default)]
    pub branding: BrandingConfig,
    /// Metrics HTTP API
    #[serde(default)]
    pub api: ApiConfig,
    /// Connection pool
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl BotConfig {
    /// Load bot configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> PatisserieResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> PatisserieResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timers.cook_secs == 0 {
            return Err(ConfigError::new("timers.cook_secs must be positive"));
        }
        if self.premium.max_codes_per_batch < 1 {
            return Err(ConfigError::new("premium.max_codes_per_batch must be positive"));
        }
        if self.premium.duration_days == 0 {
            return Err(ConfigError::new("premium.duration_days must be positive"));
        }
        Ok(())
    }
}

/// Cook timer and sweep thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimersConfig {
    /// How long an order cooks
    pub cook_secs: u64,
    /// Age at which a claim is released
    pub unclaim_after_secs: u64,
    /// Age at which a ready order is auto-delivered
    pub deliver_after_secs: u64,
    /// Period of the unclaim and delivery sweeps
    pub order_sweep_secs: u64,
    /// Period of the premium and vacation expiry sweeps
    pub expiry_sweep_secs: u64,
    /// Period of the quota boundary check
    pub quota_check_secs: u64,
}

impl Default for TimersConfig {
    fn default() -> Self {
        let sweeps = SweepSettings::default();
        Self {
            cook_secs: patisserie_core::COOK_DURATION.as_secs(),
            unclaim_after_secs: *sweeps.unclaim_after_secs(),
            deliver_after_secs: *sweeps.deliver_after_secs(),
            order_sweep_secs: *sweeps.unclaim_interval_secs(),
            expiry_sweep_secs: *sweeps.premium_interval_secs(),
            quota_check_secs: *sweeps.quota_interval_secs(),
        }
    }
}

/// Premium code settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PremiumConfig {
    /// Length of a redeemed grant
    pub duration_days: u32,
    /// Most codes per generate call
    pub max_codes_per_batch: i64,
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            duration_days: 30,
            max_codes_per_batch: 50,
        }
    }
}

/// Staff channel ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelIds {
    /// Kitchen channel
    pub kitchen: Option<u64>,
    /// Delivery counter channel
    pub counter: Option<u64>,
    /// Warning log channel
    pub moderation: Option<u64>,
    /// Ratings channel
    pub ratings: Option<u64>,
    /// Complaints channel
    pub complaints: Option<u64>,
    /// Quota report channel
    pub quota: Option<u64>,
    /// Vacation requests channel
    pub vacation: Option<u64>,
    /// Order backup channel
    pub audit: Option<u64>,
}

impl ChannelIds {
    /// Platform channel behind a staff channel.
    pub fn get(&self, channel: StaffChannel) -> Option<ChannelId> {
        let id = match channel {
            StaffChannel::Kitchen => self.kitchen,
            StaffChannel::Counter => self.counter,
            StaffChannel::Moderation => self.moderation,
            StaffChannel::Ratings => self.ratings,
            StaffChannel::Complaints => self.complaints,
            StaffChannel::Quota => self.quota,
            StaffChannel::Vacation => self.vacation,
            StaffChannel::Audit => self.audit,
        };
        id.map(ChannelId)
    }
}

/// Role ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleIds {
    /// Kitchen staff
    pub cook: Option<u64>,
    /// Delivery staff
    pub delivery: Option<u64>,
    /// Management
    pub manager: Option<u64>,
    /// Senior kitchen staff
    pub senior_cook: Option<u64>,
    /// Senior delivery staff
    pub senior_delivery: Option<u64>,
    /// Quota exemption
    pub quota_bypass: Option<u64>,
    /// Premium role in the support server
    pub vip: Option<u64>,
}

impl RoleIds {
    /// Platform role behind a staff role.
    pub fn get(&self, role: StaffRole) -> Option<u64> {
        match role {
            StaffRole::Cook => self.cook,
            StaffRole::Delivery => self.delivery,
            StaffRole::Manager => self.manager,
            StaffRole::SeniorCook => self.senior_cook,
            StaffRole::SeniorDelivery => self.senior_delivery,
            StaffRole::QuotaBypass => self.quota_bypass,
            StaffRole::Vip => self.vip,
        }
    }
}

/// Platform identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Main server
    pub guild_id: Option<u64>,
    /// Support server holding the VIP role
    pub support_guild_id: Option<u64>,
    /// Members with owner rights
    pub owner_ids: Vec<u64>,
    /// Prefix of text commands
    pub command_prefix: String,
    /// Staff channels
    pub channels: ChannelIds,
    /// Roles
    pub roles: RoleIds,
}

impl DiscordConfig {
    /// Owners as member ids.
    pub fn owners(&self) -> Vec<MemberId> {
        self.owner_ids.iter().copied().map(MemberId).collect()
    }

    /// Main server id.
    pub fn guild(&self) -> Option<GuildId> {
        self.guild_id.map(GuildId)
    }

    /// Text command prefix, `!` when unset.
    pub fn prefix(&self) -> &str {
        if self.command_prefix.is_empty() {
            "!"
        } else {
            &self.command_prefix
        }
    }
}

/// Customer-facing text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    /// Invite to the support server, shown with suspensions
    pub appeal_link: Option<String>,
}

/// Metrics HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Whether to serve the API
    pub enabled: bool,
    /// Listen address
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Maximum pooled connections
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { pool_size: 10 }
    }
}

impl From<&BotConfig> for KitchenSettings {
    fn from(config: &BotConfig) -> Self {
        Self::builder()
            .cook_duration(Duration::from_secs(config.timers.cook_secs))
            .escalation(config.escalation.clone())
            .appeal_notice(
                config
                    .branding
                    .appeal_link
                    .as_ref()
                    .map(|link| format!("Appeal here: {link}")),
            )
            .premium_days(config.premium.duration_days)
            .max_codes_per_batch(config.premium.max_codes_per_batch)
            .build()
            .unwrap_or_default()
    }
}

impl From<&BotConfig> for SweepSettings {
    fn from(config: &BotConfig) -> Self {
        let timers = &config.timers;
        Self::builder()
            .unclaim_interval_secs(timers.order_sweep_secs)
            .cooking_interval_secs(timers.order_sweep_secs)
            .delivery_interval_secs(timers.order_sweep_secs)
            .premium_interval_secs(timers.expiry_sweep_secs)
            .vacation_interval_secs(timers.expiry_sweep_secs)
            .quota_interval_secs(timers.quota_check_secs)
            .unclaim_after_secs(timers.unclaim_after_secs)
            .cook_after_secs(timers.cook_secs)
            .deliver_after_secs(timers.deliver_after_secs)
            .build()
            .unwrap_or_default()
    }
}
