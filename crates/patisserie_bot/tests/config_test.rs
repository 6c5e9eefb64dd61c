use patisserie_bot::BotConfig;
use patisserie_core::{ChannelId, StaffRole};
use patisserie_interface::StaffChannel;
use patisserie_kitchen::KitchenSettings;
use patisserie_sweep::{SweepKind, SweepSettings};
use std::io::Write;
use std::time::Duration;

#[test]
fn empty_file_takes_defaults() {
    let config = BotConfig::from_toml("").unwrap();
    assert_eq!(config, BotConfig::default());
    assert_eq!(config.timers.cook_secs, 180);
    assert_eq!(config.timers.unclaim_after_secs, 240);
    assert_eq!(config.timers.deliver_after_secs, 1200);
    assert_eq!(config.premium.max_codes_per_batch, 50);
    assert_eq!(config.discord.prefix(), "!");
    assert!(config.api.enabled);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = BotConfig::from_toml(
        r#"
        [timers]
        cook_secs = 30

        [quota]
        max_fails = 3

        [discord]
        owner_ids = [42]
        command_prefix = "?"

        [discord.channels]
        kitchen = 555

        [discord.roles]
        manager = 777
        "#,
    )
    .unwrap();

    assert_eq!(config.timers.cook_secs, 30);
    assert_eq!(config.timers.order_sweep_secs, 60);
    assert_eq!(*config.quota.max_fails(), 3);
    assert_eq!(*config.quota.target_cap(), 30);
    assert_eq!(config.discord.owners().len(), 1);
    assert_eq!(config.discord.prefix(), "?");
    assert_eq!(
        config.discord.channels.get(StaffChannel::Kitchen),
        Some(ChannelId(555))
    );
    assert_eq!(config.discord.channels.get(StaffChannel::Counter), None);
    assert_eq!(config.discord.roles.get(StaffRole::Manager), Some(777));
    assert_eq!(*config.escalation.permanent_ban_at(), 9);
}

#[test]
fn settings_follow_the_config() {
    let config = BotConfig::from_toml(
        r#"
        [timers]
        cook_secs = 60
        order_sweep_secs = 15
        deliver_after_secs = 600

        [branding]
        appeal_link = "https://discord.gg/bakery"
        "#,
    )
    .unwrap();

    let kitchen = KitchenSettings::from(&config);
    assert_eq!(*kitchen.cook_duration(), Duration::from_secs(60));
    assert!(
        kitchen
            .appeal_notice()
            .as_deref()
            .is_some_and(|notice| notice.contains("https://discord.gg/bakery"))
    );

    let sweeps = SweepSettings::from(&config);
    assert_eq!(sweeps.interval(SweepKind::Unclaim), Duration::from_secs(15));
    assert_eq!(sweeps.interval(SweepKind::Delivery), Duration::from_secs(15));
    assert_eq!(sweeps.deliver_after(), Duration::from_secs(600));
    assert_eq!(sweeps.interval(SweepKind::Cooking), Duration::from_secs(15));
    assert_eq!(sweeps.cook_after(), Duration::from_secs(60));
}

#[test]
fn invalid_values_are_rejected() {
    assert!(BotConfig::from_toml("[timers]\ncook_secs = 0").is_err());
    assert!(BotConfig::from_toml("[premium]\nmax_codes_per_batch = 0").is_err());
    assert!(BotConfig::from_toml("[premium]\nduration_days = 0").is_err());
    assert!(BotConfig::from_toml("[timers]\ncook_secs = \"soon\"").is_err());
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[api]\nenabled = false\nbind = \"0.0.0.0:9000\"").unwrap();

    let config = BotConfig::from_file(file.path()).unwrap();
    assert!(!config.api.enabled);
    assert_eq!(config.api.bind, "0.0.0.0:9000");

    let missing = BotConfig::from_file("/nonexistent/patisserie.toml").unwrap_err();
    assert!(missing.to_string().contains("Failed to read config file"));
}

#[test]
fn example_config_parses() {
    let config = BotConfig::from_toml(include_str!("../../../patisserie.example.toml")).unwrap();
    assert_eq!(config.discord.roles.get(StaffRole::Vip), Some(400000000000000007));
    assert_eq!(config.quota.schedule(), "0 0 23 * * Sun");
}
