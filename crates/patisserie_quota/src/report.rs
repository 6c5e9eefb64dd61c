//! Quota run results and live progress views.

use chrono::{DateTime, Utc};
use patisserie_core::{MemberId, QuotaOutcome, QuotaTargets, QuotaTier, RoleGroup};
use serde::Serialize;
use std::fmt::Write;

/// One member's line in a group report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberLine {
    /// Who was evaluated.
    pub member: MemberId,
    /// Which target applied.
    pub tier: QuotaTier,
    /// What happened.
    pub outcome: QuotaOutcome,
}

impl MemberLine {
    fn render(&self) -> String {
        let who = self.member.mention();
        match self.outcome {
            QuotaOutcome::ExemptBypass => format!("🛡️ {}: Exempt (Bypass/Vacation)", who),
            QuotaOutcome::ExemptLowTraffic { done } => {
                format!("⚪ {}: {} (Exempt - Low Traffic)", who, done)
            }
            QuotaOutcome::Passed { done, target } => {
                format!("✅ {}: {}/{} (Passed)", who, done, target)
            }
            QuotaOutcome::Strike {
                done,
                target,
                strike,
                limit,
            } => format!("⚠️ {}: {}/{} (Strike {}/{})", who, done, target, strike, limit),
            QuotaOutcome::RoleRemoved { done, target } => {
                format!("❌ {}: {}/{} (**ROLE REMOVED**)", who, done, target)
            }
        }
    }
}

/// Results for one role group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// The role group.
    pub group: RoleGroup,
    /// Targets computed from the group's volume.
    pub targets: QuotaTargets,
    /// One line per role holder.
    pub lines: Vec<MemberLine>,
}

impl GroupReport {
    /// The line for `member`, if they hold the group's role.
    pub fn line_for(&self, member: MemberId) -> Option<&MemberLine> {
        self.lines.iter().find(|line| line.member == member)
    }
}

/// Everything one quota run decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaReport {
    /// When the run happened.
    pub ran_at: DateTime<Utc>,
    /// Whether a manager forced the run.
    pub forced: bool,
    /// One entry per role group.
    pub groups: Vec<GroupReport>,
}

impl QuotaReport {
    /// The report for `group`.
    pub fn group(&self, group: RoleGroup) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Channel text, cut to at most `limit` characters.
    pub fn render(&self, limit: usize) -> String {
        let mut text = String::from("📊 **Weekly Quota Report**\n");
        for group in &self.groups {
            let _ = writeln!(
                text,
                "\n__**{}**__ (total {}, targets: normal `{}` | senior `{}`)",
                group.group.title(),
                group.targets.total_volume(),
                group.targets.normal(),
                group.targets.senior()
            );
            for line in &group.lines {
                text.push_str(&line.render());
                text.push('\n');
            }
        }
        truncate_chars(&text, limit)
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// Live progress in one role group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct GroupProgress {
    /// The role group.
    group: RoleGroup,
    /// Which target applies.
    tier: QuotaTier,
    /// Work done this week.
    done: u64,
    /// Current target given everyone's volume so far.
    target: u64,
}

impl GroupProgress {
    pub(crate) fn new(group: RoleGroup, tier: QuotaTier, done: u64, target: u64) -> Self {
        Self {
            group,
            tier,
            done,
            target,
        }
    }

    /// Whether the target is already met.
    pub fn is_met(&self) -> bool {
        self.done >= self.target
    }
}

/// A member's quota standing mid-week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct QuotaStatus {
    /// Whose status.
    member: MemberId,
    /// Holds the bypass role or is on vacation.
    exempt: bool,
    /// One entry per group whose role the member holds.
    groups: Vec<GroupProgress>,
}

impl QuotaStatus {
    pub(crate) fn new(member: MemberId, exempt: bool, groups: Vec<GroupProgress>) -> Self {
        Self {
            member,
            exempt,
            groups,
        }
    }

    /// Reply text for the member.
    pub fn render(&self) -> String {
        let mut text = String::from("📊 **Your Weekly Quota Status:**\n");
        if self.exempt {
            text.push_str("🛡️ **You are exempt from quota requirements (Bypass/Vacation).**\n");
        }
        for progress in &self.groups {
            let mark = if progress.is_met() { "✅" } else { "⚠️" };
            let _ = writeln!(
                text,
                "{}: {} / {} {}",
                progress.group.title(),
                progress.done,
                progress.target,
                mark
            );
        }
        if self.groups.is_empty() {
            text.push_str("You hold no quota role.\n");
        }
        text
    }
}
