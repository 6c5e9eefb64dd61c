//! The weekly quota run.

use crate::{
    GroupProgress, GroupReport, MemberLine, QuotaReport, QuotaSettings, QuotaStatus,
    WeeklyBoundary,
};
use chrono::{DateTime, Duration, Utc};
use patisserie_core::{
    MemberId, QuotaOutcome, QuotaTargets, QuotaTier, RoleGroup, StaffActivityRecord, StaffRole,
    VacationStatus, evaluate_member,
};
use patisserie_error::{PatisserieResult, ScheduleError};
use patisserie_interface::{Backends, Recipient, StaffChannel, notify_best_effort};
use std::collections::{HashMap, HashSet};
use strum::IntoEnumIterator;
use tracing::{debug, error, info, instrument, warn};

/// Role holders and their ledger records for one group.
struct Roster {
    holders: Vec<MemberId>,
    seniors: HashSet<MemberId>,
    records: HashMap<MemberId, StaffActivityRecord>,
    targets: QuotaTargets,
}

impl Roster {
    fn done(&self, member: MemberId, group: RoleGroup) -> u64 {
        self.records
            .get(&member)
            .map(|r| u64::from(r.weekly(group)))
            .unwrap_or_default()
    }

    fn fails(&self, member: MemberId, group: RoleGroup) -> u32 {
        self.records
            .get(&member)
            .map(|r| r.quota_fails(group))
            .unwrap_or_default()
    }

    fn tier(&self, member: MemberId) -> QuotaTier {
        if self.seniors.contains(&member) {
            QuotaTier::Senior
        } else {
            QuotaTier::Normal
        }
    }
}

/// Evaluates staff against weekly targets.
#[derive(Debug, Clone)]
pub struct QuotaEngine {
    backends: Backends,
    settings: QuotaSettings,
    boundary: WeeklyBoundary,
}

impl QuotaEngine {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// [`ScheduleError`] when the configured boundary does not parse.
    pub fn new(backends: Backends, settings: QuotaSettings) -> Result<Self, ScheduleError> {
        let boundary = WeeklyBoundary::parse(settings.schedule())?;
        Ok(Self {
            backends,
            settings,
            boundary,
        })
    }

    /// Settings in use.
    pub fn settings(&self) -> &QuotaSettings {
        &self.settings
    }

    /// Next weekly boundary after now.
    pub fn next_boundary(&self) -> Option<DateTime<Utc>> {
        self.boundary.next_after(self.backends.clock.now())
    }

    /// Runs the week if a boundary just passed and no run was recorded within
    /// the minimum gap.
    ///
    /// Returns `None` when nothing ran.
    #[instrument(skip(self))]
    pub async fn run_if_due(&self) -> PatisserieResult<Option<QuotaReport>> {
        let now = self.backends.clock.now();
        let window = Duration::minutes(*self.settings.check_window_minutes());
        if !self.boundary.is_due(now, window) {
            debug!(next = ?self.boundary.next_after(now), "No quota boundary due");
            return Ok(None);
        }

        let watermark = &self.backends.watermark;
        let previous = watermark.last_quota_run().await?;
        let gap = Duration::hours(*self.settings.min_gap_hours());
        if !watermark.claim_quota_run(now, gap).await? {
            info!("Quota already processed for this boundary");
            return Ok(None);
        }

        match self.process(now, false).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                warn!(error = %e, "Quota run failed, releasing the watermark");
                if let Err(release) = watermark.release_quota_run(now, previous).await {
                    error!(error = %release, "Could not release the quota watermark");
                }
                Err(e)
            }
        }
    }

    /// Runs the week immediately, ignoring the boundary and the watermark.
    #[instrument(skip(self), fields(actor = %actor))]
    pub async fn run_forced(&self, actor: MemberId) -> PatisserieResult<QuotaReport> {
        info!("Forced quota run");
        self.process(self.backends.clock.now(), true).await
    }

    /// A member's progress against targets computed from live counters.
    #[instrument(skip(self), fields(member = %member))]
    pub async fn status(&self, member: MemberId) -> PatisserieResult<QuotaStatus> {
        let exempt = self.has_bypass(member).await?;
        let mut groups = Vec::new();
        for group in RoleGroup::iter() {
            let roster = self.roster(group).await?;
            if !roster.holders.contains(&member) {
                continue;
            }
            let tier = roster.tier(member);
            groups.push(GroupProgress::new(
                group,
                tier,
                roster.done(member, group),
                roster.targets.target_for(tier),
            ));
        }
        Ok(QuotaStatus::new(member, exempt, groups))
    }

    /// Reads every roster before closing any week, so a failed read leaves
    /// all counters untouched.
    async fn process(&self, now: DateTime<Utc>, forced: bool) -> PatisserieResult<QuotaReport> {
        let mut rosters = Vec::new();
        for group in RoleGroup::iter() {
            rosters.push((group, self.roster(group).await?));
        }
        let mut groups = Vec::with_capacity(rosters.len());
        for (group, roster) in rosters {
            groups.push(self.process_group(group, roster).await);
        }
        let report = QuotaReport {
            ran_at: now,
            forced,
            groups,
        };

        notify_best_effort(
            self.backends.sink.as_ref(),
            &Recipient::Staff(StaffChannel::Quota),
            &report.render(*self.settings.report_limit()),
        )
        .await;
        info!(forced, "Quota run complete");
        Ok(report)
    }

    #[instrument(skip(self, roster), fields(group = %group))]
    async fn process_group(&self, group: RoleGroup, roster: Roster) -> GroupReport {
        let targets = roster.targets;
        info!(
            total = targets.total_volume(),
            staff = targets.staff_count(),
            normal = targets.normal(),
            senior = targets.senior(),
            "Quota targets"
        );

        let mut lines = Vec::with_capacity(roster.holders.len());
        for &member in &roster.holders {
            let bypass = match self.has_bypass(member).await {
                Ok(bypass) => bypass,
                Err(e) => {
                    warn!(member = %member, error = %e, "Bypass lookup failed, skipping member");
                    continue;
                }
            };
            let tier = roster.tier(member);
            let fails_before = roster.fails(member, group);
            let outcome = evaluate_member(
                &targets,
                tier,
                roster.done(member, group),
                bypass,
                fails_before,
                *self.settings.max_fails(),
                *self.settings.min_volume(),
            );

            if let Err(e) = self
                .backends
                .ledger
                .close_week(member, group, outcome.fails_after(fails_before))
                .await
            {
                warn!(member = %member, error = %e, "Failed to close quota week, skipping member");
                continue;
            }
            debug!(member = %member, outcome = ?outcome, "Member evaluated");

            if matches!(outcome, QuotaOutcome::RoleRemoved { .. }) {
                if let Err(e) = self
                    .backends
                    .roles
                    .revoke_role(member, group.member_role())
                    .await
                {
                    warn!(member = %member, error = %e, "Failed to revoke role after quota misses");
                }
                info!(member = %member, "Role removed for missed quota");
            }
            self.notify_member(member, group, &outcome).await;
            lines.push(MemberLine {
                member,
                tier,
                outcome,
            });
        }

        GroupReport {
            group,
            targets,
            lines,
        }
    }

    async fn roster(&self, group: RoleGroup) -> PatisserieResult<Roster> {
        let directory = &self.backends.directory;
        let holders = directory.members_with_role(group.member_role()).await?;
        let seniors: HashSet<MemberId> = directory
            .members_with_role(group.senior_role())
            .await?
            .into_iter()
            .collect();

        let mut records = HashMap::new();
        for &member in &holders {
            if let Some(record) = self.backends.ledger.get(member).await? {
                records.insert(member, record);
            }
        }
        let total: u64 = records.values().map(|r| u64::from(r.weekly(group))).sum();
        let targets = QuotaTargets::compute(total, holders.len() as u64, *self.settings.target_cap());

        Ok(Roster {
            holders,
            seniors,
            records,
            targets,
        })
    }

    async fn has_bypass(&self, member: MemberId) -> PatisserieResult<bool> {
        if self
            .backends
            .directory
            .has_role(member, StaffRole::QuotaBypass)
            .await?
        {
            return Ok(true);
        }
        let now = self.backends.clock.now();
        Ok(self
            .backends
            .vacations
            .get(member)
            .await?
            .is_some_and(|v| *v.status() == VacationStatus::Active && !v.is_overdue(now)))
    }

    async fn notify_member(&self, member: MemberId, group: RoleGroup, outcome: &QuotaOutcome) {
        let verb = group.verb();
        let message = match outcome {
            QuotaOutcome::Passed { done, target } => format!(
                "🎉 **Quota Met!** You {} {}/{} orders.",
                verb, done, target
            ),
            QuotaOutcome::Strike {
                done,
                target,
                strike,
                limit,
            } => format!(
                "⚠️ **Quota Missed.** You {} {}/{}. Strike {}/{}.",
                verb, done, target, strike, limit
            ),
            QuotaOutcome::RoleRemoved { .. } => format!(
                "🛑 **Role Removed.** You missed the {} quota {} weeks in a row.",
                group.title(),
                self.settings.max_fails()
            ),
            QuotaOutcome::ExemptBypass | QuotaOutcome::ExemptLowTraffic { .. } => return,
        };
        notify_best_effort(
            self.backends.sink.as_ref(),
            &Recipient::Member(member),
            &message,
        )
        .await;
    }
}
