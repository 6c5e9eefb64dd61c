//! Premium codes and VIP grants.

use crate::MemberId;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Leading segment of every code.
pub const PREMIUM_CODE_PREFIX: &str = "VIP";

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SEGMENTS: usize = 3;
const SEGMENT_LEN: usize = 4;

/// Random code of the form `VIP-XXXX-XXXX-XXXX`.
///
/// # Examples
///
/// ```
/// let code = patisserie_core::generate_code(&mut rand::thread_rng());
/// assert_eq!(code.len(), 18);
/// assert!(code.starts_with("VIP-"));
/// ```
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::from(PREMIUM_CODE_PREFIX);
    for _ in 0..SEGMENTS {
        code.push('-');
        for _ in 0..SEGMENT_LEN {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            code.push(CODE_ALPHABET[idx] as char);
        }
    }
    code
}

/// Redemption status of a code.
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
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CodeStatus {
    /// Not yet redeemed.
    Unused,
    /// Redeemed once.
    Redeemed,
}

/// A single-use premium code.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct PremiumCode {
    /// Code text.
    code: String,
    /// Redemption status.
    #[builder(default = "CodeStatus::Unused")]
    status: CodeStatus,
    /// Length of the grant in days.
    duration_days: u32,
    /// Issuer.
    created_by: MemberId,
    /// Issue time.
    created_at: DateTime<Utc>,
    /// Redeeming member.
    #[builder(default)]
    redeemed_by: Option<MemberId>,
    /// Redemption time.
    #[builder(default)]
    redeemed_at: Option<DateTime<Utc>>,
}

impl PremiumCode {
    /// A fresh unused code.
    pub fn issue(
        code: impl Into<String>,
        duration_days: u32,
        created_by: MemberId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            status: CodeStatus::Unused,
            duration_days,
            created_by,
            created_at: now,
            redeemed_by: None,
            redeemed_at: None,
        }
    }

    /// The redeemed form of this code.
    pub fn redeemed(&self, by: MemberId, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = CodeStatus::Redeemed;
        next.redeemed_by = Some(by);
        next.redeemed_at = Some(now);
        next
    }
}

/// A member's VIP standing.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct PremiumGrant {
    /// Holder.
    member_id: MemberId,
    /// Whether the grant is in force.
    is_vip: bool,
    /// End of the grant; `None` never expires.
    #[builder(default)]
    expires_at: Option<DateTime<Utc>>,
    /// Code that produced the grant.
    #[builder(default)]
    redeemed_code: Option<String>,
}

impl PremiumGrant {
    /// Grant produced by redeeming `code`.
    pub fn from_code(member_id: MemberId, code: &PremiumCode, now: DateTime<Utc>) -> Self {
        Self {
            member_id,
            is_vip: true,
            expires_at: Some(now + Duration::days(i64::from(*code.duration_days()))),
            redeemed_code: Some(code.code().clone()),
        }
    }

    /// Grant after redeeming `code` on top of `previous`.
    ///
    /// An active grant is never shortened: a permanent one stays permanent
    /// and a later expiry is kept.
    pub fn after_redeeming(
        member_id: MemberId,
        previous: Option<&PremiumGrant>,
        code: &PremiumCode,
        now: DateTime<Utc>,
    ) -> Self {
        let mut grant = Self::from_code(member_id, code, now);
        if let Some(previous) = previous.filter(|g| g.is_active(now)) {
            grant.expires_at = previous
                .expires_at
                .and_then(|kept| grant.expires_at.map(|fresh| kept.max(fresh)));
        }
        grant
    }

    /// Owner-granted VIP without expiry.
    pub fn permanent(member_id: MemberId) -> Self {
        Self {
            member_id,
            is_vip: true,
            expires_at: None,
            redeemed_code: None,
        }
    }

    /// A revoked grant.
    pub fn revoked(member_id: MemberId) -> Self {
        Self {
            member_id,
            is_vip: false,
            expires_at: None,
            redeemed_code: None,
        }
    }

    /// In force at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.is_vip && self.expires_at.is_none_or(|at| at > now)
    }

    /// In force by flag but past its expiry.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.is_vip && self.expires_at.is_some_and(|at| at < now)
    }
}
