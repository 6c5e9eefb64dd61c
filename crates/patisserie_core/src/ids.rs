//! Identifier newtypes.

use serde::{Deserialize, Serialize};

/// A chat member identity (customer or staff).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl MemberId {
    /// Inline mention markup for this member.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

/// A community (server) identity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// A text channel identity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Short opaque order identifier: six uppercase hex characters.
///
/// # Examples
///
/// ```
/// use patisserie_core::OrderId;
///
/// let id = OrderId::generate();
/// assert_eq!(id.as_str().len(), 6);
/// assert_eq!(OrderId::new(" abc123 ").as_str(), "ABC123");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Length of a generated identifier.
    pub const LEN: usize = 6;

    /// Wraps user-supplied text, trimmed and uppercased.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// Takes the leading hex digits of a fresh v4 UUID.
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple[..Self::LEN].to_uppercase())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for OrderId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
