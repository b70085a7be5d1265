//! Feed identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identifier of a feed.
///
/// A feed is addressed by a `(group, id)` pair, rendered on the wire as
/// `group:id` (for example `user:alice` or `timeline:alice`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FeedId {
    group: String,
    id: String,
}

impl FeedId {
    /// Creates a feed id from its group and id parts.
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
        }
    }

    /// Returns the feed group (e.g. `user`).
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the id within the group (e.g. `alice`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the `group:id` wire form.
    pub fn raw_value(&self) -> String {
        format!("{}:{}", self.group, self.id)
    }

    /// Parses the `group:id` wire form.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw.split_once(':') {
            Some((group, id)) if !group.is_empty() && !id.is_empty() => Ok(Self::new(group, id)),
            _ => Err(CoreError::invalid_feed_id(raw)),
        }
    }
}

impl FromStr for FeedId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({}:{})", self.group, self.id)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.id)
    }
}

impl Serialize for FeedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw_value())
    }
}

impl<'de> Deserialize<'de> for FeedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let fid: FeedId = "user:alice".parse().unwrap();
        assert_eq!(fid.group(), "user");
        assert_eq!(fid.id(), "alice");
        assert_eq!(fid.to_string(), "user:alice");
        assert_eq!(fid.raw_value(), "user:alice");
    }

    #[test]
    fn parse_keeps_colons_in_id() {
        let fid = FeedId::parse("stories:a:b").unwrap();
        assert_eq!(fid.group(), "stories");
        assert_eq!(fid.id(), "a:b");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(FeedId::parse("alice").is_err());
        assert!(FeedId::parse(":alice").is_err());
        assert!(FeedId::parse("user:").is_err());
    }

    #[test]
    fn serde_as_string() {
        let fid = FeedId::new("timeline", "bob");
        let json = serde_json::to_string(&fid).unwrap();
        assert_eq!(json, "\"timeline:bob\"");
        let back: FeedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fid);
        assert!(serde_json::from_str::<FeedId>("\"broken\"").is_err());
    }
}
