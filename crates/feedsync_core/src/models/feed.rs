//! Feeds.

use super::capability::FeedOwnCapability;
use super::follow::FollowData;
use super::member::FeedMemberData;
use super::user::UserData;
use crate::ids::FeedId;
use crate::sorted::Identifiable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A feed and the current user's relationship to it.
///
/// Counts are authoritative from the server and only change through
/// [`FeedData::merge`]. The `own_*` fields are `None` when unknown: list
/// endpoints omit them while detail endpoints include them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedData {
    /// Feed identity.
    pub feed: FeedId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Creator.
    pub created_by: UserData,
    /// Visibility setting.
    pub visibility: Option<String>,
    /// Number of followers.
    pub follower_count: u32,
    /// Number of followed feeds.
    pub following_count: u32,
    /// Number of members.
    pub member_count: u32,
    /// Number of pinned activities.
    pub pin_count: u32,
    /// The current user's capabilities on this feed.
    pub own_capabilities: Option<BTreeSet<FeedOwnCapability>>,
    /// The current user's follows of this feed.
    pub own_follows: Option<Vec<FollowData>>,
    /// The current user's membership.
    pub own_membership: Option<FeedMemberData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FeedData {
    /// Creates feed data with only an identity.
    pub fn new(feed: FeedId) -> Self {
        Self {
            feed,
            ..Default::default()
        }
    }

    /// Returns true if the current user may do `capability` on this feed.
    ///
    /// Unknown capabilities answer `false`.
    pub fn can(&self, capability: &FeedOwnCapability) -> bool {
        self.own_capabilities
            .as_ref()
            .map_or(false, |capabilities| capabilities.contains(capability))
    }

    /// Substitutes an incoming copy, keeping previously known `own_*`
    /// fields the incoming payload omits.
    pub fn merge(&mut self, incoming: FeedData) {
        let own_capabilities = incoming.own_capabilities.or(self.own_capabilities.take());
        let own_follows = incoming.own_follows.or(self.own_follows.take());
        let own_membership = incoming.own_membership.or(self.own_membership.take());
        *self = FeedData {
            own_capabilities,
            own_follows,
            own_membership,
            ..incoming
        };
    }
}

impl Identifiable for FeedData {
    type Id = FeedId;

    fn id(&self) -> FeedId {
        self.feed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_known_own_fields() {
        let fid = FeedId::new("user", "bob");
        let mut local = FeedData::new(fid.clone());
        local.own_capabilities = Some(BTreeSet::from([FeedOwnCapability::Follow]));
        local.own_follows = Some(vec![]);

        let mut incoming = FeedData::new(fid);
        incoming.follower_count = 12;
        incoming.name = "Bob".into();
        local.merge(incoming);

        assert_eq!(local.follower_count, 12);
        assert_eq!(local.name, "Bob");
        assert!(local.can(&FeedOwnCapability::Follow));
        assert_eq!(local.own_follows, Some(vec![]));
        assert!(local.own_membership.is_none());
    }

    #[test]
    fn merge_prefers_incoming_own_fields() {
        let fid = FeedId::new("user", "bob");
        let mut local = FeedData::new(fid.clone());
        local.own_capabilities = Some(BTreeSet::from([FeedOwnCapability::Follow]));

        let mut incoming = FeedData::new(fid);
        incoming.own_capabilities = Some(BTreeSet::from([FeedOwnCapability::Unfollow]));
        local.merge(incoming);

        assert!(!local.can(&FeedOwnCapability::Follow));
        assert!(local.can(&FeedOwnCapability::Unfollow));
    }
}
