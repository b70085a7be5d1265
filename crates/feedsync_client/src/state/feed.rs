//! State of a single feed.

use super::list::{PageMode, PaginatedList};
use super::{LoadPhase, StateChange};
use crate::event::StateEvent;
use crate::router::EventSubscriber;
use feedsync_core::{
    ActivityData, ActivityPinData, ChangeFeed, FeedData, FeedId, FeedMemberData,
    FeedOwnCapability, FollowData, FollowStatus, Identifiable, PaginationData, PaginationResult,
    QueryConfiguration, Queryable, SortedVec,
};
use feedsync_protocol::{GetOrCreateFeedResponse, NotificationStatus};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::mpsc::Receiver;
use tracing::{debug, trace};

/// Everything a get-or-create call returns, converted into models.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    /// The feed, with own capabilities filled in.
    pub feed: FeedData,
    /// First activity page.
    pub activities: PaginationResult<ActivityData>,
    /// Accepted follows targeting the feed.
    pub followers: Vec<FollowData>,
    /// Accepted follows made by the feed.
    pub following: Vec<FollowData>,
    /// Pending follows targeting the feed.
    pub follow_requests: Vec<FollowData>,
    /// First member page.
    pub members: PaginationResult<FeedMemberData>,
    /// Pinned activities.
    pub pinned_activities: Vec<ActivityPinData>,
    /// Notification counters.
    pub notification_status: Option<NotificationStatus>,
}

impl From<GetOrCreateFeedResponse> for FeedSnapshot {
    fn from(response: GetOrCreateFeedResponse) -> Self {
        let activity_pagination = response.activity_pagination();
        let member_pagination = response.member_pagination();
        let mut feed: FeedData = response.feed.into();
        if feed.own_capabilities.is_none() {
            feed.own_capabilities = Some(response.own_capabilities.into_iter().collect());
        }
        Self {
            feed,
            activities: PaginationResult::new(
                response.activities.into_iter().map(Into::into).collect(),
                activity_pagination,
            ),
            followers: response.followers.into_iter().map(Into::into).collect(),
            following: response.following.into_iter().map(Into::into).collect(),
            follow_requests: response.follow_requests.into_iter().map(Into::into).collect(),
            members: PaginationResult::new(response.members, member_pagination),
            pinned_activities: response
                .pinned_activities
                .into_iter()
                .map(Into::into)
                .collect(),
            notification_status: response.notification_status,
        }
    }
}

#[derive(Debug)]
struct FeedInner {
    feed: Option<FeedData>,
    activities: PaginatedList<ActivityData>,
    pinned_activities: Vec<ActivityPinData>,
    followers: Vec<FollowData>,
    following: Vec<FollowData>,
    follow_requests: Vec<FollowData>,
    members: PaginatedList<FeedMemberData>,
    notification_status: Option<NotificationStatus>,
    deleted: bool,
}

/// Observable state of one feed: metadata, activities, pins, follow graph
/// and members.
pub struct FeedState {
    fid: FeedId,
    current_user_id: String,
    inner: RwLock<FeedInner>,
    changes: ChangeFeed<StateChange>,
}

impl FeedState {
    /// Creates empty state for `fid` whose activities follow `query`.
    pub fn new(
        fid: FeedId,
        current_user_id: impl Into<String>,
        query: QueryConfiguration<ActivityData>,
    ) -> Self {
        Self {
            fid,
            current_user_id: current_user_id.into(),
            inner: RwLock::new(FeedInner {
                feed: None,
                activities: PaginatedList::new(query),
                pinned_activities: Vec::new(),
                followers: Vec::new(),
                following: Vec::new(),
                follow_requests: Vec::new(),
                members: PaginatedList::default(),
                notification_status: None,
                deleted: false,
            }),
            changes: ChangeFeed::new(),
        }
    }

    /// The feed's identity.
    pub fn fid(&self) -> &FeedId {
        &self.fid
    }

    /// Feed metadata, once loaded.
    pub fn feed(&self) -> Option<FeedData> {
        self.inner.read().feed.clone()
    }

    /// Loaded activities in query order.
    pub fn activities(&self) -> Vec<ActivityData> {
        self.inner.read().activities.items().to_vec()
    }

    /// One loaded activity.
    pub fn activity(&self, activity_id: &str) -> Option<ActivityData> {
        self.inner
            .read()
            .activities
            .get(&activity_id.to_string())
            .cloned()
    }

    /// Cursors of the activity list.
    pub fn activities_pagination(&self) -> PaginationData {
        self.inner.read().activities.pagination().clone()
    }

    /// Query the activities are ordered by.
    pub fn activity_query(&self) -> QueryConfiguration<ActivityData> {
        self.inner.read().activities.query().clone()
    }

    /// Returns true if more activities can be loaded.
    pub fn has_more_activities(&self) -> bool {
        self.inner.read().activities.has_next()
    }

    /// Pinned activities, most recent first.
    pub fn pinned_activities(&self) -> Vec<ActivityPinData> {
        self.inner.read().pinned_activities.clone()
    }

    /// Accepted follows targeting this feed.
    pub fn followers(&self) -> Vec<FollowData> {
        self.inner.read().followers.clone()
    }

    /// Accepted follows made by this feed.
    pub fn following(&self) -> Vec<FollowData> {
        self.inner.read().following.clone()
    }

    /// Pending requests to follow this feed.
    pub fn follow_requests(&self) -> Vec<FollowData> {
        self.inner.read().follow_requests.clone()
    }

    /// Loaded members.
    pub fn members(&self) -> Vec<FeedMemberData> {
        self.inner.read().members.items().to_vec()
    }

    /// Cursors of the member list.
    pub fn members_pagination(&self) -> PaginationData {
        self.inner.read().members.pagination().clone()
    }

    /// Query the members are ordered by.
    pub fn member_query(&self) -> QueryConfiguration<FeedMemberData> {
        self.inner.read().members.query().clone()
    }

    /// Notification counters, for notification feeds.
    pub fn notification_status(&self) -> Option<NotificationStatus> {
        self.inner.read().notification_status
    }

    /// The current user's capabilities on this feed.
    pub fn own_capabilities(&self) -> Option<BTreeSet<FeedOwnCapability>> {
        self.inner
            .read()
            .feed
            .as_ref()
            .and_then(|feed| feed.own_capabilities.clone())
    }

    /// Load phase of the feed.
    pub fn phase(&self) -> LoadPhase {
        self.inner.read().activities.phase()
    }

    /// Returns true once a delete event was applied.
    pub fn is_deleted(&self) -> bool {
        self.inner.read().deleted
    }

    /// Subscribes to changes.
    pub fn subscribe(&self) -> Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Marks the first load as started. Returns the phase to restore on failure.
    pub fn begin_load(&self) -> LoadPhase {
        self.inner.write().activities.begin_load()
    }

    /// Marks a load as failed.
    pub fn fail_load(&self, previous: LoadPhase) {
        self.inner.write().activities.fail_load(previous);
    }

    /// Replaces all state with a freshly loaded snapshot.
    pub fn apply_snapshot(&self, snapshot: FeedSnapshot, query: QueryConfiguration<ActivityData>) {
        {
            let mut inner = self.inner.write();
            let follow_order = QueryConfiguration::<FollowData>::default();
            let pin_order = QueryConfiguration::<ActivityPinData>::default();

            inner.feed = Some(snapshot.feed);
            inner
                .activities
                .apply_page(snapshot.activities, query, PageMode::Replace);
            inner.members.apply_page(
                snapshot.members,
                QueryConfiguration::default(),
                PageMode::Replace,
            );
            inner.followers = sorted(snapshot.followers, &follow_order);
            inner.following = sorted(snapshot.following, &follow_order);
            inner.follow_requests = sorted(snapshot.follow_requests, &follow_order);
            inner.pinned_activities = sorted(snapshot.pinned_activities, &pin_order);
            inner.notification_status = snapshot.notification_status;
            inner.deleted = false;
            debug!(
                fid = %self.fid,
                activities = inner.activities.len(),
                followers = inner.followers.len(),
                members = inner.members.len(),
                "applied feed snapshot"
            );
        }
        self.changes.emit_batch([
            StateChange::Feed,
            StateChange::Activities,
            StateChange::PinnedActivities,
            StateChange::Followers,
            StateChange::Following,
            StateChange::FollowRequests,
            StateChange::Members,
        ]);
    }

    /// Applies a further page of activities.
    pub fn apply_activity_page(
        &self,
        page: PaginationResult<ActivityData>,
        query: QueryConfiguration<ActivityData>,
        mode: PageMode,
    ) {
        self.inner.write().activities.apply_page(page, query, mode);
        self.changes.emit(StateChange::Activities);
    }

    /// Applies a further page of members.
    pub fn apply_member_page(
        &self,
        page: PaginationResult<FeedMemberData>,
        query: QueryConfiguration<FeedMemberData>,
        mode: PageMode,
    ) {
        self.inner.write().members.apply_page(page, query, mode);
        self.changes.emit(StateChange::Members);
    }

    fn apply(&self, inner: &mut FeedInner, event: &StateEvent) -> Vec<StateChange> {
        let mut changes = Vec::new();
        match event {
            StateEvent::ActivityAdded { fid, activity } => {
                let relevant = match fid {
                    Some(fid) => *fid == self.fid,
                    None => activity.belongs_to(&self.fid),
                };
                if relevant && inner.activities.insert(activity.clone()) {
                    changes.push(StateChange::Activities);
                }
            }
            StateEvent::ActivityDeleted { activity_id } => {
                if inner.activities.remove(activity_id).is_some() {
                    changes.push(StateChange::Activities);
                }
                if inner.pinned_activities.sorted_remove(activity_id).is_some() {
                    changes.push(StateChange::PinnedActivities);
                }
            }
            StateEvent::ActivityPinned(pin) if pin.feed == self.fid => {
                let order = QueryConfiguration::<ActivityPinData>::default();
                inner
                    .pinned_activities
                    .sorted_insert(pin.clone(), order.comparator());
                changes.push(StateChange::PinnedActivities);
            }
            StateEvent::ActivityUnpinned { fid, activity_id } if *fid == self.fid => {
                if inner.pinned_activities.sorted_remove(activity_id).is_some() {
                    changes.push(StateChange::PinnedActivities);
                }
            }
            StateEvent::FeedUpdated(feed) if feed.feed == self.fid => {
                match inner.feed.as_mut() {
                    Some(local) => local.merge(feed.clone()),
                    None => inner.feed = Some(feed.clone()),
                }
                changes.push(StateChange::Feed);
            }
            StateEvent::FeedDeleted(fid) if *fid == self.fid => {
                inner.feed = None;
                inner.activities.clear();
                inner.members.clear();
                inner.pinned_activities.clear();
                inner.followers.clear();
                inner.following.clear();
                inner.follow_requests.clear();
                inner.deleted = true;
                changes.push(StateChange::Deleted);
            }
            StateEvent::FollowAdded(follow) | StateEvent::FollowUpdated(follow) => {
                self.apply_follow(inner, follow, false, &mut changes);
            }
            StateEvent::FollowDeleted(follow) => {
                self.apply_follow(inner, follow, true, &mut changes);
            }
            StateEvent::MemberAdded { fid, member } | StateEvent::MemberUpdated { fid, member }
                if *fid == self.fid =>
            {
                if inner.members.upsert(member.clone()) {
                    changes.push(StateChange::Members);
                }
                if member.user.id == self.current_user_id {
                    if let Some(feed) = inner.feed.as_mut() {
                        feed.own_membership = Some(member.clone());
                        changes.push(StateChange::Feed);
                    }
                }
            }
            StateEvent::MemberRemoved { fid, user_id } if *fid == self.fid => {
                if inner.members.remove(user_id).is_some() {
                    changes.push(StateChange::Members);
                }
                if *user_id == self.current_user_id {
                    if let Some(feed) = inner.feed.as_mut() {
                        feed.own_membership = None;
                        changes.push(StateChange::Feed);
                    }
                }
            }
            StateEvent::FeedOwnCapabilitiesUpdated(capabilities) => {
                if let (Some(updated), Some(feed)) =
                    (capabilities.get(&self.fid), inner.feed.as_mut())
                {
                    feed.own_capabilities = Some(updated.clone());
                    changes.push(StateChange::Feed);
                }
            }
            _ => {
                if let Some(target) = event.activity_target() {
                    let user = self.current_user_id.as_str();
                    if inner.activities.update_where(
                        |activity| target.matches(activity),
                        |activity| event.apply_to_activity(activity, user),
                    ) {
                        changes.push(StateChange::Activities);
                    }
                    let mut pins_changed = false;
                    for pin in inner.pinned_activities.iter_mut() {
                        if target.matches(&pin.activity) {
                            pins_changed |= event.apply_to_activity(&mut pin.activity, user);
                        }
                    }
                    if pins_changed {
                        changes.push(StateChange::PinnedActivities);
                    }
                }
            }
        }
        changes
    }

    fn apply_follow(
        &self,
        inner: &mut FeedInner,
        follow: &FollowData,
        removed: bool,
        changes: &mut Vec<StateChange>,
    ) {
        if !follow.involves(&self.fid) {
            return;
        }
        let order = QueryConfiguration::<FollowData>::default();
        let id = follow.id();
        let lists = [
            (&mut inner.followers, follow.is_follower(&self.fid), StateChange::Followers),
            (&mut inner.following, follow.is_following(&self.fid), StateChange::Following),
            (
                &mut inner.follow_requests,
                follow.is_follow_request(&self.fid),
                StateChange::FollowRequests,
            ),
        ];
        for (list, belongs, change) in lists {
            let changed = if belongs && !removed {
                list.sorted_insert(follow.clone(), order.comparator());
                true
            } else {
                list.sorted_remove(&id).is_some()
            };
            if changed {
                changes.push(change);
            }
        }

        let own = follow.target_feed.feed == self.fid
            && follow.source_feed.created_by.id == self.current_user_id;
        if let (true, Some(feed)) = (own, inner.feed.as_mut()) {
            let own_follows = feed.own_follows.get_or_insert_with(Vec::new);
            if removed || follow.status == FollowStatus::Rejected {
                own_follows.sorted_remove(&id);
            } else {
                own_follows.insert_by_id(follow.clone());
            }
            changes.push(StateChange::Feed);
        }
    }
}

impl EventSubscriber for FeedState {
    fn apply_event(&self, event: &StateEvent) -> bool {
        let changes = {
            let mut inner = self.inner.write();
            self.apply(&mut inner, event)
        };
        if changes.is_empty() {
            return false;
        }
        trace!(fid = %self.fid, event = event.name(), ?changes, "feed state changed");
        self.changes.emit_batch(changes);
        true
    }
}

impl std::fmt::Debug for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedState")
            .field("fid", &self.fid)
            .field("phase", &self.phase())
            .finish()
    }
}

fn sorted<M: Queryable>(mut items: Vec<M>, order: &QueryConfiguration<M>) -> Vec<M> {
    items.sort_by(|a, b| order.compare(a, b));
    items.dedup_by(|a, b| a.id() == b.id());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilityMap;
    use chrono::DateTime;
    use feedsync_core::{ActivityFilterField, Filter, PollData, PollVoteData, UserData};

    fn fid() -> FeedId {
        FeedId::new("user", "bob")
    }

    fn activity(id: &str, secs: i64) -> ActivityData {
        ActivityData {
            id: id.into(),
            kind: "post".into(),
            feeds: vec![fid()],
            created_at: DateTime::from_timestamp(secs, 0).unwrap(),
            ..Default::default()
        }
    }

    fn state() -> FeedState {
        FeedState::new(fid(), "alice", QueryConfiguration::default())
    }

    fn follow(source: FeedId, target: FeedId, status: FollowStatus) -> FollowData {
        FollowData {
            source_feed: FeedData::new(source),
            target_feed: FeedData::new(target),
            status,
            ..Default::default()
        }
    }

    fn loaded() -> FeedState {
        let state = state();
        state.apply_snapshot(
            FeedSnapshot {
                feed: FeedData::new(fid()),
                activities: PaginationResult::new(
                    vec![activity("a", 1), activity("b", 2), activity("c", 3)],
                    PaginationData::new(Some("next".into()), None),
                ),
                followers: vec![],
                following: vec![],
                follow_requests: vec![],
                members: PaginationResult::new(vec![], PaginationData::default()),
                pinned_activities: vec![],
                notification_status: None,
            },
            QueryConfiguration::default(),
        );
        state
    }

    fn activity_ids(state: &FeedState) -> Vec<String> {
        state.activities().into_iter().map(|a| a.id).collect()
    }

    #[test]
    fn snapshot_populates_state() {
        let state = loaded();
        assert_eq!(state.phase(), LoadPhase::Populated);
        assert_eq!(activity_ids(&state), vec!["c", "b", "a"]);
        assert!(state.has_more_activities());
        assert_eq!(state.feed().unwrap().feed, fid());
    }

    #[test]
    fn duplicate_added_event_yields_one_entry() {
        let state = loaded();
        let event = StateEvent::ActivityAdded {
            fid: Some(fid()),
            activity: activity("d", 4),
        };
        assert!(state.apply_event(&event));
        state.apply_event(&event);
        assert_eq!(activity_ids(&state), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn insert_lands_between_neighbours() {
        let state = state();
        for (id, millis) in [("a", 1_000), ("b", 2_000), ("c", 3_000), ("d", 2_500)] {
            let mut activity = activity(id, 0);
            activity.created_at = DateTime::from_timestamp_millis(millis).unwrap();
            state.apply_event(&StateEvent::ActivityAdded {
                fid: Some(fid()),
                activity,
            });
        }
        assert_eq!(activity_ids(&state), vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn events_for_other_feeds_are_ignored() {
        let state = loaded();
        let event = StateEvent::ActivityAdded {
            fid: Some(FeedId::new("user", "carol")),
            activity: activity("x", 9),
        };
        assert!(!state.apply_event(&event));

        let mut foreign = activity("y", 9);
        foreign.feeds = vec![FeedId::new("user", "carol")];
        assert!(!state.apply_event(&StateEvent::ActivityAdded {
            fid: None,
            activity: foreign
        }));
        assert_eq!(state.activities().len(), 3);
    }

    #[test]
    fn filtered_feed_only_admits_matching_activities() {
        let state = FeedState::new(
            fid(),
            "alice",
            QueryConfiguration::new(Some(Filter::equal(ActivityFilterField::Kind, "story")), vec![]),
        );
        assert!(!state.apply_event(&StateEvent::ActivityAdded {
            fid: Some(fid()),
            activity: activity("a", 1),
        }));
    }

    #[test]
    fn poll_vote_routes_by_poll_id() {
        let state = loaded();
        let mut with_poll = activity("p", 5);
        with_poll.poll = Some(PollData {
            id: "poll-1".into(),
            enforce_unique_vote: true,
            ..Default::default()
        });
        state.apply_event(&StateEvent::ActivityAdded {
            fid: Some(fid()),
            activity: with_poll,
        });

        let vote = PollVoteData {
            id: "v1".into(),
            poll_id: "poll-1".into(),
            option_id: "o1".into(),
            user_id: "alice".into(),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::PollVoteCasted(vote)));
        let poll = state.activity("p").unwrap().poll.unwrap();
        assert_eq!(poll.vote_count, 1);
        assert_eq!(poll.own_votes.len(), 1);
    }

    #[test]
    fn follow_events_update_the_graph() {
        let state = loaded();
        let alice = FeedId::new("timeline", "alice");

        let pending = follow(alice.clone(), fid(), FollowStatus::Pending);
        assert!(state.apply_event(&StateEvent::FollowAdded(pending)));
        assert_eq!(state.follow_requests().len(), 1);
        assert!(state.followers().is_empty());

        let accepted = follow(alice.clone(), fid(), FollowStatus::Accepted);
        assert!(state.apply_event(&StateEvent::FollowUpdated(accepted.clone())));
        assert!(state.follow_requests().is_empty());
        assert_eq!(state.followers().len(), 1);

        let outgoing = follow(fid(), FeedId::new("user", "carol"), FollowStatus::Accepted);
        assert!(state.apply_event(&StateEvent::FollowAdded(outgoing)));
        assert_eq!(state.following().len(), 1);

        assert!(state.apply_event(&StateEvent::FollowDeleted(accepted)));
        assert!(state.followers().is_empty());

        let unrelated = follow(alice, FeedId::new("user", "dave"), FollowStatus::Accepted);
        assert!(!state.apply_event(&StateEvent::FollowAdded(unrelated)));
    }

    #[test]
    fn own_follow_is_tracked_on_the_feed() {
        let state = loaded();
        let mut source = FeedData::new(FeedId::new("timeline", "alice"));
        source.created_by = UserData::new("alice");
        let own = FollowData {
            source_feed: source,
            target_feed: FeedData::new(fid()),
            status: FollowStatus::Accepted,
            ..Default::default()
        };
        state.apply_event(&StateEvent::FollowAdded(own.clone()));
        assert_eq!(state.feed().unwrap().own_follows.unwrap().len(), 1);
        state.apply_event(&StateEvent::FollowDeleted(own));
        assert!(state.feed().unwrap().own_follows.unwrap().is_empty());
    }

    #[test]
    fn pins_and_members() {
        let state = loaded();
        let pin = ActivityPinData {
            activity: activity("a", 1),
            feed: fid(),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::ActivityPinned(pin)));
        assert_eq!(state.pinned_activities().len(), 1);
        assert!(state.apply_event(&StateEvent::ActivityUnpinned {
            fid: fid(),
            activity_id: "a".into()
        }));
        assert!(state.pinned_activities().is_empty());

        let member = FeedMemberData {
            user: UserData::new("alice"),
            role: "member".into(),
            ..Default::default()
        };
        assert!(state.apply_event(&StateEvent::MemberAdded {
            fid: fid(),
            member
        }));
        assert_eq!(state.members().len(), 1);
        assert!(state.feed().unwrap().own_membership.is_some());
        assert!(state.apply_event(&StateEvent::MemberRemoved {
            fid: fid(),
            user_id: "alice".into()
        }));
        assert!(state.members().is_empty());
        assert!(state.feed().unwrap().own_membership.is_none());
    }

    #[test]
    fn capability_updates_reach_the_feed() {
        let state = loaded();
        let updated = CapabilityMap::from([(
            fid(),
            BTreeSet::from([FeedOwnCapability::AddActivity]),
        )]);
        assert!(state.apply_event(&StateEvent::FeedOwnCapabilitiesUpdated(updated)));
        assert_eq!(
            state.own_capabilities(),
            Some(BTreeSet::from([FeedOwnCapability::AddActivity]))
        );
    }

    #[test]
    fn delete_clears_state() {
        let state = loaded();
        let changes = state.subscribe();
        assert!(state.apply_event(&StateEvent::FeedDeleted(fid())));
        assert!(state.is_deleted());
        assert!(state.activities().is_empty());
        assert!(state.feed().is_none());
        assert_eq!(changes.try_recv().unwrap(), StateChange::Deleted);
    }

    #[test]
    fn snapshot_from_response_fills_capabilities() {
        let response = GetOrCreateFeedResponse {
            own_capabilities: vec![FeedOwnCapability::ReadFeed],
            next: Some("n".into()),
            ..Default::default()
        };
        let snapshot = FeedSnapshot::from(response);
        assert!(snapshot.feed.can(&FeedOwnCapability::ReadFeed));
        assert!(snapshot.activities.pagination.has_next());
    }
}
