//! In-memory backend.
//!
//! Keeps server-side state in plain collections and answers with wire
//! DTOs, so facades exercise their conversion paths. Every mutation also
//! records the real-time events a server would broadcast; tests drain them
//! with [`InMemoryBackend::take_events`] to replay the echo of a local call.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use feedsync_client::{ClientError, ClientResult, FeedsBackend};
use feedsync_core::{
    ActivityData, ActivityPinData, BookmarkData, CommentData, FeedData, FeedId, FeedMemberData,
    FeedOwnCapability, FeedsReactionData, FollowData, FollowStatus, PollData, PollOptionData,
    PollVoteData, UserData,
};
use feedsync_protocol::{
    ActivityResponse, AddActivityRequest, AddBookmarkRequest, AddCommentRequest,
    AddReactionRequest, BookmarkResponse, CastPollVoteRequest, CommentReactionResponse,
    CommentResponse, CreatePollOptionRequest, CreatePollRequest, FeedResponse, FollowRequest,
    FollowResponse, GetOrCreateFeedRequest, GetOrCreateFeedResponse, OwnCapabilitiesBatchResponse,
    PagedResponse, PinResponse, PollResponse, QueryParams, ReactionResponse,
    UpdateActivityRequest, UpdateBookmarkRequest, UpdateCommentRequest, UpdateFeedRequest,
    WsEvent,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

use crate::fixtures::BASE_TIMESTAMP;

const DEFAULT_LIMIT: u32 = 25;

#[derive(Default)]
struct Store {
    clock: i64,
    feeds: BTreeMap<FeedId, FeedData>,
    activities: Vec<ActivityData>,
    comments: Vec<CommentData>,
    follows: Vec<FollowData>,
    members: BTreeMap<FeedId, Vec<FeedMemberData>>,
    pins: Vec<ActivityPinData>,
    pending_polls: BTreeMap<String, PollData>,
    votes: Vec<PollVoteData>,
    bookmarks: Vec<BookmarkData>,
    capabilities: BTreeMap<FeedId, Vec<FeedOwnCapability>>,
    failures: VecDeque<ClientError>,
    calls: Vec<&'static str>,
    events: Vec<WsEvent>,
}

impl Store {
    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default()
            + Duration::seconds(1_000 + self.clock)
    }

    fn begin(&mut self, call: &'static str) -> ClientResult<()> {
        self.calls.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn activity_mut(&mut self, activity_id: &str) -> ClientResult<&mut ActivityData> {
        self.activities
            .iter_mut()
            .find(|activity| activity.id == activity_id)
            .ok_or_else(|| not_found("activity", activity_id))
    }

    fn activity(&self, activity_id: &str) -> ClientResult<ActivityData> {
        self.activities
            .iter()
            .find(|activity| activity.id == activity_id)
            .cloned()
            .ok_or_else(|| not_found("activity", activity_id))
    }

    fn poll_activity_mut(&mut self, poll_id: &str) -> ClientResult<&mut ActivityData> {
        self.activities
            .iter_mut()
            .find(|activity| activity.poll.as_ref().is_some_and(|poll| poll.id == poll_id))
            .ok_or_else(|| not_found("poll", poll_id))
    }

    fn feed(&mut self, fid: &FeedId) -> FeedData {
        self.feeds
            .entry(fid.clone())
            .or_insert_with(|| FeedData::new(fid.clone()))
            .clone()
    }

    fn broadcast(&mut self, activity: &ActivityData, event: impl Fn(FeedId) -> WsEvent) {
        for fid in &activity.feeds {
            self.events.push(event(fid.clone()));
        }
    }
}

fn not_found(what: &str, id: &str) -> ClientError {
    ClientError::api(404, "not_found", format!("{what} {id} not found"))
}

/// Sorts by creation time in the direction of the first sort key
/// (newest first when none is given) and cuts one page at the cursor.
fn page<T: Clone>(
    mut items: Vec<T>,
    params: &QueryParams,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> PagedResponse<T> {
    let ascending = params
        .sort
        .first()
        .is_some_and(|sort| sort.direction > 0);
    items.sort_by(|lhs, rhs| {
        let ordering = created_at(lhs).cmp(&created_at(rhs));
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    let start = params
        .next
        .as_deref()
        .and_then(|cursor| cursor.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT) as usize;
    let end = (start + limit).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    let previous = (start > 0).then(|| start.saturating_sub(limit).to_string());
    PagedResponse::new(items[start..end].to_vec(), next, previous)
}

/// A [`FeedsBackend`] keeping all state in memory.
pub struct InMemoryBackend {
    user: UserData,
    store: Mutex<Store>,
}

impl InMemoryBackend {
    /// Creates an empty backend acting for `user_id`.
    pub fn new(user_id: &str) -> Self {
        Self {
            user: UserData::new(user_id),
            store: Mutex::new(Store::default()),
        }
    }

    /// The acting user.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Stores a feed.
    pub fn insert_feed(&self, feed: FeedData) {
        let mut store = self.store.lock();
        if let Some(capabilities) = &feed.own_capabilities {
            store
                .capabilities
                .insert(feed.feed.clone(), capabilities.iter().cloned().collect());
        }
        store.feeds.insert(feed.feed.clone(), feed);
    }

    /// Stores an activity.
    pub fn insert_activity(&self, activity: ActivityData) {
        let mut store = self.store.lock();
        store.activities.retain(|existing| existing.id != activity.id);
        store.activities.push(activity);
    }

    /// Stores a comment or reply.
    pub fn insert_comment(&self, comment: CommentData) {
        self.store.lock().comments.push(comment);
    }

    /// Stores a follow.
    pub fn insert_follow(&self, follow: FollowData) {
        self.store.lock().follows.push(follow);
    }

    /// Stores a member of `fid`.
    pub fn insert_member(&self, fid: &FeedId, member: FeedMemberData) {
        self.store
            .lock()
            .members
            .entry(fid.clone())
            .or_default()
            .push(member);
    }

    /// Stores a poll vote.
    pub fn insert_vote(&self, vote: PollVoteData) {
        self.store.lock().votes.push(vote);
    }

    /// Sets the acting user's capabilities on `fid`.
    pub fn set_capabilities(&self, fid: &FeedId, capabilities: &[FeedOwnCapability]) {
        self.store
            .lock()
            .capabilities
            .insert(fid.clone(), capabilities.to_vec());
    }

    /// Makes the next call fail with `err`.
    pub fn fail_next(&self, err: ClientError) {
        self.store.lock().failures.push_back(err);
    }

    /// Names of the calls made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.store.lock().calls.clone()
    }

    /// Number of calls made to `name`.
    pub fn call_count(&self, name: &str) -> usize {
        self.store
            .lock()
            .calls
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    /// Drains the real-time events broadcast since the last call.
    pub fn take_events(&self) -> Vec<WsEvent> {
        std::mem::take(&mut self.store.lock().events)
    }

    /// The server's copy of an activity.
    pub fn stored_activity(&self, activity_id: &str) -> Option<ActivityData> {
        self.store.lock().activity(activity_id).ok()
    }
}

#[async_trait]
impl FeedsBackend for InMemoryBackend {
    async fn get_or_create_feed(
        &self,
        fid: &FeedId,
        request: &GetOrCreateFeedRequest,
    ) -> ClientResult<GetOrCreateFeedResponse> {
        let mut store = self.store.lock();
        store.begin("get_or_create_feed")?;
        let mut feed = store.feed(fid);
        let own_capabilities = store.capabilities.get(fid).cloned().unwrap_or_default();
        feed.own_capabilities = Some(own_capabilities.iter().cloned().collect());

        let activities: Vec<ActivityData> = store
            .activities
            .iter()
            .filter(|activity| activity.belongs_to(fid))
            .cloned()
            .collect();
        let activities = page(activities, &request.activities, |activity| activity.created_at);

        let member_params = QueryParams {
            limit: request.member_limit,
            ..Default::default()
        };
        let members = page(
            store.members.get(fid).cloned().unwrap_or_default(),
            &member_params,
            |member| member.created_at,
        );

        let follows_where = |predicate: &dyn Fn(&FollowData) -> bool, limit: Option<u32>| -> Vec<FollowResponse> {
            store
                .follows
                .iter()
                .filter(|follow| predicate(follow))
                .take(limit.unwrap_or(DEFAULT_LIMIT) as usize)
                .cloned()
                .map(FollowResponse::from)
                .collect()
        };
        let followers = follows_where(
            &|follow: &FollowData| follow.is_follower(fid),
            request.follower_limit,
        );
        let following = follows_where(
            &|follow: &FollowData| follow.is_following(fid),
            request.following_limit,
        );
        let follow_requests =
            follows_where(&|follow: &FollowData| follow.is_follow_request(fid), None);

        let pinned_activities = store
            .pins
            .iter()
            .filter(|pin| pin.feed == *fid)
            .cloned()
            .map(PinResponse::from)
            .collect();

        Ok(GetOrCreateFeedResponse {
            feed: feed.into(),
            activities: activities.items.into_iter().map(Into::into).collect(),
            next: activities.next,
            prev: activities.prev,
            followers,
            following,
            follow_requests,
            members: members.items,
            member_next: members.next,
            member_prev: members.prev,
            pinned_activities,
            own_capabilities,
            notification_status: None,
        })
    }

    async fn update_feed(&self, fid: &FeedId, request: &UpdateFeedRequest) -> ClientResult<FeedResponse> {
        let mut store = self.store.lock();
        store.begin("update_feed")?;
        let now = store.now();
        let feed = store
            .feeds
            .get_mut(fid)
            .ok_or_else(|| not_found("feed", &fid.raw_value()))?;
        if let Some(name) = &request.name {
            feed.name = name.clone();
        }
        if request.description.is_some() {
            feed.description = request.description.clone();
        }
        if request.visibility.is_some() {
            feed.visibility = request.visibility.clone();
        }
        feed.updated_at = now;
        let feed = feed.clone();
        store.events.push(WsEvent::FeedUpdated {
            fid: fid.clone(),
            feed: feed.clone().into(),
            created_at: now,
        });
        Ok(feed.into())
    }

    async fn delete_feed(&self, fid: &FeedId) -> ClientResult<()> {
        let mut store = self.store.lock();
        store.begin("delete_feed")?;
        store
            .feeds
            .remove(fid)
            .ok_or_else(|| not_found("feed", &fid.raw_value()))?;
        let now = store.now();
        store.events.push(WsEvent::FeedDeleted {
            fid: fid.clone(),
            created_at: now,
        });
        Ok(())
    }

    async fn query_members(
        &self,
        fid: &FeedId,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<FeedMemberData>> {
        let mut store = self.store.lock();
        store.begin("query_members")?;
        let members = store.members.get(fid).cloned().unwrap_or_default();
        Ok(page(members, params, |member| member.created_at))
    }

    async fn query_activities(
        &self,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<ActivityResponse>> {
        let mut store = self.store.lock();
        store.begin("query_activities")?;
        let paged = page(store.activities.clone(), params, |activity| activity.created_at);
        Ok(PagedResponse::new(
            paged.items.into_iter().map(Into::into).collect(),
            paged.next,
            paged.prev,
        ))
    }

    async fn get_activity(&self, activity_id: &str) -> ClientResult<ActivityResponse> {
        let mut store = self.store.lock();
        store.begin("get_activity")?;
        Ok(store.activity(activity_id)?.into())
    }

    async fn add_activity(&self, request: &AddActivityRequest) -> ClientResult<ActivityResponse> {
        let mut store = self.store.lock();
        store.begin("add_activity")?;
        let now = store.now();
        let poll = match &request.poll_id {
            Some(poll_id) => Some(
                store
                    .pending_polls
                    .remove(poll_id)
                    .ok_or_else(|| not_found("poll", poll_id))?,
            ),
            None => None,
        };
        let activity = ActivityData {
            id: uuid::Uuid::new_v4().to_string(),
            kind: request.kind.clone(),
            text: request.text.clone(),
            feeds: request.feeds.clone(),
            user: self.user.clone(),
            visibility: request.visibility.clone(),
            created_at: now,
            updated_at: now,
            poll,
            ..Default::default()
        };
        store.activities.push(activity.clone());
        store.broadcast(&activity, |fid| WsEvent::ActivityAdded {
            fid,
            activity: activity.clone().into(),
            created_at: now,
        });
        Ok(activity.into())
    }

    async fn update_activity(
        &self,
        activity_id: &str,
        request: &UpdateActivityRequest,
    ) -> ClientResult<ActivityResponse> {
        let mut store = self.store.lock();
        store.begin("update_activity")?;
        let now = store.now();
        let activity = store.activity_mut(activity_id)?;
        if request.text.is_some() {
            activity.text = request.text.clone();
        }
        if request.visibility.is_some() {
            activity.visibility = request.visibility.clone();
        }
        activity.updated_at = now;
        activity.edited_at = Some(now);
        let activity = activity.clone();
        store.broadcast(&activity, |fid| WsEvent::ActivityUpdated {
            fid,
            activity: activity.clone().into(),
            created_at: now,
        });
        Ok(activity.into())
    }

    async fn delete_activity(&self, activity_id: &str) -> ClientResult<()> {
        let mut store = self.store.lock();
        store.begin("delete_activity")?;
        let activity = store.activity(activity_id)?;
        store.activities.retain(|existing| existing.id != activity_id);
        store.comments.retain(|comment| comment.object_id != activity_id);
        store.pins.retain(|pin| pin.activity.id != activity_id);
        store
            .bookmarks
            .retain(|bookmark| bookmark.activity_id() != activity_id);
        let now = store.now();
        store.broadcast(&activity, |fid| WsEvent::ActivityDeleted {
            fid,
            activity: activity.clone().into(),
            created_at: now,
        });
        Ok(())
    }

    async fn pin_activity(&self, fid: &FeedId, activity_id: &str) -> ClientResult<PinResponse> {
        let mut store = self.store.lock();
        store.begin("pin_activity")?;
        let activity = store.activity(activity_id)?;
        let now = store.now();
        let pin = ActivityPinData {
            activity,
            feed: fid.clone(),
            user: self.user.clone(),
            created_at: now,
            updated_at: now,
        };
        store
            .pins
            .retain(|existing| !(existing.feed == *fid && existing.activity.id == activity_id));
        store.pins.push(pin.clone());
        if let Some(feed) = store.feeds.get_mut(fid) {
            feed.pin_count += 1;
        }
        store.events.push(WsEvent::ActivityPinned {
            fid: fid.clone(),
            pinned_activity: pin.clone().into(),
            created_at: now,
        });
        Ok(pin.into())
    }

    async fn unpin_activity(&self, fid: &FeedId, activity_id: &str) -> ClientResult<PinResponse> {
        let mut store = self.store.lock();
        store.begin("unpin_activity")?;
        let index = store
            .pins
            .iter()
            .position(|pin| pin.feed == *fid && pin.activity.id == activity_id)
            .ok_or_else(|| not_found("pin", activity_id))?;
        let pin = store.pins.remove(index);
        if let Some(feed) = store.feeds.get_mut(fid) {
            feed.pin_count = feed.pin_count.saturating_sub(1);
        }
        let now = store.now();
        store.events.push(WsEvent::ActivityUnpinned {
            fid: fid.clone(),
            pinned_activity: pin.clone().into(),
            created_at: now,
        });
        Ok(pin.into())
    }

    async fn add_reaction(
        &self,
        activity_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<ReactionResponse> {
        let mut store = self.store.lock();
        store.begin("add_reaction")?;
        let now = store.now();
        let user_id = self.user.id.clone();
        let reaction = FeedsReactionData {
            activity_id: activity_id.to_string(),
            comment_id: None,
            kind: request.kind.clone(),
            user: self.user.clone(),
            created_at: now,
            updated_at: now,
        };
        let activity = store.activity_mut(activity_id)?;
        if request.enforce_unique {
            let own: Vec<FeedsReactionData> = activity.reactions.own.clone();
            for previous in own.iter().filter(|previous| previous.kind != reaction.kind) {
                activity.remove_reaction(previous, &user_id);
            }
        }
        activity.add_reaction(reaction.clone(), &user_id);
        let activity = activity.clone();
        store.broadcast(&activity, |fid| WsEvent::ActivityReactionAdded {
            fid,
            activity: activity.clone().into(),
            reaction: reaction.clone(),
            created_at: now,
        });
        Ok(ReactionResponse {
            activity: activity.into(),
            reaction,
        })
    }

    async fn delete_reaction(&self, activity_id: &str, kind: &str) -> ClientResult<ReactionResponse> {
        let mut store = self.store.lock();
        store.begin("delete_reaction")?;
        let user_id = self.user.id.clone();
        let activity = store.activity_mut(activity_id)?;
        let reaction = activity
            .reactions
            .own
            .iter()
            .find(|reaction| reaction.kind == kind)
            .cloned()
            .ok_or_else(|| not_found("reaction", kind))?;
        activity.remove_reaction(&reaction, &user_id);
        let activity = activity.clone();
        let now = store.now();
        store.broadcast(&activity, |fid| WsEvent::ActivityReactionDeleted {
            fid,
            activity: activity.clone().into(),
            reaction: reaction.clone(),
            created_at: now,
        });
        Ok(ReactionResponse {
            activity: activity.into(),
            reaction,
        })
    }

    async fn add_bookmark(
        &self,
        activity_id: &str,
        _request: &AddBookmarkRequest,
    ) -> ClientResult<BookmarkResponse> {
        let mut store = self.store.lock();
        store.begin("add_bookmark")?;
        let now = store.now();
        let user_id = self.user.id.clone();
        let activity = store.activity_mut(activity_id)?;
        let bookmark = BookmarkData {
            activity: activity.clone(),
            user: UserData::new(user_id.clone()),
            folder: None,
            created_at: now,
            updated_at: now,
        };
        activity.add_bookmark(bookmark.clone(), &user_id);
        store.bookmarks.push(bookmark.clone());
        store.events.push(WsEvent::BookmarkAdded {
            bookmark: bookmark.clone().into(),
            created_at: now,
        });
        Ok(bookmark.into())
    }

    async fn update_bookmark(
        &self,
        activity_id: &str,
        request: &UpdateBookmarkRequest,
    ) -> ClientResult<BookmarkResponse> {
        let mut store = self.store.lock();
        store.begin("update_bookmark")?;
        let now = store.now();
        let user_id = self.user.id.clone();
        let bookmark = store
            .bookmarks
            .iter_mut()
            .find(|bookmark| bookmark.activity_id() == activity_id && bookmark.user.id == user_id)
            .ok_or_else(|| not_found("bookmark", activity_id))?;
        if let Some(name) = request.new_folder.clone().or(request.folder_id.clone()) {
            bookmark.folder = Some(feedsync_core::BookmarkFolderData {
                id: request.folder_id.clone().unwrap_or_else(|| name.clone()),
                name,
                created_at: now,
                updated_at: now,
            });
        }
        bookmark.updated_at = now;
        let bookmark = bookmark.clone();
        store.events.push(WsEvent::BookmarkUpdated {
            bookmark: bookmark.clone().into(),
            created_at: now,
        });
        Ok(bookmark.into())
    }

    async fn delete_bookmark(
        &self,
        activity_id: &str,
        _folder_id: Option<&str>,
    ) -> ClientResult<BookmarkResponse> {
        let mut store = self.store.lock();
        store.begin("delete_bookmark")?;
        let user_id = self.user.id.clone();
        let index = store
            .bookmarks
            .iter()
            .position(|bookmark| bookmark.activity_id() == activity_id && bookmark.user.id == user_id)
            .ok_or_else(|| not_found("bookmark", activity_id))?;
        let bookmark = store.bookmarks.remove(index);
        if let Ok(activity) = store.activity_mut(activity_id) {
            activity.remove_bookmark(&bookmark, &user_id);
        }
        let now = store.now();
        store.events.push(WsEvent::BookmarkDeleted {
            bookmark: bookmark.clone().into(),
            created_at: now,
        });
        Ok(bookmark.into())
    }

    async fn query_bookmarks(
        &self,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<BookmarkResponse>> {
        let mut store = self.store.lock();
        store.begin("query_bookmarks")?;
        let own: Vec<BookmarkData> = store
            .bookmarks
            .iter()
            .filter(|bookmark| bookmark.user.id == self.user.id)
            .cloned()
            .collect();
        let paged = page(own, params, |bookmark| bookmark.created_at);
        Ok(PagedResponse::new(
            paged.items.into_iter().map(Into::into).collect(),
            paged.next,
            paged.prev,
        ))
    }

    async fn follow(&self, request: &FollowRequest) -> ClientResult<FollowResponse> {
        let mut store = self.store.lock();
        store.begin("follow")?;
        let now = store.now();
        let mut source_feed = store.feed(&request.source);
        source_feed.created_by = self.user.clone();
        let target_feed = store.feed(&request.target);
        let follow = FollowData {
            source_feed,
            target_feed,
            status: FollowStatus::Accepted,
            push_preference: request.push_preference.clone(),
            request_accepted_at: None,
            created_at: now,
            updated_at: now,
        };
        store.follows.retain(|existing| {
            !(existing.source_feed.feed == request.source && existing.target_feed.feed == request.target)
        });
        store.follows.push(follow.clone());
        store.events.push(WsEvent::FollowCreated {
            fid: request.target.clone(),
            follow: follow.clone().into(),
            created_at: now,
        });
        Ok(follow.into())
    }

    async fn unfollow(&self, source: &FeedId, target: &FeedId) -> ClientResult<FollowResponse> {
        let mut store = self.store.lock();
        store.begin("unfollow")?;
        let index = store
            .follows
            .iter()
            .position(|follow| follow.source_feed.feed == *source && follow.target_feed.feed == *target)
            .ok_or_else(|| not_found("follow", &target.raw_value()))?;
        let follow = store.follows.remove(index);
        let now = store.now();
        store.events.push(WsEvent::FollowDeleted {
            fid: target.clone(),
            follow: follow.clone().into(),
            created_at: now,
        });
        Ok(follow.into())
    }

    async fn accept_follow(&self, source: &FeedId, target: &FeedId) -> ClientResult<FollowResponse> {
        self.resolve_follow(source, target, FollowStatus::Accepted, "accept_follow")
    }

    async fn reject_follow(&self, source: &FeedId, target: &FeedId) -> ClientResult<FollowResponse> {
        self.resolve_follow(source, target, FollowStatus::Rejected, "reject_follow")
    }

    async fn query_follows(&self, params: &QueryParams) -> ClientResult<PagedResponse<FollowResponse>> {
        let mut store = self.store.lock();
        store.begin("query_follows")?;
        let paged = page(store.follows.clone(), params, |follow| follow.created_at);
        Ok(PagedResponse::new(
            paged.items.into_iter().map(Into::into).collect(),
            paged.next,
            paged.prev,
        ))
    }

    async fn add_comment(&self, request: &AddCommentRequest) -> ClientResult<CommentResponse> {
        let mut store = self.store.lock();
        store.begin("add_comment")?;
        let now = store.now();
        let comment = CommentData {
            id: uuid::Uuid::new_v4().to_string(),
            object_id: request.object_id.clone(),
            object_type: request.object_type.clone(),
            parent_id: request.parent_id.clone(),
            user: self.user.clone(),
            text: Some(request.text.clone()),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        let mut activity = store.activity(&request.object_id)?;
        if let Some(parent_id) = &request.parent_id {
            let parent = store
                .comments
                .iter_mut()
                .find(|existing| existing.id == *parent_id)
                .ok_or_else(|| not_found("comment", parent_id))?;
            parent.reply_count += 1;
        }
        activity.comment_count += 1;
        store.activity_mut(&request.object_id)?.comment_count = activity.comment_count;
        store.comments.push(comment.clone());
        store.broadcast(&activity, |fid| WsEvent::CommentAdded {
            fid,
            comment: comment.clone().into(),
            created_at: now,
        });
        Ok(comment.into())
    }

    async fn update_comment(
        &self,
        comment_id: &str,
        request: &UpdateCommentRequest,
    ) -> ClientResult<CommentResponse> {
        let mut store = self.store.lock();
        store.begin("update_comment")?;
        let now = store.now();
        let comment = store
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| not_found("comment", comment_id))?;
        if request.text.is_some() {
            comment.text = request.text.clone();
        }
        comment.updated_at = now;
        Ok(comment.clone().into())
    }

    async fn delete_comment(&self, comment_id: &str) -> ClientResult<CommentResponse> {
        let mut store = self.store.lock();
        store.begin("delete_comment")?;
        let index = store
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)
            .ok_or_else(|| not_found("comment", comment_id))?;
        let now = store.now();
        let comment = store.comments.remove(index);
        if let Ok(activity) = store.activity_mut(&comment.object_id) {
            activity.comment_count = activity.comment_count.saturating_sub(1);
        }
        if let Ok(activity) = store.activity(&comment.object_id) {
            store.broadcast(&activity, |fid| WsEvent::CommentDeleted {
                fid,
                comment: comment.clone().into(),
                created_at: now,
            });
        }
        Ok(comment.into())
    }

    async fn query_comments(
        &self,
        object_id: &str,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<CommentResponse>> {
        let mut store = self.store.lock();
        store.begin("query_comments")?;
        let top_level: Vec<CommentData> = store
            .comments
            .iter()
            .filter(|comment| comment.object_id == object_id && comment.parent_id.is_none())
            .cloned()
            .collect();
        let paged = page(top_level, params, |comment| comment.created_at);
        Ok(PagedResponse::new(
            paged.items.into_iter().map(Into::into).collect(),
            paged.next,
            paged.prev,
        ))
    }

    async fn add_comment_reaction(
        &self,
        comment_id: &str,
        request: &AddReactionRequest,
    ) -> ClientResult<CommentReactionResponse> {
        let mut store = self.store.lock();
        store.begin("add_comment_reaction")?;
        let now = store.now();
        let user_id = self.user.id.clone();
        let comment = store
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| not_found("comment", comment_id))?;
        let reaction = FeedsReactionData {
            activity_id: comment.object_id.clone(),
            comment_id: Some(comment_id.to_string()),
            kind: request.kind.clone(),
            user: self.user.clone(),
            created_at: now,
            updated_at: now,
        };
        comment.add_reaction(reaction.clone(), &user_id);
        Ok(CommentReactionResponse {
            comment: comment.clone().into(),
            reaction,
        })
    }

    async fn delete_comment_reaction(
        &self,
        comment_id: &str,
        kind: &str,
    ) -> ClientResult<CommentReactionResponse> {
        let mut store = self.store.lock();
        store.begin("delete_comment_reaction")?;
        let user_id = self.user.id.clone();
        let comment = store
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| not_found("comment", comment_id))?;
        let reaction = comment
            .reactions
            .own
            .iter()
            .find(|reaction| reaction.kind == kind)
            .cloned()
            .ok_or_else(|| not_found("reaction", kind))?;
        comment.remove_reaction(&reaction, &user_id);
        Ok(CommentReactionResponse {
            comment: comment.clone().into(),
            reaction,
        })
    }

    async fn create_poll(&self, request: &CreatePollRequest) -> ClientResult<PollResponse> {
        let mut store = self.store.lock();
        store.begin("create_poll")?;
        let now = store.now();
        let poll = PollData {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            enforce_unique_vote: request.enforce_unique_vote,
            allow_answers: request.allow_answers,
            allow_user_suggested_options: request.allow_user_suggested_options,
            max_votes_allowed: request.max_votes_allowed,
            voting_visibility: request
                .voting_visibility
                .clone()
                .unwrap_or_else(|| "public".to_string()),
            options: request
                .options
                .iter()
                .enumerate()
                .map(|(index, text)| PollOptionData {
                    id: format!("o{index}"),
                    text: text.clone(),
                })
                .collect(),
            created_by: Some(self.user.clone()),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        store.pending_polls.insert(poll.id.clone(), poll.clone());
        Ok(poll.into())
    }

    async fn close_poll(&self, poll_id: &str) -> ClientResult<PollResponse> {
        let mut store = self.store.lock();
        store.begin("close_poll")?;
        let activity = store.poll_activity_mut(poll_id)?;
        activity.close_poll(poll_id);
        let poll = activity
            .poll
            .clone()
            .ok_or_else(|| not_found("poll", poll_id))?;
        Ok(poll.into())
    }

    async fn delete_poll(&self, poll_id: &str) -> ClientResult<()> {
        let mut store = self.store.lock();
        store.begin("delete_poll")?;
        let activity = store.poll_activity_mut(poll_id)?;
        activity.remove_poll(poll_id);
        store.votes.retain(|vote| vote.poll_id != poll_id);
        Ok(())
    }

    async fn cast_poll_vote(
        &self,
        activity_id: &str,
        poll_id: &str,
        request: &CastPollVoteRequest,
    ) -> ClientResult<PollVoteData> {
        let mut store = self.store.lock();
        store.begin("cast_poll_vote")?;
        let now = store.now();
        let vote = PollVoteData {
            id: uuid::Uuid::new_v4().to_string(),
            poll_id: poll_id.to_string(),
            option_id: request.option_id.clone().unwrap_or_default(),
            answer_text: request.answer_text.clone(),
            is_answer: request.answer_text.is_some(),
            user_id: self.user.id.clone(),
            user: Some(self.user.clone()),
            created_at: now,
            updated_at: now,
        };
        let user_id = self.user.id.clone();
        let activity = store.activity_mut(activity_id)?;
        let unique = activity
            .poll
            .as_ref()
            .filter(|poll| poll.id == poll_id)
            .ok_or_else(|| not_found("poll", poll_id))?
            .enforce_unique_vote;
        activity.cast_poll_vote(vote.clone(), &user_id);
        let activity = activity.clone();
        if unique && !vote.is_answer {
            store
                .votes
                .retain(|existing| !(existing.poll_id == poll_id && existing.user_id == user_id && !existing.is_answer));
        }
        store.votes.push(vote.clone());
        store.broadcast(&activity, |fid| WsEvent::PollVoteCasted {
            fid,
            poll_id: poll_id.to_string(),
            poll_vote: vote.clone(),
            created_at: now,
        });
        Ok(vote)
    }

    async fn remove_poll_vote(
        &self,
        activity_id: &str,
        poll_id: &str,
        vote_id: &str,
    ) -> ClientResult<PollVoteData> {
        let mut store = self.store.lock();
        store.begin("remove_poll_vote")?;
        let index = store
            .votes
            .iter()
            .position(|vote| vote.id == vote_id && vote.poll_id == poll_id)
            .ok_or_else(|| not_found("vote", vote_id))?;
        let vote = store.votes.remove(index);
        let user_id = self.user.id.clone();
        let activity = store.activity_mut(activity_id)?;
        activity.remove_poll_vote(&vote, &user_id);
        let activity = activity.clone();
        let now = store.now();
        store.broadcast(&activity, |fid| WsEvent::PollVoteRemoved {
            fid,
            poll_id: poll_id.to_string(),
            poll_vote: vote.clone(),
            created_at: now,
        });
        Ok(vote)
    }

    async fn create_poll_option(
        &self,
        poll_id: &str,
        request: &CreatePollOptionRequest,
    ) -> ClientResult<PollOptionData> {
        let mut store = self.store.lock();
        store.begin("create_poll_option")?;
        let activity = store.poll_activity_mut(poll_id)?;
        let index = activity.poll.as_ref().map_or(0, |poll| poll.options.len());
        let option = PollOptionData {
            id: format!("o{index}"),
            text: request.text.clone(),
        };
        activity.add_poll_option(poll_id, option.clone());
        Ok(option)
    }

    async fn delete_poll_option(&self, poll_id: &str, option_id: &str) -> ClientResult<()> {
        let mut store = self.store.lock();
        store.begin("delete_poll_option")?;
        let activity = store.poll_activity_mut(poll_id)?;
        if !activity.remove_poll_option(poll_id, option_id) {
            return Err(not_found("option", option_id));
        }
        store
            .votes
            .retain(|vote| !(vote.poll_id == poll_id && vote.option_id == option_id));
        Ok(())
    }

    async fn query_poll_votes(
        &self,
        poll_id: &str,
        params: &QueryParams,
    ) -> ClientResult<PagedResponse<PollVoteData>> {
        let mut store = self.store.lock();
        store.begin("query_poll_votes")?;
        let votes: Vec<PollVoteData> = store
            .votes
            .iter()
            .filter(|vote| vote.poll_id == poll_id)
            .cloned()
            .collect();
        Ok(page(votes, params, |vote| vote.created_at))
    }

    async fn own_capabilities_batch(
        &self,
        fids: &[FeedId],
    ) -> ClientResult<OwnCapabilitiesBatchResponse> {
        let mut store = self.store.lock();
        store.begin("own_capabilities_batch")?;
        let capabilities = fids
            .iter()
            .filter_map(|fid| {
                store
                    .capabilities
                    .get(fid)
                    .map(|capabilities| (fid.clone(), capabilities.clone()))
            })
            .collect();
        Ok(OwnCapabilitiesBatchResponse { capabilities })
    }
}

impl InMemoryBackend {
    fn resolve_follow(
        &self,
        source: &FeedId,
        target: &FeedId,
        status: FollowStatus,
        call: &'static str,
    ) -> ClientResult<FollowResponse> {
        let mut store = self.store.lock();
        store.begin(call)?;
        let now = store.now();
        let follow = store
            .follows
            .iter_mut()
            .find(|follow| follow.source_feed.feed == *source && follow.target_feed.feed == *target)
            .ok_or_else(|| not_found("follow", &source.raw_value()))?;
        follow.status = status;
        follow.updated_at = now;
        if status == FollowStatus::Accepted {
            follow.request_accepted_at = Some(now);
        }
        let follow = follow.clone();
        store.events.push(WsEvent::FollowUpdated {
            fid: target.clone(),
            follow: follow.clone().into(),
            created_at: now,
        });
        Ok(follow.into())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let store = self.store.lock();
        f.debug_struct("InMemoryBackend")
            .field("user", &self.user.id)
            .field("activities", &store.activities.len())
            .field("calls", &store.calls.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{activity, user_feed};

    #[tokio::test]
    async fn pages_follow_cursors() {
        let backend = InMemoryBackend::new("alice");
        let fid = user_feed("alice");
        for n in 0..5 {
            backend.insert_activity(activity(&format!("a{n}"), &fid, n));
        }
        let params = QueryParams {
            limit: Some(2),
            ..Default::default()
        };
        let first = backend.query_activities(&params).await.unwrap();
        let ids: Vec<_> = first.items.iter().map(|activity| activity.id.as_str()).collect();
        assert_eq!(ids, ["a4", "a3"]);
        assert_eq!(first.next.as_deref(), Some("2"));

        let second = backend
            .query_activities(&params.clone().with_next(first.next))
            .await
            .unwrap();
        let ids: Vec<_> = second.items.iter().map(|activity| activity.id.as_str()).collect();
        assert_eq!(ids, ["a2", "a1"]);
    }

    #[tokio::test]
    async fn injected_failures_are_returned_once() {
        let backend = InMemoryBackend::new("alice");
        backend.fail_next(ClientError::transport_retryable("offline"));
        assert!(backend.get_activity("missing").await.is_err());
        let err = backend.get_activity("missing").await.unwrap_err();
        assert_eq!(err, not_found("activity", "missing"));
        assert_eq!(backend.call_count("get_activity"), 2);
    }

    #[tokio::test]
    async fn mutations_broadcast_per_feed() {
        let backend = InMemoryBackend::new("alice");
        let request = AddActivityRequest::post("hi", vec![user_feed("alice"), user_feed("team")]);
        let created = backend.add_activity(&request).await.unwrap();
        let events = backend.take_events();
        assert_eq!(events.len(), 2);
        assert!(backend.take_events().is_empty());
        assert!(backend.stored_activity(&created.id).is_some());
    }
}
