//! Configuration for the feeds client and its queries.

use feedsync_core::{
    ActivityData, ActivityFilterField, ActivitySortField, BookmarkData, CommentData, FeedId,
    FeedMemberData, Filter, FollowData, PollVoteData, QueryConfiguration, Queryable, Sort,
};
use feedsync_protocol::{GetOrCreateFeedRequest, QueryParams};

/// Configuration for a [`FeedsClient`](crate::FeedsClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The authenticated user. Decides which reactions, bookmarks and votes
    /// are "own".
    pub user_id: String,
    /// Page size used when a query does not set one.
    pub default_page_size: u32,
    /// Number of recent event fingerprints kept for duplicate suppression.
    /// Zero disables the check.
    pub event_dedupe_window: usize,
    /// Fetch capabilities of feeds seen in loaded activities that are not
    /// cached yet.
    pub fetch_missing_capabilities: bool,
}

impl ClientConfig {
    /// Creates a configuration for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            default_page_size: 25,
            event_dedupe_window: 256,
            fetch_missing_capabilities: true,
        }
    }

    /// Sets the default page size.
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the event dedupe window.
    pub fn with_event_dedupe_window(mut self, window: usize) -> Self {
        self.event_dedupe_window = window;
        self
    }

    /// Enables or disables fetching of missing capabilities.
    pub fn with_fetch_missing_capabilities(mut self, enabled: bool) -> Self {
        self.fetch_missing_capabilities = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Filter, sort and page size of a paginated list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<M: Queryable> {
    /// Filter, if any.
    pub filter: Option<Filter<M::FilterField>>,
    /// Sort. Empty means the model's default sort.
    pub sort: Vec<Sort<M::SortField>>,
    /// Page size. `None` uses the client default.
    pub limit: Option<u32>,
}

impl<M: Queryable> ListQuery<M> {
    /// A query with no filter and the default sort.
    pub fn new() -> Self {
        Self {
            filter: None,
            sort: Vec::new(),
            limit: None,
        }
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: Filter<M::FilterField>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: Vec<Sort<M::SortField>>) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The query configuration local inserts are ordered and filtered by.
    pub fn config(&self) -> QueryConfiguration<M> {
        QueryConfiguration::new(self.filter.clone(), self.sort.clone())
    }

    /// Wire parameters of the first page.
    pub fn params(&self, default_limit: u32) -> QueryParams {
        QueryParams::from_config(&self.config(), Some(self.limit.unwrap_or(default_limit)))
    }
}

impl<M: Queryable> Default for ListQuery<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Query of a cross-feed activity list.
pub type ActivitiesQuery = ListQuery<ActivityData>;
/// Query of the current user's bookmarks.
pub type BookmarksQuery = ListQuery<BookmarkData>;
/// Query of a comment list.
pub type CommentsQuery = ListQuery<CommentData>;
/// Query of a poll's votes.
pub type PollVotesQuery = ListQuery<PollVoteData>;
/// Query of follows.
pub type FollowsQuery = ListQuery<FollowData>;
/// Query of feed members.
pub type MembersQuery = ListQuery<FeedMemberData>;

/// What to load for a single feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    /// The feed.
    pub fid: FeedId,
    /// Activity filter.
    pub activity_filter: Option<Filter<ActivityFilterField>>,
    /// Activity sort. Empty means newest first.
    pub activity_sort: Vec<Sort<ActivitySortField>>,
    /// Activity page size.
    pub activity_limit: Option<u32>,
    /// Follower page size.
    pub follower_limit: Option<u32>,
    /// Following page size.
    pub following_limit: Option<u32>,
    /// Member page size.
    pub member_limit: Option<u32>,
    /// Subscribe to real-time events for the feed.
    pub watch: bool,
}

impl FeedQuery {
    /// A query for `fid` with defaults.
    pub fn new(fid: FeedId) -> Self {
        Self {
            fid,
            activity_filter: None,
            activity_sort: Vec::new(),
            activity_limit: None,
            follower_limit: None,
            following_limit: None,
            member_limit: None,
            watch: true,
        }
    }

    /// Sets the activity filter.
    pub fn with_activity_filter(mut self, filter: Filter<ActivityFilterField>) -> Self {
        self.activity_filter = Some(filter);
        self
    }

    /// Sets the activity sort.
    pub fn with_activity_sort(mut self, sort: Vec<Sort<ActivitySortField>>) -> Self {
        self.activity_sort = sort;
        self
    }

    /// Sets the activity page size.
    pub fn with_activity_limit(mut self, limit: u32) -> Self {
        self.activity_limit = Some(limit);
        self
    }

    /// Sets the follower and following page sizes.
    pub fn with_follow_limits(mut self, followers: u32, following: u32) -> Self {
        self.follower_limit = Some(followers);
        self.following_limit = Some(following);
        self
    }

    /// Sets the member page size.
    pub fn with_member_limit(mut self, limit: u32) -> Self {
        self.member_limit = Some(limit);
        self
    }

    /// Enables or disables watching.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// The activity query configuration.
    pub fn activity_config(&self) -> QueryConfiguration<ActivityData> {
        QueryConfiguration::new(self.activity_filter.clone(), self.activity_sort.clone())
    }

    /// Wire form of the first load.
    pub fn to_request(&self, default_limit: u32) -> GetOrCreateFeedRequest {
        GetOrCreateFeedRequest {
            activities: QueryParams::from_config(
                &self.activity_config(),
                Some(self.activity_limit.unwrap_or(default_limit)),
            ),
            follower_limit: self.follower_limit,
            following_limit: self.following_limit,
            member_limit: self.member_limit,
            watch: self.watch,
        }
    }
}
