//! Client entry point.

use crate::backend::FeedsBackend;
use crate::capabilities::{CapabilityCache, CapabilityMap};
use crate::config::{
    ActivitiesQuery, BookmarksQuery, ClientConfig, CommentsQuery, FeedQuery, FollowsQuery,
    ListQuery, PollVotesQuery,
};
use crate::error::ClientResult;
use crate::event::StateEvent;
use crate::facade::{
    Activity, ActivityList, BookmarkList, CommentList, Feed, FollowList, List, PollVoteList,
};
use crate::router::EventRouter;
use crate::source::EventSource;
use crate::state::{
    ActivityListKind, ActivityState, BookmarkListKind, CommentListKind, FeedState,
    FollowListKind, ListKind, ListState, PollVoteListKind,
};
use feedsync_core::FeedId;
use feedsync_protocol::WsEvent;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Everything facades share: configuration, backend, router and the
/// capability cache.
pub(crate) struct ClientContext {
    pub(crate) config: ClientConfig,
    pub(crate) backend: Arc<dyn FeedsBackend>,
    pub(crate) router: Arc<EventRouter>,
    pub(crate) capabilities: Arc<CapabilityCache>,
}

impl ClientContext {
    pub(crate) fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// Routes a locally produced event to every live container.
    pub(crate) fn publish(&self, event: StateEvent) -> usize {
        self.router.dispatch(&event)
    }

    /// Writes capabilities through the cache and propagates changed entries.
    pub(crate) fn save_capabilities(&self, capabilities: CapabilityMap) {
        let changed = self.capabilities.save(capabilities);
        if !changed.is_empty() {
            self.publish(StateEvent::FeedOwnCapabilitiesUpdated(changed));
        }
    }

    /// Returns capabilities for `fids`, fetching the whole set unless every
    /// feed is cached.
    pub(crate) async fn own_capabilities(
        &self,
        fids: &BTreeSet<FeedId>,
    ) -> ClientResult<CapabilityMap> {
        if let Some(cached) = self.capabilities.capabilities(fids) {
            return Ok(cached);
        }
        let request: Vec<FeedId> = fids.iter().cloned().collect();
        let response = self.backend.own_capabilities_batch(&request).await?;
        let fetched: CapabilityMap = response
            .capabilities
            .into_iter()
            .map(|(fid, capabilities)| (fid, capabilities.into_iter().collect()))
            .collect();
        debug!(requested = fids.len(), fetched = fetched.len(), "fetched capabilities");
        self.save_capabilities(fetched.clone());
        Ok(fetched)
    }

    /// Loads capabilities of uncached feeds when enabled. Failures are logged.
    pub(crate) async fn fill_capabilities(&self, fids: BTreeSet<FeedId>) {
        if !self.config.fetch_missing_capabilities || self.capabilities.missing(&fids).is_empty() {
            return;
        }
        if let Err(err) = self.own_capabilities(&fids).await {
            warn!(error = %err, feeds = fids.len(), "capability fetch failed");
        }
    }
}

/// Creates facades over one backend and one event stream.
///
/// Every facade registers its state container with the shared router, so
/// a real-time event or a local mutation result reaches all live
/// containers. Containers are held weakly by the router: dropping a facade
/// unsubscribes it.
#[derive(Clone)]
pub struct FeedsClient {
    context: Arc<ClientContext>,
}

impl FeedsClient {
    /// Creates a client for `config.user_id` talking to `backend`.
    pub fn new(config: ClientConfig, backend: Arc<dyn FeedsBackend>) -> Self {
        let router = Arc::new(EventRouter::new(config.event_dedupe_window));
        Self {
            context: Arc::new(ClientContext {
                config,
                backend,
                router,
                capabilities: Arc::new(CapabilityCache::new()),
            }),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.context.config
    }

    /// The event router.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.context.router
    }

    /// The shared capability cache.
    pub fn capability_cache(&self) -> &Arc<CapabilityCache> {
        &self.context.capabilities
    }

    /// A feed facade. Nothing is fetched until [`Feed::get`].
    pub fn feed(&self, query: FeedQuery) -> Feed {
        let state = Arc::new(FeedState::new(
            query.fid.clone(),
            self.context.user_id(),
            query.activity_config(),
        ));
        self.context.router.register(&state);
        Feed::new(Arc::clone(&self.context), state, query)
    }

    /// An activity facade with default comment ordering.
    pub fn activity(&self, activity_id: impl Into<String>, fid: FeedId) -> Activity {
        self.activity_with_comments(activity_id, fid, CommentsQuery::default())
    }

    /// An activity facade whose comments follow `comments`.
    pub fn activity_with_comments(
        &self,
        activity_id: impl Into<String>,
        fid: FeedId,
        comments: CommentsQuery,
    ) -> Activity {
        let state = Arc::new(ActivityState::new(
            activity_id,
            self.context.user_id(),
            comments.config(),
        ));
        self.context.router.register(&state);
        Activity::new(Arc::clone(&self.context), state, fid, comments)
    }

    /// A cross-feed activity list.
    pub fn activity_list(&self, query: ActivitiesQuery) -> ActivityList {
        self.list(ActivityListKind, query)
    }

    /// The current user's bookmarks.
    pub fn bookmark_list(&self, query: BookmarksQuery) -> BookmarkList {
        self.list(BookmarkListKind, query)
    }

    /// Comments on `object_id`.
    pub fn comment_list(&self, object_id: impl Into<String>, query: CommentsQuery) -> CommentList {
        self.list(
            CommentListKind {
                object_id: object_id.into(),
            },
            query,
        )
    }

    /// Votes of `poll_id`.
    pub fn poll_vote_list(&self, poll_id: impl Into<String>, query: PollVotesQuery) -> PollVoteList {
        self.list(
            PollVoteListKind {
                poll_id: poll_id.into(),
            },
            query,
        )
    }

    /// Follows selected by `query`.
    pub fn follow_list(&self, query: FollowsQuery) -> FollowList {
        self.list(FollowListKind, query)
    }

    fn list<K: ListKind>(&self, kind: K, query: ListQuery<K::Model>) -> List<K> {
        let state = Arc::new(ListState::new(kind, self.context.user_id(), query.config()));
        self.context.router.register(&state);
        List::new(Arc::clone(&self.context), state, query)
    }

    /// The current user's capabilities on `fids`.
    ///
    /// Served from the cache only if every feed is cached; otherwise the
    /// whole set is fetched. Entries that changed are pushed to live
    /// containers.
    pub async fn own_capabilities(
        &self,
        fids: impl IntoIterator<Item = FeedId>,
    ) -> ClientResult<CapabilityMap> {
        let fids: BTreeSet<FeedId> = fids.into_iter().collect();
        self.context.own_capabilities(&fids).await
    }

    /// Applies one real-time event. Returns the number of containers it
    /// changed.
    pub fn handle_event(&self, event: WsEvent) -> usize {
        self.context.router.handle_ws(event)
    }

    /// Drains `source` into the router on a background task.
    ///
    /// The task ends with the source and yields the number of events it
    /// routed. Undecodable frames are logged and skipped.
    pub fn connect<S>(&self, mut source: S) -> JoinHandle<usize>
    where
        S: EventSource + 'static,
    {
        let router = Arc::clone(&self.context.router);
        tokio::spawn(async move {
            let mut routed = 0;
            while let Some(next) = source.next_event().await {
                match next {
                    Ok(event) => {
                        router.handle_ws(event);
                        routed += 1;
                    }
                    Err(err) => warn!(error = %err, "dropping undecodable event"),
                }
            }
            debug!(routed, "event source ended");
            routed
        })
    }
}

impl std::fmt::Debug for FeedsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedsClient")
            .field("user_id", &self.context.config.user_id)
            .field("router", &self.context.router)
            .finish()
    }
}
