//! Generic list facade.

use super::log_failure;
use crate::client::ClientContext;
use crate::config::ListQuery;
use crate::error::{ClientError, ClientResult};
use crate::state::{
    ActivityListKind, BookmarkListKind, CommentListKind, FollowListKind, ListKind, ListState,
    PageMode, PollVoteListKind,
};
use feedsync_protocol::QueryParams;
use std::sync::Arc;
use tracing::debug;

/// A paginated list: [`List::get`] loads the first page,
/// [`List::query_more`] the following ones. Real-time changes arrive
/// through the router.
pub struct List<K: ListKind> {
    context: Arc<ClientContext>,
    state: Arc<ListState<K>>,
    query: ListQuery<K::Model>,
}

impl<K: ListKind> List<K> {
    pub(crate) fn new(
        context: Arc<ClientContext>,
        state: Arc<ListState<K>>,
        query: ListQuery<K::Model>,
    ) -> Self {
        Self {
            context,
            state,
            query,
        }
    }

    /// The observable state.
    pub fn state(&self) -> &Arc<ListState<K>> {
        &self.state
    }

    /// The query the list was created with.
    pub fn query(&self) -> &ListQuery<K::Model> {
        &self.query
    }

    /// Loads the first page, replacing loaded items.
    pub async fn get(&self) -> ClientResult<Vec<K::Model>> {
        let previous = self.state.begin_load();
        let params = self.query.params(self.context.config.default_page_size);
        let page = match self
            .state
            .kind()
            .fetch(self.context.backend.as_ref(), &params)
            .await
        {
            Ok(page) => page,
            Err(err) => {
                self.state.fail_load(previous);
                log_failure("list_get")(&err);
                return Err(err);
            }
        };
        debug!(count = page.models.len(), has_next = page.pagination.has_next(), "loaded first page");
        self.state
            .apply_page(page, self.query.config(), PageMode::Replace);
        Ok(self.state.items())
    }

    /// Loads the next page. Returns the new page.
    pub async fn query_more(&self, limit: Option<u32>) -> ClientResult<Vec<K::Model>> {
        if !self.state.phase().is_loaded() {
            return Err(ClientError::NotLoaded { what: "list" });
        }
        let next = self
            .state
            .pagination()
            .next
            .ok_or(ClientError::NoMorePages)?;
        let query = self.state.query();
        let limit = limit
            .or(self.query.limit)
            .unwrap_or(self.context.config.default_page_size);
        let params = QueryParams::from_config(&query, Some(limit)).with_next(Some(next));

        let page = self
            .state
            .kind()
            .fetch(self.context.backend.as_ref(), &params)
            .await
            .inspect_err(log_failure("list_query_more"))?;
        let models = page.models.clone();
        self.state.apply_page(page, query, PageMode::Append);
        Ok(models)
    }
}

impl<K: ListKind> std::fmt::Debug for List<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("List")
            .field("phase", &self.state.phase())
            .field("has_next", &self.state.has_next())
            .finish()
    }
}

/// Activities across feeds.
pub type ActivityList = List<ActivityListKind>;
/// The current user's bookmarks.
pub type BookmarkList = List<BookmarkListKind>;
/// Comments on an activity.
pub type CommentList = List<CommentListKind>;
/// Votes of a poll.
pub type PollVoteList = List<PollVoteListKind>;
/// Follows.
pub type FollowList = List<FollowListKind>;
