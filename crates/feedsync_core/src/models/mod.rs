//! Entity models.
//!
//! Models are plain value types built from backend responses. They are only
//! changed through the mutators defined here, which keep counters and
//! derived values consistent (see each type's invariants).

mod activity;
mod bookmark;
mod capability;
mod comment;
mod feed;
mod follow;
mod ledger;
mod member;
mod pagination;
mod pin;
mod poll;
mod reaction;
mod user;

pub use activity::{ActivityData, ActivityFilterField, ActivitySortField, COMMENT_SAMPLE_LIMIT};
pub use bookmark::{BookmarkData, BookmarkFilterField, BookmarkFolderData, BookmarkSortField};
pub use capability::FeedOwnCapability;
pub use comment::{CommentData, CommentFilterField, CommentSortField, ReplyInsert};
pub use feed::FeedData;
pub use follow::{FollowData, FollowFilterField, FollowSortField, FollowStatus};
pub use ledger::{CommentLedger, CountedIds, COUNTED_IDS_CAPACITY};
pub use member::{FeedMemberData, MemberFilterField, MemberSortField, MemberStatus};
pub use pagination::{PaginationData, PaginationResult};
pub use pin::{ActivityPinData, PinFilterField, PinSortField};
pub use poll::{PollData, PollOptionData, PollVoteData, PollVoteFilterField, PollVoteSortField};
pub use reaction::{FeedsReactionData, ReactionGroupData, ReactionSummary, LATEST_REACTIONS_LIMIT};
pub use user::UserData;
