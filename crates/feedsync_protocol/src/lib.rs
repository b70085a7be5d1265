//! # feedsync protocol
//!
//! Wire types exchanged with the feeds backend.
//!
//! This crate provides:
//! - Response DTOs for every entity and their conversion into core models
//! - Request bodies and paged query parameters
//! - Response envelopes (`GetOrCreateFeedResponse`, paged lists, mutation results)
//! - `WsEvent`, the closed union of real-time events, with JSON framing
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod events;
mod requests;
mod responses;

pub use error::{ProtocolError, ProtocolResult};
pub use events::WsEvent;
pub use requests::{
    AddActivityRequest, AddBookmarkRequest, AddCommentRequest, AddReactionRequest,
    CastPollVoteRequest, CreatePollOptionRequest, CreatePollRequest, FollowRequest,
    GetOrCreateFeedRequest, QueryParams, SortParam, UpdateActivityRequest, UpdateBookmarkRequest,
    UpdateCommentRequest, UpdateFeedRequest,
};
pub use responses::{
    ActivityResponse, BookmarkResponse, CommentReactionResponse, CommentResponse, FeedResponse,
    FollowResponse, GetOrCreateFeedResponse, NotificationStatus, OwnCapabilitiesBatchResponse,
    PagedResponse, PinResponse, PollResponse, ReactionResponse,
};
