//! Polls and the poll vote ledger.

use super::user::UserData;
use crate::query::{FilterField, FilterValue, Queryable, Sort, SortField};
use crate::sorted::{Identifiable, SortedVec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOptionData {
    /// Option id.
    pub id: String,
    /// Option label.
    pub text: String,
}

impl Identifiable for PollOptionData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// A vote on a poll option, or a free-text answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollVoteData {
    /// Vote id.
    pub id: String,
    /// Poll the vote belongs to.
    pub poll_id: String,
    /// Chosen option. Empty for answers.
    pub option_id: String,
    /// Answer text, for answers.
    pub answer_text: Option<String>,
    /// Returns true for free-text answers.
    pub is_answer: bool,
    /// Voter id.
    pub user_id: String,
    /// Voter, when the poll's voting visibility exposes it.
    pub user: Option<UserData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Identifiable for PollVoteData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// A poll attached to an activity.
///
/// # Invariants
///
/// - `vote_count` equals the sum of `vote_counts_by_option` after every mutation
/// - Option counts never go below zero
/// - With `enforce_unique_vote`, a user holds at most one option vote
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollData {
    /// Poll id.
    pub id: String,
    /// Question.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Voting is mutually exclusive across options.
    pub enforce_unique_vote: bool,
    /// Free-text answers are accepted.
    pub allow_answers: bool,
    /// Voters may add options.
    pub allow_user_suggested_options: bool,
    /// Voting has been closed.
    pub is_closed: bool,
    /// Maximum option votes per user, if limited.
    pub max_votes_allowed: Option<u32>,
    /// `public` or `anonymous`.
    pub voting_visibility: String,
    /// Options.
    pub options: Vec<PollOptionData>,
    /// Votes per option id.
    pub vote_counts_by_option: BTreeMap<String, u32>,
    /// Total option votes; derived from `vote_counts_by_option`.
    pub vote_count: u32,
    /// The current user's votes and answers.
    pub own_votes: Vec<PollVoteData>,
    /// Recent votes per option, newest first.
    pub latest_votes_by_option: BTreeMap<String, Vec<PollVoteData>>,
    /// Recent answers, newest first.
    pub latest_answers: Vec<PollVoteData>,
    /// Number of answers.
    pub answers_count: u32,
    /// Poll creator.
    pub created_by: Option<UserData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl PollData {
    /// Recomputes `vote_count` from the per-option counts.
    pub fn recompute_vote_count(&mut self) {
        self.vote_count = self.vote_counts_by_option.values().sum();
    }

    /// Returns true if the current user voted for `option_id`.
    pub fn has_own_vote(&self, option_id: &str) -> bool {
        self.own_votes
            .iter()
            .any(|vote| !vote.is_answer && vote.option_id == option_id)
    }

    /// The current user's answer, if any.
    pub fn own_answer(&self) -> Option<&PollVoteData> {
        self.own_votes.iter().find(|vote| vote.is_answer)
    }

    /// Records a vote (or an answer).
    ///
    /// With `enforce_unique_vote`, every known option vote by the same user
    /// is retracted first, even when the new vote is for the same option.
    /// Otherwise only a previous copy of the same vote is retracted.
    pub fn cast_vote(&mut self, vote: PollVoteData, current_user_id: &str) {
        if vote.is_answer {
            self.cast_answer(vote, current_user_id);
            return;
        }

        let prior = if self.enforce_unique_vote {
            self.known_votes_by(&vote.user_id, current_user_id)
        } else {
            self.known_vote(&vote.id, current_user_id).into_iter().collect()
        };
        for previous in &prior {
            self.retract(previous, current_user_id);
        }

        *self
            .vote_counts_by_option
            .entry(vote.option_id.clone())
            .or_insert(0) += 1;
        if vote.user_id == current_user_id {
            self.own_votes.insert_by_id(vote.clone());
        }
        let latest = self
            .latest_votes_by_option
            .entry(vote.option_id.clone())
            .or_default();
        latest.sorted_remove(&vote.id);
        latest.insert(0, vote);
        self.recompute_vote_count();
    }

    /// Retracts a vote (or an answer).
    ///
    /// Retracting one of the current user's votes that is no longer in
    /// `own_votes` is a no-op.
    pub fn remove_vote(&mut self, vote: &PollVoteData, current_user_id: &str) -> bool {
        if vote.is_answer {
            return self.remove_answer(vote, current_user_id);
        }
        let removed = self.retract(vote, current_user_id);
        self.recompute_vote_count();
        removed
    }

    /// Adds an option. Returns `false` if it already exists.
    pub fn add_option(&mut self, option: PollOptionData) -> bool {
        self.vote_counts_by_option.entry(option.id.clone()).or_insert(0);
        self.options.insert_by_id(option)
    }

    /// Refreshes an option's text.
    pub fn update_option(&mut self, option: PollOptionData) -> bool {
        self.options.replace_by_id(option)
    }

    /// Removes an option together with its votes.
    pub fn remove_option(&mut self, option_id: &str) -> bool {
        let removed = self.options.sorted_remove(&option_id.to_string()).is_some();
        self.vote_counts_by_option.remove(option_id);
        self.latest_votes_by_option.remove(option_id);
        self.own_votes
            .retain(|vote| vote.is_answer || vote.option_id != option_id);
        self.recompute_vote_count();
        removed
    }

    /// Closes voting.
    pub fn close(&mut self) {
        self.is_closed = true;
    }

    /// Substitutes an incoming copy, keeping the current user's votes when
    /// the payload does not carry them.
    pub fn merge(&mut self, mut incoming: PollData) {
        if incoming.own_votes.is_empty() {
            incoming.own_votes = std::mem::take(&mut self.own_votes);
        }
        incoming.recompute_vote_count();
        *self = incoming;
    }

    fn known_vote(&self, vote_id: &str, current_user_id: &str) -> Option<PollVoteData> {
        let id = vote_id.to_string();
        self.own_votes
            .iter()
            .chain(self.latest_votes_by_option.values().flatten())
            .find(|vote| vote.id == id && !vote.is_answer)
            .cloned()
            .filter(|vote| vote.user_id != current_user_id || self.own_votes.contains_id(&id))
    }

    fn known_votes_by(&self, user_id: &str, current_user_id: &str) -> Vec<PollVoteData> {
        let mut votes: Vec<PollVoteData> = Vec::new();
        let candidates = self
            .own_votes
            .iter()
            .filter(|_| user_id == current_user_id)
            .chain(self.latest_votes_by_option.values().flatten())
            .filter(|vote| vote.user_id == user_id && !vote.is_answer);
        for vote in candidates {
            votes.insert_by_id(vote.clone());
        }
        votes
    }

    fn retract(&mut self, vote: &PollVoteData, current_user_id: &str) -> bool {
        let was_own = self.own_votes.sorted_remove(&vote.id).is_some();
        let mut was_latest = false;
        if let Some(latest) = self.latest_votes_by_option.get_mut(&vote.option_id) {
            was_latest = latest.sorted_remove(&vote.id).is_some();
            if latest.is_empty() {
                self.latest_votes_by_option.remove(&vote.option_id);
            }
        }
        if vote.user_id == current_user_id && !was_own {
            return false;
        }
        if let Some(count) = self.vote_counts_by_option.get_mut(&vote.option_id) {
            *count = count.saturating_sub(1);
        }
        was_own || was_latest
    }

    fn cast_answer(&mut self, answer: PollVoteData, current_user_id: &str) {
        let previous = self
            .latest_answers
            .iter()
            .chain(self.own_votes.iter().filter(|_| answer.user_id == current_user_id))
            .find(|existing| existing.is_answer && existing.user_id == answer.user_id)
            .cloned();
        if let Some(previous) = previous {
            self.remove_answer(&previous, current_user_id);
        }

        self.answers_count += 1;
        if answer.user_id == current_user_id {
            self.own_votes.insert_by_id(answer.clone());
        }
        self.latest_answers.sorted_remove(&answer.id);
        self.latest_answers.insert(0, answer);
    }

    fn remove_answer(&mut self, answer: &PollVoteData, current_user_id: &str) -> bool {
        let was_own = self.own_votes.sorted_remove(&answer.id).is_some();
        let was_latest = self.latest_answers.sorted_remove(&answer.id).is_some();
        if answer.user_id == current_user_id && !was_own {
            return false;
        }
        self.answers_count = self.answers_count.saturating_sub(1);
        was_own || was_latest
    }
}

impl Identifiable for PollData {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Sort fields for poll votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVoteSortField {
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl SortField for PollVoteSortField {
    type Model = PollVoteData;

    fn remote_name(&self) -> &'static str {
        match self {
            PollVoteSortField::CreatedAt => "created_at",
            PollVoteSortField::UpdatedAt => "updated_at",
        }
    }

    fn compare(&self, lhs: &PollVoteData, rhs: &PollVoteData) -> Ordering {
        match self {
            PollVoteSortField::CreatedAt => lhs.created_at.cmp(&rhs.created_at),
            PollVoteSortField::UpdatedAt => lhs.updated_at.cmp(&rhs.updated_at),
        }
    }
}

/// Filter fields for poll votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVoteFilterField {
    /// Chosen option.
    OptionId,
    /// Voter.
    UserId,
    /// Answers versus option votes.
    IsAnswer,
}

impl FilterField for PollVoteFilterField {
    type Model = PollVoteData;

    fn remote_name(&self) -> &'static str {
        match self {
            PollVoteFilterField::OptionId => "option_id",
            PollVoteFilterField::UserId => "user_id",
            PollVoteFilterField::IsAnswer => "is_answer",
        }
    }

    fn value_of(&self, model: &PollVoteData) -> FilterValue {
        match self {
            PollVoteFilterField::OptionId => model.option_id.as_str().into(),
            PollVoteFilterField::UserId => model.user_id.as_str().into(),
            PollVoteFilterField::IsAnswer => model.is_answer.into(),
        }
    }
}

impl Queryable for PollVoteData {
    type SortField = PollVoteSortField;
    type FilterField = PollVoteFilterField;

    fn default_sort() -> Vec<Sort<PollVoteSortField>> {
        vec![Sort::descending(PollVoteSortField::CreatedAt)]
    }
}
