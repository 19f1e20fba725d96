//! What to write to the user's list after an episode finishes.
//!
//! Everything here is pure: the same list entry and episode always produce the
//! same plan. Dates are requested as "now" flags and stamped by the client.

use anisync_api::traits::{ListEntry, ListStatus, StatusCommand};

use crate::error::SyncError;
use crate::models::{SkipReason, UserSyncPreferences};

/// Result of checking the entry's list status against the user's preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    /// Proceed, and start a rewatch if the episode was already watched.
    ProceedWithRewatch,
    Skip(SkipReason),
}

/// Decide whether an entry with `status` (`None` = not on the list) may be updated.
pub fn gate(status: Option<ListStatus>, preferences: &UserSyncPreferences) -> Gate {
    match status {
        Some(ListStatus::Watching) => Gate::Proceed,
        Some(ListStatus::Completed) if preferences.rewatch_completed => Gate::ProceedWithRewatch,
        Some(ListStatus::Completed) => Gate::Skip(SkipReason::CompletedWithoutRewatch),
        Some(ListStatus::PlanToWatch) => Gate::Proceed,
        _ if preferences.plan_to_watch_only => Gate::Skip(SkipReason::NotPlanToWatch),
        _ => Gate::Proceed,
    }
}

/// One step of an update plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedCommand {
    Send(StatusCommand),
    /// Mark completed again with the rewatch count one above the count the
    /// service returned for the previous step.
    BumpRewatchCount { episodes_watched: u32 },
}

impl PlannedCommand {
    /// Turn the step into a concrete command, given the record confirmed by the previous step.
    pub fn resolve(&self, previous: Option<&ListEntry>) -> Result<StatusCommand, SyncError> {
        match self {
            Self::Send(command) => Ok(command.clone()),
            Self::BumpRewatchCount { episodes_watched } => {
                let previous = previous.ok_or_else(|| {
                    SyncError::InconsistentState(
                        "rewatch count bump has no preceding update response".into(),
                    )
                })?;
                let count = previous.times_rewatched.checked_add(1).ok_or_else(|| {
                    SyncError::InconsistentState(format!(
                        "rewatch count {} cannot be incremented",
                        previous.times_rewatched
                    ))
                })?;
                Ok(StatusCommand::new(ListStatus::Completed)
                    .episodes(*episodes_watched)
                    .rewatching(false)
                    .rewatch_count(count))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    Skip(SkipReason),
    /// Commands to send, in order.
    Apply(Vec<PlannedCommand>),
}

/// The parts of a list entry the decision looks at. Not-tracked single-episode
/// works are decided as if they had an empty record.
#[derive(Debug, Clone, Copy, Default)]
struct Prior {
    status: Option<ListStatus>,
    episodes_watched: u32,
    is_rewatching: bool,
}

impl From<&ListEntry> for Prior {
    fn from(entry: &ListEntry) -> Self {
        Self {
            status: Some(entry.status),
            episodes_watched: entry.episodes_watched,
            is_rewatching: entry.is_rewatching,
        }
    }
}

/// Compute the update for finishing `episode` of an entry with `total_episodes`
/// (0 = unknown). `rewatch_requested` comes from [`Gate::ProceedWithRewatch`].
pub fn decide(
    entry: Option<&ListEntry>,
    episode: u32,
    total_episodes: u32,
    rewatch_requested: bool,
) -> SyncDecision {
    let single_episode = total_episodes == 1;

    let prior = match entry {
        Some(entry) => Prior::from(entry),
        None if single_episode => Prior::default(),
        None => {
            return SyncDecision::Apply(vec![PlannedCommand::Send(
                StatusCommand::new(ListStatus::Watching).episodes(episode),
            )]);
        }
    };

    if prior.episodes_watched < episode || single_episode {
        if single_episode || (total_episodes > 0 && episode == total_episodes) {
            return SyncDecision::Apply(complete(prior, episode, single_episode));
        }

        let command = if prior.is_rewatching {
            // MAL keeps rewatches under "completed" and tracks progress there.
            StatusCommand::new(ListStatus::Completed).episodes(episode)
        } else {
            StatusCommand::new(ListStatus::Watching)
                .episodes(episode)
                .start_now(episode == 1)
        };
        return SyncDecision::Apply(vec![PlannedCommand::Send(command)]);
    }

    if rewatch_requested {
        SyncDecision::Apply(vec![PlannedCommand::Send(
            StatusCommand::new(ListStatus::Completed).rewatching(true),
        )])
    } else {
        SyncDecision::Skip(SkipReason::AlreadyWatched)
    }
}

/// Plan for the final episode of a work.
fn complete(prior: Prior, episode: u32, single_episode: bool) -> Vec<PlannedCommand> {
    // Dates of an earlier viewing are kept.
    let keep_dates = prior.is_rewatching || prior.status == Some(ListStatus::Completed);
    let episodes_watched = if single_episode { 1 } else { episode };

    let command = StatusCommand::new(ListStatus::Completed)
        .episodes(episodes_watched)
        .rewatching(false)
        .start_now(single_episode && !keep_dates)
        .finish_now(!keep_dates);

    let mut plan = vec![PlannedCommand::Send(command)];
    if prior.is_rewatching || (single_episode && prior.status == Some(ListStatus::Completed)) {
        plan.push(PlannedCommand::BumpRewatchCount { episodes_watched });
    }
    plan
}
