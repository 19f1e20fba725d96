use std::collections::HashMap;
use std::path::Path;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use anisync_api::traits::{CatalogClient, CatalogEntry, EntryFields, ListEntry, StatusCommand};

use crate::config::SyncConfig;
use crate::decision::{self, Gate, PlannedCommand, SyncDecision};
use crate::error::SyncError;
use crate::matcher;
use crate::models::{
    LibraryFolder, PlaybackCompletionEvent, SeasonTarget, SkipReason, UserSyncPreferences,
};
use crate::relations;

/// A host user that can be synced, with their own authenticated client.
pub struct UserAccount<C> {
    pub preferences: UserSyncPreferences,
    pub client: C,
}

/// Outcome of processing one event for one user.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing was sent.
    Skipped(SkipReason),
    /// Commands were sent and confirmed.
    Synced {
        entry_id: u64,
        title: String,
        commands: Vec<StatusCommand>,
        list_entry: ListEntry,
    },
    Failed(SyncError),
}

#[derive(Debug)]
pub struct UserReport {
    pub user_id: String,
    pub outcome: SyncOutcome,
}

/// Turns playback completion events into list updates.
///
/// Holds no mutable state; users are processed concurrently and independently.
pub struct SyncOrchestrator<C> {
    accounts: HashMap<String, UserAccount<C>>,
    libraries: Vec<LibraryFolder>,
}

impl<C: CatalogClient> SyncOrchestrator<C> {
    pub fn new(libraries: Vec<LibraryFolder>) -> Self {
        Self {
            accounts: HashMap::new(),
            libraries,
        }
    }

    /// Build accounts for every configured user, connecting each with `connect(access_token)`.
    /// Users without a token cannot be synced and are left out.
    pub fn from_config(config: &SyncConfig, mut connect: impl FnMut(&str) -> C) -> Self {
        let mut orchestrator = Self::new(config.libraries.clone());
        for user in &config.users {
            let Some(token) = user.access_token.as_deref().filter(|t| !t.is_empty()) else {
                warn!(user_id = %user.user_id, "User is not authenticated with MyAnimeList, skipping");
                continue;
            };
            orchestrator.add_account(
                user.user_id.clone(),
                UserAccount {
                    preferences: user.preferences(),
                    client: connect(token),
                },
            );
        }
        orchestrator
    }

    pub fn add_account(&mut self, user_id: impl Into<String>, account: UserAccount<C>) {
        self.accounts.insert(user_id.into(), account);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Process an event for every user on it. Returns one report per user, in event order.
    pub async fn handle_event(&self, event: &PlaybackCompletionEvent) -> Vec<UserReport> {
        if !event.played_to_completion {
            debug!(name = %event.name, "Playback not finished, ignoring");
            return event
                .user_ids
                .iter()
                .map(|user_id| UserReport {
                    user_id: user_id.clone(),
                    outcome: SyncOutcome::Skipped(SkipReason::PlaybackIncomplete),
                })
                .collect();
        }

        join_all(
            event
                .user_ids
                .iter()
                .map(|user_id| self.handle_user(event, user_id)),
        )
        .await
    }

    async fn handle_user(&self, event: &PlaybackCompletionEvent, user_id: &str) -> UserReport {
        let outcome = match self.sync_user(event, user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                match &e {
                    SyncError::NotFound(_) => warn!(user_id, error = %e, "Sync skipped"),
                    SyncError::Transport(_) | SyncError::InconsistentState(_) => {
                        error!(user_id, error = %e, "Could not update anime status")
                    }
                }
                SyncOutcome::Failed(e)
            }
        };
        UserReport {
            user_id: user_id.to_string(),
            outcome,
        }
    }

    async fn sync_user(
        &self,
        event: &PlaybackCompletionEvent,
        user_id: &str,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(account) = self.accounts.get(user_id) else {
            warn!(user_id, "User is not configured for syncing, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::UnknownUser));
        };

        if !library_scope_allows(&account.preferences, &self.libraries, &event.path) {
            info!(user_id, path = %event.path.display(), "Item is outside the monitored libraries");
            return Ok(SyncOutcome::Skipped(SkipReason::OutOfLibraryScope));
        }

        let Some(episode) = event.progress_episode() else {
            debug!(user_id, name = %event.name, "No episode number, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::NoEpisodeNumber));
        };

        let client = &account.client;
        let target = self.resolve_entry(client, event).await?;

        let detail = client
            .get_entry_detail(target.id, EntryFields::SYNC)
            .await
            .map_err(transport)?
            .ok_or_else(|| SyncError::NotFound(format!("catalog entry {}", target.id)))?;

        let list_entry = detail.list_entry.as_ref();
        let rewatch_requested = match decision::gate(list_entry.map(|e| e.status), &account.preferences) {
            Gate::Proceed => false,
            Gate::ProceedWithRewatch => true,
            Gate::Skip(reason) => {
                info!(user_id, title = %detail.title, %reason, "Not updating list");
                return Ok(SyncOutcome::Skipped(reason));
            }
        };

        match decision::decide(list_entry, episode, detail.num_episodes, rewatch_requested) {
            SyncDecision::Skip(reason) => {
                info!(user_id, title = %detail.title, episode, %reason, "Not updating list");
                Ok(SyncOutcome::Skipped(reason))
            }
            SyncDecision::Apply(plan) => {
                let (commands, list_entry) = dispatch(client, detail.id, &plan).await?;
                info!(
                    user_id,
                    title = %detail.title,
                    status = %list_entry.status,
                    episodes = list_entry.episodes_watched,
                    "Updated list entry"
                );
                Ok(SyncOutcome::Synced {
                    entry_id: detail.id,
                    title: detail.title,
                    commands,
                    list_entry,
                })
            }
        }
    }

    /// Search by title, pick the matching entry, then move to the right season or special.
    async fn resolve_entry(
        &self,
        client: &C,
        event: &PlaybackCompletionEvent,
    ) -> Result<CatalogEntry, SyncError> {
        let results = client
            .search_by_title(&event.name, EntryFields::SEARCH)
            .await
            .map_err(transport)?;

        let root = matcher::select_candidate(&event.name, &results)
            .ok_or_else(|| SyncError::NotFound(format!("no catalog entry titled {:?}", event.name)))?;
        info!(kind = event.kind.as_str(), title = %root.title, "Found matching entry");

        match event.season_target() {
            SeasonTarget::Root => Ok(root.clone()),
            SeasonTarget::Season(season) => {
                let entry = relations::resolve_season(client, root, season)
                    .await
                    .ok_or_else(|| {
                        SyncError::NotFound(format!("season {season} of {:?}", root.title))
                    })?;
                info!(season, title = %entry.title, "Season being watched");
                Ok(entry)
            }
            SeasonTarget::Special(Some(name)) => relations::resolve_special(client, root, name)
                .await
                .ok_or_else(|| SyncError::NotFound(format!("special {name:?} of {:?}", root.title))),
            SeasonTarget::Special(None) => Err(SyncError::NotFound(format!(
                "special of {:?} has no episode name",
                root.title
            ))),
        }
    }
}

/// Send the plan's commands in order. Each step must be confirmed before the next.
async fn dispatch<C: CatalogClient>(
    client: &C,
    entry_id: u64,
    plan: &[PlannedCommand],
) -> Result<(Vec<StatusCommand>, ListEntry), SyncError> {
    let mut sent = Vec::with_capacity(plan.len());
    let mut confirmed: Option<ListEntry> = None;

    for step in plan {
        let command = step.resolve(confirmed.as_ref())?;
        debug!(entry_id, ?command, "Sending status update");
        let updated = client
            .submit_status_update(entry_id, &command)
            .await
            .map_err(transport)?;
        sent.push(command);
        confirmed = Some(updated);
    }

    let confirmed = confirmed
        .ok_or_else(|| SyncError::InconsistentState("update plan has no commands".into()))?;
    Ok((sent, confirmed))
}

/// True if `path` lies in one of the user's libraries, or the user has no library filter.
pub fn library_scope_allows(
    preferences: &UserSyncPreferences,
    libraries: &[LibraryFolder],
    path: &Path,
) -> bool {
    if preferences.library_scope.is_empty() {
        return true;
    }
    libraries
        .iter()
        .filter(|library| preferences.library_scope.contains(&library.id))
        .flat_map(|library| &library.locations)
        .any(|location| path.starts_with(location))
}

fn transport<E: std::error::Error>(e: E) -> SyncError {
    SyncError::Transport(e.to_string())
}
