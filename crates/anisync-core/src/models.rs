use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of media whose playback finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Episode,
    Movie,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episode => "series",
            Self::Movie => "movie",
        }
    }
}

/// A "playback finished" notification from the media library host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackCompletionEvent {
    pub kind: MediaKind,
    /// Series name for episodes, movie name for movies.
    pub name: String,
    /// Display name of the episode itself. Used to find specials.
    #[serde(default)]
    pub episode_name: Option<String>,
    /// 0 for specials/OVAs, 1.. for numbered seasons.
    #[serde(default)]
    pub season_number: Option<u32>,
    /// 1-based index within the season.
    #[serde(default)]
    pub episode_number: Option<u32>,
    pub played_to_completion: bool,
    #[serde(default)]
    pub user_ids: Vec<String>,
    pub path: PathBuf,
}

/// Which catalog entry an event refers to, relative to the series' first season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonTarget<'a> {
    /// The entry found by title search.
    Root,
    /// A later season, reached through sequel relations.
    Season(u32),
    /// A special/OVA, found by name among side stories and alternatives.
    Special(Option<&'a str>),
}

impl PlaybackCompletionEvent {
    /// Episode number to record as progress. Movies always count as episode 1.
    pub fn progress_episode(&self) -> Option<u32> {
        match self.kind {
            MediaKind::Movie => Some(1),
            MediaKind::Episode => self.episode_number,
        }
    }

    pub fn season_target(&self) -> SeasonTarget<'_> {
        if self.kind == MediaKind::Movie {
            return SeasonTarget::Root;
        }
        match self.season_number {
            Some(0) => SeasonTarget::Special(self.episode_name.as_deref()),
            Some(n) if n > 1 => SeasonTarget::Season(n),
            _ => SeasonTarget::Root,
        }
    }
}

/// Per-user sync settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSyncPreferences {
    /// Library ids to sync from. Empty means every library.
    #[serde(default)]
    pub library_scope: Vec<String>,
    /// Only update entries that are on the plan-to-watch (or watching) list.
    #[serde(default)]
    pub plan_to_watch_only: bool,
    /// Start a rewatch when a completed entry is watched again.
    #[serde(default)]
    pub rewatch_completed: bool,
}

/// A library as configured on the host, with the folders it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFolder {
    pub id: String,
    #[serde(default)]
    pub locations: Vec<PathBuf>,
}

/// Why an event produced no update for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PlaybackIncomplete,
    UnknownUser,
    OutOfLibraryScope,
    NoEpisodeNumber,
    /// Entry is completed and the user does not want rewatches tracked.
    CompletedWithoutRewatch,
    /// Plan-to-watch-only is set and the entry is not on that list.
    NotPlanToWatch,
    /// The list already records this episode or later.
    AlreadyWatched,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::PlaybackIncomplete => "playback not finished",
            Self::UnknownUser => "user not configured",
            Self::OutOfLibraryScope => "item outside monitored libraries",
            Self::NoEpisodeNumber => "no episode number",
            Self::CompletedWithoutRewatch => "completed, rewatch tracking off",
            Self::NotPlanToWatch => "not on plan to watch list",
            Self::AlreadyWatched => "episode already watched",
        })
    }
}
