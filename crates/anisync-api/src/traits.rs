//! Trait and shared types for the remote list-tracking catalog.
//!
//! The sync core only talks to [`CatalogClient`]; the MyAnimeList client is one
//! implementation and the tests provide an in-memory one.

use std::future::Future;

use bitflags::bitflags;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remote catalog interface consumed by the sync core.
pub trait CatalogClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search the catalog by title. Results keep the service's ranking order.
    fn search_by_title(
        &self,
        query: &str,
        fields: EntryFields,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send;

    /// Fetch a single entry. `Ok(None)` means the catalog has no such entry.
    fn get_entry_detail(
        &self,
        entry_id: u64,
        fields: EntryFields,
    ) -> impl Future<Output = Result<Option<CatalogEntry>, Self::Error>> + Send;

    /// Apply a status update and return the record as confirmed by the service.
    fn submit_status_update(
        &self,
        entry_id: u64,
        command: &StatusCommand,
    ) -> impl Future<Output = Result<ListEntry, Self::Error>> + Send;
}

bitflags! {
    /// Which parts of a catalog entry a request should populate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFields: u8 {
        const TITLES = 0b0000_0001;
        const ALTERNATIVE_TITLES = 0b0000_0010;
        const EPISODES = 0b0000_0100;
        const RELATIONS = 0b0000_1000;
        const LIST_STATUS = 0b0001_0000;
    }
}

impl EntryFields {
    /// Fields needed to pick a search candidate.
    pub const SEARCH: Self = Self::TITLES.union(Self::ALTERNATIVE_TITLES);

    /// Fields needed to run the sync decision for an entry.
    pub const SYNC: Self = Self::TITLES
        .union(Self::ALTERNATIVE_TITLES)
        .union(Self::EPISODES)
        .union(Self::LIST_STATUS);
}

/// Alternative titles attached to a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeTitles {
    pub en: Option<String>,
    pub ja: Option<String>,
    pub synonyms: Vec<String>,
}

/// One catalog entry (series, season, movie or special) as fetched from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub alternative_titles: AlternativeTitles,
    /// 0 when the service does not know the count yet.
    pub num_episodes: u32,
    /// `None` when relations were not requested.
    pub relations: Option<Vec<RelationEdge>>,
    pub list_entry: Option<ListEntry>,
}

impl CatalogEntry {
    pub fn english_title(&self) -> Option<&str> {
        self.alternative_titles.en.as_deref()
    }
}

/// How one catalog entry relates to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Sequel,
    Prequel,
    SideStory,
    AlternativeVersion,
    AlternativeSetting,
    #[serde(other)]
    Other,
}

impl RelationKind {
    /// Relations that can point at a special or OVA of the source entry.
    pub fn is_special(self) -> bool {
        matches!(
            self,
            Self::SideStory | Self::AlternativeVersion | Self::AlternativeSetting
        )
    }
}

/// A typed link from one catalog entry to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub kind: RelationKind,
    pub target_id: u64,
}

/// Status of a list entry on the user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Watching,
    Completed,
    OnHold,
    Dropped,
    PlanToWatch,
}

impl ListStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Dropped => "dropped",
            Self::PlanToWatch => "plan_to_watch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "watching" => Some(Self::Watching),
            "completed" => Some(Self::Completed),
            "on_hold" => Some(Self::OnHold),
            "dropped" => Some(Self::Dropped),
            "plan_to_watch" => Some(Self::PlanToWatch),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's tracking record for one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub status: ListStatus,
    pub episodes_watched: u32,
    pub is_rewatching: bool,
    pub times_rewatched: u32,
    pub start_date: Option<NaiveDate>,
    pub finish_date: Option<NaiveDate>,
    pub score: Option<u32>,
}

/// A single write against a list entry. Unset fields are left untouched by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCommand {
    pub status: ListStatus,
    pub episodes_watched: Option<u32>,
    pub is_rewatching: Option<bool>,
    /// Stamp today's date as the start date.
    pub start_date_now: bool,
    /// Stamp today's date as the finish date.
    pub finish_date_now: bool,
    pub times_rewatched: Option<u32>,
}

impl StatusCommand {
    pub fn new(status: ListStatus) -> Self {
        Self {
            status,
            episodes_watched: None,
            is_rewatching: None,
            start_date_now: false,
            finish_date_now: false,
            times_rewatched: None,
        }
    }

    pub fn episodes(mut self, episodes: u32) -> Self {
        self.episodes_watched = Some(episodes);
        self
    }

    pub fn rewatching(mut self, rewatching: bool) -> Self {
        self.is_rewatching = Some(rewatching);
        self
    }

    pub fn start_now(mut self, stamp: bool) -> Self {
        self.start_date_now = stamp;
        self
    }

    pub fn finish_now(mut self, stamp: bool) -> Self {
        self.finish_date_now = stamp;
        self
    }

    pub fn rewatch_count(mut self, count: u32) -> Self {
        self.times_rewatched = Some(count);
        self
    }
}
