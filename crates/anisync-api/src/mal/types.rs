use chrono::NaiveDate;
use serde::Deserialize;

use crate::traits::{
    AlternativeTitles, CatalogEntry, ListEntry, ListStatus, RelationEdge, RelationKind,
};

// ── Search / anime detail responses ─────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MalSearchResponse {
    pub data: Vec<MalSearchNode>,
}

#[derive(Debug, Deserialize)]
pub struct MalSearchNode {
    pub node: MalAnimeNode,
}

#[derive(Debug, Deserialize)]
pub struct MalAnimeNode {
    pub id: u64,
    pub title: String,
    pub alternative_titles: Option<MalAlternativeTitles>,
    pub num_episodes: Option<u32>,
    pub related_anime: Option<Vec<MalRelatedAnime>>,
    pub my_list_status: Option<MalListStatus>,
}

#[derive(Debug, Deserialize)]
pub struct MalAlternativeTitles {
    pub en: Option<String>,
    pub ja: Option<String>,
    pub synonyms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MalRelatedAnime {
    pub node: MalRelatedNode,
    pub relation_type: RelationKind,
}

#[derive(Debug, Deserialize)]
pub struct MalRelatedNode {
    pub id: u64,
}

// ── List status (detail field and PATCH response) ───────────────

#[derive(Debug, Deserialize)]
pub struct MalListStatus {
    pub status: Option<String>,
    pub num_episodes_watched: Option<u32>,
    pub is_rewatching: Option<bool>,
    pub num_times_rewatched: Option<u32>,
    pub start_date: Option<String>,
    pub finish_date: Option<String>,
    pub score: Option<u32>,
}

// ── Conversions to shared trait types ───────────────────────────

impl MalAnimeNode {
    pub fn into_catalog_entry(self) -> CatalogEntry {
        let alternative_titles = self
            .alternative_titles
            .map(|alt| AlternativeTitles {
                en: alt.en.filter(|t| !t.is_empty()),
                ja: alt.ja.filter(|t| !t.is_empty()),
                synonyms: alt.synonyms.unwrap_or_default(),
            })
            .unwrap_or_default();

        CatalogEntry {
            id: self.id,
            title: self.title,
            alternative_titles,
            num_episodes: self.num_episodes.unwrap_or(0),
            relations: self.related_anime.map(|related| {
                related
                    .into_iter()
                    .map(|r| RelationEdge {
                        kind: r.relation_type,
                        target_id: r.node.id,
                    })
                    .collect()
            }),
            list_entry: self.my_list_status.and_then(MalListStatus::into_list_entry),
        }
    }
}

impl MalListStatus {
    /// Convert to a [`ListEntry`]. Returns `None` when the status is missing or unknown,
    /// which MAL uses for entries that are not on the user's list.
    pub fn into_list_entry(self) -> Option<ListEntry> {
        let status = ListStatus::parse(self.status.as_deref()?)?;
        Some(ListEntry {
            status,
            episodes_watched: self.num_episodes_watched.unwrap_or(0),
            is_rewatching: self.is_rewatching.unwrap_or(false),
            times_rewatched: self.num_times_rewatched.unwrap_or(0),
            start_date: self.start_date.as_deref().and_then(parse_mal_date),
            finish_date: self.finish_date.as_deref().and_then(parse_mal_date),
            score: self.score.filter(|&s| s > 0),
        })
    }
}

/// MAL dates are `YYYY-MM-DD`. Partial dates (`YYYY-MM`, `YYYY`) on old entries are ignored.
fn parse_mal_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
