//! Relation graph walks for seasons and specials.
//!
//! Media libraries number seasons sequentially under one series, while the
//! catalog models every season as its own entry linked by sequel relations.
//! Specials live on yet other entries, linked as side stories or alternatives.
//! Each visited node costs one detail fetch. Lookup failures end the walk; they
//! are not retried here.

use tracing::{debug, info, warn};

use anisync_api::traits::{CatalogClient, CatalogEntry, EntryFields, RelationEdge, RelationKind};

use crate::matcher;

/// Fields requested for each node of a walk.
const WALK_FIELDS: EntryFields = EntryFields::SEARCH.union(EntryFields::RELATIONS);

/// Follow sequel relations from `root` (season 1) to `season`.
///
/// Seasons 0 and 1 return the root unchanged. For season N the walk takes N−1
/// sequel hops, picking the first sequel relation at each node in the order the
/// catalog returned them, and gives up at the first node without one.
pub async fn resolve_season<C: CatalogClient>(
    client: &C,
    root: &CatalogEntry,
    season: u32,
) -> Option<CatalogEntry> {
    let mut current = root.clone();

    for next_season in 2..=season {
        let relations = relations_of(client, &current).await?;
        let Some(sequel) = relations.iter().find(|r| r.kind == RelationKind::Sequel) else {
            info!(
                title = %current.title,
                season = next_season,
                "No sequel relation, cannot resolve season"
            );
            return None;
        };

        debug!(season = next_season, entry_id = sequel.target_id, "Following sequel");
        current = fetch(client, sequel.target_id, WALK_FIELDS).await?;
    }

    Some(current)
}

/// Find the special/OVA of `root` whose title contains `episode_name`.
///
/// Candidates are the side-story, alternative-version and alternative-setting
/// relations, checked in catalog order; the first whose primary or English
/// title contains the name wins.
pub async fn resolve_special<C: CatalogClient>(
    client: &C,
    root: &CatalogEntry,
    episode_name: &str,
) -> Option<CatalogEntry> {
    let relations = relations_of(client, root).await?;

    for relation in relations.iter().filter(|r| r.kind.is_special()) {
        let candidate = fetch(client, relation.target_id, EntryFields::SEARCH).await?;
        let english_match = candidate
            .english_title()
            .is_some_and(|en| matcher::contains(en, episode_name));

        if english_match || matcher::contains(&candidate.title, episode_name) {
            info!(title = %candidate.title, episode = episode_name, "Found matching special");
            return Some(candidate);
        }
    }

    info!(title = %root.title, episode = episode_name, "No related entry matches special");
    None
}

/// Relations of `entry`, fetched only if the snapshot was taken without them.
async fn relations_of<C: CatalogClient>(
    client: &C,
    entry: &CatalogEntry,
) -> Option<Vec<RelationEdge>> {
    if let Some(relations) = &entry.relations {
        return Some(relations.clone());
    }
    let fetched = fetch(client, entry.id, EntryFields::RELATIONS).await?;
    Some(fetched.relations.unwrap_or_default())
}

async fn fetch<C: CatalogClient>(
    client: &C,
    entry_id: u64,
    fields: EntryFields,
) -> Option<CatalogEntry> {
    match client.get_entry_detail(entry_id, fields).await {
        Ok(Some(entry)) => Some(entry),
        Ok(None) => {
            warn!(entry_id, "Related entry not found in catalog");
            None
        }
        Err(e) => {
            warn!(entry_id, error = %e, "Catalog lookup failed");
            None
        }
    }
}
