//! Title matching between the local library and catalog entries.
//!
//! Matching is exact after reducing both sides to a comparison key, or plain
//! substring containment for specials. There is no fuzzy pass.

use unicode_normalization::UnicodeNormalization;

use anisync_api::traits::CatalogEntry;

/// Reduce a title to the form used for comparison.
///
/// NFKD decomposition, then everything that is not alphanumeric is dropped
/// (whitespace, punctuation, symbols and the combining marks split off by
/// decomposition), then lowercased. "Café: Ｌａｔｔｅ!" becomes "cafelatte".
pub fn comparison_key(s: &str) -> String {
    s.nfkd()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True if `local` equals any of `candidates`, ignoring case and symbols.
pub fn matches(local: &str, candidates: &[&str]) -> bool {
    let key = comparison_key(local);
    if key.is_empty() {
        return false;
    }
    candidates.iter().any(|c| comparison_key(c) == key)
}

/// True if `haystack` contains `needle`, ignoring case and symbols.
///
/// Used for special/OVA names only.
pub fn contains(haystack: &str, needle: &str) -> bool {
    let needle = comparison_key(needle);
    !needle.is_empty() && comparison_key(haystack).contains(&needle)
}

/// First entry, in search order, whose primary or English title matches `local`.
pub fn select_candidate<'a>(local: &str, entries: &'a [CatalogEntry]) -> Option<&'a CatalogEntry> {
    entries.iter().find(|entry| {
        let mut titles = vec![entry.title.as_str()];
        titles.extend(entry.english_title());
        matches(local, &titles)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anisync_api::traits::AlternativeTitles;

    fn entry(id: u64, title: &str, english: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id,
            title: title.into(),
            alternative_titles: AlternativeTitles {
                en: english.map(Into::into),
                ja: None,
                synonyms: vec!["Frieren".into()],
            },
            num_episodes: 0,
            relations: None,
            list_entry: None,
        }
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert!(matches("Attack on Titan", &["ATTACK-ON_TITAN"]));
        assert!(matches(
            "Re:Zero kara Hajimeru Isekai Seikatsu",
            &["re zero kara hajimeru isekai seikatsu"]
        ));
        assert!(matches("Steins;Gate", &["Other", "Steins Gate"]));
    }

    #[test]
    fn test_diacritics_and_fullwidth() {
        assert!(matches("Pokémon", &["Pokemon"]));
        assert!(matches("ＢＬＥＡＣＨ", &["Bleach"]));
    }

    #[test]
    fn test_no_partial_match() {
        assert!(!matches("Attack on Titan", &["Attack on Titan Season 2"]));
        assert!(!matches("Attack on Titan", &[]));
    }

    #[test]
    fn test_empty_title_never_matches() {
        assert!(!matches("", &[""]));
        assert!(!matches("!!!", &["???"]));
    }

    #[test]
    fn test_contains() {
        assert!(contains("Shingeki no Kyojin: Lost Girls", "lost girls"));
        assert!(contains("Attack on Titan: No Regrets", "No-Regrets"));
        assert!(!contains("Attack on Titan: No Regrets", "Ilse's Notebook"));
        assert!(!contains("Attack on Titan", ""));
    }

    #[test]
    fn test_select_candidate_uses_primary_and_english() {
        let entries = vec![
            entry(1, "Shingeki no Kyojin Season 2", Some("Attack on Titan Season 2")),
            entry(2, "Shingeki no Kyojin", Some("Attack on Titan")),
        ];
        assert_eq!(select_candidate("Attack on Titan", &entries).map(|e| e.id), Some(2));
        assert_eq!(select_candidate("shingeki no kyojin", &entries).map(|e| e.id), Some(2));
    }

    #[test]
    fn test_select_candidate_ignores_synonyms() {
        let entries = vec![entry(3, "Sousou no Frieren", None)];
        assert!(select_candidate("Frieren", &entries).is_none());
    }

    #[test]
    fn test_select_candidate_keeps_search_order() {
        let entries = vec![
            entry(10, "Hunter x Hunter", None),
            entry(11, "Hunter x Hunter", Some("Hunter x Hunter (2011)")),
        ];
        assert_eq!(select_candidate("Hunter x Hunter", &entries).map(|e| e.id), Some(10));
    }
}
