//! Normalization of loosely-shaped catalog JSON into fixed row types.
//!
//! The upstream API has grown several shapes for the same data (episode
//! listings arrive as a season-keyed map or a flat list; numbers arrive as
//! integers or strings). All of that variance is absorbed here so the rest
//! of the engine only ever sees one `CatalogItem`/`Episode` shape.

use serde_json::Value;
use vod_export_models::{CatalogItem, Episode};

fn coerce_u64(v: Option<&Value>) -> Option<u64> {
    match v {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_u32(v: Option<&Value>) -> Option<u32> {
    coerce_u64(v).and_then(|n| u32::try_from(n).ok())
}

fn coerce_u16(v: Option<&Value>) -> Option<u16> {
    coerce_u64(v).and_then(|n| u16::try_from(n).ok())
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_key<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| row.get(*k))
}

/// Derive a category/group name, checking top-level keys first and the
/// nested `custom_properties` object second.
pub(crate) fn category(row: &Value) -> Option<String> {
    const KEYS: [&str; 3] = ["category", "category_name", "group_name"];
    for key in KEYS {
        if let Some(v) = non_empty_str(row.get(key)) {
            return Some(v);
        }
    }
    if let Some(cp) = row.get("custom_properties").filter(|v| v.is_object()) {
        for key in KEYS {
            if let Some(v) = non_empty_str(cp.get(key)) {
                return Some(v);
            }
        }
    }
    None
}

fn tmdb_id(row: &Value) -> Option<u32> {
    coerce_u32(row.get("tmdb_id")).or_else(|| {
        row.get("custom_properties")
            .and_then(|cp| coerce_u32(cp.get("tmdb_id")))
    })
}

/// Normalize one movie/series list row.
pub(crate) fn catalog_item(row: &Value) -> CatalogItem {
    CatalogItem {
        id: coerce_u64(row.get("id")).unwrap_or(0),
        playback_id: non_empty_str(row.get("uuid")),
        name: non_empty_str(row.get("name"))
            .or_else(|| non_empty_str(row.get("title")))
            .unwrap_or_default(),
        year: coerce_u16(row.get("year")),
        category: category(row),
        tmdb_id: tmdb_id(row),
    }
}

/// Normalize a provider-info episode payload into a flat, sorted episode
/// list. Accepts `episodes` as a season-keyed map of lists or as one flat
/// list; anything else yields an empty listing.
pub(crate) fn episodes(info: &Value) -> Vec<Episode> {
    let raw = info.get("episodes");

    let flat: Vec<&Value> = match raw {
        Some(Value::Object(map)) => map
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .collect(),
        Some(Value::Array(list)) => list.iter().collect(),
        _ => Vec::new(),
    };

    let mut out: Vec<Episode> = flat
        .into_iter()
        .filter(|ep| ep.is_object())
        .map(|ep| {
            let season = coerce_u32(first_key(ep, &["season_number", "season", "season_num"]))
                .unwrap_or(0);
            let number =
                coerce_u32(first_key(ep, &["episode_number", "episode_num"])).unwrap_or(0);
            let title = non_empty_str(ep.get("title"))
                .or_else(|| non_empty_str(ep.get("name")))
                .unwrap_or_else(|| format!("Episode {}", number));
            Episode {
                playback_id: non_empty_str(ep.get("uuid")),
                season,
                episode: number,
                title,
            }
        })
        .collect();

    out.sort_by_key(|ep| (ep.season, ep.episode));
    out
}
