//! NFO sidecar documents (Kodi/Emby-compatible XML).

use vod_export_models::EnrichmentRecord;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn push_tag(out: &mut String, tag: &str, value: &str) {
    out.push_str(&format!("  <{tag}>{}</{tag}>\n", escape(value)));
}

fn push_common(out: &mut String, record: Option<&EnrichmentRecord>) {
    let Some(rec) = record else { return };
    if let Some(plot) = &rec.overview {
        push_tag(out, "plot", plot);
    }
    if let Some(rating) = rec.rating {
        push_tag(out, "rating", &format!("{rating:.1}"));
    }
    if let Some(votes) = rec.votes {
        push_tag(out, "votes", &votes.to_string());
    }
    if let Some(id) = rec.tmdb_id {
        out.push_str(&format!(
            "  <uniqueid type=\"tmdb\" default=\"true\">{id}</uniqueid>\n"
        ));
    }
}

pub fn movie_nfo(title: &str, year: Option<u16>, record: Option<&EnrichmentRecord>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<movie>\n");
    push_tag(&mut out, "title", title);
    if let Some(y) = year {
        push_tag(&mut out, "year", &y.to_string());
    }
    push_common(&mut out, record);
    out.push_str("</movie>\n");
    out
}

pub fn tvshow_nfo(title: &str, year: Option<u16>, record: Option<&EnrichmentRecord>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tvshow>\n");
    push_tag(&mut out, "title", title);
    if let Some(y) = year {
        push_tag(&mut out, "year", &y.to_string());
    }
    push_common(&mut out, record);
    out.push_str("</tvshow>\n");
    out
}

pub fn episode_nfo(
    title: &str,
    season: u32,
    episode: u32,
    record: Option<&EnrichmentRecord>,
) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<episodedetails>\n");
    push_tag(&mut out, "title", title);
    push_tag(&mut out, "season", &season.to_string());
    push_tag(&mut out, "episode", &episode.to_string());
    push_common(&mut out, record);
    out.push_str("</episodedetails>\n");
    out
}
