//! Result rendering: panel markup, message lines and panel placement.

use crate::interface::{PanelPosition, QueryHit, Rect};
use crate::snapshot::IndexSnapshot;

/// One entry as rendered in the panel; its position is the cursor index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub permalink: String,
}

/// Markup for a hit list plus the entries that actually made it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedList {
    pub html: String,
    pub entries: Vec<RenderedEntry>,
}

/// Render hits as the `<ul>` the theme styles. Hits whose permalink is not in
/// the snapshot are skipped, so `data-index` always counts rendered entries.
pub fn render_results(hits: &[QueryHit], snapshot: &IndexSnapshot) -> RenderedList {
    let mut html = String::from("<ul>");
    let mut entries = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(record) = snapshot.get(&hit.permalink) else {
            continue;
        };
        let index = entries.len();
        html.push_str(&format!(
            concat!(
                r#"<li class="search-result-item" data-index="{}">"#,
                r#"<a href="{}">"#,
                r#"<span class="search-result-title">{}</span>"#,
                r#"<span class="search-result-date">{}</span>"#,
                r#"<span class="search-result-summary">{}</span>"#,
                "</a></li>"
            ),
            index,
            escape_html(&record.permalink),
            escape_html(&record.title),
            escape_html(&record.date),
            escape_html(&record.summary),
        ));
        entries.push(RenderedEntry {
            permalink: record.permalink.clone(),
        });
    }

    html.push_str("</ul>");
    RenderedList { html, entries }
}

/// Single-line status text ("loading", "no results"). Not escaped: callers
/// pass fixed strings from configuration.
pub fn render_message(message: &str) -> String {
    format!(r#"<div class="search-message">{}</div>"#, message)
}

/// Place the panel just under the wrapper, right edges aligned.
pub fn panel_position(anchor: Rect, viewport_width: f64, gap: f64) -> PanelPosition {
    PanelPosition {
        top: anchor.bottom + gap,
        right: viewport_width - anchor.right,
    }
}

/// Escape text for HTML. Entities already present in the source are decoded
/// first, so `&amp;` in the index renders as `&amp;`, not `&amp;amp;`.
pub fn escape_html(text: &str) -> String {
    let decoded = decode_entities(text);
    let mut out = String::with_capacity(decoded.len());
    for ch in decoded.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Longest entity body we try to decode, e.g. `#x10FFFF`
const MAX_ENTITY_LEN: usize = 8;

/// Decode named, decimal and hex character references. Anything that is not
/// a recognizable entity is kept verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest[1..]
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&rest[1..=end]).map(|ch| (ch, end + 2)));

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        // NUL, surrogates and out-of-range code points decode to U+FFFD
        return Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}
