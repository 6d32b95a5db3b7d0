use sha2::{Digest, Sha256};
use url::Url;

use crate::EntryId;

/// Filename for a downloaded cover image: the last URL path segment made
/// filesystem-safe, or `recipe-{entry}-{short_hash(url)}.jpg` when the URL has
/// no usable segment.
pub fn image_filename(image_url: &str, entry: EntryId) -> String {
    let segment = Url::parse(image_url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(|s| percent_decode(s))
    });

    match segment.map(|s| sanitize(&s)).filter(|s| !s.is_empty()) {
        Some(name) => name,
        None => format!("recipe-{entry}-{}.jpg", short_hash(image_url)),
    }
}

fn percent_decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    truncate_keeping_extension(compacted, 120)
}

fn truncate_keeping_extension(name: String, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() <= 8 => (stem, format!(".{ext}")),
        _ => (name.as_str(), String::new()),
    };
    let keep = max_chars.saturating_sub(ext.chars().count());
    let mut out: String = stem.chars().take(keep).collect();
    out.push_str(&ext);
    out
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
