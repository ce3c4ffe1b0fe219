use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Placeholder values the scrapers write for "unknown".
pub const SENTINELS: [&str; 3] = ["", "-", "--"];

static NON_WORD: OnceLock<Regex> = OnceLock::new();
static FIGHTER_DETAILS_ID: OnceLock<Regex> = OnceLock::new();

fn non_word() -> &'static Regex {
    NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

fn fighter_details_id() -> &'static Regex {
    FIGHTER_DETAILS_ID
        .get_or_init(|| Regex::new(r"fighter-details/([a-zA-Z0-9]+)").expect("static regex"))
}

/// Comparable key for a fighter name: strip punctuation, trim, lowercase.
///
/// Word characters are Unicode-aware, so "José Aldo" keeps its accent while
/// "Kai Kara-France" becomes "kai karafrance". Never fails; garbage in gives
/// garbage (or an empty string) out.
pub fn normalize_name(name: &str) -> String {
    non_word().replace_all(name, "").trim().to_lowercase()
}

pub fn is_sentinel(value: &str) -> bool {
    SENTINELS.contains(&value.trim())
}

/// Trim an attribute cell and map the scrapers' placeholders to `None`.
pub fn clean_attribute(value: &str) -> Option<String> {
    let v = value.trim();
    if is_sentinel(v) {
        None
    } else {
        Some(v.to_string())
    }
}

/// Pull the UFC-stats id out of a `.../fighter-details/<id>` URL.
pub fn extract_external_id(url: &str) -> Option<String> {
    fighter_details_id()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
];

/// Lenient birth date parsing for the free-text columns of both sources.
/// Returns `None` for placeholders and anything unparseable.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if is_sentinel(s) {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}
