//! Conversation filenames
//!
//! Saved conversations are named `<first words>__<Month_DD_YYYY_HH-MM-SS>.json`.
//! Beyond that, names are treated as opaque: only a display title and date are
//! derived back from them, and a name that does not follow the pattern still
//! lists and loads.

use chrono::{NaiveDateTime, TimeZone};

/// Suffix every conversation file carries
pub const EXTENSION: &str = ".json";

const SEPARATOR: &str = "__";
const DATE_FORMAT: &str = "%B_%d_%Y_%H-%M-%S";
const TITLE_SOURCE_CHARS: usize = 25;
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '!', '\n', '\r'];

/// Build a filename from the first message and a timestamp
pub fn conversation_filename<Tz: TimeZone>(
    first_message: &str,
    at: &chrono::DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}{}{}{}",
        title_slug(first_message),
        SEPARATOR,
        at.format(DATE_FORMAT),
        EXTENSION
    )
}

/// Slug made of the first words of a message
///
/// Takes the first 25 characters and drops the last (likely cut) word when
/// there is more than one.
pub fn title_slug(first_message: &str) -> String {
    let head: String = first_message.trim().chars().take(TITLE_SOURCE_CHARS).collect();
    let words: Vec<&str> = head.split(' ').filter(|w| !w.is_empty()).collect();
    let joined = if words.len() >= 2 {
        words[..words.len() - 1].join("_")
    } else {
        words.first().copied().unwrap_or_default().to_string()
    };

    let slug: String = joined.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
    if slug.is_empty() {
        "Conversation".to_string()
    } else {
        slug
    }
}

/// Human-readable title derived from a filename
pub fn display_title(filename: &str) -> String {
    let stem = filename.strip_suffix(EXTENSION).unwrap_or(filename);
    let title = match stem.rsplit_once(SEPARATOR) {
        Some((title, _)) => title,
        None => stem,
    };
    title.replace('_', " ").trim().to_string()
}

/// Date encoded in a filename, if it follows the naming pattern
pub fn display_date(filename: &str) -> Option<NaiveDateTime> {
    let stem = filename.strip_suffix(EXTENSION)?;
    let (_, date) = stem.rsplit_once(SEPARATOR)?;
    NaiveDateTime::parse_from_str(date, DATE_FORMAT).ok()
}

/// Check that a client-supplied name refers to a file directly inside the
/// history directory
pub fn is_valid(filename: &str) -> bool {
    !filename.is_empty()
        && filename.ends_with(EXTENSION)
        && filename.len() > EXTENSION.len()
        && !filename.contains(['/', '\\', '\0'])
        && filename != ".."
        && !filename.starts_with('.')
}
