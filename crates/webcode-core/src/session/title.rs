//! Session title derivation.

use super::model::DEFAULT_SESSION_TITLE;

/// Maximum number of characters kept before the ellipsis is appended.
pub const TITLE_MAX_CHARS: usize = 30;

const TITLE_ELLIPSIS: &str = "...";

/// Derives a display title from the first user message.
///
/// Leading and trailing whitespace is removed, every internal whitespace run
/// (including line breaks) collapses to a single space, and titles longer than
/// [`TITLE_MAX_CHARS`] characters are cut and suffixed with `"..."`.
/// Blank input yields [`DEFAULT_SESSION_TITLE`].
pub fn generate_session_title(first_message: &str) -> String {
    let collapsed = first_message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return DEFAULT_SESSION_TITLE.to_string();
    }

    if collapsed.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(TITLE_ELLIPSIS);
        return title;
    }

    collapsed
}
