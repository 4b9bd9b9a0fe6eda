use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static TRAILING_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\blimit\s+\d+\s*;?\s*$").unwrap());

/// Cap the result size of `query`.
///
/// A query that already ends in `LIMIT <n>` (trailing `;` and whitespace
/// allowed) is returned untouched. Otherwise trailing whitespace and one
/// trailing `;` are stripped and `\nLIMIT <limit>` is appended.
pub fn enforce_limit(query: &str, limit: u64) -> Cow<'_, str> {
    if TRAILING_LIMIT.is_match(query.trim()) {
        return Cow::Borrowed(query);
    }
    let stripped = query.trim_end();
    let stripped = stripped.strip_suffix(';').unwrap_or(stripped);
    Cow::Owned(format!("{stripped}\nLIMIT {limit}"))
}
