// Search query normalization.
// Cleans free-form input into something the user search endpoint accepts.

/// Longest query kept after sanitizing.
pub const MAX_QUERY_LENGTH: usize = 100;

/// Shortest query worth sending upstream.
pub const MIN_QUERY_LENGTH: usize = 3;

/// Trim, truncate to `MAX_QUERY_LENGTH` characters, then keep only ASCII
/// letters, digits and `-` (the characters GitHub allows in logins).
pub fn sanitize_query(input: &str) -> String {
    input
        .trim()
        .chars()
        .take(MAX_QUERY_LENGTH)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Whether a sanitized query is long enough to search for.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LENGTH
}
