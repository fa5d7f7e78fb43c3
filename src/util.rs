//! Small shared helpers

/// Split a comma-separated setting into trimmed, non-empty entries.
///
/// `"a, b,,c "` becomes `["a", "b", "c"]`. Used for execution-order lists
/// and application-setting string lists.
pub fn split_and_trim(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
