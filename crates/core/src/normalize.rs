/// Normalises free text for matching: lowercase, ASCII alphanumerics and
/// whitespace only, whitespace runs collapsed to one space, ends trimmed.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when either normalised string contains the other. An empty string
/// only matches another empty string.
pub fn contains_either_way(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}
