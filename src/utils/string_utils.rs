/// UTF-8 safe string helpers for terminal output

/// Truncates to at most `max_bytes` without splitting a character
fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Truncates and appends `suffix` when something was cut
fn truncate_with_suffix(s: &str, max_bytes: usize, suffix: &str) -> String {
    let truncated = truncate_safe(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{}{}", truncated, suffix)
    } else {
        truncated.to_string()
    }
}

/// One-line preview of free text: newlines flattened, at most `width` bytes
pub fn preview(text: &str, width: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.len() <= width {
        return flat;
    }
    truncate_with_suffix(&flat, width.saturating_sub(3), "...")
}
