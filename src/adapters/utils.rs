//! Shared validation helpers for network and topic strings.

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate WiFi SSID strings.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Returns `true` if `s` can be used as a single MQTT topic level:
/// non-empty, printable, and free of separators, wildcards and spaces.
pub(crate) fn is_topic_level(s: &str) -> bool {
    !s.is_empty()
        && is_printable_ascii(s)
        && !s.bytes().any(|b| matches!(b, b'/' | b'+' | b'#' | b' '))
}
