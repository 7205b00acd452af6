/// Returns `bytes` as text when it is valid UTF-8 free of control characters.
///
/// Tab, newline, and carriage return are allowed. Anything else below 0x20,
/// and DEL, cannot round-trip through XML 1.0 character data, so callers
/// fall back to base64 for such input.
///
/// # Examples
///
/// ```
/// use atomutil::util::as_printable_text;
///
/// assert_eq!(as_printable_text(b"plain\ttext\n"), Some("plain\ttext\n"));
/// assert_eq!(as_printable_text(&[0xff, 0xd8, 0xff]), None);
/// assert_eq!(as_printable_text(b"bell\x07"), None);
/// ```
pub fn as_printable_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    let has_control = text
        .bytes()
        .any(|b| b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d));
    (!has_control).then_some(text)
}

/// Whether `text` reads as markup: optional leading whitespace, then `<`.
pub fn looks_like_markup(text: &str) -> bool {
    text.trim_start().starts_with('<')
}
