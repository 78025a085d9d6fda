use unicode_width::UnicodeWidthStr;

/// Display width of `text` in terminal columns.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Widest entry of `texts`, 0 when empty.
pub fn max_width<'a>(texts: impl IntoIterator<Item = &'a str>) -> usize {
    texts.into_iter().map(text_width).max().unwrap_or(0)
}

/// `text` followed by enough spaces to fill `width` columns.
pub fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text_width(text));
    let mut padded = String::with_capacity(text.len() + fill);
    padded.push_str(text);
    padded.extend(std::iter::repeat_n(' ', fill));
    padded
}
