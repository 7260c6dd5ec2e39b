pub(crate) fn needs_quotes(s: &str) -> bool {
    s.contains([',', '"', '\n', '\r']) || s.starts_with(' ') || s.ends_with(' ')
}

/// Оборачивает значение в кавычки, удваивая кавычки внутри.
pub(crate) fn wrap_with_quotes(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
