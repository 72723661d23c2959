//! LIKE pattern escaping.
//!
//! User text is matched literally: `%`, `_` and `\` are escaped with `\` and the
//! generated clause carries a matching `ESCAPE` declaration.

pub(crate) fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// `%value%` substring pattern with the value escaped.
pub(crate) fn contains_pattern(s: &str) -> String {
    format!("%{}%", escape_like_pattern(s))
}

/// Quote a value as a SQL string literal (single quotes doubled). Only used when
/// rendering conditions into prompt text, never for executed SQL.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
