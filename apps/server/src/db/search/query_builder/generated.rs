//! Top-level shape of generated statements.
//!
//! Generated SQL is wrapped for counting and paging, so it must carry no
//! comments, no row limit of its own, and a top-level ordering. Keywords are
//! only recognized outside string literals, quoted identifiers and parentheses.

use crate::models::COMPANY_PRIMARY_KEY;

/// Top-level keywords that start a row-limiting clause.
const ROW_LIMIT_KEYWORDS: &[&str] = &["limit", "offset", "fetch"];

/// Rewrite a validated statement into the form that is counted and paged:
/// comments and trailing `;` removed, any top-level `LIMIT`/`OFFSET`/`FETCH`
/// dropped, and `ORDER BY id` appended when the outermost query has no ordering.
pub fn prepare_for_paging(sql: &str) -> String {
    let stripped = strip_comments(sql);
    let statement = stripped.trim_matches(|c: char| c == ';' || c.is_whitespace());

    let words = top_level_words(statement);
    let end = words
        .iter()
        .find(|(_, word)| ROW_LIMIT_KEYWORDS.contains(&word.as_str()))
        .map_or(statement.len(), |(start, _)| *start);
    let statement = statement[..end].trim_end();

    let ordered = words
        .windows(2)
        .any(|pair| pair[1].0 < end && pair[0].1 == "order" && pair[1].1 == "by");

    if ordered {
        statement.to_string()
    } else {
        format!("{} ORDER BY {}", statement, COMPANY_PRIMARY_KEY)
    }
}

/// Replace `--` line comments and (nested) `/* */` block comments with a space.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(ch);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(ch);
            }
            '-' if !in_single && !in_double && chars.peek() == Some(&'-') => {
                while chars.next_if(|next| *next != '\n').is_some() {}
                out.push(' ');
            }
            '/' if !in_single && !in_double && chars.peek() == Some(&'*') => {
                chars.next();
                let mut depth = 1usize;
                let mut prev = '\0';
                for next in chars.by_ref() {
                    match (prev, next) {
                        ('/', '*') => {
                            depth += 1;
                            prev = '\0';
                        }
                        ('*', '/') => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            prev = '\0';
                        }
                        _ => prev = next,
                    }
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Lowercased words at parenthesis depth 0, with their byte offsets.
fn top_level_words(sql: &str) -> Vec<(usize, String)> {
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut word_start: Option<usize> = None;

    for (idx, ch) in sql.char_indices() {
        let is_word_char = ch.is_ascii_alphanumeric() || ch == '_';
        if is_word_char && !in_single && !in_double && depth == 0 {
            word_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = word_start.take() {
            words.push((start, sql[start..idx].to_ascii_lowercase()));
        }
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '(' if !in_single && !in_double => depth = depth.saturating_add(1),
            ')' if !in_single && !in_double => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        words.push((start, sql[start..].to_ascii_lowercase()));
    }

    words
}
