//! SQL extraction from model completions.
//!
//! Models are told to answer with one bare statement, but they still wrap it
//! in markdown fences, prefix it with a label, or follow it with commentary.
//! [`extract_sql`] reduces a completion to a single statement:
//!
//! 1. Keep the body of the first fenced block, if any.
//! 2. Start at the first line beginning with a statement keyword, or whose
//!    text after a `label:` prefix does. A keyword line that reads as a
//!    lead-in ("Select the rows with this query:") is passed over.
//! 3. Stop at the first `;` or blank line that is outside quoted text and
//!    comments. The terminator is not kept.
//!
//! The transform is idempotent: feeding its output back in returns the same
//! string.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that may open a statement
const STATEMENT_KEYWORDS: &[&str] = &[
    "select", "with", "insert", "update", "delete", "replace", "create", "drop", "alter",
    "pragma", "explain", "values",
];

static FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?(.*?)```").unwrap());

static CTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^with\s+(?:recursive\s+)?\S+.*?\bas\s*(?:not\s+)?(?:materialized\s*)?\(")
        .unwrap()
});

/// Extract a single SQL statement from a model completion.
///
/// Returns `None` when the completion holds no identifiable statement.
pub fn extract_sql(completion: &str) -> Option<String> {
    let body = strip_fences(completion.trim());
    let lines: Vec<(usize, &str)> = body
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .collect();

    for (index, &(offset, line)) in lines.iter().enumerate() {
        let Some(column) = statement_column(line) else {
            continue;
        };
        let next_line = lines[index + 1..]
            .iter()
            .map(|&(_, next)| next)
            .find(|next| !next.trim().is_empty());
        if is_lead_in(&line[column..], next_line) {
            continue;
        }

        let candidate = &body[offset + column..];
        let statement = candidate[..statement_end(candidate)].trim();
        if is_statement(statement) {
            return Some(statement.to_string());
        }
    }

    None
}

/// Body of the first fenced block, or the text with a lone fence removed
fn strip_fences(text: &str) -> &str {
    if let Some(body) = FENCE_REGEX.captures(text).and_then(|c| c.get(1)) {
        return body.as_str();
    }

    match line_fence(text) {
        // Unterminated opening fence: drop the fence line
        Some(pos) if text[..pos].trim().is_empty() => {
            let rest = &text[pos..];
            rest.find('\n').map(|nl| &rest[nl + 1..]).unwrap_or("")
        }
        // Dangling closing fence: keep what precedes it
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Byte index of the first fence that opens a line. Backticks inside a
/// statement, such as a `'```'` literal, are left alone.
fn line_fence(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// Prose that opens with a keyword and introduces the real statement,
/// either with a trailing colon or by being followed by a keyword line
fn is_lead_in(line: &str, next_line: Option<&str>) -> bool {
    let line = line.trim_end();
    if line.ends_with(':') {
        return true;
    }
    let next_is_statement = next_line
        .map(|next| statement_column(next).is_some())
        .unwrap_or(false);
    next_is_statement && !has_sql_structure(line)
}

/// Any operator, literal or grouping marks the line as SQL rather than prose
fn has_sql_structure(line: &str) -> bool {
    if line.to_ascii_lowercase().starts_with("explain") {
        return true;
    }
    line.chars().any(|c| {
        c.is_ascii_digit() || matches!(c, '*' | ',' | '(' | ')' | '=' | '<' | '>' | '\'' | '"')
    })
}

/// Byte column where a statement starts on this line, if any
fn statement_column(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    if starts_with_keyword(trimmed) {
        return Some(indent);
    }

    // "SQL: SELECT ..." and similar labelled lines
    let colon = trimmed.find(':')?;
    let after = &trimmed[colon + 1..];
    let after_trimmed = after.trim_start();
    if starts_with_keyword(after_trimmed) {
        return Some(indent + colon + 1 + (after.len() - after_trimmed.len()));
    }

    None
}

fn starts_with_keyword(text: &str) -> bool {
    let word_len = text
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    if word_len == 0 || text[word_len..].starts_with(':') {
        return false;
    }
    let word = text[..word_len].to_ascii_lowercase();
    STATEMENT_KEYWORDS.contains(&word.as_str())
}

/// A prose line such as "With this query..." is not a CTE
fn is_statement(statement: &str) -> bool {
    if statement.is_empty() {
        return false;
    }
    let lowered = statement.to_ascii_lowercase();
    if lowered.starts_with("with") {
        return CTE_REGEX.is_match(statement);
    }
    true
}

/// Byte index of the statement terminator, or the text length
fn statement_end(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(close) => {
                if b == close {
                    quote = None;
                }
            }
            None => match b {
                b'\'' => quote = Some(b'\''),
                b'"' => quote = Some(b'"'),
                b'`' => quote = Some(b'`'),
                b'[' => quote = Some(b']'),
                b';' => return i,
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    // Line comment runs to end of line; the newline is scanned next
                    match text[i..].find('\n') {
                        Some(nl) => {
                            i += nl;
                            continue;
                        }
                        None => return bytes.len(),
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => match text[i + 2..].find("*/") {
                    Some(close) => {
                        i += close + 4;
                        continue;
                    }
                    None => return bytes.len(),
                },
                b'\n' => {
                    let next_line = text[i + 1..].split('\n').next().unwrap_or("");
                    if next_line.trim().is_empty() {
                        return i;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }

    bytes.len()
}
