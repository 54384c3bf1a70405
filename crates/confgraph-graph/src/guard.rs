use std::fmt;
use thiserror::Error;
use tracing::debug;

/// A Cypher query that has passed the read-only safety gate.
///
/// The inner text is private; the only way to obtain a `SafeQuery` is
/// through [`validate`], so an executor accepting this type can never be
/// handed raw completion output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeQuery(String);

impl SafeQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a candidate query was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("candidate query is empty")]
    Empty,

    #[error("query does not start with a read clause (got '{0}')")]
    NotAReadQuery(String),

    #[error("forbidden clause '{0}' in generated query")]
    ForbiddenClause(String),

    #[error("query has no RETURN clause")]
    MissingReturn,
}

/// Clauses that mutate the graph or reach outside a plain read, refused
/// outright. `CALL` is included: procedure calls can write and can touch
/// the whole DBMS. `USING` is also refused even though planner hints are
/// read-only: generated queries have no business steering the planner, and
/// `USING PERIODIC COMMIT` heads a write.
const FORBIDDEN: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "FOREACH", "LOAD", "CALL",
    "USING", "CONSTRAINT", "INDEX", "GRANT", "REVOKE", "DENY",
];

/// Clauses a validated query may open with.
const READ_OPENERS: &[&str] = &["MATCH", "OPTIONAL", "UNWIND", "WITH", "RETURN"];

/// Validate completion output as a read-only Cypher query.
///
/// Completion artifacts (markdown code fences, a leading `cypher` language
/// tag or `Cypher query:` label, a trailing semicolon) are stripped before
/// validation. Keyword scanning skips string literals so a session title
/// containing the word "create" is not a false positive.
pub fn validate(candidate: &str) -> Result<SafeQuery, RejectionReason> {
    let text = normalize(candidate);
    if text.is_empty() {
        return Err(RejectionReason::Empty);
    }

    let words = bare_words(&text);
    if words.is_empty() {
        return Err(RejectionReason::Empty);
    }

    let opener = words[0].to_uppercase();
    if !READ_OPENERS.contains(&opener.as_str()) {
        return Err(RejectionReason::NotAReadQuery(words[0].clone()));
    }

    let mut has_return = false;
    for word in &words {
        let upper = word.to_uppercase();
        if FORBIDDEN.contains(&upper.as_str()) {
            return Err(RejectionReason::ForbiddenClause(upper));
        }
        if upper == "RETURN" {
            has_return = true;
        }
    }

    if !has_return {
        return Err(RejectionReason::MissingReturn);
    }

    debug!("validated read-only query: {}", text);
    Ok(SafeQuery(text))
}

/// Strip completion artifacts down to the query text itself.
fn normalize(candidate: &str) -> String {
    let mut text = candidate.trim();

    // Prefer the first fenced block if the model wrapped its answer.
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        text = body.trim();
        // Drop a language tag on the opening fence line.
        if let Some(rest) = text.strip_prefix("cypher").or_else(|| text.strip_prefix("Cypher")) {
            if rest.starts_with('\n') || rest.starts_with('\r') {
                text = rest.trim();
            }
        }
    }

    // Drop a "Cypher query:" style label the few-shot format invites.
    let lower = text.to_lowercase();
    if lower.starts_with("cypher query:") {
        text = text["cypher query:".len()..].trim_start();
    }

    text.trim().trim_end_matches(';').trim().to_string()
}

/// Word tokens outside single- and double-quoted string literals.
///
/// Inside a literal, both escape forms Cypher accepts are honored: a
/// backslash escapes the next character, and a doubled quote (`''` or `""`)
/// is an escaped quote rather than a terminator. Mishandling either would
/// desynchronize the in-literal state and let later clauses go unscanned.
fn bare_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut in_literal: Option<char> = None;

    while let Some(c) = chars.next() {
        match in_literal {
            Some(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    if chars.peek() == Some(&quote) {
                        chars.next();
                    } else {
                        in_literal = None;
                    }
                }
            }
            None => match c {
                '\'' | '"' => {
                    in_literal = Some(c);
                    flush(&mut current, &mut words);
                }
                c if c.is_alphanumeric() || c == '_' => current.push(c),
                _ => flush(&mut current, &mut words),
            },
        }
    }
    flush(&mut current, &mut words);
    words
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}
