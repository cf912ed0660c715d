//! Text shaping helpers that bring messages within length limits.

use crate::config::MessageLimits;
use crate::squash::types::DraftMessage;

/// Subject used when a message would otherwise have none.
const DEFAULT_SUBJECT: &str = "Squash changes";

/// Cuts `text` to at most `limit` characters, ending in `...` when there is room.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit > 3 {
        let mut out: String = text.chars().take(limit - 3).collect();
        out.truncate(out.trim_end().len());
        out.push_str("...");
        out
    } else {
        text.chars().take(limit).collect()
    }
}

/// Byte offset of the `n`th character, or the string length.
fn char_boundary(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(idx, _)| idx)
}

/// Wraps one line at word boundaries so no piece exceeds `width` characters.
///
/// Bullet lines (`- ` or `* `) continue with a two-space indent. Words longer
/// than the available room are split.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let trimmed = line.trim_start();
    let (first_prefix, rest_prefix, content) = match trimmed.get(..2) {
        Some(bullet @ ("- " | "* ")) if width > 4 => (bullet, "  ", trimmed[2..].trim_start()),
        _ => ("", "", trimmed),
    };

    let mut lines = Vec::new();
    let mut current = first_prefix.to_string();
    let mut current_len = first_prefix.chars().count();
    let mut has_word = false;

    for word in content.split_whitespace() {
        let mut word = word;
        loop {
            let word_len = word.chars().count();
            let needed = if has_word {
                current_len + 1 + word_len
            } else {
                current_len + word_len
            };
            if needed <= width {
                if has_word {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = needed;
                has_word = true;
                break;
            }
            if has_word {
                lines.push(std::mem::replace(&mut current, rest_prefix.to_string()));
                current_len = rest_prefix.len();
                has_word = false;
                continue;
            }
            let split_at = char_boundary(word, width - current_len);
            current.push_str(&word[..split_at]);
            lines.push(std::mem::replace(&mut current, rest_prefix.to_string()));
            current_len = rest_prefix.len();
            word = &word[split_at..];
            if word.is_empty() {
                break;
            }
        }
    }
    if has_word {
        lines.push(current);
    }
    lines
}

fn message_len(subject: &str, body: &[String]) -> usize {
    let subject_len = subject.chars().count();
    if body.iter().all(String::is_empty) {
        return subject_len;
    }
    let body_len: usize = body.iter().map(|l| l.chars().count()).sum();
    subject_len + 2 + body_len + body.len().saturating_sub(1)
}

/// Returns a copy of `draft` that satisfies `limits`.
///
/// The subject is truncated (or replaced when blank), body lines are wrapped,
/// and trailing body lines are replaced by a `- ...and N more` marker until
/// the total fits. Assumes `limits.subject <= limits.total`.
pub fn enforce_limits(draft: &DraftMessage, limits: &MessageLimits) -> DraftMessage {
    let first_line = draft.subject.lines().next().unwrap_or("").trim();
    let subject = if first_line.is_empty() {
        truncate_chars(DEFAULT_SUBJECT, limits.subject)
    } else {
        truncate_chars(first_line, limits.subject)
    };

    let mut body: Vec<String> = draft
        .body
        .lines()
        .flat_map(|line| wrap_line(line.trim_end(), limits.body_line))
        .collect();
    trim_trailing_blank(&mut body);

    if message_len(&subject, &body) > limits.total {
        let original = body.len();
        loop {
            body.pop();
            trim_trailing_blank(&mut body);
            if body.is_empty() {
                break;
            }
            let marker = truncate_chars(
                &format!("- ...and {} more", original - body.len()),
                limits.body_line,
            );
            body.push(marker);
            if message_len(&subject, &body) <= limits.total {
                break;
            }
            body.pop();
        }
    }

    DraftMessage::new(subject, body.join("\n"))
}

fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
}

/// Tidies a model-written message: trims, drops a trailing period from the
/// subject, and removes blank lines around the body.
pub fn normalize_draft(raw: &str) -> DraftMessage {
    let mut lines = raw.trim().lines();
    let subject = lines
        .next()
        .unwrap_or("")
        .trim()
        .trim_end_matches('.')
        .trim_end()
        .to_string();

    let mut body: Vec<String> = lines
        .map(str::trim_end)
        .skip_while(|l| l.is_empty())
        .map(String::from)
        .collect();
    trim_trailing_blank(&mut body);

    DraftMessage::new(subject, body.join("\n"))
}
