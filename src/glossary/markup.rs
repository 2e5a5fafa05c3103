//! Inline markup stored in sense bodies.
//!
//! | Form          | Meaning                                   |
//! |---------------|-------------------------------------------|
//! | `*text*`      | emphasis                                  |
//! | `{id}`        | cross-reference, label resolved on render |
//! | `{label\|id}` | cross-reference with its own label       |
//!
//! `\` escapes any of `\ * { } |`. Malformed references are kept as text.

/// A run of body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Emphasis(String),
    Ref { id: String, label: Option<String> },
}

fn is_special(c: char) -> bool {
    matches!(c, '\\' | '*' | '{' | '}' | '|')
}

/// Append `text` to `out`, escaping markup characters
pub fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        if is_special(c) {
            out.push('\\');
        }
        out.push(c);
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Append a cross-reference marker
pub fn push_ref(out: &mut String, id: &str, label: Option<&str>) {
    out.push('{');
    if let Some(label) = label {
        escape_into(out, label);
        out.push('|');
    }
    escape_into(out, id);
    out.push('}');
}

/// Split a body into spans
pub fn parse(body: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut buf = String::new();
    let mut emphasis = false;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => buf.push(chars.next().unwrap_or('\\')),
            '*' => {
                flush(&mut spans, &mut buf, emphasis);
                emphasis = !emphasis;
            }
            '{' => {
                let rest = chars.as_str();
                match scan_ref(rest) {
                    Some((id, label, consumed)) => {
                        flush(&mut spans, &mut buf, emphasis);
                        spans.push(Span::Ref { id, label });
                        chars = rest[consumed..].chars();
                    }
                    None => buf.push('{'),
                }
            }
            _ => buf.push(c),
        }
    }
    flush(&mut spans, &mut buf, emphasis);

    spans
}

/// Ids of every cross-reference written inline in `body`
pub fn inline_refs(body: &str) -> Vec<String> {
    parse(body)
        .into_iter()
        .filter_map(|span| match span {
            Span::Ref { id, .. } => Some(id),
            _ => None,
        })
        .collect()
}

fn flush(spans: &mut Vec<Span>, buf: &mut String, emphasis: bool) {
    if buf.is_empty() {
        return;
    }
    let text = std::mem::take(buf);
    spans.push(if emphasis {
        Span::Emphasis(text)
    } else {
        Span::Text(text)
    });
}

/// Scan a reference body after `{`. Returns (id, label, bytes consumed
/// including the closing `}`).
fn scan_ref(rest: &str) -> Option<(String, Option<String>, usize)> {
    let mut label: Option<String> = None;
    let mut current = String::new();
    let mut iter = rest.char_indices();

    while let Some((i, c)) = iter.next() {
        match c {
            '\\' => current.push(iter.next().map(|(_, c)| c)?),
            '|' if label.is_none() => label = Some(std::mem::take(&mut current)),
            '}' => {
                let id = current.trim().to_string();
                if id.is_empty() {
                    return None;
                }
                let label = label
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty());
                return Some((id, label, i + 1));
            }
            '{' => return None,
            _ => current.push(c),
        }
    }

    None
}
