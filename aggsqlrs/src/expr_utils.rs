//! Expression utility functions.
//!
//! Shared helpers for picking apart pre-classified SQL fragments. None of
//! these parse SQL in general; they only scan for structure at the top level
//! of a fragment, skipping over parentheses, string literals and quoted
//! identifiers (`'..'`, `".."`, `` `..` ``, `[..]`).

/// A character of a fragment together with whether it sits at the top level
/// (outside every parenthesis, literal and quoted identifier).
#[derive(Debug, Clone, Copy)]
struct Scanned {
    pos: usize,
    ch: char,
    top: bool,
}

fn closing_quote(c: char) -> Option<char> {
    match c {
        '\'' => Some('\''),
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    }
}

fn scan(text: &str) -> Vec<Scanned> {
    let mut out = Vec::with_capacity(text.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if let Some(close) = quote {
            out.push(Scanned {
                pos,
                ch,
                top: false,
            });
            if ch == close {
                // doubled closer is an escape, not the end of the quoted run
                if let Some(&(next_pos, next)) = chars.peek() {
                    if next == close {
                        out.push(Scanned {
                            pos: next_pos,
                            ch: next,
                            top: false,
                        });
                        chars.next();
                        continue;
                    }
                }
                quote = None;
            }
            continue;
        }

        let top = depth == 0;
        if let Some(close) = closing_quote(ch) {
            quote = Some(close);
            out.push(Scanned {
                pos,
                ch,
                top: false,
            });
            continue;
        }
        match ch {
            '(' => {
                depth += 1;
                out.push(Scanned {
                    pos,
                    ch,
                    top: false,
                });
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(Scanned {
                    pos,
                    ch,
                    top: false,
                });
            }
            _ => out.push(Scanned { pos, ch, top }),
        }
    }
    out
}

/// Index of the `)` matching the `(` at byte offset `open`.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text[open..].char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if let Some(close) = quote {
            if ch == close {
                if chars.peek().map(|&(_, n)| n) == Some(close) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }
        if let Some(close) = closing_quote(ch) {
            quote = Some(close);
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip one layer of identifier quoting (`[x]`, `` `x` ``, `"x"`), undoubling
/// escaped closers.
pub fn unquote_ident(ident: &str) -> String {
    let ident = ident.trim();
    let mut chars = ident.chars();
    let (first, last) = match (chars.next(), ident.chars().last()) {
        (Some(f), Some(l)) if ident.len() >= 2 => (f, l),
        _ => return ident.to_string(),
    };
    let close = match first {
        '[' => ']',
        '`' => '`',
        '"' => '"',
        _ => return ident.to_string(),
    };
    if last != close {
        return ident.to_string();
    }
    let inner = &ident[first.len_utf8()..ident.len() - last.len_utf8()];
    let doubled: String = [close, close].iter().collect();
    inner.replace(&doubled, &close.to_string())
}

/// Split a select fragment into its expression and its explicit alias.
///
/// The alias is the text after the last top-level `AS` keyword; `AS` inside
/// a function call (`CAST(x AS DATE)`) or a literal does not count. A
/// trailing comma left over from hand-written fragments is ignored.
pub fn split_alias(text: &str) -> (&str, Option<String>) {
    let trimmed = text.trim().trim_end_matches(',').trim_end();
    let scanned = scan(trimmed);

    let mut found: Option<(usize, usize)> = None;
    for (i, s) in scanned.iter().enumerate() {
        if !(s.top && s.ch.is_whitespace()) {
            continue;
        }
        let (Some(a), Some(b), Some(after)) =
            (scanned.get(i + 1), scanned.get(i + 2), scanned.get(i + 3))
        else {
            continue;
        };
        if a.top
            && b.top
            && a.ch.eq_ignore_ascii_case(&'a')
            && b.ch.eq_ignore_ascii_case(&'s')
            && after.ch.is_whitespace()
        {
            found = Some((s.pos, after.pos));
        }
    }

    match found {
        Some((expr_end, alias_start)) => {
            let alias = trimmed[alias_start..].trim();
            if alias.is_empty() {
                (trimmed, None)
            } else {
                (trimmed[..expr_end].trim_end(), Some(unquote_ident(alias)))
            }
        }
        None => (trimmed, None),
    }
}

/// Split `NAME(arg)` into `("NAME", "arg")`.
///
/// Returns `None` unless the whole expression is a single call, so
/// `COUNT(*) + 1` and `(SUM(x))` are rejected. The argument may itself
/// contain nested calls.
pub fn split_outermost_function(expr: &str) -> Option<(String, String)> {
    let expr = expr.trim();
    let open = expr.find('(')?;
    let name = expr[..open].trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }
    let close = matching_paren(expr, open)?;
    if close != expr.len() - 1 {
        return None;
    }
    Some((name.to_string(), expr[open + 1..close].trim().to_string()))
}

/// True when the whole fragment is enclosed by one pair of parentheses.
pub fn is_wrapped_in_parens(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('(') && matching_paren(text, 0) == Some(text.len() - 1)
}

fn is_bare_ident(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '@' || c == '#' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '@'))
}

fn is_quoted_ident(part: &str) -> bool {
    let part = part.trim();
    part.len() >= 2
        && matches!(
            (part.chars().next(), part.chars().last()),
            (Some('['), Some(']')) | (Some('`'), Some('`')) | (Some('"'), Some('"'))
        )
}

/// The name a fragment's value takes in a result set.
///
/// An explicit alias wins. Otherwise the fragment must be a column
/// reference, possibly qualified (`db..tbl.[col]`), whose last part is the
/// name. Computed expressions without an alias have no derivable name.
pub fn runtime_name(text: &str) -> Option<String> {
    let (expr, alias) = split_alias(text);
    if alias.is_some() {
        return alias;
    }

    let scanned = scan(expr);
    let mut parts = Vec::new();
    let mut start = 0;
    for s in &scanned {
        if s.top && s.ch == '.' {
            parts.push(&expr[start..s.pos]);
            start = s.pos + 1;
        }
    }
    parts.push(&expr[start..]);

    let last = parts.last()?.trim();
    if last.is_empty() {
        return None;
    }
    let valid = parts
        .iter()
        .map(|p| p.trim())
        .all(|p| p.is_empty() || is_bare_ident(p) || is_quoted_ident(p));
    if !valid || !(is_bare_ident(last) || is_quoted_ident(last)) {
        return None;
    }
    Some(unquote_ident(last))
}

/// Trailing integer of a limit fragment: `TOP 5`, `LIMIT 5` and `5` all give 5.
pub fn trailing_count(text: &str) -> Option<u64> {
    text.split_whitespace().last()?.parse::<u64>().ok()
}
