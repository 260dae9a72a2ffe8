//! Text-level preparation of SDL before it reaches the parser.
//!
//! Subgraph schemas open with `extend schema @link(...)`, which the SDL parser
//! does not accept. Those blocks only carry federation metadata, so they are
//! blanked out (replaced by spaces, newlines kept) so that parser diagnostics
//! still point at the original line and column.

use std::borrow::Cow;

pub fn strip_schema_extensions(sdl: &str) -> Cow<'_, str> {
    let ranges = schema_extension_ranges(sdl);
    if ranges.is_empty() {
        return Cow::Borrowed(sdl);
    }

    let mut out = String::with_capacity(sdl.len());
    let mut last = 0;
    for (start, end) in ranges {
        out.push_str(&sdl[last..start]);
        out.extend(
            sdl[start..end]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' }),
        );
        last = end;
    }
    out.push_str(&sdl[last..]);
    Cow::Owned(out)
}

fn schema_extension_ranges(sdl: &str) -> Vec<(usize, usize)> {
    let bytes = sdl.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => i = skip_comment(bytes, i),
            b'"' => i = skip_string(bytes, i),
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            c if depth == 0 && is_name_start(c) => {
                let (word, after) = read_name(bytes, i);
                if word == b"extend" {
                    let next = skip_ignored(bytes, after);
                    let (second, after_second) = read_name(bytes, next);
                    if second == b"schema" {
                        let end = skip_schema_extension_body(bytes, after_second);
                        ranges.push((i, end));
                        i = end;
                        continue;
                    }
                }
                i = after;
            }
            _ => i += 1,
        }
    }

    ranges
}

/// Consume `@directive(args)` repetitions and an optional `{ ... }` body.
fn skip_schema_extension_body(bytes: &[u8], mut i: usize) -> usize {
    loop {
        let next = skip_ignored(bytes, i);
        match bytes.get(next) {
            Some(b'@') => {
                let (_, after_name) = read_name(bytes, next + 1);
                let after_ws = skip_ignored(bytes, after_name);
                i = if bytes.get(after_ws) == Some(&b'(') {
                    skip_balanced(bytes, after_ws, b'(', b')')
                } else {
                    after_name
                };
            }
            Some(b'{') => return skip_balanced(bytes, next, b'{', b'}'),
            _ => return i,
        }
    }
}

fn skip_balanced(bytes: &[u8], start: usize, open: u8, close: u8) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'#' => {
                i = skip_comment(bytes, i);
                continue;
            }
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn skip_ignored(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\n' | b'\r' | b',' => i += 1,
            b'#' => i = skip_comment(bytes, i),
            _ => break,
        }
    }
    i
}

fn skip_comment(bytes: &[u8], i: usize) -> usize {
    bytes[i..]
        .iter()
        .position(|&c| c == b'\n')
        .map_or(bytes.len(), |pos| i + pos)
}

fn skip_string(bytes: &[u8], i: usize) -> usize {
    if bytes[i..].starts_with(b"\"\"\"") {
        let body = i + 3;
        let mut j = body;
        while j + 2 < bytes.len() {
            if bytes[j] == b'\\' && bytes[j + 1..].starts_with(b"\"\"\"") {
                j += 4;
                continue;
            }
            if bytes[j..].starts_with(b"\"\"\"") {
                return j + 3;
            }
            j += 1;
        }
        return bytes.len();
    }

    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return j + 1,
            b'\n' => return j,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn is_name_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn read_name(bytes: &[u8], start: usize) -> (&[u8], usize) {
    let mut end = start;
    while end < bytes.len() && (bytes[end] == b'_' || bytes[end].is_ascii_alphanumeric()) {
        end += 1;
    }
    (&bytes[start..end], end)
}
