//! Quote-aware scanning helpers shared by the SQL and DBML front-ends.

const QUOTES: [char; 3] = ['\'', '"', '`'];

/// Byte length of the quoted run opening at `start`, quotes included.
///
/// A quote that is not closed on its own line is a stray character, so one
/// apostrophe cannot swallow the rest of the input.
fn quoted_len(input: &str, start: usize) -> Option<usize> {
    let q = input[start..].chars().next()?;
    let body = &input[start + q.len_utf8()..];
    let line = body.split('\n').next().unwrap_or("");
    line.find(q).map(|close| close + 2 * q.len_utf8())
}

/// Blank out `/* */` and `--` comments outside quotes.
///
/// Comment characters become spaces and newlines are kept, so byte offsets
/// change only for multi-byte comment text while line numbers never do.
pub fn strip_sql_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            c if QUOTES.contains(&c) => match quoted_len(input, i) {
                Some(len) => {
                    out.push_str(&input[i..i + len]);
                    while chars.next_if(|&(j, _)| j < i + len).is_some() {}
                }
                None => out.push(c),
            },
            '/' if next == Some('*') => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for (_, c) in chars.by_ref() {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '-' if next == Some('-') => {
                out.push(' ');
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                    out.push(' ');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Cut a trailing line comment that starts with `marker` outside quotes.
pub fn strip_line_comment<'a>(line: &'a str, marker: &str) -> &'a str {
    let mut skip_to = 0;
    for (i, c) in line.char_indices() {
        if i < skip_to {
            continue;
        }
        if QUOTES.contains(&c) {
            if let Some(len) = quoted_len(line, i) {
                skip_to = i + len;
            }
        } else if line[i..].starts_with(marker) {
            return &line[..i];
        }
    }
    line
}

/// Split on `;` outside quotes. Each piece carries its byte offset.
pub fn split_statements(input: &str) -> Vec<(usize, &str)> {
    split(input, ';', false)
}

/// Split on `sep` outside quotes and at parenthesis depth zero.
pub fn split_top_level(input: &str, sep: char) -> Vec<(usize, &str)> {
    split(input, sep, true)
}

fn split(input: &str, sep: char, track_parens: bool) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut skip_to = 0;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if i < skip_to {
            continue;
        }
        match c {
            c if QUOTES.contains(&c) => {
                if let Some(len) = quoted_len(input, i) {
                    skip_to = i + len;
                }
            }
            '(' if track_parens => depth += 1,
            ')' if track_parens => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push((start, &input[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push((start, &input[start..]));
    parts
}

/// Byte index of the `)` matching the `(` at `open`.
pub fn find_closing_paren(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut skip_to = 0;

    for (i, c) in input[open..].char_indices() {
        if i < skip_to {
            continue;
        }
        match c {
            c if QUOTES.contains(&c) => {
                if let Some(len) = quoted_len(input, open + i) {
                    skip_to = i + len;
                }
            }
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip one level of `"..."`, `` `...` ``, `'...'` or `[...]` quoting.
pub fn unquote(ident: &str) -> String {
    let ident = ident.trim();
    let mut chars = ident.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return ident.to_string();
    };
    let quoted = matches!(
        (first, last),
        ('"', '"') | ('`', '`') | ('\'', '\'') | ('[', ']')
    );
    if quoted {
        ident[1..ident.len() - 1].to_string()
    } else {
        ident.to_string()
    }
}

/// 1-based line number of a byte offset.
pub fn line_at(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Replace the contents of single-quoted literals so keyword scans
/// cannot match inside them.
pub fn blank_string_literals(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut skip_to = 0;
    for (i, c) in input.char_indices() {
        if i < skip_to {
            continue;
        }
        if c == '\'' {
            if let Some(len) = quoted_len(input, i) {
                out.push_str("''");
                skip_to = i + len;
                continue;
            }
        }
        out.push(c);
    }
    out
}
