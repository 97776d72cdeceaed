//! V3000 tagged lines: `M  V30` prefixes, `-` continuations, `KEY=value`
//! and `KEY=(n ...)` attributes, quoting, and wrapping on output.

use std::borrow::Cow;
use std::fmt::Display;
use std::io::{BufRead, Write};

use super::error::Result;
use super::source::LineSource;

pub(crate) const PREFIX: &str = "M  V30 ";
/// Longest physical line the writer emits, continuation dash included.
pub(crate) const LINE_WIDTH: usize = 78;

/// One physical-or-joined line of a V3000 connection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    /// Content of an `M  V30` line with continuations joined.
    Command { line: usize, text: String },
    /// `M  END`.
    End { line: usize },
    /// Any other line.
    Other { line: usize, text: String },
}

fn content(line: &str) -> &str {
    line.strip_prefix(PREFIX)
        .or_else(|| line.strip_prefix("M  V30"))
        .unwrap_or(line)
}

/// Reads the next logical line. End of input is an error: a V3000 table
/// must close with `M  END`.
pub(crate) fn read_line<R: BufRead>(src: &mut LineSource<R>) -> Result<Line> {
    let first = src.expect_line()?;
    let number = src.number();
    if first.trim_end() == "M  END" {
        return Ok(Line::End { line: number });
    }
    if !first.starts_with("M  V30") {
        return Ok(Line::Other {
            line: number,
            text: first,
        });
    }
    let mut text = content(&first).trim_end().to_string();
    while text.ends_with('-') {
        text.pop();
        let next = src.expect_line()?;
        text.push_str(content(next.trim_end()));
    }
    Ok(Line::Command { line: number, text })
}

/// Splits at whitespace that is outside quotes, parentheses and brackets.
pub(crate) fn tokens(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        let mut depth = 0i32;
        let mut quoted = false;
        while i < bytes.len() {
            let b = bytes[i];
            if quoted {
                if b == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    quoted = false;
                }
            } else {
                match b {
                    b'"' => quoted = true,
                    b'(' | b'[' => depth += 1,
                    b')' | b']' => depth -= 1,
                    b if b.is_ascii_whitespace() && depth <= 0 => break,
                    _ => {}
                }
            }
            i += 1;
        }
        out.push(&s[start..i]);
    }
    out
}

/// Splits `KEY=value`; the key is upper-cased.
pub(crate) fn attribute(token: &str) -> Option<(String, &str)> {
    let (key, value) = token.split_once('=')?;
    Some((key.to_ascii_uppercase(), value))
}

/// Removes surrounding quotes and collapses `""` escapes.
pub(crate) fn unquote(value: &str) -> Cow<'_, str> {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) if value.len() >= 2 => Cow::Owned(inner.replace("\"\"", "\"")),
        _ => Cow::Borrowed(value),
    }
}

/// Items of a `(n a b ...)` list. The count must match the items.
pub(crate) fn list(value: &str) -> std::result::Result<Vec<&str>, String> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| format!("expected a (n ...) list, found '{value}'"))?;
    let mut items = inner.split_whitespace();
    let count: usize = items
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| format!("list '{value}' has no count"))?;
    let items: Vec<&str> = items.collect();
    if items.len() != count {
        return Err(format!(
            "list '{value}' announces {count} items but holds {}",
            items.len()
        ));
    }
    Ok(items)
}

/// Quotes a value when it would not survive tokenizing bare. A trailing
/// `-` is quoted too, since at the end of a line it reads as a continuation.
pub(crate) fn quote(value: &str) -> Cow<'_, str> {
    let bare = !value.is_empty()
        && !value.ends_with('-')
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')' | '[' | ']' | '='));
    if bare {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    }
}

pub(crate) fn format_list<T: Display>(items: &[T]) -> String {
    let mut out = format!("({}", items.len());
    for item in items {
        out.push(' ');
        out.push_str(&item.to_string());
    }
    out.push(')');
    out
}

/// Physical lines for one logical line, each at most [`LINE_WIDTH`]
/// characters including the trailing `-` of continued lines.
pub(crate) fn wrap(text: &str) -> Vec<String> {
    let room = LINE_WIDTH - PREFIX.len() - 1;
    let mut out = Vec::new();
    let mut rest = text;
    while PREFIX.len() + rest.len() > LINE_WIDTH {
        let mut cut = room;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        out.push(format!("{PREFIX}{head}-"));
        rest = tail;
    }
    out.push(format!("{PREFIX}{rest}"));
    out
}

pub(crate) fn write_line<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    for physical in wrap(text) {
        writeln!(out, "{physical}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<Line> {
        let mut src = LineSource::new(input.as_bytes());
        let mut lines = Vec::new();
        loop {
            let line = read_line(&mut src).unwrap();
            let done = matches!(line, Line::End { .. });
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    #[test]
    fn joins_continuations() {
        let lines = read_all("M  V30 1 C 0 0 0 0 CHG=-\nM  V30 1\nM  END\n");
        assert_eq!(
            lines[0],
            Line::Command {
                line: 1,
                text: "1 C 0 0 0 0 CHG=1".to_string()
            }
        );
        assert_eq!(lines[1], Line::End { line: 3 });
    }

    #[test]
    fn reports_other_lines() {
        let lines = read_all("M  CHG  1   1   1\nM  END");
        assert!(matches!(&lines[0], Line::Other { line: 1, text } if text.starts_with("M  CHG")));
    }

    #[test]
    fn tokenizes_nested_values() {
        assert_eq!(
            tokens(r#"1 DAT 0 ATOMS=(2 1 2) FIELDNAME="pKa value" NOT [C,N]"#),
            vec!["1", "DAT", "0", "ATOMS=(2 1 2)", "FIELDNAME=\"pKa value\"", "NOT", "[C,N]"]
        );
        assert_eq!(tokens(r#"LABEL="say ""hi"" now" X"#), vec![r#"LABEL="say ""hi"" now""#, "X"]);
        assert!(tokens("   ").is_empty());
    }

    #[test]
    fn attributes_and_lists() {
        let (key, value) = attribute("atoms=(3 4 5 6)").unwrap();
        assert_eq!(key, "ATOMS");
        assert_eq!(list(value).unwrap(), vec!["4", "5", "6"]);
        assert!(list("(3 4 5)").is_err());
        assert!(list("4").is_err());
        assert_eq!(attribute("CFG"), None);
    }

    #[test]
    fn quoting() {
        assert_eq!(quote("Ph"), "Ph");
        assert_eq!(quote("pKa value"), "\"pKa value\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("2-"), "\"2-\"");
        assert_eq!(quote("-2"), "-2");
        assert_eq!(unquote(&quote(r#"a "b""#)), r#"a "b""#);
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(format_list(&[1, 2, 3]), "(3 1 2 3)");
    }

    #[test]
    fn trailing_dash_value_ends_the_line() {
        let mut buf = Vec::new();
        write_line(&mut buf, &format!("1 DAT 1 FIELDDATA={}", quote("2-"))).unwrap();
        write_line(&mut buf, "END SGROUP").unwrap();
        buf.extend_from_slice(b"M  END\n");
        let lines = read_all(std::str::from_utf8(&buf).unwrap());
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            Line::Command {
                line: 1,
                text: "1 DAT 1 FIELDDATA=\"2-\"".to_string()
            }
        );
    }

    #[test]
    fn wraps_long_lines() {
        let text = (1..=40).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let physical = wrap(&text);
        assert!(physical.len() > 1);
        assert!(physical.iter().all(|l| l.len() <= LINE_WIDTH));
        assert!(physical[..physical.len() - 1].iter().all(|l| l.ends_with('-')));

        let joined = physical.join("\n") + "\nM  END\n";
        let lines = read_all(&joined);
        assert_eq!(lines[0], Line::Command { line: 1, text });
    }

    #[test]
    fn short_lines_stay_whole() {
        assert_eq!(wrap("BEGIN CTAB"), vec!["M  V30 BEGIN CTAB"]);
    }
}
