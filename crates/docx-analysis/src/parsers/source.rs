//! Source text helpers: dedenting and whole-line slicing.

/// Remove the longest common leading whitespace from every non-blank line.
///
/// Blank lines are normalized to empty. Tabs and spaces are compared
/// literally, so mixed indentation only loses the prefix shared exactly.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if !line.trim().is_empty() {
            out.push_str(line.strip_prefix(margin).unwrap_or(line));
        }
        out.push('\n');
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

/// Expand a byte range to whole lines: from the start of the line holding
/// `start` through the end of the line holding `end`.
pub fn line_span(source: &str, start: usize, end: usize) -> (usize, usize) {
    let start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = source[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(source.len());
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_strips_common_margin() {
        let text = "    def f():\n        return 1\n\n    # done\n";
        assert_eq!(dedent(text), "def f():\n    return 1\n\n# done\n");
    }

    #[test]
    fn dedent_keeps_unindented_text() {
        assert_eq!(dedent("x = 1\n  y = 2\n"), "x = 1\n  y = 2\n");
    }

    #[test]
    fn line_span_covers_whole_lines() {
        let src = "a = 1\n    @dec\n    def f(): pass\nb = 2\n";
        let start = src.find("@dec").unwrap();
        let end = src.find("pass").unwrap() + 4;
        let (s, e) = line_span(src, start, end);
        assert_eq!(&src[s..e], "    @dec\n    def f(): pass\n");
    }
}
