//! # Article Rendering
//!
//! Turns the raw article into the styled HTML shown on the page. Headings
//! up to level three become sized bold text; every source line is its own
//! visual block.

/// Separator placed between every pair of source lines
pub const LINE_BREAK: &str = "<br><br>";

/// Heading prefixes, deepest first so `### ` is not read as `# `
const HEADING_STYLES: [(&str, &str); 3] = [
    ("### ", "1.2em"),
    ("## ", "1.4em"),
    ("# ", "1.6em"),
];

/// Style one line. Lines without a heading prefix come back unchanged.
pub fn style_line(line: &str) -> String {
    let line = line.trim();
    for (prefix, size) in HEADING_STYLES {
        if let Some(text) = line.strip_prefix(prefix) {
            return format!("<strong style='font-size:{}'>{}</strong>", size, text.trim());
        }
    }
    line.to_string()
}

/// Style every line and join them with [`LINE_BREAK`].
pub fn to_styled_html(raw: &str) -> String {
    raw.split('\n')
        .map(style_line)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels_are_distinct_and_ordered() {
        let h1 = style_line("# Title");
        let h2 = style_line("## Section");
        let h3 = style_line("### Detail");
        assert_eq!(h1, "<strong style='font-size:1.6em'>Title</strong>");
        assert_eq!(h2, "<strong style='font-size:1.4em'>Section</strong>");
        assert_eq!(h3, "<strong style='font-size:1.2em'>Detail</strong>");
    }

    #[test]
    fn test_plain_lines_pass_through() {
        for line in ["Just text", "#hashtag", "#### Too deep", "- bullet", "**bold**"] {
            assert_eq!(style_line(line), line);
        }
    }

    #[test]
    fn test_idempotent_without_heading_prefix() {
        let raw = "Intro paragraph.\n\n- point one\n#### four";
        let once = to_styled_html(raw);
        let lines: Vec<&str> = raw.split('\n').collect();
        let again: Vec<String> = lines.iter().map(|l| style_line(&style_line(l))).collect();
        assert_eq!(once, again.join(LINE_BREAK));
    }

    #[test]
    fn test_every_line_gets_a_break() {
        let html = to_styled_html("# Title\nFirst\n\nSecond");
        assert_eq!(
            html,
            "<strong style='font-size:1.6em'>Title</strong><br><br>First<br><br><br><br>Second"
        );
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            style_line("   ##   Spaced out  "),
            "<strong style='font-size:1.4em'>Spaced out</strong>"
        );
        assert_eq!(style_line("  indented text "), "indented text");
    }
}
