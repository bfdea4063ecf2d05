//! Markdown-ish rendering for assistant replies.
//!
//! Supports the subset language models actually emit in short answers:
//! `**bold**`, `*italic*`, `- ` bullets, `#` headings and line breaks.
//! Formatting is idempotent: emphasis never spans a tag or a line, and
//! every rule consumes the marker it matches, so running the formatter on
//! its own output changes nothing.

use once_cell::sync::Lazy;
use regex::Regex;

static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*<>\n]+)\*\*").expect("valid strong pattern"));
static EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*<>\n]+)\*").expect("valid emphasis pattern"));
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6} (.*)$").expect("valid heading pattern"));

/// Renders an assistant reply to inline HTML.
pub fn format_message(content: &str) -> String {
    content
        .split('\n')
        .map(format_line)
        .collect::<Vec<_>>()
        .join("<br>")
}

fn format_line(line: &str) -> String {
    let line = STRONG.replace_all(line, "<strong>$1</strong>");
    let line = EMPHASIS.replace_all(&line, "<em>$1</em>");

    if let Some(caps) = HEADING.captures(&line) {
        return format!("<strong>{}</strong>", &caps[1]);
    }
    if let Some(rest) = line.strip_prefix("- ") {
        return format!("• {rest}");
    }
    line.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            format_message("Use **copper fungicide** every *7 days*"),
            "Use <strong>copper fungicide</strong> every <em>7 days</em>"
        );
    }

    #[test]
    fn test_bullets_and_line_breaks() {
        assert_eq!(
            format_message("Steps:\n- Remove leaves\n- Spray\n"),
            "Steps:<br>• Remove leaves<br>• Spray<br>"
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            format_message("## Prevention\nRotate crops"),
            "<strong>Prevention</strong><br>Rotate crops"
        );
    }

    #[test]
    fn test_lone_asterisks_untouched() {
        assert_eq!(format_message("2 * 3 = 6"), "2 * 3 = 6");
    }

    #[test]
    fn test_emphasis_does_not_cross_lines() {
        assert_eq!(format_message("a * b\nc * d"), "a * b<br>c * d");
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let samples = [
            "**Immediate steps**\n- Remove *infected* leaves\n- Apply **copper**\n",
            "# Plan\n## Timeline\nWeek 1: *scout*\nWeek 2: spray",
            "a * b\nc * d",
            "***odd*** markers **unclosed\n* bullet-ish\n-not a bullet",
            "already <strong>formatted</strong><br>• item<br>",
            "",
            "\n\n",
            "####### seven hashes\n#no space",
        ];
        for sample in samples {
            let once = format_message(sample);
            let twice = format_message(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_formatted_content_is_not_double_wrapped() {
        let formatted = "<strong>Bold</strong> and <em>it</em><br>• step";
        assert_eq!(format_message(formatted), formatted);
    }
}
