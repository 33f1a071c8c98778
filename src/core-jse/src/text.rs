use std::sync::LazyLock;

use regex::Regex;

static REPEATED_PERIODS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\.+").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Flattens scraped description text into a single line.
///
/// Lines are trimmed and blank ones dropped, runs of periods become one period and
/// every whitespace run becomes one space. Applying it to its own output is a no-op.
pub fn normalize_description(raw: &str) -> String {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let collapsed = REPEATED_PERIODS.replace_all(&joined, ".");
    WHITESPACE_RUN.replace_all(&collapsed, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description("  Great role.\n\nApply now.  "), "Great role. Apply now.");
        assert_eq!(
            normalize_description("Wait...\n\n\n   and   see....\t\tok"),
            "Wait. and see. ok"
        );
        assert_eq!(normalize_description("\n \n\t\n"), "");
    }

    #[test]
    fn test_normalize_description_is_idempotent() {
        let samples = [
            "  Great role.\n\nApply now.  ",
            "Line one..\r\n\r\nLine two ...  \n. . .\n..",
            "•  Rust\n•  Go,\n\n\n  SQL....",
            "already normal text.",
            "",
            "\u{a0}non-breaking\u{a0}\u{a0}space..",
        ];
        for sample in samples {
            let once = normalize_description(sample);
            assert_eq!(normalize_description(&once), once, "not idempotent for {sample:?}");
        }
    }
}
