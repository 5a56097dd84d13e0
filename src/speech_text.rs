/// Horizontal rules, removed before their single characters are.
const RULES: [&str; 2] = ["---", "___"];

/// Emphasis, heading and code markers a synthesizer would read aloud.
const MARKERS: [char; 4] = ['*', '_', '#', '`'];

/// Strip markdown tokens from generated text so a speech synthesizer reads
/// plain prose, then collapse all whitespace runs to single spaces.
///
/// Hyphens are only removed as part of a `---` rule; a lone `-` or `--`
/// survives. Underscores and backticks are removed wherever they appear.
pub fn normalize_for_speech(text: &str) -> String {
    let mut cleaned = text.to_string();
    for rule in RULES {
        cleaned = cleaned.replace(rule, "");
    }
    cleaned.retain(|c| !MARKERS.contains(&c));

    // Dropping markers can rejoin a split rule, e.g. "-*--".
    if cleaned.contains("---") {
        cleaned = cleaned.replace("---", "");
    }

    cleaned
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace, counting the ASCII separator controls U+001C..=U+001F.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_markers() {
        assert_eq!(normalize_for_speech("**Hello** World!"), "Hello World!");
    }

    #[test]
    fn test_heading_rule_and_code() {
        assert_eq!(
            normalize_for_speech("# Title\n\n---\nSome `code` here___"),
            "Title Some code here"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize_for_speech(""), "");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(
            normalize_for_speech("   multiple   \n\n spaces  "),
            "multiple spaces"
        );
        assert_eq!(normalize_for_speech("tab\tseparated\r\nlines"), "tab separated lines");
        assert_eq!(normalize_for_speech("a\u{1f}b"), "a b");
        assert_eq!(normalize_for_speech("x\u{1c}\u{1d} *y*\u{1e}"), "x y");
    }

    #[test]
    fn test_markup_only() {
        assert_eq!(normalize_for_speech("*** ___ --- ## ``` _"), "");
        assert_eq!(normalize_for_speech(" \n\t "), "");
    }

    #[test]
    fn test_hyphens_survive() {
        assert_eq!(normalize_for_speech("well-known"), "well-known");
        assert_eq!(normalize_for_speech("a - b -- c"), "a - b -- c");
        assert_eq!(normalize_for_speech("----"), "-");
        assert_eq!(normalize_for_speech("------"), "");
    }

    #[test]
    fn test_underscores_in_prose_are_stripped() {
        assert_eq!(normalize_for_speech("net_profit and `x`"), "netprofit and x");
    }

    #[test]
    fn test_rule_rejoined_by_marker_removal() {
        let out = normalize_for_speech("-*--");
        assert!(!out.contains("---"));
        assert_eq!(out, "");
    }

    #[test]
    fn test_table_markdown() {
        let table = "| Debit | Credit |\n|---|---|\n| **Cash** | _Capital_ |";
        assert_eq!(
            normalize_for_speech(table),
            "| Debit | Credit | ||| | Cash | Capital |"
        );
    }

    #[test]
    fn test_output_guarantees() {
        let inputs = [
            "## Journal Entry\n\n1. **Dr** Cash A/c\n   _Cr_ Capital A/c",
            "`a`_b_*c*#d#---e___f",
            "-_-_-",
            "#-#-#-#",
            "line one  \n\n\n  line two\t\tthree",
            "   ",
            "plain text",
        ];
        for input in inputs {
            let out = normalize_for_speech(input);
            for bad in ["*", "_", "#", "`", "---", "___", "  "] {
                assert!(!out.contains(bad), "{:?} -> {:?} contains {:?}", input, out, bad);
            }
            assert_eq!(out, out.trim());
            assert_eq!(normalize_for_speech(&out), out, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_unicode_text_kept() {
        assert_eq!(normalize_for_speech("**₹500** ka *profit*"), "₹500 ka profit");
    }
}
