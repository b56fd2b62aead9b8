//! Text-extraction heuristics for free-form model replies
//!
//! Every function here is total: malformed or section-free input degrades to
//! `None` or an empty list, never to an error or a panic.

/// Markers that close a section.
const SECTION_END_MARKERS: [&str; 3] = ["##", "\n\n\n", "---"];

/// Bullet prefixes recognized by `extract_bullets`.
const BULLET_PREFIXES: [char; 6] = ['-', '•', '*', '✓', '✗', '→'];

pub const MAX_BULLETS: usize = 10;

/// Find the first header alias present (case-insensitive) and return the text
/// from that header to the nearest section marker, or end of text.
///
/// Aliases are tried in order; the first one that occurs anywhere wins.
pub fn extract_section(text: &str, headers: &[&str]) -> Option<String> {
    // ASCII-only uppercasing keeps byte offsets aligned with `text`
    let upper = text.to_ascii_uppercase();

    headers.iter().find_map(|header| {
        let needle = header.to_ascii_uppercase();
        if needle.is_empty() {
            return None;
        }

        let start = upper.find(&needle)?;
        let body_start = start + needle.len();

        let end = SECTION_END_MARKERS
            .iter()
            .filter_map(|marker| text[body_start..].find(marker).map(|pos| body_start + pos))
            .min()
            .unwrap_or(text.len());

        Some(text[start..end].trim().to_string())
    })
}

/// Collect bulleted lines with the prefix stripped, up to `max_items`.
pub fn extract_bullets(text: &str, max_items: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| {
            let mut chars = line.chars();
            match chars.next() {
                Some(c) if BULLET_PREFIXES.contains(&c) => Some(chars.as_str().trim()),
                _ => None,
            }
        })
        .filter(|item| !item.is_empty())
        .take(max_items)
        .map(str::to_string)
        .collect()
}

/// Section lookup followed by bullet extraction. `None` when no alias matches.
pub fn extract_section_bullets(text: &str, headers: &[&str]) -> Option<Vec<String>> {
    extract_section(text, headers).map(|section| extract_bullets(&section, MAX_BULLETS))
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROS: [&str; 3] = ["Pros", "Strengths", "What I Like"];

    #[test]
    fn test_section_found_by_any_alias() {
        for alias in PROS {
            let text = format!("Intro\n## {}\n- Pricing power\n## Cons\n- Debt", alias);
            let section = extract_section(&text, &PROS).unwrap();
            assert!(section.starts_with(alias));
            assert!(section.contains("Pricing power"));
            assert!(!section.contains("Debt"));
        }
    }

    #[test]
    fn test_section_missing_is_none() {
        assert_eq!(extract_section("nothing relevant here", &PROS), None);
        assert_eq!(extract_section("", &PROS), None);
    }

    #[test]
    fn test_section_case_insensitive() {
        let section = extract_section("### what i like:\n* cash", &PROS).unwrap();
        assert_eq!(section, "what i like:\n* cash");
    }

    #[test]
    fn test_section_stops_at_nearest_marker() {
        let text = "Summary: strong\n\n\nunrelated\n---\nfooter";
        assert_eq!(extract_section(text, &["Summary"]).unwrap(), "Summary: strong");

        let text = "Summary: a --- b ## c";
        assert_eq!(extract_section(text, &["Summary"]).unwrap(), "Summary: a");
    }

    #[test]
    fn test_section_runs_to_end_of_text() {
        let text = "## Recommendation\nBuy and hold";
        assert_eq!(
            extract_section(text, &["Recommendation"]).unwrap(),
            "Recommendation\nBuy and hold"
        );
    }

    #[test]
    fn test_non_ascii_text_does_not_panic() {
        let text = "Überblick → ## Risk ✗ Währung\n→ FX exposure";
        let section = extract_section(text, &["Risk"]).unwrap();
        assert!(section.starts_with("Risk"));
        assert_eq!(extract_bullets(&section, 10), vec!["FX exposure"]);
    }

    #[test]
    fn test_bullets_strip_all_prefixes() {
        let text = "- one\n• two\n* three\n✓ four\n✗ five\n→ six\nplain line\n-   \n";
        assert_eq!(
            extract_bullets(text, 10),
            vec!["one", "two", "three", "four", "five", "six"]
        );
    }

    #[test]
    fn test_bullets_capped() {
        let text = (0..20).map(|i| format!("- item {}", i)).collect::<Vec<_>>().join("\n");
        let bullets = extract_bullets(&text, MAX_BULLETS);
        assert_eq!(bullets.len(), 10);
        assert_eq!(bullets[9], "item 9");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
