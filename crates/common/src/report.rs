//! Violation filtering and text rendering

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Violation;

/// Rules that only make sense on a full page. A story rendered on its own
/// never has a level-one heading, landmarks or skip links.
pub const NOISE_PATTERNS: &[&str] = &[
    r"contains a level-one heading",
    r"document has a main landmark",
    r"content is contained by landmarks",
    r"bypass navigation and jump straight",
];

static NOISE_FILTERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    NOISE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Whether a violation description matches any noise pattern
pub fn is_noise(description: &str) -> bool {
    NOISE_FILTERS.iter().any(|re| re.is_match(description))
}

/// Drop every violation whose description matches a noise pattern.
pub fn filter_violations(violations: Vec<Violation>) -> Vec<Violation> {
    violations
        .into_iter()
        .filter(|v| !is_noise(&v.description))
        .collect()
}

/// Render one entry's violations.
///
/// Returns an empty string for an entry without violations.
pub fn format_entry(name: &str, violations: &[Violation]) -> String {
    if violations.is_empty() {
        return String::new();
    }

    let mut out = format!("###\n### {}:\n###\n\n", name);

    let blocks: Vec<String> = violations
        .iter()
        .map(|v| {
            let nodes: Vec<String> = v
                .nodes
                .iter()
                .map(|n| format!("Summary: {}\n{}\n", n.failure_summary, n.html))
                .collect();
            format!("Description: {}\n{}", v.description, nodes.join("\n"))
        })
        .collect();

    out.push_str(&blocks.join("\n"));
    out.push_str("\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark() -> Violation {
        Violation::new("Ensures all page content is contained by landmarks")
            .with_node("Fix all of the following:\n  Some page content is not contained by landmarks", "<div>")
    }

    fn contrast() -> Violation {
        Violation::new("Color contrast must meet WCAG 2 AA")
            .with_node("Fix any of the following:\n  Element has insufficient color contrast", "<span class=\"muted\">Hint</span>")
    }

    fn sample() -> Vec<Violation> {
        vec![
            Violation::new("Ensures the document has a main landmark"),
            contrast(),
            Violation::new("Ensures each page has at least one mechanism for a user to bypass navigation and jump straight to the content"),
            Violation::new("Ensure that the page, or at least one of its frames contains a level-one heading"),
            landmark(),
            Violation::new("Ensures buttons have discernible text"),
        ]
    }

    #[test]
    fn test_filter_removes_exactly_the_noise() {
        let kept = filter_violations(sample());
        let descriptions: Vec<&str> = kept.iter().map(|v| v.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["Color contrast must meet WCAG 2 AA", "Ensures buttons have discernible text"]
        );
        assert!(kept.iter().all(|v| !is_noise(&v.description)));
    }

    #[test]
    fn test_filter_keeps_every_non_matching_violation() {
        let clean = vec![contrast(), Violation::new("Images must have alternate text")];
        assert_eq!(filter_violations(clean.clone()), clean);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let once = filter_violations(sample());
        let twice = filter_violations(once.clone());
        assert_eq!(once, twice);

        assert!(filter_violations(Vec::new()).is_empty());
    }

    #[test]
    fn test_format_entry_layout() {
        let text = format_entry("button--primary", &[contrast()]);
        assert_eq!(
            text,
            "###\n### button--primary:\n###\n\n\
             Description: Color contrast must meet WCAG 2 AA\n\
             Summary: Fix any of the following:\n  Element has insufficient color contrast\n\
             <span class=\"muted\">Hint</span>\n\n\n"
        );
    }

    #[test]
    fn test_format_separates_nodes_and_violations() {
        let multi = Violation::new("Form elements must have labels")
            .with_node("first", "<input id=\"a\">")
            .with_node("second", "<input id=\"b\">");
        let text = format_entry("form--login", &[multi, contrast()]);

        assert!(text.contains("Summary: first\n<input id=\"a\">\n\nSummary: second\n<input id=\"b\">\n"));
        assert!(text.contains("<input id=\"b\">\n\nDescription: Color contrast"));
        assert_eq!(text.matches("Description:").count(), 2);
    }

    #[test]
    fn test_format_empty_is_silent() {
        assert_eq!(format_entry("button--primary", &[]), "");
    }
}
