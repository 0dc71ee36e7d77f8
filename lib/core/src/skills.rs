//! Skill highlighting and tagging.
//!
//! Both operations are plain case-insensitive substring containment: no
//! stemming, no fuzzy matching, no tokenization.

use ahash::AHashSet;

/// Fixed vocabulary used to tag uploaded CVs.
pub const SKILL_VOCABULARY: &[&str] = &[
    "JavaScript", "Python", "Java", "React", "Node", "SQL", "MongoDB", "AWS", "Git",
    "Communication", "Leadership", "Management", "Analytics", "Excel", "Marketing",
    "Sales", "Design", "UX", "UI", "Testing", "Agile", "Scrum", "French", "English", "Arabic",
];

pub const MAX_SKILL_TAGS: usize = 30;

/// The subsequence of `document_skills` whose lowercase form occurs in the
/// lowercased `source_text`, in original order.
pub fn highlight(source_text: &str, document_skills: &[String]) -> Vec<String> {
    if document_skills.is_empty() {
        return Vec::new();
    }

    let haystack = source_text.to_lowercase();
    document_skills
        .iter()
        .filter(|skill| haystack.contains(&skill.to_lowercase()))
        .cloned()
        .collect()
}

/// Vocabulary terms present in `text`, deduplicated, at most [`MAX_SKILL_TAGS`].
pub fn extract_skill_tags(text: &str) -> Vec<String> {
    extract_tags_from(text, SKILL_VOCABULARY)
}

pub fn extract_tags_from(text: &str, vocabulary: &[&str]) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut seen = AHashSet::new();

    vocabulary
        .iter()
        .filter(|term| haystack.contains(&term.to_lowercase()))
        .filter(|term| seen.insert(term.to_lowercase()))
        .take(MAX_SKILL_TAGS)
        .map(|term| (*term).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_highlight_case_insensitive_in_order() {
        let result = highlight("I know python and Excel", &skills(&["Python", "SQL"]));
        assert_eq!(result, vec!["Python"]);

        let result = highlight("sql, EXCEL and python", &skills(&["Excel", "SQL", "Python"]));
        assert_eq!(result, vec!["Excel", "SQL", "Python"]);
    }

    #[test]
    fn test_highlight_keeps_duplicates_and_case() {
        let result = highlight("rust", &skills(&["Rust", "rust", "Go"]));
        assert_eq!(result, vec!["Rust", "rust"]);
    }

    #[test]
    fn test_highlight_no_fuzzy_match() {
        assert!(highlight("I program in Pyton", &skills(&["Python"])).is_empty());
        assert!(highlight("", &skills(&["Python"])).is_empty());
    }

    #[test]
    fn test_extract_skill_tags() {
        let tags = extract_skill_tags("Senior PYTHON dev, SQL and git. Fluent english.");
        assert_eq!(tags, vec!["Python", "SQL", "Git", "English"]);
    }

    #[test]
    fn test_extract_dedupes_and_caps() {
        let vocab: Vec<String> = (0..40).map(|i| format!("t{i:02}")).collect();
        let refs: Vec<&str> = vocab.iter().map(String::as_str).chain(["T00"]).collect();
        let text = vocab.join(" ");
        let tags = extract_tags_from(&text, &refs);
        assert_eq!(tags.len(), MAX_SKILL_TAGS);
        assert_eq!(tags.iter().filter(|t| t.eq_ignore_ascii_case("t00")).count(), 1);
    }
}
