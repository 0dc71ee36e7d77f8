// Keyword matching used when no embedding is available for a text query
use crate::document::CandidateDocument;

/// Case-insensitive keyword matcher over title, description, category and skills.
///
/// A document matches when the whole query, or any query token of at least
/// two characters, occurs as a substring of one of those fields.
#[derive(Debug, Clone)]
pub struct LexicalMatcher {
    needles: Vec<String>,
}

impl LexicalMatcher {
    pub fn new(query: &str) -> Self {
        let full = query.trim().to_lowercase();
        let mut needles = Vec::new();
        if !full.is_empty() {
            needles.push(full);
        }
        for token in Self::tokenize(query) {
            if !needles.contains(&token) {
                needles.push(token);
            }
        }
        Self { needles }
    }

    /// Lowercased whitespace tokens, edge punctuation stripped, shorter than
    /// two characters dropped.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(|s| s.trim_matches(|c: char| c.is_ascii_punctuation()).to_string())
            .filter(|s| s.chars().count() >= 2)
            .collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.needles.is_empty()
    }

    pub fn matches(&self, doc: &CandidateDocument) -> bool {
        if self.needles.is_empty() {
            return false;
        }

        let fields = [
            doc.title.to_lowercase(),
            doc.description.to_lowercase(),
            doc.category.to_lowercase(),
        ];
        let skills: Vec<String> = doc.skills.iter().map(|s| s.to_lowercase()).collect();

        self.needles.iter().any(|needle| {
            fields.iter().any(|f| f.contains(needle.as_str()))
                || skills.iter().any(|s| s.contains(needle.as_str()))
        })
    }

    /// Matching documents in the order given, at most `cap`.
    pub fn search<I>(&self, documents: I, cap: usize) -> Vec<CandidateDocument>
    where
        I: IntoIterator<Item = CandidateDocument>,
    {
        documents
            .into_iter()
            .filter(|doc| self.matches(doc))
            .take(cap)
            .collect()
    }
}
