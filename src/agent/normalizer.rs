//! Turning free-text queries into cache keys.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::Dataset;

use super::query::{ParsedQuery, QueryKind};

/// Maps a raw user query to a canonical cache key.
///
/// Returning `None` means the query cannot be keyed at all.
pub trait KeyNormalizer: Send + Sync {
    fn name(&self) -> &str;

    fn normalize(&self, raw: &str) -> Option<String>;
}

static NON_KEY_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Replaces every whitespace run with a single space and trims the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Lowercases, keeps only `[a-z0-9 ]` and collapses runs of whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn clean(raw: &str) -> String {
        let lowered = raw.to_lowercase();
        let kept = NON_KEY_CHARS_RE.replace_all(&lowered, "");
        collapse_whitespace(&kept)
    }
}

impl KeyNormalizer for TextNormalizer {
    fn name(&self) -> &str {
        "text"
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned = Self::clean(raw);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// Recognises known client names and years in a query.
///
/// The key is `client|year|kind`, so differently worded questions about the
/// same thing share one cache entry.
#[derive(Debug, Clone)]
pub struct EntityNormalizer {
    /// Cleaned client names, longest first.
    clients: Vec<String>,
    years: Vec<String>,
}

impl EntityNormalizer {
    pub fn new<C, Y>(clients: C, years: Y) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        Y: IntoIterator,
        Y::Item: AsRef<str>,
    {
        let mut clients: Vec<String> = clients
            .into_iter()
            .map(|c| TextNormalizer::clean(c.as_ref()))
            .filter(|c| !c.is_empty())
            .collect();
        clients.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        clients.dedup();

        Self {
            clients,
            years: years.into_iter().map(|y| y.as_ref().to_string()).collect(),
        }
    }

    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::new(dataset.client_names(), dataset.years())
    }

    fn find_client(&self, padded: &str) -> Option<&str> {
        self.clients
            .iter()
            .find(|name| padded.contains(&format!(" {} ", name)))
            .map(String::as_str)
    }

    fn find_year<'a>(&self, words: &[&'a str]) -> Option<&'a str> {
        words
            .iter()
            .copied()
            .find(|w| self.years.iter().any(|y| y.as_str() == *w))
    }

    fn find_kind(words: &[&str]) -> QueryKind {
        if words.iter().any(|w| matches!(*w, "income" | "incomes")) {
            QueryKind::Incomes
        } else if words.iter().any(|w| matches!(*w, "expense" | "expenses")) {
            QueryKind::Expenses
        } else if words.iter().any(|w| matches!(*w, "transaction" | "transactions")) {
            QueryKind::Transactions
        } else {
            QueryKind::AccountBalance
        }
    }
}

impl KeyNormalizer for EntityNormalizer {
    fn name(&self) -> &str {
        "entity"
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned = TextNormalizer::clean(raw);
        let padded = format!(" {} ", cleaned);
        let words: Vec<&str> = cleaned.split(' ').collect();

        let client = self.find_client(&padded)?;
        let year = self.find_year(&words)?;
        let kind = Self::find_kind(&words);

        Some(ParsedQuery::new(kind, client, year).to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SAMPLE_DATASET;

    #[test]
    fn test_text_normalizer_cleans() {
        let normalizer = TextNormalizer;
        assert_eq!(
            normalizer.normalize("  Account   Balance of JOHN in 2023?! "),
            Some("account balance of john in 2023".to_string())
        );
        assert_eq!(
            normalizer.normalize("tabs\tand\nnewlines"),
            Some("tabs and newlines".to_string())
        );
    }

    #[test]
    fn test_text_normalizer_empty() {
        assert_eq!(TextNormalizer.normalize("   "), None);
        assert_eq!(TextNormalizer.normalize("?!.,"), None);
    }

    #[test]
    fn test_entity_normalizer_extracts() {
        let dataset = Dataset::from_json(SAMPLE_DATASET).unwrap();
        let normalizer = EntityNormalizer::from_dataset(&dataset);

        assert_eq!(
            normalizer.normalize("What is the account balance of John Doe in 2023?"),
            Some("john doe|2023|account_balance".to_string())
        );
        assert_eq!(
            normalizer.normalize("john doe balance for 2023"),
            Some("john doe|2023|account_balance".to_string())
        );
        assert_eq!(
            normalizer.normalize("Expenses, Jane Smith, 2022"),
            Some("jane smith|2022|expenses".to_string())
        );
    }

    #[test]
    fn test_entity_normalizer_needs_client_and_year() {
        let dataset = Dataset::from_json(SAMPLE_DATASET).unwrap();
        let normalizer = EntityNormalizer::from_dataset(&dataset);

        assert_eq!(normalizer.normalize("balance of john doe"), None);
        assert_eq!(normalizer.normalize("balance of somebody in 2023"), None);
        assert_eq!(normalizer.normalize("john doe in 1999"), None);
    }

    #[test]
    fn test_entity_prefers_longest_name() {
        let normalizer = EntityNormalizer::new(["Jan", "Jan Kowalski"], ["2020"]);
        assert_eq!(
            normalizer.normalize("jan kowalski 2020"),
            Some("jan kowalski|2020|account_balance".to_string())
        );
    }

    #[test]
    fn test_entity_key_uses_cleaned_name() {
        let normalizer = EntityNormalizer::new(["Mary-Jane O'Neil"], ["2020"]);
        assert_eq!(
            normalizer.normalize("Balance of Mary-Jane O'Neil in 2020"),
            Some("maryjane oneil|2020|account_balance".to_string())
        );
    }
}
