//! Structured form of a client finance query.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::is_year;

use super::normalizer::collapse_whitespace;

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(account balance|transactions|incomes|expenses) of (.+?) in ([0-9]{4})")
        .unwrap()
});

/// What the user is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    AccountBalance,
    Transactions,
    /// Transactions with a positive amount.
    Incomes,
    /// Transactions with a negative amount.
    Expenses,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        QueryKind::AccountBalance,
        QueryKind::Transactions,
        QueryKind::Incomes,
        QueryKind::Expenses,
    ];

    /// Phrase that introduces this kind in a natural-language query.
    pub fn phrase(&self) -> &'static str {
        match self {
            QueryKind::AccountBalance => "account balance",
            QueryKind::Transactions => "transactions",
            QueryKind::Incomes => "incomes",
            QueryKind::Expenses => "expenses",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::AccountBalance => "account_balance",
            QueryKind::Transactions => "transactions",
            QueryKind::Incomes => "incomes",
            QueryKind::Expenses => "expenses",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown query kind '{}'", s))
    }
}

/// A query reduced to kind, client and year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedQuery {
    pub kind: QueryKind,
    /// Lowercased client name or name fragment.
    pub client: String,
    pub year: String,
}

impl ParsedQuery {
    pub fn new(kind: QueryKind, client: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            kind,
            client: client.into().to_lowercase(),
            year: year.into(),
        }
    }

    /// Serialised form used as a cache key.
    pub fn to_key(&self) -> String {
        format!("{}|{}|{}", self.client, self.year, self.kind)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let mut parts = key.split('|');
        let client = parts.next()?.trim();
        let year = parts.next()?.trim();
        let kind = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() || client.is_empty() || !is_year(year) {
            return None;
        }
        Some(Self::new(kind, client, year))
    }

    /// Matches `<kind> of <client> in <yyyy>` anywhere in the text. The
    /// client is the shortest run that is followed by a year.
    pub fn from_sentence(text: &str) -> Option<Self> {
        let text = collapse_whitespace(text);
        let caps = SENTENCE_RE.captures(&text)?;

        let phrase = caps.get(1)?.as_str().to_lowercase();
        let kind = QueryKind::ALL.into_iter().find(|k| k.phrase() == phrase)?;
        let client = caps.get(2)?.as_str().trim();
        if client.is_empty() {
            return None;
        }

        Some(Self::new(kind, client, caps.get(3)?.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentence() {
        let parsed = ParsedQuery::from_sentence("Account Balance of John in 2023").unwrap();
        assert_eq!(parsed.kind, QueryKind::AccountBalance);
        assert_eq!(parsed.client, "john");
        assert_eq!(parsed.year, "2023");
    }

    #[test]
    fn test_parse_sentence_with_prefix_and_spacing() {
        let parsed =
            ParsedQuery::from_sentence("show me   the EXPENSES of jane\tsmith in 2022 please")
                .unwrap();
        assert_eq!(parsed.kind, QueryKind::Expenses);
        assert_eq!(parsed.client, "jane smith");
        assert_eq!(parsed.year, "2022");
    }

    #[test]
    fn test_parse_client_is_shortest_match() {
        let parsed = ParsedQuery::from_sentence("transactions of ann in 2021 in 2022").unwrap();
        assert_eq!(parsed.client, "ann");
        assert_eq!(parsed.year, "2021");
    }

    #[test]
    fn test_parse_rejects_missing_year() {
        assert!(ParsedQuery::from_sentence("incomes of john in last year").is_none());
        assert!(ParsedQuery::from_sentence("what is the weather").is_none());
        assert!(ParsedQuery::from_sentence("incomes of  in 2023").is_none());
    }

    #[test]
    fn test_key_form() {
        let parsed = ParsedQuery::new(QueryKind::Incomes, "John Doe", "2022");
        let key = parsed.to_key();
        assert_eq!(key, "john doe|2022|incomes");
        assert_eq!(ParsedQuery::from_key(&key), Some(parsed));
    }

    #[test]
    fn test_key_form_rejects_garbage() {
        assert!(ParsedQuery::from_key("john|20x2|incomes").is_none());
        assert!(ParsedQuery::from_key("john|2022|salary").is_none());
        assert!(ParsedQuery::from_key("john|2022|incomes|extra").is_none());
    }

    #[test]
    fn test_kind_roundtrip_str() {
        for kind in QueryKind::ALL {
            assert_eq!(kind.as_str().parse::<QueryKind>(), Ok(kind));
        }
    }
}
