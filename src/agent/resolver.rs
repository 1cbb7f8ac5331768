//! Computing answers for cache misses.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dataset::{Client, Dataset, Transaction, YearRecord};

use super::normalizer::TextNormalizer;
use super::query::{ParsedQuery, QueryKind};

/// Outcome of resolving a normalized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Answer text.
    Found(String),

    /// The query is not understood or no data matches it.
    NoMatch,

    /// The client fragment matches several clients.
    Ambiguous(Vec<String>),
}

/// Produces an answer for a normalized query. Only called on a cache miss.
#[async_trait]
pub trait ValueResolver: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, query: &str) -> Resolution;
}

/// Answers balance and transaction questions from a [`Dataset`].
#[derive(Debug, Clone)]
pub struct DatasetResolver {
    dataset: Arc<Dataset>,
}

impl DatasetResolver {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    /// Answers a sentence query. The client is any name containing the
    /// typed fragment, so a short fragment may be ambiguous.
    pub fn answer(&self, query: &ParsedQuery) -> Resolution {
        respond(self.dataset.find_clients(&query.client), query)
    }

    /// Answers an entity key. The client must be a whole dataset name, either
    /// as written or in its cleaned key form, so `jan` never picks up
    /// `Jan Kowalski`.
    pub fn answer_key(&self, query: &ParsedQuery) -> Resolution {
        let matches = match self.dataset.find_client_exact(&query.client) {
            Some(client) => vec![client],
            None => self
                .dataset
                .clients
                .iter()
                .filter(|c| TextNormalizer::clean(&c.client_name) == query.client)
                .collect(),
        };
        respond(matches, query)
    }
}

#[async_trait]
impl ValueResolver for DatasetResolver {
    fn name(&self) -> &str {
        "dataset"
    }

    async fn resolve(&self, query: &str) -> Resolution {
        if let Some(parsed) = ParsedQuery::from_key(query) {
            return self.answer_key(&parsed);
        }
        match ParsedQuery::from_sentence(query) {
            Some(parsed) => self.answer(&parsed),
            None => Resolution::NoMatch,
        }
    }
}

fn respond(matches: Vec<&Client>, query: &ParsedQuery) -> Resolution {
    let client = match matches.as_slice() {
        [] => return Resolution::NoMatch,
        [client] => *client,
        many => {
            return Resolution::Ambiguous(many.iter().map(|c| c.client_name.clone()).collect())
        }
    };

    let Some(record) = client.year(&query.year) else {
        return Resolution::NoMatch;
    };

    Resolution::Found(render(query.kind, client, &query.year, record))
}

fn render(kind: QueryKind, client: &Client, year: &str, record: &YearRecord) -> String {
    let name = &client.client_name;
    let (header, keep): (String, fn(&Transaction) -> bool) = match kind {
        QueryKind::AccountBalance => {
            return format!(
                "The account balance of {} in {} is ${}.",
                name, year, record.account_balance
            )
        }
        QueryKind::Transactions => (format!("Transactions for {} in {}:", name, year), |_| true),
        QueryKind::Incomes => (
            format!("Income transactions for {} in {}:", name, year),
            Transaction::is_income,
        ),
        QueryKind::Expenses => (
            format!("Expense transactions for {} in {}:", name, year),
            Transaction::is_expense,
        ),
    };

    let mut lines = vec![header];
    lines.extend(record.transactions.iter().filter(|t| keep(t)).map(|t| {
        format!(
            "Date: {}, Amount: {}, Description: {}",
            t.date, t.amount, t.description
        )
    }));
    lines.join("\n")
}
