//! Client finance dataset.
//!
//! The dataset is a JSON document of the form
//!
//! ```json
//! {
//!   "clients": [
//!     {
//!       "client_name": "John Doe",
//!       "2023": {
//!         "account_balance": 1000,
//!         "transactions": [
//!           { "date": "01-01-2023", "amount": -500, "description": "Rent payment" }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Year records sit directly on the client object, keyed by the year.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{QueryCacheError, QueryCacheResult};

/// A single transaction. Positive amounts are income, negative are expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub amount: serde_json::Number,
    pub description: String,
}

impl Transaction {
    pub fn amount_value(&self) -> f64 {
        self.amount.as_f64().unwrap_or(0.0)
    }

    pub fn is_income(&self) -> bool {
        self.amount_value() > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount_value() < 0.0
    }
}

/// Balance and transactions for one client in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub account_balance: serde_json::Number,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_name: String,
    #[serde(flatten)]
    pub years: BTreeMap<String, YearRecord>,
}

impl Client {
    pub fn year(&self, year: &str) -> Option<&YearRecord> {
        self.years.get(year)
    }
}

/// The whole dataset, read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub clients: Vec<Client>,
}

impl Dataset {
    /// Loads and validates the dataset at `path`.
    pub async fn load<P: AsRef<Path>>(path: P) -> QueryCacheResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            QueryCacheError::dataset(format!("cannot read {}: {}", path.display(), e))
        })?;

        let dataset = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            clients = dataset.clients.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parses a dataset from a JSON string.
    pub fn from_json(content: &str) -> QueryCacheResult<Self> {
        let dataset: Dataset = serde_json::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> QueryCacheResult<()> {
        for client in &self.clients {
            if client.client_name.trim().is_empty() {
                return Err(QueryCacheError::dataset("client with empty client_name"));
            }
            if let Some(bad) = client.years.keys().find(|y| !is_year(y)) {
                return Err(QueryCacheError::dataset(format!(
                    "client '{}' has non-year key '{}'",
                    client.client_name, bad
                )));
            }
        }
        Ok(())
    }

    /// Clients whose name contains `fragment`, ignoring case.
    pub fn find_clients(&self, fragment: &str) -> Vec<&Client> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.clients
            .iter()
            .filter(|c| c.client_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// The client whose name equals `name`, ignoring case.
    pub fn find_client_exact(&self, name: &str) -> Option<&Client> {
        let name = name.trim();
        self.clients
            .iter()
            .find(|c| c.client_name.eq_ignore_ascii_case(name))
    }

    pub fn client_names(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.client_name.as_str()).collect()
    }

    /// Every year that appears for at least one client.
    pub fn years(&self) -> BTreeSet<&str> {
        self.clients
            .iter()
            .flat_map(|c| c.years.keys().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// True for a four-digit year such as `2023`.
pub fn is_year(text: &str) -> bool {
    text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit())
}

/// Sample dataset written by `querycache init`.
pub const SAMPLE_DATASET: &str = r#"{
  "clients": [
    {
      "client_name": "John Doe",
      "2022": {
        "account_balance": 750,
        "transactions": [
          { "date": "15-03-2022", "amount": 1200, "description": "Salary" },
          { "date": "20-03-2022", "amount": -450, "description": "Rent payment" }
        ]
      },
      "2023": {
        "account_balance": 1000,
        "transactions": [
          { "date": "01-01-2023", "amount": -500, "description": "Rent payment" },
          { "date": "05-02-2023", "amount": 1500, "description": "Salary" }
        ]
      }
    },
    {
      "client_name": "Jane Smith",
      "2022": {
        "account_balance": 2300,
        "transactions": [
          { "date": "01-01-2022", "amount": 500, "description": "Freelance invoice" },
          { "date": "10-06-2022", "amount": -120, "description": "Utilities" }
        ]
      }
    },
    {
      "client_name": "Janet Brown",
      "2023": {
        "account_balance": 480,
        "transactions": [
          { "date": "12-04-2023", "amount": -80, "description": "Groceries" }
        ]
      }
    }
  ]
}
"#;
