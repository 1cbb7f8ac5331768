//! Integration tests for the query agent over the sample dataset.

use std::sync::Arc;

use querycache::agent::{AgentReply, QueryAgent};
use querycache::dataset::{Dataset, SAMPLE_DATASET};
use querycache::types::config::{Config, NormalizerKind};

fn agent_with(capacity: usize, normalizer: NormalizerKind) -> QueryAgent {
    let dataset = Arc::new(Dataset::from_json(SAMPLE_DATASET).expect("sample dataset parses"));
    let mut config = Config::default_config();
    config.cache.capacity = capacity;
    config.agent.normalizer = normalizer;
    QueryAgent::from_config(&config, dataset).expect("valid config")
}

#[tokio::test]
async fn test_fresh_then_cached_answer() {
    let mut agent = agent_with(4, NormalizerKind::Text);

    let first = agent.process("Account balance of John in 2023").await;
    assert_eq!(
        first,
        AgentReply::Fresh("The account balance of John Doe in 2023 is $1000.".to_string())
    );

    let second = agent.process("account balance of JOHN in 2023!").await;
    assert_eq!(
        second.to_string(),
        "Previously asked: The account balance of John Doe in 2023 is $1000."
    );
    assert_eq!(agent.stats().hits, 1);
}

#[tokio::test]
async fn test_ambiguous_reply_message() {
    let mut agent = agent_with(4, NormalizerKind::Text);

    let reply = agent.process("transactions of jan in 2022").await;
    assert_eq!(
        reply.to_string(),
        "Multiple clients found: Jane Smith, Janet Brown. Please be more specific."
    );
    assert!(agent.cache_keys().is_empty());
}

#[tokio::test]
async fn test_no_data_reply_message() {
    let mut agent = agent_with(4, NormalizerKind::Text);

    let reply = agent.process("account balance of john in 1990").await;
    assert_eq!(reply.to_string(), "Sorry, no data available for this query.");
}

#[tokio::test]
async fn test_cache_evicts_oldest_query() {
    let mut agent = agent_with(2, NormalizerKind::Text);

    agent.process("account balance of john in 2023").await;
    agent.process("account balance of jane smith in 2022").await;
    agent.process("incomes of john in 2022").await;

    assert_eq!(
        agent.cache_keys(),
        vec!["account balance of jane smith in 2022", "incomes of john in 2022"]
    );
    assert_eq!(agent.stats().evictions, 1);
    assert_eq!(agent.history().count(), 3);
}

#[tokio::test]
async fn test_entity_normalizer_shares_entries() {
    let mut agent = agent_with(4, NormalizerKind::Entity);

    let first = agent.process("Balance of Jane Smith in 2022?").await;
    assert_eq!(
        first.answer(),
        Some("The account balance of Jane Smith in 2022 is $2300.")
    );

    let second = agent.process("jane smith account balance for 2022").await;
    assert!(second.is_cached());

    let missing = agent.process("balance of jane smith").await;
    assert_eq!(
        missing.to_string(),
        "I need both client name and year to answer."
    );
}

const PUNCTUATED_DATASET: &str = r#"{
  "clients": [
    { "client_name": "Jan", "2020": { "account_balance": 10 } },
    { "client_name": "Jan Kowalski", "2020": { "account_balance": 20 } },
    { "client_name": "Mary-Jane O'Neil", "2020": { "account_balance": 30 } }
  ]
}"#;

fn entity_agent_over(json: &str) -> QueryAgent {
    let dataset = Arc::new(Dataset::from_json(json).expect("dataset parses"));
    let mut config = Config::default_config();
    config.agent.normalizer = NormalizerKind::Entity;
    QueryAgent::from_config(&config, dataset).expect("valid config")
}

#[tokio::test]
async fn test_entity_short_name_is_not_ambiguous() {
    let mut agent = entity_agent_over(PUNCTUATED_DATASET);

    let reply = agent.process("balance of Jan in 2020").await;
    assert_eq!(
        reply,
        AgentReply::Fresh("The account balance of Jan in 2020 is $10.".to_string())
    );

    let longer = agent.process("balance of Jan Kowalski in 2020").await;
    assert_eq!(
        longer.answer(),
        Some("The account balance of Jan Kowalski in 2020 is $20.")
    );
    assert_eq!(
        agent.cache_keys(),
        vec!["jan|2020|account_balance", "jan kowalski|2020|account_balance"]
    );
}

#[tokio::test]
async fn test_entity_punctuated_name_resolves() {
    let mut agent = entity_agent_over(PUNCTUATED_DATASET);

    let reply = agent.process("balance of Mary-Jane O'Neil in 2020").await;
    assert_eq!(
        reply,
        AgentReply::Fresh("The account balance of Mary-Jane O'Neil in 2020 is $30.".to_string())
    );
    assert_eq!(agent.cache_keys(), vec!["maryjane oneil|2020|account_balance"]);

    let again = agent.process("mary-jane o'neil balance 2020").await;
    assert!(again.is_cached());
}
