//! Query agent.
//!
//! The agent answers free-text questions about the client dataset and keeps
//! recent answers in an [`LruCache`]:
//!
//! 1. the [`KeyNormalizer`] turns the question into a cache key
//! 2. on a hit the cached answer is returned and promoted
//! 3. on a miss the [`ValueResolver`] computes the answer, which is cached
//!    only when it is a definite result

mod normalizer;
mod query;
mod resolver;

pub use normalizer::{EntityNormalizer, KeyNormalizer, TextNormalizer};
pub use query::{ParsedQuery, QueryKind};
pub use resolver::{DatasetResolver, Resolution, ValueResolver};

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::{CacheStats, LruCache};
use crate::dataset::Dataset;
use crate::types::config::{Config, NormalizerKind};
use crate::QueryCacheResult;

/// What the agent has to say about one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    /// Blank input.
    EmptyQuery,

    /// The normalizer could not derive a key.
    Unrecognized,

    /// Answer served from the cache.
    Cached(String),

    /// Answer computed by the resolver and now cached.
    Fresh(String),

    /// Nothing in the dataset matches.
    NoData,

    /// The client name matches several clients.
    Ambiguous(Vec<String>),
}

impl AgentReply {
    /// The answer text, for both cached and fresh answers.
    pub fn answer(&self) -> Option<&str> {
        match self {
            AgentReply::Cached(answer) | AgentReply::Fresh(answer) => Some(answer),
            _ => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, AgentReply::Cached(_))
    }
}

impl fmt::Display for AgentReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentReply::EmptyQuery => write!(f, "Please enter a query."),
            AgentReply::Unrecognized => write!(f, "I need both client name and year to answer."),
            AgentReply::Cached(answer) => write!(f, "Previously asked: {}", answer),
            AgentReply::Fresh(answer) => write!(f, "{}", answer),
            AgentReply::NoData => write!(f, "Sorry, no data available for this query."),
            AgentReply::Ambiguous(names) => write!(
                f,
                "Multiple clients found: {}. Please be more specific.",
                names.join(", ")
            ),
        }
    }
}

/// One answered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    /// The query as typed.
    pub query: String,
    /// The cache key it normalized to.
    pub key: String,
    pub asked_at: DateTime<Utc>,
}

/// Answers queries through a normalizer, a resolver and an LRU cache.
pub struct QueryAgent {
    cache: LruCache<String, String>,
    normalizer: Box<dyn KeyNormalizer>,
    resolver: Box<dyn ValueResolver>,
    history: VecDeque<QueryRecord>,
    history_limit: usize,
}

impl QueryAgent {
    pub fn new(
        cache: LruCache<String, String>,
        normalizer: Box<dyn KeyNormalizer>,
        resolver: Box<dyn ValueResolver>,
    ) -> Self {
        Self {
            cache,
            normalizer,
            resolver,
            history: VecDeque::new(),
            history_limit: 100,
        }
    }

    /// Builds the agent described by `config` over `dataset`.
    pub fn from_config(config: &Config, dataset: Arc<Dataset>) -> QueryCacheResult<Self> {
        let cache = LruCache::new(config.cache.capacity)?;
        let normalizer: Box<dyn KeyNormalizer> = match config.agent.normalizer {
            NormalizerKind::Text => Box::new(TextNormalizer),
            NormalizerKind::Entity => Box::new(EntityNormalizer::from_dataset(&dataset)),
        };
        let resolver = Box::new(DatasetResolver::new(dataset));

        Ok(Self::new(cache, normalizer, resolver).with_history_limit(config.agent.history_limit))
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Answers `raw`, consulting the cache before the resolver.
    pub async fn process(&mut self, raw: &str) -> AgentReply {
        let raw = raw.trim();
        if raw.is_empty() {
            return AgentReply::EmptyQuery;
        }

        let Some(key) = self.normalizer.normalize(raw) else {
            tracing::debug!(normalizer = self.normalizer.name(), "Query could not be normalized");
            return AgentReply::Unrecognized;
        };

        if let Some(answer) = self.cache.get(&key) {
            tracing::info!(key = %key, "Returning cached result");
            return AgentReply::Cached(answer.clone());
        }

        match self.resolver.resolve(&key).await {
            Resolution::Found(answer) => {
                if let Some((evicted, _)) = self.cache.put(key.clone(), answer.clone()) {
                    tracing::info!(evicted = %evicted, "Removed least recently used query");
                }
                self.record(raw, key);
                tracing::info!(
                    resolver = self.resolver.name(),
                    "Fetched from dataset and stored in cache"
                );
                AgentReply::Fresh(answer)
            }
            Resolution::NoMatch => {
                tracing::warn!(key = %key, "No matching data found");
                AgentReply::NoData
            }
            Resolution::Ambiguous(names) => {
                tracing::warn!(key = %key, matches = names.len(), "Ambiguous client name");
                AgentReply::Ambiguous(names)
            }
        }
    }

    /// Cache keys from least to most recently used.
    pub fn cache_keys(&self) -> Vec<&str> {
        self.cache.keys_in_order().map(String::as_str).collect()
    }

    pub fn cache(&self) -> &LruCache<String, String> {
        &self.cache
    }

    /// Answered queries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &QueryRecord> + '_ {
        self.history.iter()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops a cached answer so the next identical query is resolved again.
    pub fn forget(&mut self, raw: &str) -> Option<String> {
        let key = self.normalizer.normalize(raw.trim())?;
        self.cache.remove(&key)
    }

    fn record(&mut self, raw: &str, key: String) {
        self.history.push_back(QueryRecord {
            query: raw.to_string(),
            key,
            asked_at: Utc::now(),
        });
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver that counts calls and answers with the key itself.
    struct EchoResolver {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ValueResolver for EchoResolver {
        fn name(&self) -> &str {
            "echo"
        }

        async fn resolve(&self, query: &str) -> Resolution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match query {
                "missing" => Resolution::NoMatch,
                "twins" => Resolution::Ambiguous(vec!["A".to_string(), "B".to_string()]),
                other => Resolution::Found(format!("answer for {}", other)),
            }
        }
    }

    fn echo_agent(capacity: usize) -> (QueryAgent, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let agent = QueryAgent::new(
            LruCache::new(capacity).unwrap(),
            Box::new(TextNormalizer),
            Box::new(EchoResolver {
                calls: Arc::clone(&calls),
            }),
        );
        (agent, calls)
    }

    #[tokio::test]
    async fn test_second_query_hits_cache() {
        let (mut agent, calls) = echo_agent(2);

        let first = agent.process("Hello World").await;
        assert_eq!(first, AgentReply::Fresh("answer for hello world".to_string()));

        let second = agent.process("  hello,   WORLD!").await;
        assert!(second.is_cached());
        assert_eq!(second.to_string(), "Previously asked: answer for hello world");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_and_unrecognized() {
        let (mut agent, calls) = echo_agent(2);
        assert_eq!(agent.process("   ").await, AgentReply::EmptyQuery);
        assert_eq!(agent.process("?!?").await, AgentReply::Unrecognized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_negative_results_are_not_cached() {
        let (mut agent, calls) = echo_agent(2);

        assert_eq!(agent.process("missing").await, AgentReply::NoData);
        assert_eq!(agent.process("missing").await, AgentReply::NoData);
        assert!(matches!(agent.process("twins").await, AgentReply::Ambiguous(_)));

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(agent.cache_keys().is_empty());
        assert_eq!(agent.history().count(), 0);
    }

    #[tokio::test]
    async fn test_eviction_order_follows_queries() {
        let (mut agent, _) = echo_agent(2);
        agent.process("a").await;
        agent.process("b").await;
        agent.process("a").await;
        agent.process("c").await;

        assert_eq!(agent.cache_keys(), vec!["a", "c"]);
        assert_eq!(agent.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let (agent, _) = echo_agent(4);
        let mut agent = agent.with_history_limit(2);

        agent.process("one").await;
        agent.process("two").await;
        agent.process("three").await;

        let queries: Vec<&str> = agent.history().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn test_forget_forces_resolve() {
        let (mut agent, calls) = echo_agent(2);
        agent.process("x").await;
        assert!(agent.forget("X").is_some());
        agent.process("x").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_from_config_entity_normalizer() {
        let dataset = Arc::new(Dataset::from_json(crate::dataset::SAMPLE_DATASET).unwrap());
        let mut config = Config::default_config();
        config.agent.normalizer = NormalizerKind::Entity;

        let mut agent = QueryAgent::from_config(&config, dataset).unwrap();
        let first = agent.process("What is the account balance of John Doe in 2023?").await;
        assert_eq!(first.answer(), Some("The account balance of John Doe in 2023 is $1000."));

        let second = agent.process("john doe balance for 2023").await;
        assert!(second.is_cached());
        assert_eq!(agent.cache_keys(), vec!["john doe|2023|account_balance"]);
    }

    #[tokio::test]
    async fn test_from_config_rejects_zero_capacity() {
        let dataset = Arc::new(Dataset::default());
        let mut config = Config::default_config();
        config.cache.capacity = 0;

        assert!(QueryAgent::from_config(&config, dataset).is_err());
    }
}
