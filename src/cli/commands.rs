//! Implementation of the querycache CLI commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::QueryAgent;
use crate::cache::LruCache;
use crate::dataset::{Dataset, SAMPLE_DATASET};
use crate::types::config::Config;
use crate::{QueryCacheError, QueryCacheResult};

/// Writes a default configuration and a sample dataset into `path`.
pub async fn init(path: Option<PathBuf>) -> QueryCacheResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("querycache.toml");
    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
    } else {
        Config::default_config().save(&config_path)?;
        println!("Configuration created at: {}", config_path.display());
    }

    let data_path = target_dir.join("data.json");
    if data_path.exists() {
        tracing::debug!("Dataset already present at {}", data_path.display());
    } else {
        std::fs::write(&data_path, SAMPLE_DATASET)?;
        println!("Sample dataset created at: {}", data_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Check the setup: querycache doctor");
    println!("  2. Ask something: querycache ask \"account balance of John in 2023\"");
    println!("  3. Start a session: querycache repl");

    Ok(())
}

async fn load_agent(config: &Config) -> QueryCacheResult<QueryAgent> {
    let dataset = Dataset::load(&config.dataset.path).await?;
    QueryAgent::from_config(config, Arc::new(dataset))
}

/// Answers a single query.
pub async fn ask(query: &str, config: &Config) -> QueryCacheResult<()> {
    let mut agent = load_agent(config).await?;

    let reply = agent.process(query).await;
    println!("{}", reply);
    println!("Cache: {}", agent.cache());

    Ok(())
}

/// Reads queries line by line from stdin, answering each one.
pub async fn repl(config: &Config) -> QueryCacheResult<()> {
    let mut agent = load_agent(config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Cache capacity {}. Type 'exit' to quit, ':history' or ':stats' for diagnostics.",
        agent.cache().capacity()
    );

    loop {
        print!("Enter your query: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match line.trim() {
            "exit" | "quit" => break,
            ":history" => {
                for record in agent.history() {
                    println!(
                        "  {} {} -> {}",
                        record.asked_at.format("%H:%M:%S"),
                        record.query,
                        record.key
                    );
                }
            }
            ":stats" => {
                let stats = agent.stats();
                println!(
                    "  size {}/{}, hits {}, misses {}, evictions {}, hit rate {:.0}%",
                    stats.size,
                    stats.capacity,
                    stats.hits,
                    stats.misses,
                    stats.evictions,
                    stats.hit_rate() * 100.0
                );
            }
            query => {
                let reply = agent.process(query).await;
                println!("AI Response: {}", reply);
                println!("Cache: {}", agent.cache());
            }
        }
    }

    Ok(())
}

/// Replays the capacity-4 eviction walkthrough.
pub fn demo() -> QueryCacheResult<()> {
    let mut storage = LruCache::new(4)?;

    for (key, value) in [(1, "Apple"), (2, "Banana"), (3, "Car"), (4, "Deer")] {
        storage.put(key, value);
        println!("put({}, {:?})  -> storage {}", key, value, storage);
    }

    for key in [1, 2] {
        storage.get(&key);
        println!("get({})          -> storage {}", key, storage);
    }

    if let Some((key, value)) = storage.put(5, "Elder") {
        println!("put(5, \"Elder\") evicted ({}, {:?})", key, value);
    }
    println!("storage {}", storage);

    match storage.get(&3) {
        Some(value) => println!("get(3) -> {:?}", value),
        None => println!("get(3) -> not found"),
    }

    Ok(())
}

/// Checks configuration and dataset.
pub async fn doctor(config_path: &Path) -> QueryCacheResult<()> {
    println!("Checking querycache setup...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let mut config = if config_path.exists() {
        match Config::load(config_path) {
            Ok(config) => {
                println!("✓ Configuration file: {}", config_path.display());
                println!(
                    "✓ Cache capacity {}, normalizer {:?}",
                    config.cache.capacity, config.agent.normalizer
                );
                config
            }
            Err(e) => {
                issues.push(format!("{}: {}", config_path.display(), e));
                Config::default_config()
            }
        }
    } else {
        warnings.push(format!(
            "No configuration at {}, using defaults (run 'querycache init')",
            config_path.display()
        ));
        Config::default_config()
    };
    if let Some(base) = config_path.parent() {
        config.resolve_paths(base);
    }

    match Dataset::load(&config.dataset.path).await {
        Ok(dataset) if dataset.is_empty() => {
            warnings.push(format!("{} contains no clients", config.dataset.path.display()));
        }
        Ok(dataset) => {
            let years: Vec<&str> = dataset.years().into_iter().collect();
            println!(
                "✓ Dataset {}: {} clients, years {}",
                config.dataset.path.display(),
                dataset.clients.len(),
                years.join(", ")
            );
        }
        Err(e) => issues.push(e.to_string()),
    }

    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ All good! querycache is ready.");
        return Ok(());
    }

    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in &warnings {
            println!("  ⚠ {}", warning);
        }
    }
    if issues.is_empty() {
        return Ok(());
    }

    println!("Problems:");
    for issue in &issues {
        println!("  ✗ {}", issue);
    }
    Err(QueryCacheError::other(format!("doctor found {} problem(s)", issues.len())))
}

/// Shows version.
pub fn version() {
    println!("querycache {}", env!("CARGO_PKG_VERSION"));
}
