use clap::Parser;
use querycache::cli::{Cli, Commands};
use querycache::types::config::Config;
use querycache::QueryCacheResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> QueryCacheResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let (mut config, config_error) = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(config) => (config, None),
            Err(e) => (Config::default_config(), Some(e)),
        }
    } else {
        (Config::default_config(), None)
    };

    if let Some(base) = cli.config.parent() {
        config.resolve_paths(base);
    }

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("querycache={}", log_level)
            .parse()
            .unwrap_or_else(|_| "querycache=info".parse().expect("fallback directive is valid")),
    );

    let json = config.general.log_format == "json";
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    // Commands that answer queries refuse a broken configuration; doctor
    // reports it itself.
    match config_error {
        Some(e) if matches!(cli.command, Commands::Ask { .. } | Commands::Repl) => {
            tracing::error!("Invalid configuration {}: {}", cli.config.display(), e);
            return Err(e);
        }
        Some(e) => tracing::warn!("Ignoring {}: {}", cli.config.display(), e),
        None => tracing::debug!("Configuration loaded from: {}", cli.config.display()),
    }

    match cli.command {
        Commands::Init { path } => {
            querycache::cli::commands::init(path).await?;
        }
        Commands::Ask { query } => {
            querycache::cli::commands::ask(&query.join(" "), &config).await?;
        }
        Commands::Repl => {
            querycache::cli::commands::repl(&config).await?;
        }
        Commands::Demo => {
            querycache::cli::commands::demo()?;
        }
        Commands::Doctor => {
            querycache::cli::commands::doctor(&cli.config).await?;
        }
        Commands::Version => {
            querycache::cli::commands::version();
        }
    }

    Ok(())
}
