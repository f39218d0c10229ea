//! Info command - show the configured backend

use crate::cache::create_cache;
use crate::cli::args::{InfoArgs, OutputFormat};
use crate::config::{BackendKind, Config};
use crate::diagnostics::TracingSink;
use crate::error::CacheResult;
use console::style;

/// Execute the info command
pub async fn execute(args: InfoArgs, config: &Config) -> CacheResult<()> {
    let cache = create_cache(&config.cache, TracingSink::shared())?;
    let description = cache.description();
    cache.close()?;

    let backend = match config.cache.backend {
        BackendKind::Memory => "memory",
        BackendKind::Http => "http",
    };
    let resilience = &config.cache.resilience;

    match args.format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "description": description,
                "backend": backend,
                "root": config.cache.http.root,
                "resilience": {
                    "enabled": resilience.enabled,
                    "max_error_count": resilience.max_error_count,
                },
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Table => {
            println!("{}", style(&description).bold());
            println!("  {:<16} {}", "backend", backend);
            if let Some(root) = &config.cache.http.root {
                println!("  {:<16} {}", "root", root);
            }
            let breaker = if resilience.enabled {
                format!("after {} errors", resilience.max_error_count)
            } else {
                "off".to_string()
            };
            println!("  {:<16} {}", "circuit breaker", breaker);
        }
    }

    Ok(())
}
