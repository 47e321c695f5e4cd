//! `agentdesk doctor`: Diagnose system health.

use agentdesk_agent::AgentRegistry;
use agentdesk_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("agentdesk doctor: system diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file: {}", config_path.display());
    } else {
        println!("  ℹ️  No config file at {} (using defaults)", config_path.display());
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    match config.api_key_prefix() {
        Some(prefix) => println!("  ✅ API key configured ({prefix})"),
        None => {
            println!("  ❌ No API key: set GROQ_API_KEY in the environment or .env");
            issues += 1;
        }
    }

    if config.has_api_key() {
        let providers = agentdesk_providers::build_from_config(&config)?;
        match providers.default() {
            Some(provider) => match provider.list_models().await {
                Ok(models) => {
                    println!(
                        "  ✅ Provider '{}' reachable ({} models)",
                        provider.name(),
                        models.len()
                    );
                    issues += check_models(&config, &models);
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ Default provider '{}' not configured", config.default_provider);
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Warn about agent models the provider does not list. Returns the issue count.
fn check_models(config: &AppConfig, available: &[String]) -> usize {
    if available.is_empty() {
        return 0;
    }

    let registry = AgentRegistry::from_config(config);
    let mut wanted: Vec<&str> = registry
        .descriptors()
        .iter()
        .map(|a| a.model.as_str())
        .collect();
    wanted.push(&config.vision.model);
    wanted.sort_unstable();
    wanted.dedup();

    let mut missing = 0;
    for model in wanted {
        if available.iter().any(|m| m == model) {
            println!("  ✅ Model available: {model}");
        } else {
            println!("  ⚠️  Model not listed by provider: {model}");
            missing += 1;
        }
    }
    missing
}
