//! `chainwright config`: Show the effective configuration.

use chainwright_config::AppConfig;

use super::CmdResult;

pub async fn run(starter: bool) -> CmdResult {
    if starter {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let path = AppConfig::config_dir().join("config.toml");
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };

    println!("📋 Chainwright configuration");
    let status = if path.exists() {
        ""
    } else {
        " (not found, using defaults)"
    };
    println!("   File:        {}{status}", path.display());
    println!("   Provider:    {}", config.default_provider);
    println!("   Model:       {}", config.default_model);
    println!("   Temperature: {}", config.default_temperature);
    println!(
        "   Max tokens:  {}",
        config.default_max_tokens.map_or_else(|| "provider default".to_string(), |n| n.to_string())
    );
    println!("   API key:     {}", if config.has_api_key() { "set" } else { "missing" });
    println!(
        "   Memory:      {:?} (window {}, token limit {})",
        config.memory.strategy, config.memory.window_size, config.memory.max_token_limit
    );

    let mut providers: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    providers.sort_unstable();
    if !providers.is_empty() {
        println!("   Providers:   {}", providers.join(", "));
    }

    if config.pipelines.is_empty() {
        println!("   Pipelines:   (none, built-in 'review' available)");
    } else {
        for p in &config.pipelines {
            println!(
                "   Pipeline:    {} ({} -> {}, {} steps)",
                p.name,
                p.inputs.join(", "),
                p.outputs.join(", "),
                p.steps.len()
            );
        }
    }

    match &config.router {
        Some(router) => {
            let names: Vec<&str> = router.destinations.iter().map(|d| d.name.as_str()).collect();
            println!("   Router:      {}", names.join(", "));
        }
        None => println!("   Router:      (none, built-in science router available)"),
    }

    Ok(())
}
