pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod extract;
pub mod pipeline;
pub mod route;

use chainwright_config::AppConfig;
use chainwright_core::invoker::ModelInvoker;

pub(crate) type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load the config and build an invoker for the default provider, failing
/// early with setup instructions when no API key is available.
pub(crate) fn load_invoker() -> CmdResult<(AppConfig, ModelInvoker)> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let local = matches!(config.default_provider.as_str(), "ollama" | "vllm" | "llamacpp");
    if !config.has_api_key() && !local {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in a .env file):");
        eprintln!("    OPENAI_API_KEY       = 'sk-...'");
        eprintln!("    OPENROUTER_API_KEY   = 'sk-or-v1-...'");
        eprintln!("    CHAINWRIGHT_API_KEY  = 'sk-...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let invoker = chainwright_providers::invoker_from_config(&config)
        .ok_or("No default provider configured")?;
    tracing::debug!(
        provider = %invoker.provider_name(),
        model = %invoker.options().model,
        "Using provider"
    );
    Ok((config, invoker))
}
