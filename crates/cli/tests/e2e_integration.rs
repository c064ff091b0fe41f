//! End-to-end integration tests for Chainwright.
//!
//! These tests go from a TOML config file to pipeline, router and memory
//! output, with a scripted provider standing in for the model backend.

use std::io::Write;
use std::sync::Arc;

use chainwright_config::{AppConfig, MemoryStrategy};
use chainwright_core::Variables;
use chainwright_core::error::{Error, ProviderError};
use chainwright_core::invoker::{InvokeOptions, ModelInvoker};
use chainwright_core::message::Role;
use chainwright_core::test_helpers::ScriptedProvider;
use chainwright_memory::{ConversationMemory, Turn};
use chainwright_workflow::{ConversationChain, DEFAULT_DESTINATION, Router, SequentialPipeline};

const CONFIG: &str = r#"
default_provider = "ollama"
default_model = "llama3"
default_temperature = 0.3

[memory]
strategy = "window"
window_size = 2

[[pipelines]]
name = "company"
inputs = ["product"]
outputs = ["company_name", "description"]

[[pipelines.steps]]
template = "What is the best name for a company that makes {product}?"
output_key = "company_name"
temperature = 0.9

[[pipelines.steps]]
template = "Write a 20 word description for the company {company_name}, which makes {product}."
output_key = "description"

[router]
default_template = "Answer briefly: {input}"

[[router.destinations]]
name = "math"
description = "Good for math questions"
template = "You are a mathematician.\n\n{input}"

[[router.destinations]]
name = "physics"
description = "Good for physics questions"
template = "You are a physicist.\n\n{input}"

[[router.destinations]]
name = "history"
description = "Good for history questions"
template = "You are a historian.\n\n{input}"
"#;

fn load_config() -> AppConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    AppConfig::load_from(file.path()).unwrap()
}

fn invoker_for(config: &AppConfig, provider: Arc<ScriptedProvider>) -> ModelInvoker {
    ModelInvoker::new(
        provider,
        InvokeOptions::new(&config.default_model, config.default_temperature),
    )
}

// ── Pipelines ────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_configured_pipeline_runs_in_order() {
    let config = load_config();
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Royal Rest Linens",
        "Royal Rest Linens makes luxurious queen size sheet sets.",
    ]));
    let pipeline = SequentialPipeline::from_config(
        config.pipeline("company").unwrap(),
        invoker_for(&config, provider.clone()),
    )
    .unwrap();

    let inputs = Variables::from([("product".to_string(), "Queen Size Sheet Set".to_string())]);
    let outputs = pipeline.run(&inputs).await.unwrap();

    assert_eq!(outputs["company_name"], "Royal Rest Linens");
    assert!(outputs["description"].starts_with("Royal Rest Linens makes"));
    assert_eq!(
        provider.prompts()[1],
        "Write a 20 word description for the company Royal Rest Linens, which makes Queen Size Sheet Set."
    );

    let requests = provider.requests();
    assert_eq!(requests[0].model, "llama3");
    assert_eq!(requests[0].temperature, 0.9);
    assert_eq!(requests[1].temperature, 0.3);
}

#[tokio::test]
async fn e2e_pipeline_failure_surfaces_provider_error() {
    let config = load_config();
    let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Timeout(
        "ollama: 120s".into(),
    ))]));
    let pipeline = SequentialPipeline::from_config(
        config.pipeline("company").unwrap(),
        invoker_for(&config, provider),
    )
    .unwrap();

    let inputs = Variables::from([("product".to_string(), "socks".to_string())]);
    let err = pipeline.run(&inputs).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::Timeout(_))));
}

// ── Router ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_router_dispatches_to_math() {
    let config = load_config();
    let provider = Arc::new(ScriptedProvider::texts(&[
        "```json\n{\"destination\": \"math\", \"next_inputs\": \"2+2\"}\n```",
        "4",
    ]));
    let router = Router::from_config(
        config.router.as_ref().unwrap(),
        invoker_for(&config, provider.clone()),
    )
    .unwrap();

    let outcome = router.dispatch("what is 2+2").await.unwrap();
    assert_eq!(outcome.destination, "math");
    assert_eq!(outcome.output, "4");

    // Routing is deterministic even though the default temperature is not
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].temperature, 0.0);
    assert_eq!(provider.prompts()[1], "You are a mathematician.\n\n2+2");
}

#[tokio::test]
async fn e2e_router_falls_back_on_garbage() {
    let config = load_config();
    let provider = Arc::new(ScriptedProvider::texts(&[
        "Definitely a physics question!",
        "Because of Rayleigh scattering.",
    ]));
    let router = Router::from_config(
        config.router.as_ref().unwrap(),
        invoker_for(&config, provider.clone()),
    )
    .unwrap();

    let outcome = router.dispatch("Why is the sky blue?").await.unwrap();
    assert_eq!(outcome.destination, DEFAULT_DESTINATION);
    assert!(outcome.fell_back);
    assert_eq!(provider.prompts()[1], "Answer briefly: Why is the sky blue?");
}

// ── Memory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_chat_with_configured_window_memory() {
    let config = load_config();
    assert_eq!(config.memory.strategy, MemoryStrategy::Window);

    let provider = Arc::new(ScriptedProvider::texts(&["Hi Andrew!", "2", "3", "I don't know."]));
    let invoker = invoker_for(&config, provider.clone());
    let memory = ConversationMemory::from_config(&config.memory, &invoker).unwrap();
    let mut chain = ConversationChain::new(invoker, memory).unwrap();

    chain.predict("Hi, my name is Andrew").await.unwrap();
    chain.predict("What is 1+1?").await.unwrap();
    chain.predict("What is 1+2?").await.unwrap();
    let reply = chain.predict("What is my name?").await.unwrap();
    assert_eq!(reply, "I don't know.");

    // The introduction fell out of the two-turn window
    let last_prompt = &provider.prompts()[3];
    assert!(!last_prompt.contains("Andrew"));
    assert!(last_prompt.contains("Human: What is 1+1?\nAI: 2"));

    let context = chain.memory().load();
    assert_eq!(context.turns.len(), 2);
    assert_eq!(context.turns[1].input, "What is my name?");
}

#[tokio::test]
async fn e2e_summary_memory_recovers_after_backend_failure() {
    let config = load_config();
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        }),
        Ok("The human asked about the schedule and lunch.".into()),
    ]));
    let invoker = invoker_for(&config, provider.clone());
    let mut memory_config = config.memory.clone();
    memory_config.strategy = MemoryStrategy::Summary;
    memory_config.max_token_limit = 20;
    let mut memory = ConversationMemory::from_config(&memory_config, &invoker).unwrap();

    memory
        .save(Turn::new("What's on the schedule today?", "A meeting with the product team at 8am."))
        .await
        .unwrap();
    let err = memory
        .save(Turn::new("And after that?", "Lunch at noon with a customer."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::RateLimited { .. })));

    // Nothing was lost
    assert_eq!(memory.load().turns.len(), 2);

    memory.save(Turn::new("Thanks", "You're welcome.")).await.unwrap();
    let context = memory.load();
    assert_eq!(
        context.summary.as_deref(),
        Some("The human asked about the schedule and lunch.")
    );
    assert_eq!(context.turns, vec![Turn::new("Thanks", "You're welcome.")]);

    let messages = context.as_messages();
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages.len(), 3);
}
