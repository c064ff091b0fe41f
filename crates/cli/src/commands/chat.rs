//! `chainwright chat`: Interactive conversation with memory.

use chainwright_config::MemoryStrategy;
use chainwright_core::error::Error;
use chainwright_memory::ConversationMemory;
use chainwright_workflow::ConversationChain;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CmdResult, load_invoker};

pub async fn run(
    strategy: Option<MemoryStrategy>,
    window: Option<usize>,
    max_tokens: Option<usize>,
) -> CmdResult {
    let (mut config, invoker) = load_invoker()?;

    if let Some(strategy) = strategy {
        config.memory.strategy = strategy;
    }
    if let Some(k) = window {
        config.memory.window_size = k;
    }
    if let Some(limit) = max_tokens {
        config.memory.max_token_limit = limit;
    }
    config.validate()?;

    let memory = ConversationMemory::from_config(&config.memory, &invoker)?;
    let mut chain = ConversationChain::new(invoker, memory)?;

    println!();
    println!("  Chainwright chat");
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Memory:    {}", chain.memory().strategy_name());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }
        if !input.is_empty() {
            eprint!("  ...");
            match chain.predict(input).await {
                Ok(reply) => {
                    eprint!("\r     \r");
                    print_reply(&reply);
                }
                Err(Error::Unrecorded { reply, source }) => {
                    eprint!("\r     \r");
                    print_reply(&reply);
                    eprintln!("  [Warning] Summary not updated, will retry: {source}");
                    println!();
                }
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    let context = chain.memory().load();
    println!();
    println!("  ── Memory ({}) ──", chain.memory().strategy_name());
    if context.is_empty() {
        println!("  (empty)");
    } else {
        for line in context.render().lines() {
            println!("  {line}");
        }
    }
    println!();
    Ok(())
}

fn print_reply(reply: &str) {
    println!();
    for line in reply.lines() {
        println!("  AI > {line}");
    }
    println!();
}
