//! `chainwright route`: Send a question to the best-suited specialist.

use chainwright_workflow::Router;

use super::{CmdResult, load_invoker};
use crate::presets;

pub async fn run(input: String) -> CmdResult {
    let (config, invoker) = load_invoker()?;

    let router = match &config.router {
        Some(router_config) => Router::from_config(router_config, invoker)?,
        None => presets::science_router(invoker)?,
    };

    let outcome = router.dispatch(&input).await?;
    if outcome.fell_back {
        eprintln!("  → {} (routing answer was unreadable)", outcome.destination);
    } else {
        eprintln!("  → {}", outcome.destination);
    }
    if outcome.input != input {
        eprintln!("    input: {}", outcome.input);
    }
    println!("{}", outcome.output);
    Ok(())
}
