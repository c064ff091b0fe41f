//! `chainwright extract`: Pull structured fields out of a product review.

use std::path::PathBuf;

use chainwright_core::Variables;

use super::{CmdResult, load_invoker};
use crate::presets;

pub async fn run(text: Option<String>, file: Option<PathBuf>) -> CmdResult {
    let review = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        (None, None) => {
            eprintln!("  (no review given, using the built-in sample)");
            presets::SAMPLE_REVIEW.to_string()
        }
    };

    let (_, invoker) = load_invoker()?;
    let chain = presets::review_extraction(invoker)?;

    let mut vars = Variables::new();
    vars.insert("text".into(), review);
    let fields = chain.run(&vars).await?;

    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
