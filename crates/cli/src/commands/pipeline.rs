//! `chainwright pipeline`: Run a configured or built-in sequential pipeline.

use chainwright_core::Variables;
use chainwright_workflow::SequentialPipeline;

use super::{CmdResult, load_invoker};
use crate::presets;

pub async fn run(name: String, set: Vec<(String, String)>, intermediates: bool) -> CmdResult {
    let (config, invoker) = load_invoker()?;

    let pipeline = match config.pipeline(&name) {
        Some(pipeline_config) => SequentialPipeline::from_config(pipeline_config, invoker)?,
        None if name == presets::REVIEW_PIPELINE => presets::review_pipeline(invoker)?,
        None => {
            let mut known: Vec<&str> = config.pipelines.iter().map(|p| p.name.as_str()).collect();
            known.push(presets::REVIEW_PIPELINE);
            return Err(
                format!("Unknown pipeline '{name}' (available: {})", known.join(", ")).into(),
            );
        }
    };

    let mut inputs: Variables = set.into_iter().collect();
    if pipeline.name() == presets::REVIEW_PIPELINE && !inputs.contains_key("review") {
        eprintln!("  (no review given, using the built-in sample)");
        inputs.insert("review".into(), presets::SAMPLE_FOREIGN_REVIEW.into());
    }

    let outputs = if intermediates {
        pipeline.run_with_intermediates(&inputs).await?
    } else {
        pipeline.run(&inputs).await?
    };

    for (key, value) in &outputs {
        println!("── {key} ──");
        println!("{}", value.trim());
        println!();
    }
    Ok(())
}

/// Parse a `key=value` argument.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("review=Great product=yes").unwrap(),
            ("review".into(), "Great product=yes".into())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
