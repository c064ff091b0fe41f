//! Extraction chain: one prompt, one structured answer.
//!
//! The template can place the parser's instructions with
//! `{format_instructions}`; they are filled in automatically.

use chainwright_core::Variables;
use chainwright_core::error::{Error, Result};
use chainwright_core::invoker::ModelInvoker;
use chainwright_prompt::{PromptTemplate, StructuredOutput, StructuredOutputParser};
use tracing::debug;

pub const FORMAT_INSTRUCTIONS_KEY: &str = "format_instructions";

#[derive(Debug, Clone)]
pub struct ExtractionChain {
    invoker: ModelInvoker,
    template: PromptTemplate,
    parser: StructuredOutputParser,
}

impl ExtractionChain {
    pub fn new(
        invoker: ModelInvoker,
        template: PromptTemplate,
        parser: StructuredOutputParser,
    ) -> Self {
        Self {
            invoker,
            template,
            parser,
        }
    }

    pub fn parser(&self) -> &StructuredOutputParser {
        &self.parser
    }

    /// Render, invoke at temperature 0, and parse.
    pub async fn run(&self, inputs: &Variables) -> Result<StructuredOutput> {
        if inputs.contains_key(FORMAT_INSTRUCTIONS_KEY) {
            return Err(Error::config(format!(
                "'{FORMAT_INSTRUCTIONS_KEY}' is filled in by the extraction chain"
            )));
        }

        let mut vars = inputs.clone();
        vars.insert(FORMAT_INSTRUCTIONS_KEY.into(), self.parser.format_instructions());
        let prompt = self.template.render(&vars)?;

        let options = self.invoker.options().with_temperature(0.0);
        let raw = self.invoker.invoke_with(&prompt, &options).await?;
        debug!(raw = %raw, "Extraction answer");

        Ok(self.parser.parse(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwright_core::error::ParseError;
    use chainwright_core::test_helpers::{ScriptedProvider, invoker};
    use chainwright_prompt::ResponseSchema;
    use serde_json::json;
    use std::sync::Arc;

    fn chain(provider: &Arc<ScriptedProvider>) -> ExtractionChain {
        let parser = StructuredOutputParser::new(vec![
            ResponseSchema::new("gift", "Was the item a gift?"),
            ResponseSchema::new("delivery_days", "Days to arrive, or -1").with_type("integer"),
        ])
        .unwrap();
        let template = PromptTemplate::new("text: {text}\n\n{format_instructions}").unwrap();
        ExtractionChain::new(invoker(provider.clone()), template, parser)
    }

    fn text(value: &str) -> Variables {
        Variables::from([("text".to_string(), value.to_string())])
    }

    #[tokio::test]
    async fn extracts_fields() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "```json\n{\"gift\": true, \"delivery_days\": 2}\n```",
        ]));
        let out = chain(&provider).run(&text("arrived in two days")).await.unwrap();
        assert_eq!(out["gift"], json!(true));
        assert_eq!(out["delivery_days"], json!(2));

        let prompt = &provider.prompts()[0];
        assert!(prompt.starts_with("text: arrived in two days"));
        assert!(prompt.contains("\"delivery_days\": integer"));
        assert_eq!(provider.requests()[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn parse_failure_surfaces() {
        let provider = Arc::new(ScriptedProvider::texts(&["{\"gift\": true}"]));
        let err = chain(&provider).run(&text("x")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::MissingField(ref f)) if f == "delivery_days"
        ));
    }

    #[tokio::test]
    async fn reserved_variable_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut vars = text("x");
        vars.insert(FORMAT_INSTRUCTIONS_KEY.into(), "mine".into());
        let err = chain(&provider).run(&vars).await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
