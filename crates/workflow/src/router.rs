//! Model-driven routing between specialist pipelines.
//!
//! The router asks the model which destination suits a request, parses
//! the structured answer, and dispatches to that destination's pipeline.
//! A malformed answer never fails the request: it falls back to the
//! default pipeline with the original input.

use std::collections::HashSet;

use chainwright_config::RouterConfig;
use chainwright_core::Variables;
use chainwright_core::error::{Error, Result};
use chainwright_core::invoker::ModelInvoker;
use chainwright_prompt::{PromptTemplate, ResponseSchema, StructuredOutputParser};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pipeline::SequentialPipeline;

/// Sentinel destination name meaning "none of the above".
pub const DEFAULT_DESTINATION: &str = "DEFAULT";

const ROUTER_PROMPT: &str = "\
You are routing a request to the specialist best able to answer it.

Pick exactly one destination from the list below by its name, or \"DEFAULT\" \
if none of them is a good fit. You may reword the request in \"next_inputs\" \
when a clearer phrasing would help the specialist; otherwise copy it \
unchanged.

Destinations:
{destinations}

{format_instructions}

Request:
{input}";

/// A named pipeline the router can pick.
#[derive(Debug, Clone)]
pub struct Destination {
    pub name: String,
    pub description: String,
    pub pipeline: SequentialPipeline,
}

/// The model's routing answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub destination: String,
    /// Input for the chosen pipeline, possibly reworded
    pub next_inputs: String,
}

impl RoutingDecision {
    pub fn is_default(&self) -> bool {
        self.destination.eq_ignore_ascii_case(DEFAULT_DESTINATION)
    }
}

/// What happened during a [`Router::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Destination that ran, or [`DEFAULT_DESTINATION`]
    pub destination: String,
    /// Input handed to that destination's pipeline
    pub input: String,
    pub output: String,
    /// True when the routing answer could not be parsed
    pub fell_back: bool,
}

/// Builder for [`Router`].
pub struct RouterBuilder {
    invoker: ModelInvoker,
    destinations: Vec<Destination>,
    default: Option<SequentialPipeline>,
}

impl RouterBuilder {
    pub fn destination(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        pipeline: SequentialPipeline,
    ) -> Self {
        self.destinations.push(Destination {
            name: name.into(),
            description: description.into(),
            pipeline,
        });
        self
    }

    /// Pipeline used for `DEFAULT`, unknown names and unparsable answers.
    /// Without one, the raw input is sent to the model as is.
    pub fn default_pipeline(mut self, pipeline: SequentialPipeline) -> Self {
        self.default = Some(pipeline);
        self
    }

    /// Validate the table and build the router.
    ///
    /// Fails with [`Error::Config`] on an empty table, an empty name, names
    /// that collide once lowercased, a destination named `DEFAULT`, or a
    /// pipeline without exactly one input and one output.
    pub fn build(self) -> Result<Router> {
        if self.destinations.is_empty() {
            return Err(Error::config("router needs at least one destination"));
        }

        let mut seen = HashSet::new();
        for dest in &self.destinations {
            if dest.name.trim().is_empty() {
                return Err(Error::config("router destination with an empty name"));
            }
            if dest.name.eq_ignore_ascii_case(DEFAULT_DESTINATION) {
                return Err(Error::config(format!(
                    "'{}' is reserved for the default destination",
                    dest.name
                )));
            }
            if !seen.insert(dest.name.to_lowercase()) {
                return Err(Error::config(format!(
                    "router destination '{}' collides with another destination",
                    dest.name
                )));
            }
            check_single_io(&dest.name, &dest.pipeline)?;
        }

        let default = match self.default {
            Some(pipeline) => pipeline,
            None => {
                SequentialPipeline::single(self.invoker.clone(), DEFAULT_DESTINATION, "{input}")?
            }
        };
        check_single_io(DEFAULT_DESTINATION, &default)?;

        let parser = StructuredOutputParser::new(vec![
            ResponseSchema::new(
                "destination",
                "name of the destination to use, or \"DEFAULT\"",
            ),
            ResponseSchema::new(
                "next_inputs",
                "the request to pass on, possibly reworded",
            ),
        ])?;

        Ok(Router {
            invoker: self.invoker,
            destinations: self.destinations,
            default,
            parser,
            prompt: PromptTemplate::new(ROUTER_PROMPT)?,
        })
    }
}

fn check_single_io(name: &str, pipeline: &SequentialPipeline) -> Result<()> {
    if pipeline.single_input().is_none() || pipeline.single_output().is_none() {
        return Err(Error::config(format!(
            "destination '{name}' pipeline must have exactly one input and one output, \
             has {} and {}",
            pipeline.input_keys().len(),
            pipeline.output_keys().len()
        )));
    }
    Ok(())
}

/// Routes a request to one of several destination pipelines.
#[derive(Debug, Clone)]
pub struct Router {
    invoker: ModelInvoker,
    destinations: Vec<Destination>,
    default: SequentialPipeline,
    parser: StructuredOutputParser,
    prompt: PromptTemplate,
}

impl Router {
    pub fn builder(invoker: ModelInvoker) -> RouterBuilder {
        RouterBuilder {
            invoker,
            destinations: Vec::new(),
            default: None,
        }
    }

    /// Build a router whose destinations are single-prompt pipelines.
    pub fn from_config(config: &RouterConfig, invoker: ModelInvoker) -> Result<Self> {
        let mut builder = Self::builder(invoker.clone());
        for dest in &config.destinations {
            let pipeline = SequentialPipeline::single(invoker.clone(), &dest.name, &dest.template)?;
            builder = builder.destination(&dest.name, &dest.description, pipeline);
        }
        let default =
            SequentialPipeline::single(invoker, DEFAULT_DESTINATION, &config.default_template)?;
        builder.default_pipeline(default).build()
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// The routing prompt sent to the model for `input`.
    pub fn routing_prompt(&self, input: &str) -> Result<String> {
        let destinations = self
            .destinations
            .iter()
            .map(|d| format!("{}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mut vars = Variables::new();
        vars.insert("destinations".into(), destinations);
        vars.insert("format_instructions".into(), self.parser.format_instructions());
        vars.insert("input".into(), input.to_string());
        self.prompt.render(&vars)
    }

    /// Ask the model for a routing decision without dispatching.
    ///
    /// Fails with [`Error::RoutingParse`] when the answer does not match the
    /// routing schema, and with [`Error::Provider`] when the call itself
    /// fails.
    pub async fn decide(&self, input: &str) -> Result<RoutingDecision> {
        let prompt = self.routing_prompt(input)?;
        let options = self.invoker.options().with_temperature(0.0);
        let raw = self.invoker.invoke_with(&prompt, &options).await?;
        debug!(raw = %raw, "Routing answer");
        self.parse_decision(&raw)
    }

    /// Route `input` and return the chosen pipeline's output.
    pub async fn route(&self, input: &str) -> Result<String> {
        Ok(self.dispatch(input).await?.output)
    }

    /// Route `input` and report where it went.
    pub async fn dispatch(&self, input: &str) -> Result<RouteOutcome> {
        let (decision, fell_back) = match self.decide(input).await {
            Ok(decision) => (decision, false),
            Err(Error::RoutingParse(reason)) => {
                warn!(%reason, "Unparsable routing answer, using default destination");
                let decision = RoutingDecision {
                    destination: DEFAULT_DESTINATION.into(),
                    next_inputs: input.to_string(),
                };
                (decision, true)
            }
            Err(e) => return Err(e),
        };

        let (name, pipeline) = self.select(&decision);
        info!(destination = %name, fell_back, "Routing request");

        let output = pipeline.run_single(&decision.next_inputs).await?;
        Ok(RouteOutcome {
            destination: name.to_string(),
            input: decision.next_inputs,
            output,
            fell_back,
        })
    }

    /// Exact name match, otherwise the default.
    fn select(&self, decision: &RoutingDecision) -> (&str, &SequentialPipeline) {
        if let Some(dest) = self
            .destinations
            .iter()
            .find(|d| d.name == decision.destination)
        {
            return (dest.name.as_str(), &dest.pipeline);
        }
        if !decision.is_default() {
            warn!(destination = %decision.destination, "Unknown destination, using default");
        }
        (DEFAULT_DESTINATION, &self.default)
    }

    fn parse_decision(&self, raw: &str) -> Result<RoutingDecision> {
        let fields = self
            .parser
            .parse(raw)
            .map_err(|e| Error::RoutingParse(e.to_string()))?;

        let text = |key: &str| -> Result<String> {
            fields
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| Error::RoutingParse(format!("'{key}' is not a string")))
        };

        Ok(RoutingDecision {
            destination: text("destination")?.trim().to_string(),
            next_inputs: text("next_inputs")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwright_config::DestinationConfig;
    use chainwright_core::error::ProviderError;
    use chainwright_core::test_helpers::{ScriptedProvider, invoker};
    use std::sync::Arc;

    fn passthrough(inv: &ModelInvoker, name: &str) -> SequentialPipeline {
        SequentialPipeline::single(inv.clone(), name, "{input}").unwrap()
    }

    fn science_router(provider: &Arc<ScriptedProvider>) -> Router {
        let inv = invoker(provider.clone());
        let single = |name: &str, template: &str| {
            SequentialPipeline::single(inv.clone(), name, template).unwrap()
        };
        Router::builder(inv.clone())
            .destination("math", "Good for math questions", single("math", "MATH: {input}"))
            .destination(
                "physics",
                "Good for physics questions",
                single("physics", "PHYSICS: {input}"),
            )
            .destination(
                "history",
                "Good for history questions",
                single("history", "HISTORY: {input}"),
            )
            .default_pipeline(single("default", "DEFAULT: {input}"))
            .build()
            .unwrap()
    }

    fn decision(destination: &str, next_inputs: &str) -> String {
        format!(
            "```json\n{}\n```",
            serde_json::json!({"destination": destination, "next_inputs": next_inputs})
        )
    }

    #[tokio::test]
    async fn dispatches_to_named_destination() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(r#"{"destination":"math","next_inputs":"2+2"}"#.into()),
            Ok("4".into()),
        ]));
        let router = science_router(&provider);

        let outcome = router.dispatch("what is 2+2").await.unwrap();
        assert_eq!(outcome.destination, "math");
        assert_eq!(outcome.input, "2+2");
        assert_eq!(outcome.output, "4");
        assert!(!outcome.fell_back);

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[1], "MATH: 2+2");
    }

    #[tokio::test]
    async fn routing_call_is_deterministic_and_lists_destinations() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(decision("physics", "What is black body radiation?")),
            Ok("Radiation from an idealized absorber.".into()),
        ]));
        let router = science_router(&provider);
        router.route("What is black body radiation?").await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].temperature, 0.0);

        let routing_prompt = &provider.prompts()[0];
        assert!(routing_prompt.contains("math: Good for math questions"));
        assert!(routing_prompt.contains("history: Good for history questions"));
        assert!(routing_prompt.contains("\"next_inputs\": string"));
        assert!(routing_prompt.ends_with("What is black body radiation?"));
    }

    #[tokio::test]
    async fn unparsable_answer_falls_back_with_original_input() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("I think this is about physics.".into()),
            Ok("fallback answer".into()),
        ]));
        let router = science_router(&provider);

        let outcome = router.dispatch("Why does the sky look blue?").await.unwrap();
        assert!(outcome.fell_back);
        assert_eq!(outcome.destination, DEFAULT_DESTINATION);
        assert_eq!(outcome.output, "fallback answer");
        assert_eq!(provider.prompts()[1], "DEFAULT: Why does the sky look blue?");
    }

    #[tokio::test]
    async fn missing_field_falls_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(r#"{"destination": "math"}"#.into()),
            Ok("ok".into()),
        ]));
        let router = science_router(&provider);
        let outcome = router.dispatch("1+1").await.unwrap();
        assert!(outcome.fell_back);
        assert_eq!(provider.prompts()[1], "DEFAULT: 1+1");
    }

    #[tokio::test]
    async fn default_sentinel_is_case_insensitive() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(decision("default", "Tell me a joke, please")),
            Ok("joke".into()),
        ]));
        let router = science_router(&provider);
        let outcome = router.dispatch("tell me a joke").await.unwrap();
        assert_eq!(outcome.destination, DEFAULT_DESTINATION);
        assert!(!outcome.fell_back);
        assert_eq!(provider.prompts()[1], "DEFAULT: Tell me a joke, please");
    }

    #[tokio::test]
    async fn unknown_destination_goes_to_default() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(decision("biology", "What is DNA?")),
            Ok("a molecule".into()),
        ]));
        let router = science_router(&provider);
        let outcome = router.dispatch("What is DNA?").await.unwrap();
        assert_eq!(outcome.destination, DEFAULT_DESTINATION);
        assert_eq!(provider.prompts()[1], "DEFAULT: What is DNA?");
    }

    #[tokio::test]
    async fn destination_names_match_exactly() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(decision("Math", "2+2")),
            Ok("4".into()),
        ]));
        let router = science_router(&provider);
        let outcome = router.dispatch("2+2").await.unwrap();
        assert_eq!(outcome.destination, DEFAULT_DESTINATION);
    }

    #[tokio::test]
    async fn backend_error_during_routing_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let router = science_router(&provider);
        let err = router.route("anything").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn decide_reports_parse_errors() {
        let provider =
            Arc::new(ScriptedProvider::texts(&[r#"{"destination": 3, "next_inputs": "x"}"#]));
        let router = science_router(&provider);
        let err = router.decide("x").await.unwrap_err();
        assert!(matches!(err, Error::RoutingParse(_)));
    }

    #[test]
    fn rejects_case_colliding_names() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let inv = invoker(provider);
        let err = Router::builder(inv.clone())
            .destination("Math", "a", passthrough(&inv, "a"))
            .destination("math", "b", passthrough(&inv, "b"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn rejects_reserved_default_name() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let inv = invoker(provider);
        let err = Router::builder(inv.clone())
            .destination("Default", "x", passthrough(&inv, "d"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { ref message } if message.contains("reserved")));
    }

    #[test]
    fn rejects_multi_output_destination() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let inv = invoker(provider);
        let two_outputs = SequentialPipeline::builder(inv.clone())
            .input("input")
            .step(crate::pipeline::PipelineStep::parse("{input}", "a").unwrap())
            .step(crate::pipeline::PipelineStep::parse("{a}", "b").unwrap())
            .output("a")
            .output("b")
            .build()
            .unwrap();
        let err = Router::builder(inv)
            .destination("math", "m", two_outputs)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn rejects_empty_table() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        assert!(Router::builder(invoker(provider)).build().is_err());
    }

    #[tokio::test]
    async fn from_config_builds_single_prompt_destinations() {
        let config = RouterConfig {
            destinations: vec![DestinationConfig {
                name: "history".into(),
                description: "Good for history questions".into(),
                template: "You are a historian.\n\n{input}".into(),
            }],
            default_template: "{input}".into(),
        };
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(decision("history", "Who was Ada Lovelace?")),
            Ok("A mathematician.".into()),
        ]));
        let router = Router::from_config(&config, invoker(provider.clone())).unwrap();
        assert_eq!(router.destinations().len(), 1);

        let answer = router.route("who was ada lovelace").await.unwrap();
        assert_eq!(answer, "A mathematician.");
        assert_eq!(provider.prompts()[1], "You are a historian.\n\nWho was Ada Lovelace?");
    }

    #[test]
    fn routing_prompt_keeps_braces_in_input() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let router = science_router(&provider);
        let prompt = router.routing_prompt("solve {x} for x").unwrap();
        assert!(prompt.ends_with("solve {x} for x"));
    }
}
