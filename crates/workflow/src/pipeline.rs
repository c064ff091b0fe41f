//! Sequential pipelines: chains of prompt steps wired by name.
//!
//! Each step renders its template from the pipeline inputs plus every
//! earlier step's output, invokes the model once, and binds the reply under
//! its `output_key`. Wiring is checked when the pipeline is built, so a step
//! that references a variable nothing provides is a configuration error
//! rather than a failure halfway through a run.
//!
//! ```text
//! review ──▶ [translate] ──▶ english_review ──▶ [summarize] ──▶ summary
//!    └─────▶ [detect]    ──▶ language ──────────────┐              │
//!                                                   ▼              ▼
//!                                           [reply(summary, language)]
//! ```

use std::collections::HashSet;

use chainwright_config::PipelineConfig;
use chainwright_core::Variables;
use chainwright_core::error::{Error, Result};
use chainwright_core::invoker::ModelInvoker;
use chainwright_prompt::PromptTemplate;
use tracing::{debug, info};

/// One model call in a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineStep {
    template: PromptTemplate,
    output_key: String,
    /// Overrides the invoker's default temperature for this step
    temperature: Option<f32>,
}

impl PipelineStep {
    pub fn new(template: PromptTemplate, output_key: impl Into<String>) -> Self {
        Self {
            template,
            output_key: output_key.into(),
            temperature: None,
        }
    }

    /// Parse `template` and build a step from it.
    pub fn parse(template: &str, output_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new(PromptTemplate::new(template)?, output_key))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }
}

/// Builder for [`SequentialPipeline`].
pub struct PipelineBuilder {
    name: String,
    invoker: ModelInvoker,
    inputs: Vec<String>,
    steps: Vec<PipelineStep>,
    outputs: Vec<String>,
}

impl PipelineBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn input(mut self, key: impl Into<String>) -> Self {
        self.inputs.push(key.into());
        self
    }

    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn output(mut self, key: impl Into<String>) -> Self {
        self.outputs.push(key.into());
        self
    }

    /// Validate the wiring and build the pipeline.
    ///
    /// Fails with [`Error::Config`] when:
    /// - there are no steps or no outputs
    /// - an input key is declared twice
    /// - a step references a variable that is neither an input nor the
    ///   output of an earlier step
    /// - a step's `output_key` repeats an input or an earlier output
    /// - a declared output is never produced
    pub fn build(self) -> Result<SequentialPipeline> {
        let name = &self.name;
        if self.steps.is_empty() {
            return Err(Error::config(format!("pipeline '{name}' has no steps")));
        }
        if self.outputs.is_empty() {
            return Err(Error::config(format!("pipeline '{name}' declares no outputs")));
        }

        let mut available: HashSet<&str> = HashSet::new();
        for input in &self.inputs {
            if !available.insert(input.as_str()) {
                return Err(Error::config(format!(
                    "pipeline '{name}' declares input '{input}' twice"
                )));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            if let Some(var) = step
                .template
                .input_variables()
                .iter()
                .find(|v| !available.contains(v.as_str()))
            {
                return Err(Error::config(format!(
                    "pipeline '{name}' step {i} ('{}') uses '{{{var}}}', which is neither \
                     an input nor the output of an earlier step",
                    step.output_key
                )));
            }
            if !available.insert(step.output_key.as_str()) {
                return Err(Error::config(format!(
                    "pipeline '{name}' step {i} output key '{}' is already bound",
                    step.output_key
                )));
            }
        }

        let mut seen = HashSet::new();
        for output in &self.outputs {
            if !available.contains(output.as_str()) {
                return Err(Error::config(format!(
                    "pipeline '{name}' output '{output}' is never produced"
                )));
            }
            if !seen.insert(output.as_str()) {
                return Err(Error::config(format!(
                    "pipeline '{name}' declares output '{output}' twice"
                )));
            }
        }

        Ok(SequentialPipeline {
            name: self.name,
            invoker: self.invoker,
            inputs: self.inputs,
            steps: self.steps,
            outputs: self.outputs,
        })
    }
}

/// An ordered chain of prompt steps.
#[derive(Debug, Clone)]
pub struct SequentialPipeline {
    name: String,
    invoker: ModelInvoker,
    inputs: Vec<String>,
    steps: Vec<PipelineStep>,
    outputs: Vec<String>,
}

impl SequentialPipeline {
    pub fn builder(invoker: ModelInvoker) -> PipelineBuilder {
        PipelineBuilder {
            name: "pipeline".into(),
            invoker,
            inputs: Vec::new(),
            steps: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A one-step pipeline: `{input}` in, model reply out under `text`.
    pub fn single(invoker: ModelInvoker, name: impl Into<String>, template: &str) -> Result<Self> {
        Self::builder(invoker)
            .name(name)
            .input("input")
            .step(PipelineStep::parse(template, "text")?)
            .output("text")
            .build()
    }

    /// Build a pipeline from its configuration entry.
    pub fn from_config(config: &PipelineConfig, invoker: ModelInvoker) -> Result<Self> {
        let mut builder = Self::builder(invoker).name(&config.name);
        for input in &config.inputs {
            builder = builder.input(input);
        }
        for step in &config.steps {
            let mut parsed = PipelineStep::parse(&step.template, &step.output_key)?;
            if let Some(t) = step.temperature {
                parsed = parsed.with_temperature(t);
            }
            builder = builder.step(parsed);
        }
        for output in &config.outputs {
            builder = builder.output(output);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_keys(&self) -> &[String] {
        &self.inputs
    }

    pub fn output_keys(&self) -> &[String] {
        &self.outputs
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Run every step and return the declared outputs.
    pub async fn run(&self, inputs: &Variables) -> Result<Variables> {
        let mut state = self.run_with_intermediates(inputs).await?;
        Ok(self
            .outputs
            .iter()
            .filter_map(|key| state.remove_entry(key))
            .collect())
    }

    /// Run every step and return all inputs and step outputs.
    pub async fn run_with_intermediates(&self, inputs: &Variables) -> Result<Variables> {
        let mut state = Variables::new();
        for key in &self.inputs {
            let value = inputs
                .get(key)
                .ok_or_else(|| Error::MissingVariable(key.clone()))?;
            state.insert(key.clone(), value.clone());
        }

        info!(pipeline = %self.name, steps = self.steps.len(), "Running pipeline");

        for (i, step) in self.steps.iter().enumerate() {
            let prompt = step.template.render(&state)?;
            debug!(
                pipeline = %self.name,
                step = i,
                output_key = %step.output_key,
                %prompt,
                "Rendered step prompt"
            );

            let reply = match step.temperature {
                Some(t) => {
                    let options = self.invoker.options().with_temperature(t);
                    self.invoker.invoke_with(&prompt, &options).await?
                }
                None => self.invoker.invoke(&prompt).await?,
            };

            debug!(pipeline = %self.name, step = i, chars = reply.len(), "Step complete");
            state.insert(step.output_key.clone(), reply);
        }

        Ok(state)
    }

    /// Run a pipeline with exactly one input and one output on a single
    /// string.
    pub async fn run_single(&self, input: &str) -> Result<String> {
        let (Some(input_key), Some(output_key)) = (self.single_input(), self.single_output())
        else {
            return Err(Error::config(format!(
                "pipeline '{}' must have exactly one input and one output to run on a single value",
                self.name
            )));
        };

        let mut vars = Variables::new();
        vars.insert(input_key.to_string(), input.to_string());
        let mut outputs = self.run(&vars).await?;
        outputs
            .remove(output_key)
            .ok_or_else(|| Error::MissingVariable(output_key.to_string()))
    }

    pub(crate) fn single_input(&self) -> Option<&str> {
        match self.inputs.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub(crate) fn single_output(&self) -> Option<&str> {
        match self.outputs.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}
