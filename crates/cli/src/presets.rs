//! Built-in pipelines, routers and schemas used when the config file does
//! not define its own.

use chainwright_core::error::Result;
use chainwright_core::invoker::ModelInvoker;
use chainwright_prompt::{PromptTemplate, ResponseSchema, StructuredOutputParser};
use chainwright_workflow::{ExtractionChain, PipelineStep, Router, SequentialPipeline};

/// Name of the built-in review pipeline.
pub const REVIEW_PIPELINE: &str = "review";

pub const SAMPLE_REVIEW: &str = "\
This stand mixer is great. It has six speeds, from a slow fold up to a \
fast whip, and the bowl locks in with a quarter turn. It showed up three \
days after I ordered it, right before my brother's birthday, and he has \
used it every weekend since. It costs a bit more than the other mixers I \
looked at, but the attachments alone make it worth the price.";

pub const SAMPLE_FOREIGN_REVIEW: &str = "\
Je trouve le goût médiocre. La mousse ne tient pas, c'est bizarre. \
J'achète les mêmes dans le commerce et le goût est bien meilleur...";

/// Translate, summarize, detect the language, then reply in that language.
pub fn review_pipeline(invoker: ModelInvoker) -> Result<SequentialPipeline> {
    SequentialPipeline::builder(invoker)
        .name(REVIEW_PIPELINE)
        .input("review")
        .step(PipelineStep::parse(
            "Translate the following review to English:\n\n{review}",
            "english_review",
        )?)
        .step(PipelineStep::parse(
            "Summarize the following review in one sentence:\n\n{english_review}",
            "summary",
        )?)
        .step(PipelineStep::parse(
            "Which language is the following review written in? Answer with the \
             language name only.\n\n{review}",
            "language",
        )?)
        .step(PipelineStep::parse(
            "Write a short follow-up reply to the customer, in {language}, based on \
             this summary of their review:\n\n{summary}",
            "followup_message",
        )?)
        .output("english_review")
        .output("summary")
        .output("followup_message")
        .build()
}

const PHYSICS_TEMPLATE: &str = "\
You are a physics professor who explains things clearly and concisely. \
When you do not know the answer, you say so.

Question:
{input}";

const MATH_TEMPLATE: &str = "\
You are a mathematician. Break the problem into its component parts, solve \
each part, then put them together to answer the whole question.

Question:
{input}";

const HISTORY_TEMPLATE: &str = "\
You are a historian. Answer using the people, events and context of the \
period, and weigh the sources you rely on.

Question:
{input}";

const COMPUTER_SCIENCE_TEMPLATE: &str = "\
You are a computer scientist. Give a clear answer, with pseudocode where it \
helps, and prefer solutions that are efficient in time and space.

Question:
{input}";

/// Router over four single-prompt specialists.
pub fn science_router(invoker: ModelInvoker) -> Result<Router> {
    let specialists = [
        ("physics", "Good for answering questions about physics", PHYSICS_TEMPLATE),
        ("math", "Good for answering math questions", MATH_TEMPLATE),
        ("history", "Good for answering history questions", HISTORY_TEMPLATE),
        (
            "computer science",
            "Good for answering computer science questions",
            COMPUTER_SCIENCE_TEMPLATE,
        ),
    ];

    let mut builder = Router::builder(invoker.clone());
    for (name, description, template) in specialists {
        let pipeline = SequentialPipeline::single(invoker.clone(), name, template)?;
        builder = builder.destination(name, description, pipeline);
    }
    builder.build()
}

/// Gift, delivery time and price remarks from a product review.
pub fn review_extraction(invoker: ModelInvoker) -> Result<ExtractionChain> {
    let parser = StructuredOutputParser::new(vec![
        ResponseSchema::new(
            "gift",
            "Was the item purchased as a gift for someone else? Answer true if yes, \
             false if not or unknown.",
        )
        .with_type("boolean"),
        ResponseSchema::new(
            "delivery_days",
            "How many days did it take for the product to arrive? If this information \
             is not found, output -1.",
        )
        .with_type("integer"),
        ResponseSchema::new(
            "price_value",
            "Any sentences about the value or price, as a list of strings.",
        )
        .with_type("array"),
    ])?;

    let template = PromptTemplate::new(
        "For the following text, extract the information described below.\n\n\
         text: {text}\n\n{format_instructions}",
    )?;
    Ok(ExtractionChain::new(invoker, template, parser))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwright_core::test_helpers::{self, ScriptedProvider};
    use std::sync::Arc;

    fn invoker() -> ModelInvoker {
        test_helpers::invoker(Arc::new(ScriptedProvider::new(vec![])))
    }

    #[test]
    fn presets_are_well_formed() {
        let pipeline = review_pipeline(invoker()).unwrap();
        assert_eq!(pipeline.steps().len(), 4);
        assert_eq!(pipeline.input_keys(), ["review"]);

        let router = science_router(invoker()).unwrap();
        assert_eq!(router.destinations().len(), 4);

        let extraction = review_extraction(invoker()).unwrap();
        assert_eq!(extraction.parser().schemas().len(), 3);
    }
}
