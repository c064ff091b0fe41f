//! Question answering over retrieved documents.
//!
//! The "stuff" strategy: every retrieved document goes into one prompt and
//! the model is called once.

use std::sync::Arc;

use chainwright_core::Variables;
use chainwright_core::error::Result;
use chainwright_core::invoker::ModelInvoker;
use chainwright_core::retriever::Retriever;
use chainwright_prompt::PromptTemplate;
use tracing::{debug, info};

const QA_PROMPT: &str = "\
Answer the question using only the documents below. If they do not contain \
the answer, say that you don't know instead of guessing.

Documents:
{context}

Question: {question}
Answer:";

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Answer plus the documents it was grounded on.
#[derive(Debug, Clone)]
pub struct QaAnswer {
    pub answer: String,
    pub documents: Vec<String>,
}

pub struct StuffQa {
    invoker: ModelInvoker,
    retriever: Arc<dyn Retriever>,
    prompt: PromptTemplate,
}

impl StuffQa {
    pub fn new(invoker: ModelInvoker, retriever: Arc<dyn Retriever>) -> Result<Self> {
        Ok(Self {
            invoker,
            retriever,
            prompt: PromptTemplate::new(QA_PROMPT)?,
        })
    }

    pub async fn ask(&self, question: &str) -> Result<QaAnswer> {
        let documents = self.retriever.retrieve(question).await?;
        info!(documents = documents.len(), "Retrieved documents");

        let mut vars = Variables::new();
        vars.insert("context".into(), documents.join(DOCUMENT_SEPARATOR));
        vars.insert("question".into(), question.to_string());

        let prompt = self.prompt.render(&vars)?;
        debug!(chars = prompt.len(), "QA prompt");

        let answer = self.invoker.invoke(&prompt).await?;
        Ok(QaAnswer { answer, documents })
    }
}
