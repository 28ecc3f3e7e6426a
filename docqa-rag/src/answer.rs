//! Answerer trait, prompt construction, and the structured answer type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Reply used when the retrieved context does not contain the answer.
pub const NO_ANSWER: &str = "I don't have enough information to answer this question.";

/// A language model that turns a prompt into a natural-language answer.
///
/// Model id and sampling temperature are fixed by the implementation at
/// construction time.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Build the grounded question-answering prompt.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Answer the question based ONLY on the provided context.\n\
         If the context doesn't contain the answer, say \"{NO_ANSWER}\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

/// The result of answering a question over the indexed documents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated answer text.
    pub answer: String,
    /// Distinct sources of the retrieved chunks, in rank order.
    pub sources: Vec<String>,
    /// The context block handed to the answerer.
    pub context_used: String,
}
