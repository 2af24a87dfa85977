//! Hierarchical extractor.
//!
//! Assembles one denormalized `QuestionDocument` per question id from the
//! relational source: the question's scalar fields, its comments, and its
//! answers, each with their own comments.

mod id_cache;
mod postgres;
mod source;
#[cfg(test)]
pub(crate) mod testing;

pub use id_cache::{IdCache, DEFAULT_ID_DUMP_PATH};
pub use postgres::{PostgresConfig, PostgresSource};
pub use source::RecordSource;

use std::sync::Arc;

use qa_indexer_shared::{CommentDocument, QuestionDocument};
use tracing::{debug, instrument};

use crate::errors::PipelineError;

/// Builds question documents from a `RecordSource`.
///
/// Field values reflect a read at call time; no snapshot isolation spans a
/// whole document tree.
pub struct HierarchicalExtractor {
    source: Arc<dyn RecordSource>,
}

impl HierarchicalExtractor {
    /// Create a new extractor over the given source.
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// The underlying source.
    pub fn source(&self) -> &dyn RecordSource {
        self.source.as_ref()
    }

    /// Extract one question with all nested children.
    ///
    /// Any failed child fetch fails the whole document.
    #[instrument(skip(self))]
    pub async fn extract(&self, question_id: i32) -> Result<QuestionDocument, PipelineError> {
        let mut question = self
            .source
            .question(question_id)
            .await?
            .ok_or_else(|| PipelineError::RecordNotFound(format!("question {}", question_id)))?;

        question.comments = self.post_comments(question_id).await?;

        let answer_ids = self.source.answer_ids(question_id).await?;
        let mut answers = Vec::with_capacity(answer_ids.len());
        for answer_id in answer_ids {
            let mut answer = self
                .source
                .answer(answer_id)
                .await?
                .ok_or_else(|| PipelineError::RecordNotFound(format!("answer {}", answer_id)))?;
            answer.comments = self.post_comments(answer_id).await?;
            answers.push(answer);
        }
        question.answers = answers;

        debug!(
            answers = question.answers.len(),
            comments = question.total_comments(),
            "Extracted question"
        );
        Ok(question)
    }

    async fn post_comments(&self, post_id: i32) -> Result<Vec<CommentDocument>, PipelineError> {
        let ids = self.source.comment_ids(post_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.source.comments(&ids).await
    }
}
