//! Relational source trait definition.

use async_trait::async_trait;
use qa_indexer_shared::{AnswerDocument, CommentDocument, QuestionDocument};

use crate::errors::PipelineError;

/// Read-only access to the relational dump.
///
/// Each method is one query round trip. Documents returned by `question`
/// and `answer` carry empty child lists; the extractor fills them in.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identifiers of every question.
    async fn question_ids(&self) -> Result<Vec<i32>, PipelineError>;

    /// Scalar fields of one question.
    async fn question(&self, id: i32) -> Result<Option<QuestionDocument>, PipelineError>;

    /// Identifiers of the answers linked to a question.
    async fn answer_ids(&self, question_id: i32) -> Result<Vec<i32>, PipelineError>;

    /// Scalar fields of one answer.
    async fn answer(&self, id: i32) -> Result<Option<AnswerDocument>, PipelineError>;

    /// Identifiers of the comments attached to a post (question or answer).
    async fn comment_ids(&self, post_id: i32) -> Result<Vec<i32>, PipelineError>;

    /// Comments by identifier.
    async fn comments(&self, ids: &[i32]) -> Result<Vec<CommentDocument>, PipelineError>;
}
