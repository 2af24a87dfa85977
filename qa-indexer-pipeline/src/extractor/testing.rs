//! In-memory `RecordSource` for unit tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use qa_indexer_shared::{AnswerDocument, CommentDocument, QuestionDocument};

use crate::errors::PipelineError;
use crate::extractor::source::RecordSource;

pub(crate) fn timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2008, 7, 31)
        .and_then(|d| d.and_hms_opt(21, 42, 52))
        .unwrap()
}

pub(crate) fn question(id: i32) -> QuestionDocument {
    QuestionDocument {
        id,
        body: Some(format!("<p>body {}</p>", id)),
        title: Some(format!("Question {}", id)),
        tags: Some("<rust>".to_string()),
        accepted_answer_id: None,
        owner_user_id: Some(7),
        creation_date: timestamp(),
        score: Some(1),
        last_edit_date: None,
        answers: Vec::new(),
        comments: Vec::new(),
    }
}

pub(crate) fn answer(id: i32, parent_id: i32) -> AnswerDocument {
    AnswerDocument {
        id,
        parent_id: Some(parent_id),
        body: Some(format!("<p>answer {}</p>", id)),
        tags: None,
        owner_user_id: Some(8),
        creation_date: timestamp(),
        score: Some(0),
        last_edit_date: None,
        comments: Vec::new(),
    }
}

#[derive(Default)]
pub(crate) struct MemorySource {
    order: Vec<i32>,
    questions: HashMap<i32, QuestionDocument>,
    answers: HashMap<i32, AnswerDocument>,
    answer_links: HashMap<i32, Vec<i32>>,
    comments: HashMap<i32, CommentDocument>,
    comment_links: HashMap<i32, Vec<i32>>,
    failing: HashSet<i32>,
}

impl MemorySource {
    pub(crate) fn with_questions(ids: &[i32]) -> Self {
        let mut source = Self::default();
        for &id in ids {
            source.order.push(id);
            source.questions.insert(id, question(id));
        }
        source
    }

    pub(crate) fn add_answer(&mut self, question_id: i32, answer_id: i32) {
        self.answers.insert(answer_id, answer(answer_id, question_id));
        self.answer_links.entry(question_id).or_default().push(answer_id);
    }

    pub(crate) fn add_comment(&mut self, post_id: i32, comment_id: i32, text: &str) {
        self.comments.insert(
            comment_id,
            CommentDocument {
                text: Some(text.to_string()),
                creation_date: timestamp(),
                user_id: Some(9),
                score: 0,
            },
        );
        self.comment_links.entry(post_id).or_default().push(comment_id);
    }

    /// Make every fetch touching this post id fail.
    pub(crate) fn fail_answer(&mut self, id: i32) {
        self.failing.insert(id);
    }

    fn check(&self, id: i32) -> Result<(), PipelineError> {
        if self.failing.contains(&id) {
            return Err(PipelineError::database(format!("connection reset fetching {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn question_ids(&self) -> Result<Vec<i32>, PipelineError> {
        Ok(self.order.clone())
    }

    async fn question(&self, id: i32) -> Result<Option<QuestionDocument>, PipelineError> {
        self.check(id)?;
        Ok(self.questions.get(&id).cloned())
    }

    async fn answer_ids(&self, question_id: i32) -> Result<Vec<i32>, PipelineError> {
        Ok(self.answer_links.get(&question_id).cloned().unwrap_or_default())
    }

    async fn answer(&self, id: i32) -> Result<Option<AnswerDocument>, PipelineError> {
        self.check(id)?;
        Ok(self.answers.get(&id).cloned())
    }

    async fn comment_ids(&self, post_id: i32) -> Result<Vec<i32>, PipelineError> {
        Ok(self.comment_links.get(&post_id).cloned().unwrap_or_default())
    }

    async fn comments(&self, ids: &[i32]) -> Result<Vec<CommentDocument>, PipelineError> {
        Ok(ids.iter().filter_map(|id| self.comments.get(id).cloned()).collect())
    }
}
