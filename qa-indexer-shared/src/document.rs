//! Denormalized question documents.
//!
//! A `QuestionDocument` is the unit of export: one question together with
//! its comments and its answers, each answer carrying its own comments.
//! Field names follow the column names of the source dump so archived
//! files stay readable next to the database they came from.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A comment attached either to a question or to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommentDocument {
    pub text: Option<String>,
    pub creation_date: NaiveDateTime,
    pub user_id: Option<i32>,
    pub score: i32,
}

/// An answer to a question, with its own comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnswerDocument {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub body: Option<String>,
    pub tags: Option<String>,
    pub owner_user_id: Option<i32>,
    pub creation_date: NaiveDateTime,
    pub score: Option<i32>,
    pub last_edit_date: Option<NaiveDateTime>,
    #[serde(rename = "comments", default)]
    pub comments: Vec<CommentDocument>,
}

/// A question with every nested child record.
///
/// Immutable once written to the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionDocument {
    pub id: i32,
    pub body: Option<String>,
    pub title: Option<String>,
    pub tags: Option<String>,
    pub accepted_answer_id: Option<i32>,
    pub owner_user_id: Option<i32>,
    pub creation_date: NaiveDateTime,
    pub score: Option<i32>,
    pub last_edit_date: Option<NaiveDateTime>,
    #[serde(rename = "answers", default)]
    pub answers: Vec<AnswerDocument>,
    #[serde(rename = "comments", default)]
    pub comments: Vec<CommentDocument>,
}

impl QuestionDocument {
    /// Text submitted to the embedding model for this document.
    pub fn index_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Total number of comments in the tree, including those on answers.
    pub fn total_comments(&self) -> usize {
        self.comments.len() + self.answers.iter().map(|a| a.comments.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2008, 7, 31)
            .unwrap()
            .and_hms_milli_opt(21, 42, 52, 667)
            .unwrap()
    }

    fn sample() -> QuestionDocument {
        QuestionDocument {
            id: 4,
            body: Some("<p>How do I convert a decimal to a double?</p>".to_string()),
            title: Some("Convert Decimal to Double".to_string()),
            tags: Some("<c#><floating-point>".to_string()),
            accepted_answer_id: Some(7),
            owner_user_id: Some(8),
            creation_date: timestamp(),
            score: Some(42),
            last_edit_date: None,
            answers: vec![AnswerDocument {
                id: 7,
                parent_id: Some(4),
                body: Some("<p>Use an explicit cast.</p>".to_string()),
                tags: None,
                owner_user_id: Some(9),
                creation_date: timestamp(),
                score: Some(10),
                last_edit_date: None,
                comments: vec![CommentDocument {
                    text: Some("Works for me".to_string()),
                    creation_date: timestamp(),
                    user_id: None,
                    score: 0,
                }],
            }],
            comments: vec![],
        }
    }

    #[test]
    fn test_serializes_source_column_names() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["Id"], 4);
        assert_eq!(value["Title"], "Convert Decimal to Double");
        assert_eq!(value["AcceptedAnswerId"], 7);
        assert!(value["answers"].is_array());
        assert!(value["comments"].is_array());
        assert_eq!(value["answers"][0]["ParentId"], 4);
        assert_eq!(value["answers"][0]["comments"][0]["Text"], "Works for me");
    }

    #[test]
    fn test_timestamps_are_iso_text() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["CreationDate"], "2008-07-31T21:42:52.667");
        assert!(value["LastEditDate"].is_null());
    }

    #[test]
    fn test_index_text_is_title() {
        let doc = sample();
        assert_eq!(doc.index_text(), Some("Convert Decimal to Double"));
    }

    #[test]
    fn test_total_comments_counts_nested() {
        assert_eq!(sample().total_comments(), 1);
    }
}
