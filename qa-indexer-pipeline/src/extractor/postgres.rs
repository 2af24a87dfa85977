//! PostgreSQL implementation of `RecordSource`.
//!
//! Expects the StackOverflow dump layout: `Posts` (questions have
//! `PostTypeId = 1`), `Comments`, and the link tables `QuestionAnswer` and
//! `PostComments`. Only parameterized, read-only statements are issued.

use async_trait::async_trait;
use qa_indexer_shared::{AnswerDocument, CommentDocument, QuestionDocument};
use tokio_postgres::{Client, NoTls, Row, Statement};
use tracing::{error, info};

use crate::errors::PipelineError;
use crate::extractor::source::RecordSource;

const QUESTION_IDS_SQL: &str = "SELECT Id FROM Posts WHERE PostTypeId = 1 ORDER BY Id";

const QUESTION_SQL: &str = "SELECT Id, Body, Title, Tags, AcceptedAnswerId, OwnerUserId, \
     CreationDate, Score, LastEditDate FROM Posts WHERE Id = $1";

const ANSWER_IDS_SQL: &str =
    "SELECT AnswerId FROM QuestionAnswer WHERE QuestionId = $1 ORDER BY AnswerId";

const ANSWER_SQL: &str = "SELECT Id, ParentId, Body, Tags, OwnerUserId, CreationDate, Score, \
     LastEditDate FROM Posts WHERE Id = $1";

const COMMENT_IDS_SQL: &str =
    "SELECT CommentId FROM PostComments WHERE PostId = $1 ORDER BY CommentId";

const COMMENTS_SQL: &str =
    "SELECT Text, CreationDate, UserId, Score FROM Comments WHERE Id = ANY($1) ORDER BY Id";

/// Connection settings for the relational dump.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub search_path: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "postgres".to_string(),
            port: 5432,
            dbname: "dump".to_string(),
            user: None,
            password: None,
            search_path: "public".to_string(),
        }
    }
}

impl PostgresConfig {
    fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .options(&format!("-c search_path={}", self.search_path));
        if let Some(user) = &self.user {
            config.user(user);
        }
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

struct Statements {
    question_ids: Statement,
    question: Statement,
    answer_ids: Statement,
    answer: Statement,
    comment_ids: Statement,
    comments: Statement,
}

/// Record source backed by a single PostgreSQL connection.
pub struct PostgresSource {
    client: Client,
    statements: Statements,
}

impl PostgresSource {
    /// Connect and prepare every statement up front.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, PipelineError> {
        let (client, connection) = config.to_pg_config().connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection error");
            }
        });

        let statements = Statements {
            question_ids: client.prepare(QUESTION_IDS_SQL).await?,
            question: client.prepare(QUESTION_SQL).await?,
            answer_ids: client.prepare(ANSWER_IDS_SQL).await?,
            answer: client.prepare(ANSWER_SQL).await?,
            comment_ids: client.prepare(COMMENT_IDS_SQL).await?,
            comments: client.prepare(COMMENTS_SQL).await?,
        };

        info!(host = %config.host, port = config.port, dbname = %config.dbname, "Connected to Postgres");
        Ok(Self { client, statements })
    }

    async fn ids(&self, statement: &Statement, key: i32) -> Result<Vec<i32>, PipelineError> {
        let rows = self.client.query(statement, &[&key]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, i32>(0).map_err(PipelineError::from))
            .collect()
    }
}

fn question_from_row(row: &Row) -> Result<QuestionDocument, tokio_postgres::Error> {
    Ok(QuestionDocument {
        id: row.try_get(0)?,
        body: row.try_get(1)?,
        title: row.try_get(2)?,
        tags: row.try_get(3)?,
        accepted_answer_id: row.try_get(4)?,
        owner_user_id: row.try_get(5)?,
        creation_date: row.try_get(6)?,
        score: row.try_get(7)?,
        last_edit_date: row.try_get(8)?,
        answers: Vec::new(),
        comments: Vec::new(),
    })
}

fn answer_from_row(row: &Row) -> Result<AnswerDocument, tokio_postgres::Error> {
    Ok(AnswerDocument {
        id: row.try_get(0)?,
        parent_id: row.try_get(1)?,
        body: row.try_get(2)?,
        tags: row.try_get(3)?,
        owner_user_id: row.try_get(4)?,
        creation_date: row.try_get(5)?,
        score: row.try_get(6)?,
        last_edit_date: row.try_get(7)?,
        comments: Vec::new(),
    })
}

fn comment_from_row(row: &Row) -> Result<CommentDocument, tokio_postgres::Error> {
    Ok(CommentDocument {
        text: row.try_get(0)?,
        creation_date: row.try_get(1)?,
        user_id: row.try_get(2)?,
        score: row.try_get(3)?,
    })
}

#[async_trait]
impl RecordSource for PostgresSource {
    async fn question_ids(&self) -> Result<Vec<i32>, PipelineError> {
        let rows = self.client.query(&self.statements.question_ids, &[]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, i32>(0).map_err(PipelineError::from))
            .collect()
    }

    async fn question(&self, id: i32) -> Result<Option<QuestionDocument>, PipelineError> {
        let row = self.client.query_opt(&self.statements.question, &[&id]).await?;
        Ok(row.as_ref().map(question_from_row).transpose()?)
    }

    async fn answer_ids(&self, question_id: i32) -> Result<Vec<i32>, PipelineError> {
        self.ids(&self.statements.answer_ids, question_id).await
    }

    async fn answer(&self, id: i32) -> Result<Option<AnswerDocument>, PipelineError> {
        let row = self.client.query_opt(&self.statements.answer, &[&id]).await?;
        Ok(row.as_ref().map(answer_from_row).transpose()?)
    }

    async fn comment_ids(&self, post_id: i32) -> Result<Vec<i32>, PipelineError> {
        self.ids(&self.statements.comment_ids, post_id).await
    }

    async fn comments(&self, ids: &[i32]) -> Result<Vec<CommentDocument>, PipelineError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        let rows = self.client.query(&self.statements.comments, &[&ids]).await?;
        rows.iter()
            .map(|row| comment_from_row(row).map_err(PipelineError::from))
            .collect()
    }
}
