//! # Q&A Indexer Shared
//!
//! Shared types used by every stage of the Q&A corpus indexer: the
//! denormalized question document written to the archive, the content
//! address it is stored under, vector point identifiers and the derived
//! metadata patched onto indexed points.

pub mod address;
pub mod document;
pub mod metadata;
pub mod point;

pub use address::{ContentAddress, ParseAddressError};
pub use document::{AnswerDocument, CommentDocument, QuestionDocument};
pub use metadata::{DerivedMetadata, MetadataError};
pub use point::PointId;
