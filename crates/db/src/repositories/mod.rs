//! Database repositories.

#![allow(missing_docs)]

pub mod comment;
pub mod post;
pub mod report;

pub use comment::{AroundPage, CommentPageFilter, CommentRepository, CommentRow};
pub use post::PostRepository;
pub use report::ReportRepository;
