//! Message domain: AI-drafted follow-up messages for accepted connections
//!
//! Drafts are created by the external generation path; this core only
//! reads them and flips them to sent after delivery.

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{MessageError, MessageResult};
pub use models::{Message, MessageStatus};
pub use postgres::PgMessageRepository;
pub use repository::MessageRepository;
