//! Connection-acceptance checking
//!
//! Scrapes the "My Network → Connections" page with human-like
//! scrolling, matches collected usernames against leads with sent
//! invites, promotes matches to accepted via the URL fan-out, and
//! delivers any pending generated message to each fresh connection.

pub mod checker;
pub mod error;
pub mod session;

pub use checker::{CheckReport, ConnectionChecker, MatchedLead, ScrollSettings};
pub use error::{ConnectionCheckError, ConnectionCheckResult};
pub use session::to_session_data;
