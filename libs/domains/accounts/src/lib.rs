//! LinkedIn account domain: session bundles and daily rate limits
//!
//! A linked account carries the persisted browser session (cookies plus
//! origin storage) and three independent daily counters: invites,
//! connection checks, messages. The rate-limit manager is the sole
//! authority over those counters.

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod rate_limit;
pub mod repository;

pub use error::{AccountError, AccountResult};
pub use models::{
    DEFAULT_CONNECTION_CHECK_LIMIT, DEFAULT_INVITE_LIMIT, DEFAULT_MESSAGE_LIMIT, LimitKind,
    LimitStatus, LinkedInAccount, SessionBundle, SessionCookie,
};
pub use postgres::PgAccountRepository;
pub use rate_limit::RateLimitManager;
pub use repository::AccountRepository;
