//! Browser automation for LinkedIn outreach
//!
//! Drives a persistent headless Chromium context (one profile directory
//! per account) through session validation, the Connect flow, and the
//! Message flow. Selector tables live in [`selectors`] and are the only
//! defense against LinkedIn DOM churn; treat them as configuration.

pub mod browser;
pub mod dom;
pub mod error;
pub mod invites;
pub mod messaging;
pub mod pacing;
pub mod selectors;
pub mod session;

pub use browser::BrowserSession;
pub use chromiumoxide::page::Page;
pub use error::{AutomationError, AutomationResult, Interrupt};
pub use invites::{
    InviteLead, InviteObserver, InviteOutcome, InviteProgress, InviteResults, InviteRunner,
    InviteStage, LeadStatusWriter,
};
pub use messaging::MessageSender;
pub use session::{SessionCookie, SessionData, SessionValidator, SessionVerdict};
