//! Lead domain: campaign leads, the dual-tier state store, and eligibility
//!
//! PostgreSQL is the store of record; the per-campaign Redis hash
//! `campaign:{id}:leads` is a read-through cache. Writes go cache first,
//! store second; the store write is the one that may fail the caller.
//! Cross-campaign fan-out is keyed by the lead's profile URL.

pub mod cache;
pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod state;
pub mod url;

pub use cache::{CachedLeadUpdate, LeadCache, RedisLeadCache};
pub use error::{LeadError, LeadResult};
pub use models::{
    CachedLead, CampaignStatus, EligibleLeads, InviteStatus, Lead, LeadAnalytics, LeadSource,
    ScrapeStatus, lead_analytics,
};
pub use postgres::PgLeadRepository;
pub use repository::LeadRepository;
pub use state::LeadStateManager;
pub use url::{extract_username, normalize_profile_url};
