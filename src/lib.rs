//! Dual-store persistence and orchestration core for an emotion-driven
//! music recommendation backend.
//!
//! Every inbound event (a detection, a set of recommendations, a login) is
//! recorded across two independently-failing stores: a relational history
//! database ([`sqlite_persistence`], [`dal`]) and a per-user aggregate
//! document store ([`profile_store`]). The [`orchestrator`] composes the
//! two behind a single "record this event" pipeline with a best-effort
//! failure policy; the stores are eventually consistent at best and may
//! diverge.

pub mod config;
pub mod dal;
pub mod error;
pub mod orchestrator;
pub mod profile_store;
pub mod sqlite_persistence;

pub use error::StoreError;
