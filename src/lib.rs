//! HarvestLink - agricultural marketplace backend
//!
//! Connects farmers and firms (buyers): account signup and login, crop
//! listings, a combined user directory, and a mutual friend-connection
//! system backed by MongoDB.
//!
//! ## Services
//!
//! - **Auth**: JWT sessions with argon2 password hashing
//! - **Crops**: listing CRUD for farmers
//! - **Friends**: the relationship state machine (pending requests,
//!   symmetric connections, atomic acceptance)
//! - **SMS**: optional courtesy notifications via an external gateway

pub mod auth;
pub mod config;
pub mod db;
pub mod friends;
pub mod routes;
pub mod server;
pub mod sms;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HarvestError, Result};
