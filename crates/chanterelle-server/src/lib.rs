//! Chanterelle API server.
//!
//! Backs the band site with:
//! - A public contact intake endpoint
//! - One-time-passcode login for admins (phone or email allow-list)
//! - Signed bearer tokens gating the contact list
//! - Optional Mailchimp audience subscription for contact submitters

pub mod api;
pub mod audience;
pub mod config;
pub mod error;
pub mod identifier;
pub mod login;
pub mod sender;
pub mod store;
pub mod token;

pub use audience::MailchimpAudience;
pub use config::Config;
pub use error::ApiError;
pub use identifier::{Identifier, IdentifierKind};
pub use login::LoginPolicy;
pub use sender::CodeSender;
pub use store::{ContactRecord, Ledger, PendingCode, Store};
pub use token::{SessionClaims, TokenIssuer};
