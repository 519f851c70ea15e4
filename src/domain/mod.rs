//! Core domain model: receipt layouts, receipt data, users, and credits.

pub mod error;
pub mod layout;
pub mod receipt;
pub mod types;
pub mod uploads;
pub mod users;
