//! recibo: a self-hosted receipt generation service.
//!
//! Declarative layouts plus business/item data in, print-quality PDF and PNG
//! artifacts out, gated by a per-user credit balance and subscription state.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod render;
