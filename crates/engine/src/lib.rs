//! Questline Engine library.
//!
//! This crate contains all server-side code for the Questline onboarding
//! quest engine.
//!
//! ## Structure
//!
//! - `use_cases/` - Operation orchestration around the domain aggregates
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
