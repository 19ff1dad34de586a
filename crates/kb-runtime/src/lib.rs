//! # Knowledge-Base Runtime Library
//!
//! The composition root of the knowledge-base backend. The binary in
//! `main.rs` is a thin wrapper around [`KnowledgeRuntime`].
//!
//! ## Architectural Patterns
//!
//! - **EDA (Event-Driven Architecture)**: modules communicate via the event bus only
//! - **Explicit registration**: each module exposes one typed registration
//!   function, called once from [`wiring::register_all`]
//! - **Single bus instance**: constructed here and handed to modules, never global

pub mod activity;
pub mod config;
pub mod modules;
pub mod reporter;
pub mod runtime;
pub mod wiring;

pub use activity::ActivityLog;
pub use config::RuntimeConfig;
pub use modules::ModuleContext;
pub use runtime::KnowledgeRuntime;
pub use wiring::ModuleRegistration;
