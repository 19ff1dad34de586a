//! # Shared Types Crate
//!
//! The shared kernel. Every domain module may depend on this crate; no
//! domain module may depend on another.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: event names and payload fields are declared
//!   once, in [`events::DOMAIN_EVENTS`].
//! - **Names, not types**: modules refer to one another only through
//!   [`ModuleId`] and event names, never through each other's code.

pub mod events;
pub mod module;

pub use events::{definition, definitions_owned_by, EventDefinition, DOMAIN_EVENTS};
pub use module::{ModuleId, UnknownModule};
