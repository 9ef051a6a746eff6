//! UID-routed control facade.
//!
//! [`Engine`] owns a [`Registry`](crate::Registry) and a
//! [`LinkGraph`](crate::LinkGraph) and keeps both consistent while an API
//! surface adds components, resizes dynamic connectors, writes pins and
//! triggers executions.

#[allow(clippy::module_inception)]
mod engine;
mod error;

pub use engine::Engine;
pub use error::EngineError;
