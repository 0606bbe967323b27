//! Deterministic fake host for integration tests.
//!
//! The real consumer of this workspace is a message-driven runtime: per
//! message it builds a sinked promise, runs it against the model, installs the
//! candidate model, and launches the returned effects. [`engine::Host`] plays
//! that runtime with everything observable: the model is inspectable between
//! ticks and dispatched effects accumulate in an ordered log instead of going
//! anywhere. Tests script the transport by writing response states back into
//! the model through [`engine::Host::respond`].

pub mod engine;
pub mod logging;

pub use engine::Host;
