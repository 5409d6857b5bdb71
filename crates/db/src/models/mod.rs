pub mod enrollment;
pub mod notification;
pub mod session_activity;
pub mod team;
pub mod user;
pub mod workshop;
pub mod workshop_session;

pub use enrollment::*;
pub use notification::*;
pub use session_activity::*;
pub use team::*;
pub use user::*;
pub use workshop::*;
pub use workshop_session::*;

use thiserror::Error;

/// A lifecycle method was called on an entity whose current status does not
/// permit the edge. The entity is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot transition from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: &'static str,
}

impl TransitionError {
    pub fn new(entity: &'static str, from: impl std::fmt::Debug, to: &'static str) -> Self {
        Self {
            entity,
            from: format!("{from:?}"),
            to,
        }
    }
}
