//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Error taxonomy shared by every fleet command."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use strum::Display;
use thiserror::Error;

use crate::route::{RouteCommand, RouteStatus};

pub type Result<T> = std::result::Result<T, FleetError>;

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Container,
    Route,
}

/// Every failure leaves fleet state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("route '{id}' cannot {command} while {from}")]
    InvalidTransition {
        id: String,
        from: RouteStatus,
        command: RouteCommand,
    },
    #[error("duplicate container id '{0}' in provisioning list")]
    DuplicateId(String),
}

impl FleetError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn container_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Container,
            id: id.to_owned(),
        }
    }

    pub(crate) fn route_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Route,
            id: id.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        assert_eq!(
            FleetError::container_not_found("BIN-404").to_string(),
            "container 'BIN-404' not found"
        );
        let err = FleetError::InvalidTransition {
            id: "RT-001".into(),
            from: RouteStatus::InProgress,
            command: RouteCommand::Start,
        };
        assert_eq!(err.to_string(), "route 'RT-001' cannot start while in-progress");
    }
}
