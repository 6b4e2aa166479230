//! Static catalog of triggerable actions.

use crate::client::faults::ClientFault;

/// Where an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionState::Idle => "idle",
            ActionState::Loading => "loading",
            ActionState::Success => "success",
            ActionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// What invoking an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    /// Inject a fault locally, without the backend.
    Fault(ClientFault),
    /// Call an endpoint, path relative to the API base URL.
    Endpoint(&'static str),
}

struct ActionSpec {
    id: &'static str,
    label: &'static str,
    description: &'static str,
    target: ActionTarget,
}

const ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        id: "undefined-access",
        label: "Undefined access",
        description: "Read a property of a missing value",
        target: ActionTarget::Fault(ClientFault::UndefinedAccess),
    },
    ActionSpec {
        id: "promise-rejection",
        label: "Unhandled rejection",
        description: "Fail a detached task nobody awaits",
        target: ActionTarget::Fault(ClientFault::PromiseRejection),
    },
    ActionSpec {
        id: "json-parse",
        label: "Malformed JSON",
        description: "Parse a malformed JSON document",
        target: ActionTarget::Fault(ClientFault::JsonParse),
    },
    ActionSpec {
        id: "network-error",
        label: "Network error",
        description: "Request an address nothing listens on",
        target: ActionTarget::Fault(ClientFault::NetworkError),
    },
    ActionSpec {
        id: "cors-error",
        label: "Cross-origin request",
        description: "Request a foreign origin the client policy blocks",
        target: ActionTarget::Fault(ClientFault::CorsError),
    },
    ActionSpec {
        id: "resource-load",
        label: "Broken image",
        description: "Load an image that does not exist",
        target: ActionTarget::Fault(ClientFault::ResourceLoad),
    },
    ActionSpec {
        id: "health",
        label: "Health check",
        description: "Liveness probe",
        target: ActionTarget::Endpoint("/health"),
    },
    ActionSpec {
        id: "unhandled-exception",
        label: "Unhandled exception",
        description: "Server panics; the top-level middleware answers",
        target: ActionTarget::Endpoint("/errors/unhandled-exception"),
    },
    ActionSpec {
        id: "handled-exception",
        label: "Handled exception",
        description: "Server catches a failure and reports it",
        target: ActionTarget::Endpoint("/errors/handled-exception"),
    },
    ActionSpec {
        id: "sql-error",
        label: "Database error",
        description: "Simulated connection refused from the database",
        target: ActionTarget::Endpoint("/errors/sql-error"),
    },
    ActionSpec {
        id: "timeout",
        label: "Timeout",
        description: "Server suspends for 30 seconds",
        target: ActionTarget::Endpoint("/errors/timeout"),
    },
    ActionSpec {
        id: "cpu-spike",
        label: "CPU spike",
        description: "Server busy-computes for 3 seconds",
        target: ActionTarget::Endpoint("/errors/cpu-spike"),
    },
    ActionSpec {
        id: "memory-spike",
        label: "Memory spike",
        description: "Server allocates and releases 500 MB",
        target: ActionTarget::Endpoint("/errors/memory-spike"),
    },
    ActionSpec {
        id: "dependency-failure",
        label: "Dependency failure",
        description: "Server calls an unreachable downstream service",
        target: ActionTarget::Endpoint("/errors/dependency-failure"),
    },
    ActionSpec {
        id: "serialization-error",
        label: "Serialization error",
        description: "Server serializes a self-referencing graph",
        target: ActionTarget::Endpoint("/errors/serialization-error"),
    },
    ActionSpec {
        id: "auth-failure",
        label: "Auth failure",
        description: "Server rejects the caller (401)",
        target: ActionTarget::Endpoint("/errors/auth-failure"),
    },
    ActionSpec {
        id: "forbidden",
        label: "Forbidden",
        description: "Server denies for a missing role (403)",
        target: ActionTarget::Endpoint("/errors/forbidden"),
    },
    ActionSpec {
        id: "slow-response",
        label: "Slow response",
        description: "Server answers after 5 seconds",
        target: ActionTarget::Endpoint("/errors/slow-response"),
    },
];

/// One triggerable action and its current UI state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    id: &'static str,
    label: &'static str,
    description: &'static str,
    target: ActionTarget,
    state: ActionState,
    last_response: Option<String>,
}

impl ActionDescriptor {
    fn from_spec(spec: &ActionSpec) -> Self {
        Self {
            id: spec.id,
            label: spec.label,
            description: spec.description,
            target: spec.target,
            state: ActionState::Idle,
            last_response: None,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn target(&self) -> ActionTarget {
        self.target
    }

    pub fn class(&self) -> ActionClass {
        match self.target {
            ActionTarget::Fault(_) => ActionClass::Client,
            ActionTarget::Endpoint(_) => ActionClass::Server,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Summary of the last completed invocation.
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }
}

/// The full set of actions, created once and never shrunk.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    actions: Vec<ActionDescriptor>,
}

impl ActionCatalog {
    pub fn standard() -> Self {
        Self {
            actions: ACTIONS.iter().map(ActionDescriptor::from_spec).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter()
    }

    pub fn by_class(&self, class: ActionClass) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter().filter(move |a| a.class() == class)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn mark_loading(&mut self, id: &str) {
        if let Some(action) = self.actions.iter_mut().find(|a| a.id == id) {
            action.state = ActionState::Loading;
        }
    }

    pub(crate) fn mark_finished(&mut self, id: &str, state: ActionState, summary: String) {
        if let Some(action) = self.actions.iter_mut().find(|a| a.id == id) {
            action.state = state;
            action.last_response = Some(summary);
        }
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let catalog = ActionCatalog::standard();
        let ids: HashSet<_> = catalog.iter().map(|a| a.id()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_classes() {
        let catalog = ActionCatalog::standard();
        assert_eq!(catalog.by_class(ActionClass::Client).count(), 6);
        assert_eq!(catalog.by_class(ActionClass::Server).count(), 12);
        assert_eq!(
            catalog.get("cors-error").unwrap().target(),
            ActionTarget::Fault(ClientFault::CorsError)
        );
        assert_eq!(
            catalog.get("forbidden").unwrap().target(),
            ActionTarget::Endpoint("/errors/forbidden")
        );
    }

    #[test]
    fn test_every_action_starts_idle() {
        let catalog = ActionCatalog::standard();
        assert!(catalog
            .iter()
            .all(|a| a.state() == ActionState::Idle && a.last_response().is_none()));
    }

    #[test]
    fn test_transitions() {
        let mut catalog = ActionCatalog::standard();
        catalog.mark_loading("health");
        assert_eq!(catalog.get("health").unwrap().state(), ActionState::Loading);

        catalog.mark_finished("health", ActionState::Success, "200 healthy".into());
        let health = catalog.get("health").unwrap();
        assert_eq!(health.state(), ActionState::Success);
        assert_eq!(health.last_response(), Some("200 healthy"));
    }
}
