//! Application record — the discovered topology of one deployed app.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::instance::AppInstance;
use crate::domain::service::Service;

/// An application identified by `(org, space, name)`.
///
/// `guid` is `Some` only once discovery has completed; `instances` and
/// `services` are meaningful only after that. A discovered `App` is never
/// mutated in place — rediscovery builds a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub org: String,
    pub space: String,
    pub name: String,
    pub guid: Option<String>,
    pub services: Vec<Service>,
    pub instances: Vec<AppInstance>,
}

impl App {
    /// Create an undiscovered application.
    #[must_use]
    pub fn new(org: impl Into<String>, space: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            space: space.into(),
            name: name.into(),
            guid: None,
            services: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Unique descriptor of the form `org_space_name`.
    #[must_use]
    pub fn id(&self) -> String {
        [self.org.as_str(), self.space.as_str(), self.name.as_str()].join("_")
    }

    /// Number of discovered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether discovery has completed for this value.
    #[must_use]
    pub fn is_discovered(&self) -> bool {
        self.guid.is_some()
    }

    /// All services of the given type.
    #[must_use]
    pub fn services_by_type(&self, kind: &str) -> Vec<&Service> {
        self.services.iter().filter(|s| s.kind == kind).collect()
    }

    /// The first service with the given name.
    #[must_use]
    pub fn service_by_name(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Pretty JSON dump used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "App({})", self.id())
    }
}
