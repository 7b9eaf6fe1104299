//! Registry scoping
//!
//! A registry is either shared by every conversation or private to one.
//! The choice is resolved to a [`GroupKey`] up front and passed explicitly to
//! every registry and storage call.

use super::{Driver, DriverRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Which conversations share a driver registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryScope {
    /// One registry visible to every conversation
    #[default]
    Global,
    /// Each conversation gets its own registry
    PerConversation,
}

impl RegistryScope {
    pub fn group_for(self, conversation_id: i64) -> GroupKey {
        match self {
            RegistryScope::Global => GroupKey::global(),
            RegistryScope::PerConversation => GroupKey(format!("conversation:{conversation_id}")),
        }
    }
}

impl FromStr for RegistryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(RegistryScope::Global),
            "conversation" | "per_conversation" => Ok(RegistryScope::PerConversation),
            other => Err(format!("unknown registry scope: {other}")),
        }
    }
}

/// Key of one registry, stored alongside every persisted driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn global() -> Self {
        Self("global".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for GroupKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All registries known to the process, created on first use
#[derive(Debug, Default)]
pub struct Registries {
    scope: RegistryScope,
    groups: RwLock<HashMap<GroupKey, Arc<DriverRegistry>>>,
}

impl Registries {
    pub fn new(scope: RegistryScope) -> Self {
        Self {
            scope,
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild registries from persisted drivers, preserving their order
    pub fn with_drivers(
        scope: RegistryScope,
        drivers: impl IntoIterator<Item = (GroupKey, Driver)>,
    ) -> Self {
        let mut grouped: HashMap<GroupKey, Vec<Driver>> = HashMap::new();
        for (group, driver) in drivers {
            grouped.entry(group).or_default().push(driver);
        }

        let groups = grouped
            .into_iter()
            .map(|(group, drivers)| (group, Arc::new(DriverRegistry::from_drivers(drivers))))
            .collect();

        Self {
            scope,
            groups: RwLock::new(groups),
        }
    }

    pub fn group_for(&self, conversation_id: i64) -> GroupKey {
        self.scope.group_for(conversation_id)
    }

    pub fn get_or_create(&self, group: &GroupKey) -> Arc<DriverRegistry> {
        if let Some(registry) = self
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group)
        {
            return Arc::clone(registry);
        }

        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(groups.entry(group.clone()).or_default())
    }

    /// Registry serving a conversation under the configured scope
    pub fn for_conversation(&self, conversation_id: i64) -> Arc<DriverRegistry> {
        self.get_or_create(&self.group_for(conversation_id))
    }
}
