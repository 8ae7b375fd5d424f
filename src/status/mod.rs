//! Service status model: per-service state and the ordered snapshot taken
//! each run.

#![allow(missing_docs)]

pub mod parser;

use serde::{Deserialize, Serialize};

/// State of one supervised service as reported by the status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Running,
    Failed,
}

impl ServiceStatus {
    /// Stable textual form used by the persisted snapshot file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }

    /// Inverse of [`as_str`](Self::as_str). Unknown words yield `None`.
    #[must_use]
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "running" => Some(Self::Running),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One named service and its observed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub status: ServiceStatus,
}

/// Full mapping of service name to status at one point in time.
///
/// Insertion order is preserved so the persisted file stays readable and the
/// failed set keeps order of first appearance. Names are unique: inserting an
/// existing name overwrites its status in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    entries: Vec<ServiceEntry>,
}

impl StatusSnapshot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a service's status, overwriting any earlier entry for the name.
    pub fn insert(&mut self, name: impl Into<String>, status: ServiceStatus) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            entry.status = status;
        } else {
            self.entries.push(ServiceEntry { name, status });
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ServiceStatus> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names with status `Failed`, in order of first appearance.
    #[must_use]
    pub fn failed_services(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.status == ServiceStatus::Failed)
            .map(|entry| entry.name.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a StatusSnapshot {
    type Item = &'a ServiceEntry;
    type IntoIter = std::slice::Iter<'a, ServiceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
