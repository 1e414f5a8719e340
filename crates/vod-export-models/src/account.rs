use serde::{Deserialize, Serialize};

/// A provider account as discovered from the catalog server.
///
/// Resolved once per run; every listing and every output root is scoped to
/// one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub name: String,
    /// Upstream server URL as reported by the catalog, informational only.
    pub server_url: Option<String>,
}

impl Account {
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Account-{}", self.id)
        } else {
            self.name.clone()
        }
    }
}
