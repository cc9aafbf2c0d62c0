//! Composition clients.
//!
//! A client is one place a tile can live (a browser window, a screen, a
//! device). Every host knows which client it is and which others exist.

use serde::{Deserialize, Serialize};

/// One composition client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Free-form device class, e.g. `desktop` or `tablet`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Client {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Display label, `name (kind)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.kind)
    }
}

/// Known clients plus the id of the one this host runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDirectory {
    current: String,
    clients: Vec<Client>,
}

impl ClientDirectory {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            clients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_clients(mut self, clients: impl IntoIterator<Item = Client>) -> Self {
        for client in clients {
            self.insert(client);
        }
        self
    }

    /// Add a client, replacing any previous entry with the same id.
    pub fn insert(&mut self, client: Client) {
        match self.clients.iter_mut().find(|c| c.id == client.id) {
            Some(existing) => *existing = client,
            None => self.clients.push(client),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Client> {
        let index = self.clients.iter().position(|c| c.id == id)?;
        Some(self.clients.remove(index))
    }

    #[must_use]
    pub fn current_id(&self) -> &str {
        &self.current
    }

    #[must_use]
    pub fn is_current(&self, id: &str) -> bool {
        self.current == id
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    /// All clients, in insertion order.
    #[must_use]
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Clients a tile on this host may be moved to.
    pub fn targets(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter().filter(move |c| c.id != self.current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ClientDirectory {
        ClientDirectory::new("c1").with_clients([
            Client::new("c1", "Wall", "display"),
            Client::new("c2", "Pad", "tablet"),
            Client::new("c3", "Laptop", "desktop"),
        ])
    }

    #[test]
    fn test_label() {
        assert_eq!(Client::new("c2", "Pad", "tablet").label(), "Pad (tablet)");
    }

    #[test]
    fn test_targets_exclude_current() {
        let dir = directory();
        let ids: Vec<&str> = dir.targets().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c3"]);
        assert!(dir.is_current("c1"));
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut dir = directory();
        dir.insert(Client::new("c2", "Tablet", "tablet"));
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.get("c2").map(|c| c.name.as_str()), Some("Tablet"));
    }

    #[test]
    fn test_remove() {
        let mut dir = directory();
        assert!(dir.remove("c3").is_some());
        assert!(dir.remove("c3").is_none());
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_client_wire_shape() {
        let value = serde_json::to_value(Client::new("c2", "Pad", "tablet")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "c2", "name": "Pad", "type": "tablet"})
        );
    }
}
