//! Client record store

use super::{load, load_strict, new_id, save, CLIENTS_KEY};
use crate::consistency;
use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::types::{Client, ClientStatus, ClientUpdate, NewClient};
use chrono::Utc;

/// Repository over the client collection.
pub struct ClientStore<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> ClientStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    /// All clients in insertion order; empty if storage cannot be read.
    pub fn get_all(&self) -> Vec<Client> {
        load(self.kv, CLIENTS_KEY)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Client> {
        self.get_all().into_iter().find(|c| c.id == id)
    }

    pub fn get_by_status(&self, status: ClientStatus) -> Vec<Client> {
        self.get_all()
            .into_iter()
            .filter(|c| c.status == status)
            .collect()
    }

    /// Case-insensitive match on name, email or company.
    pub fn search(&self, query: &str) -> Vec<Client> {
        let needle = query.to_lowercase();
        self.get_all()
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.email.to_lowercase().contains(&needle)
                    || c.company
                        .as_deref()
                        .is_some_and(|company| company.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn add(&self, new: NewClient) -> Result<Client> {
        if new.name.trim().is_empty() {
            return Err(Error::Validation("client name must not be empty".to_string()));
        }

        let mut clients: Vec<Client> = load_strict(self.kv, CLIENTS_KEY)?;
        let now = Utc::now();
        let client = Client {
            id: new_id(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            company: new.company,
            address: new.address,
            status: new.status,
            project_count: 0,
            created_at: now,
            updated_at: now,
        };
        clients.push(client.clone());
        save(self.kv, CLIENTS_KEY, &clients)?;

        tracing::info!(client_id = %client.id, name = %client.name, "Client created");
        Ok(client)
    }

    /// Apply a partial update. Renaming re-syncs the cached name on projects.
    pub fn update(&self, id: &str, update: ClientUpdate) -> Result<Client> {
        let mut clients: Vec<Client> = load_strict(self.kv, CLIENTS_KEY)?;
        let client = clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ClientNotFound(id.to_string()))?;

        let renamed = update.name.as_ref().is_some_and(|n| *n != client.name);
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("client name must not be empty".to_string()));
            }
            client.name = name;
        }
        if let Some(email) = update.email {
            client.email = email;
        }
        if let Some(phone) = update.phone {
            client.phone = Some(phone);
        }
        if let Some(company) = update.company {
            client.company = Some(company);
        }
        if let Some(address) = update.address {
            client.address = Some(address);
        }
        if let Some(status) = update.status {
            client.status = status;
        }
        client.updated_at = Utc::now();
        let updated = client.clone();
        save(self.kv, CLIENTS_KEY, &clients)?;

        if renamed {
            consistency::resync_client_name(self.kv, &updated.id, &updated.name);
        }

        tracing::info!(client_id = %updated.id, "Client updated");
        Ok(updated)
    }

    /// Delete a client. Its projects are left in place.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut clients: Vec<Client> = load_strict(self.kv, CLIENTS_KEY)?;
        let before = clients.len();
        clients.retain(|c| c.id != id);
        if clients.len() == before {
            return Err(Error::ClientNotFound(id.to_string()));
        }
        save(self.kv, CLIENTS_KEY, &clients)?;

        tracing::info!(client_id = id, "Client deleted");
        Ok(())
    }
}
