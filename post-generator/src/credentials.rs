use crate::provider::ContentModel;
use crate::types::{GeneratorError, Result};
use crate::utils::mask_secret;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// An API key for one account/quota allocation with the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Keep the filled slots, in slot order. Blank values count as unset.
    pub fn from_slots<I>(slots: I) -> Vec<Credential>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        slots
            .into_iter()
            .flatten()
            .map(|secret| secret.trim().to_string())
            .filter(|secret| !secret.is_empty())
            .map(Credential)
            .collect()
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// One shared client per configured credential, in priority order.
///
/// Built once at startup and handed to every component that needs a client.
/// Clients are only ever read, so sharing them across concurrent requests is fine.
pub struct CredentialPool {
    clients: Vec<Arc<dyn ContentModel>>,
}

impl CredentialPool {
    /// Construct one client per credential with `make_client`.
    ///
    /// Fails with [`GeneratorError::NoCredentials`] when nothing is configured,
    /// since no generation path can work without a key.
    pub fn from_credentials<F>(credentials: &[Credential], mut make_client: F) -> Result<Self>
    where
        F: FnMut(usize, &Credential) -> Result<Arc<dyn ContentModel>>,
    {
        let clients = credentials
            .iter()
            .enumerate()
            .map(|(index, credential)| {
                info!("Initializing provider client #{} ({})", index + 1, credential.masked());
                make_client(index, credential)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_clients(clients)
    }

    pub fn from_clients(clients: Vec<Arc<dyn ContentModel>>) -> Result<Self> {
        if clients.is_empty() {
            return Err(GeneratorError::NoCredentials);
        }
        Ok(Self { clients })
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn client_at(&self, index: usize) -> Result<&Arc<dyn ContentModel>> {
        self.clients.get(index).ok_or(GeneratorError::ClientOutOfRange {
            index,
            count: self.clients.len(),
        })
    }

    /// The highest-priority client, used by the single-attempt paths.
    pub fn primary(&self) -> &Arc<dyn ContentModel> {
        &self.clients[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContentModel>> {
        self.clients.iter()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("clients", &self.clients.iter().map(|c| c.label()).collect::<Vec<_>>())
            .finish()
    }
}
