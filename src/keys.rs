//! Provider API-key management.
//!
//! Keys are saved and tested through the Oasis backend only. The key
//! material never travels from this client to a provider directly, so a
//! backend test failure is reported as a failed test rather than
//! falling back to a direct provider call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::Backend;
use crate::session::SessionAuthority;

/// Third-party services the generation pipeline needs credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    ElevenLabs,
    PikaPikaPika,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::ElevenLabs, Provider::PikaPikaPika];
}

/// Outcome of the most recent server-side test of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTestStatus {
    Untested,
    Valid,
    Invalid,
}

/// Per-provider key state tracked by the service.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub key: String,
    pub status: KeyTestStatus,
    pub last_tested: Option<DateTime<Utc>>,
    /// Diagnostic from the last failed test, if any.
    pub message: Option<String>,
}

impl KeyRecord {
    fn new(key: String) -> Self {
        Self {
            key,
            status: KeyTestStatus::Untested,
            last_tested: None,
            message: None,
        }
    }
}

/// Payload of `POST /keys`: one entry per provider, empty string for
/// providers without a key.
#[derive(Debug, Default, Serialize)]
pub struct ProviderKeys {
    pub openai: String,
    pub elevenlabs: String,
    pub pikapikapika: String,
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("you need to be signed in to manage API keys")]
    NotAuthenticated,

    #[error("no key entered for {0:?}")]
    MissingKey(Provider),

    #[error("could not save keys ({0})")]
    SaveFailed(crate::error::ApiError),
}

pub struct ApiKeyService {
    session: Arc<SessionAuthority>,
    backend: Arc<dyn Backend>,
    records: DashMap<Provider, KeyRecord>,
}

impl ApiKeyService {
    pub fn new(session: Arc<SessionAuthority>, backend: Arc<dyn Backend>) -> Self {
        Self {
            session,
            backend,
            records: DashMap::new(),
        }
    }

    /// Enter or replace a key. Changing the key resets its test status.
    pub fn set_key(&self, provider: Provider, key: impl Into<String>) {
        let key = key.into();
        let unchanged = self
            .records
            .get(&provider)
            .is_some_and(|record| record.key == key);
        if !unchanged {
            self.records.insert(provider, KeyRecord::new(key));
        }
    }

    pub fn record(&self, provider: Provider) -> Option<KeyRecord> {
        self.records.get(&provider).map(|r| r.value().clone())
    }

    /// Test one provider key through the backend. The resulting status
    /// is recorded and returned; a backend failure is a failed test,
    /// never a direct call to the provider.
    pub async fn test(&self, provider: Provider) -> Result<KeyTestStatus, KeyError> {
        let key = self
            .records
            .get(&provider)
            .filter(|record| !record.key.trim().is_empty())
            .map(|record| record.key.clone())
            .ok_or(KeyError::MissingKey(provider))?;

        let token = self.token().await?;

        let (status, message) = match self.backend.test_key(&token, provider, &key).await {
            Ok(()) => {
                info!("Key test succeeded for {:?}", provider);
                (KeyTestStatus::Valid, None)
            }
            Err(e) => {
                warn!("Key test failed for {:?}: {}", provider, e);
                (KeyTestStatus::Invalid, Some(e.to_string()))
            }
        };

        if let Some(mut record) = self.records.get_mut(&provider) {
            record.status = status;
            record.last_tested = Some(Utc::now());
            record.message = message;
        }

        Ok(status)
    }

    /// Persist all entered keys server-side.
    pub async fn save(&self) -> Result<(), KeyError> {
        let token = self.token().await?;

        let mut keys = ProviderKeys::default();
        for entry in self.records.iter() {
            let key = entry.value().key.clone();
            match entry.key() {
                Provider::OpenAi => keys.openai = key,
                Provider::ElevenLabs => keys.elevenlabs = key,
                Provider::PikaPikaPika => keys.pikapikapika = key,
            }
        }

        self.backend
            .save_keys(&token, &keys)
            .await
            .map_err(KeyError::SaveFailed)?;
        info!("Provider keys saved");
        Ok(())
    }

    async fn token(&self) -> Result<String, KeyError> {
        self.session
            .bearer_token()
            .await
            .ok_or(KeyError::NotAuthenticated)
    }
}
