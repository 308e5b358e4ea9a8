//! Named endpoint profiles persisted as a flat JSON object.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{AUTH_TOKEN_VAR, BASE_URL_VAR, store_path};
use crate::error::StoreError;

/// One endpoint configuration. Field names match the keys written to the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "ANTHROPIC_BASE_URL")]
    pub base_url: String,
    #[serde(rename = "ANTHROPIC_AUTH_TOKEN")]
    pub auth_token: String,
    #[serde(default)]
    pub description: String,
}

impl Profile {
    pub fn new(base_url: &str, auth_token: &str, description: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            auth_token: auth_token.to_string(),
            description: description.to_string(),
        }
    }

    /// The two variables this profile sets, in apply order
    pub fn env_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (BASE_URL_VAR, self.base_url.as_str()),
            (AUTH_TOKEN_VAR, self.auth_token.as_str()),
        ]
    }
}

/// Profiles keyed by name, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    entries: Vec<(String, Profile)>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile, keeping the position of an existing name
    pub fn insert(&mut self, name: &str, profile: Profile) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = profile;
        } else {
            self.entries.push((name.to_string(), profile));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ProfileSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, profile) in &self.entries {
            map.serialize_entry(name, profile)?;
        }
        map.end()
    }
}

/// The five profiles written on first run
pub fn default_profiles() -> ProfileSet {
    let mut set = ProfileSet::new();
    set.insert(
        "official",
        Profile::new(
            "https://api.anthropic.com",
            "YOUR_OFFICIAL_TOKEN_HERE",
            "Official Anthropic API",
        ),
    );
    set.insert(
        "openai",
        Profile::new(
            "https://api.openai.com/v1",
            "YOUR_OPENAI_TOKEN_HERE",
            "OpenAI API (compatible)",
        ),
    );
    set.insert(
        "azure",
        Profile::new(
            "https://your-azure-openai.openai.azure.com",
            "YOUR_AZURE_TOKEN_HERE",
            "Azure OpenAI Service",
        ),
    );
    set.insert(
        "custom",
        Profile::new(
            "https://your-custom-endpoint.com",
            "YOUR_CUSTOM_TOKEN_HERE",
            "Custom API endpoint",
        ),
    );
    set.insert(
        "local",
        Profile::new(
            "http://localhost:8080",
            "local_token_or_empty",
            "Local development server",
        ),
    );
    set
}

/// Result of [`ConfigStore::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Seed profiles were written; the tokens still need real values.
    Created,
    Existing,
}

/// Owns the lifecycle of the store file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user location
    pub fn open_default() -> Self {
        Self::new(store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the seed profiles unless the file already exists.
    pub fn initialize(&self) -> Result<InitOutcome, StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if self.path.exists() {
            debug!(path = %self.path.display(), "config file already present");
            return Ok(InitOutcome::Existing);
        }

        let content = serde_json::to_string_pretty(&default_profiles()).map_err(|source| {
            StoreError::Encode {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "wrote default config file");
        Ok(InitOutcome::Created)
    }

    /// Read every profile, seeding the file first if it is missing.
    pub fn load(&self) -> Result<ProfileSet, StoreError> {
        if !self.path.exists() {
            self.initialize()?;
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let profiles = parse_profiles(&self.path, &content)?;
        debug!(
            path = %self.path.display(),
            count = profiles.len(),
            "loaded config file"
        );
        Ok(profiles)
    }

    /// Whether the store file exists yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

fn parse_profiles(path: &Path, content: &str) -> Result<ProfileSet, StoreError> {
    let raw: Map<String, Value> =
        serde_json::from_str(content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut set = ProfileSet::new();
    for (name, value) in raw {
        let profile: Profile =
            serde_json::from_value(value).map_err(|source| StoreError::InvalidProfile {
                path: path.to_path_buf(),
                name: name.clone(),
                source,
            })?;
        set.insert(&name, profile);
    }
    Ok(set)
}
