//! In-memory model of the registry config document.
//!
//! The document is kept as a generic ordered TOML table rather than a typed
//! struct: the file is shared with the package manager and with the user, so any
//! section or key this crate does not know about must be written back exactly as
//! it was read.  Only the `npmAuth.<registry>` tables are ever interpreted.
//!
//! All operations here are pure; reading and writing the file is the job of the
//! agent's `ConfigStore`.

use toml::{Table, Value};

use crate::domain::registry::{RegistryEntry, AUTH_SECTION};
use crate::error::ConfigError;

const TOKEN_KEY: &str = "token";
const EMAIL_KEY: &str = "email";
const ALWAYS_AUTH_KEY: &str = "alwaysAuth";

/// The parsed contents of `.upmconfig.toml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Table,
}

impl ConfigDocument {
    /// Parses TOML text into a document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let root: Table = toml::from_str(text)?;
        Ok(Self { root })
    }

    /// Builds the first-run document: one placeholder entry for `registry_id`.
    pub fn seeded(registry_id: &str) -> Self {
        let mut auth = Table::new();
        auth.insert(
            registry_id.to_string(),
            Value::Table(entry_table(&RegistryEntry::seed())),
        );
        let mut root = Table::new();
        root.insert(AUTH_SECTION.to_string(), Value::Table(auth));
        Self { root }
    }

    /// Serializes the document back to TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if the table cannot be represented as
    /// TOML (not expected for documents produced by [`ConfigDocument::parse`]).
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(&self.root)?)
    }

    /// Top-level keys in file order.
    pub fn top_level_keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Returns the registry ids listed under the auth section, in file order.
    ///
    /// A document without an auth section has no registries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedSection`] if the auth section is not a table.
    pub fn registry_ids(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .auth_section()?
            .map(|auth| auth.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Returns whether `registry_id` has an entry.
    pub fn contains_registry(&self, registry_id: &str) -> bool {
        matches!(self.auth_section(), Ok(Some(auth)) if auth.contains_key(registry_id))
    }

    /// Returns the current token for `registry_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry, or
    /// [`ConfigError::MalformedSection`] if the entry has no string `token`.
    pub fn get_token(&self, registry_id: &str) -> Result<&str, ConfigError> {
        self.entry(registry_id)?
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(registry_id, "missing string `token`"))
    }

    /// Replaces the token for `registry_id`, leaving every other key of the
    /// entry untouched.  Never creates an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry.
    pub fn set_token(&mut self, registry_id: &str, token: &str) -> Result<(), ConfigError> {
        self.entry_mut(registry_id)?
            .insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        Ok(())
    }

    /// Returns the full entry for `registry_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry, or
    /// [`ConfigError::MalformedSection`] if the entry's fields have the wrong types.
    pub fn get_entry(&self, registry_id: &str) -> Result<RegistryEntry, ConfigError> {
        Value::Table(self.entry(registry_id)?.clone())
            .try_into::<RegistryEntry>()
            .map_err(|e: toml::de::Error| malformed(registry_id, e.message()))
    }

    /// Updates the user-editable fields of an entry.
    ///
    /// The token is not a parameter; it is only written through
    /// [`ConfigDocument::set_token`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegistryNotFound`] if the registry has no entry.
    pub fn set_entry(
        &mut self,
        registry_id: &str,
        email: &str,
        always_auth: bool,
    ) -> Result<(), ConfigError> {
        let entry = self.entry_mut(registry_id)?;
        entry.insert(EMAIL_KEY.to_string(), Value::String(email.to_string()));
        entry.insert(ALWAYS_AUTH_KEY.to_string(), Value::Boolean(always_auth));
        Ok(())
    }

    fn auth_section(&self) -> Result<Option<&Table>, ConfigError> {
        match self.root.get(AUTH_SECTION) {
            None => Ok(None),
            Some(Value::Table(auth)) => Ok(Some(auth)),
            Some(_) => Err(malformed(AUTH_SECTION, "expected a table")),
        }
    }

    fn entry(&self, registry_id: &str) -> Result<&Table, ConfigError> {
        let auth = self
            .auth_section()?
            .ok_or_else(|| ConfigError::RegistryNotFound(registry_id.to_string()))?;
        match auth.get(registry_id) {
            Some(Value::Table(entry)) => Ok(entry),
            Some(_) => Err(malformed(registry_id, "expected a table")),
            None => Err(ConfigError::RegistryNotFound(registry_id.to_string())),
        }
    }

    fn entry_mut(&mut self, registry_id: &str) -> Result<&mut Table, ConfigError> {
        let auth = match self.root.get_mut(AUTH_SECTION) {
            Some(Value::Table(auth)) => auth,
            Some(_) => return Err(malformed(AUTH_SECTION, "expected a table")),
            None => return Err(ConfigError::RegistryNotFound(registry_id.to_string())),
        };
        match auth.get_mut(registry_id) {
            Some(Value::Table(entry)) => Ok(entry),
            Some(_) => Err(malformed(registry_id, "expected a table")),
            None => Err(ConfigError::RegistryNotFound(registry_id.to_string())),
        }
    }
}

fn entry_table(entry: &RegistryEntry) -> Table {
    let mut table = Table::new();
    table.insert(TOKEN_KEY.to_string(), Value::String(entry.token.clone()));
    table.insert(EMAIL_KEY.to_string(), Value::String(entry.email.clone()));
    table.insert(ALWAYS_AUTH_KEY.to_string(), Value::Boolean(entry.always_auth));
    table
}

fn malformed(section: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::MalformedSection {
        section: section.to_string(),
        reason: reason.into(),
    }
}
