//! Connection credentials.

use std::fmt;

use otrs_domain::config::{env_var_name, DEFAULT_URI};

/// One of the four values required before a connection can be made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Location,
    Uri,
    Username,
    Password,
}

impl CredentialField {
    /// Validation and env-seeding order.
    pub const ALL: [CredentialField; 4] = [
        CredentialField::Location,
        CredentialField::Uri,
        CredentialField::Username,
        CredentialField::Password,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialField::Location => "location",
            CredentialField::Uri => "uri",
            CredentialField::Username => "username",
            CredentialField::Password => "password",
        }
    }

    /// Name of the variable that seeds this field (`OTRS_API_LOCATION`, ...).
    pub fn env_var(self) -> String {
        env_var_name(self.as_str())
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location, namespace, and login. Values are stored raw; emptiness is
/// only checked when a connection is about to be created.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    location: String,
    uri: String,
    username: String,
    password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            location: String::new(),
            uri: DEFAULT_URI.into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Credentials {
    pub fn get(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::Location => &self.location,
            CredentialField::Uri => &self.uri,
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
        }
    }

    pub(crate) fn set(&mut self, field: CredentialField, value: String) {
        let slot = match field {
            CredentialField::Location => &mut self.location,
            CredentialField::Uri => &mut self.uri,
            CredentialField::Username => &mut self.username,
            CredentialField::Password => &mut self.password,
        };
        *slot = value;
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Fields that are still empty, in [`CredentialField::ALL`] order.
    pub fn missing(&self) -> Vec<CredentialField> {
        CredentialField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("location", &self.location)
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}
