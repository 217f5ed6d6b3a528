//! Action contact metadata
//!
//! A contact is one email address, a non-empty list of them, or the literal
//! `tbd` sentinel. The sentinel is accepted while owners are being tracked
//! down; the registry reports it as a diagnostic rather than failing.
//!
//! Addresses may also be written as `Display Name <address>`; only the bare
//! address is kept.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContactError;
use crate::params::describe;

/// Sentinel accepted in place of real contact data
pub const UNSET_CONTACT: &str = "tbd";

/// Email pattern: dot-atom local part, at least one dot in the domain
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

/// `Name <address>` form
static NAMED_EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w ]*?)\s*<(.*)>\s*$").unwrap());

/// Contact exactly as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawContact {
    One(String),
    Many(Vec<String>),
    /// Anything else; rejected when the action is validated
    Other(Value),
}

/// A syntactically valid email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(value: &str) -> Result<Self, ContactError> {
        let address = match NAMED_EMAIL_RE.captures(value) {
            Some(caps) => caps.get(2).map_or("", |m| m.as_str()),
            None => value,
        };
        let trimmed = address.trim();
        if EMAIL_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ContactError::InvalidEmail {
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(EmailAddress),
    Emails(Vec<EmailAddress>),
    Unset,
}

impl Contact {
    /// Validate the raw union. The sentinel only counts as a bare string.
    pub fn parse(raw: &RawContact) -> Result<Self, ContactError> {
        match raw {
            RawContact::One(value) if value == UNSET_CONTACT => Ok(Self::Unset),
            RawContact::One(value) => EmailAddress::parse(value).map(Self::Email),
            RawContact::Many(values) if values.is_empty() => Err(ContactError::EmptyList),
            RawContact::Many(values) => values
                .iter()
                .map(|v| EmailAddress::parse(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Emails),
            RawContact::Other(value) => Err(ContactError::InvalidType {
                found: describe(value).to_string(),
            }),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// All addresses, in configuration order
    pub fn addresses(&self) -> Vec<&EmailAddress> {
        match self {
            Self::Email(email) => vec![email],
            Self::Emails(emails) => emails.iter().collect(),
            Self::Unset => Vec::new(),
        }
    }
}

impl From<&Contact> for RawContact {
    fn from(contact: &Contact) -> Self {
        match contact {
            Contact::Email(email) => RawContact::One(email.to_string()),
            Contact::Emails(emails) => {
                RawContact::Many(emails.iter().map(ToString::to_string).collect())
            }
            Contact::Unset => RawContact::One(UNSET_CONTACT.to_string()),
        }
    }
}
