//! Backend base URL and REST paths
//!
//! Base format: `http[s]://<host>[:<port>][/<prefix>]`

use std::fmt;
use std::str::FromStr;

use hyper::Uri;
use slotbook_core::{CollectionId, ReservationKind, SlotKey};

use crate::error::{Error, Result};

/// Parsed backend root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    pub secure: bool,
    /// Host as written in the URL, brackets included for IPv6
    pub host: String,
    pub port: u16,
    /// Path prefix without trailing slash, empty for the root
    pub prefix: String,
    authority: String,
}

impl BaseUrl {
    /// Parse from URL string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        // `Uri` drops fragments silently
        if s.contains('#') {
            return Err(Error::InvalidUrl(format!(
                "'{}' must not carry a fragment",
                s
            )));
        }

        let uri: Uri = s
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("'{}': {}", s, e)))?;

        let secure = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            _ => {
                return Err(Error::InvalidUrl(format!(
                    "'{}' must start with http:// or https://",
                    s
                )))
            }
        };

        let authority = uri
            .authority()
            .ok_or_else(|| Error::InvalidUrl(format!("'{}' has no host", s)))?;
        if authority.as_str().contains('@') {
            return Err(Error::InvalidUrl(format!(
                "'{}' must not carry credentials",
                s
            )));
        }
        let host = authority.host();
        if host.is_empty() {
            return Err(Error::InvalidUrl(format!("'{}' has no host", s)));
        }
        // Only `:<port>` may follow the host
        let well_formed = match authority.as_str().strip_prefix(host) {
            Some("") => true,
            Some(rest) => rest.starts_with(':') && authority.port_u16().is_some(),
            None => false,
        };
        if !well_formed || host.starts_with('[') != host.ends_with(']') {
            return Err(Error::InvalidUrl(format!("'{}' has a malformed host or port", s)));
        }
        if uri.query().is_some() {
            return Err(Error::InvalidUrl(format!(
                "'{}' must not carry a query",
                s
            )));
        }

        let default_port = if secure { 443 } else { 80 };
        Ok(Self {
            secure,
            host: host.to_string(),
            port: uri.port_u16().unwrap_or(default_port),
            prefix: uri.path().trim_end_matches('/').to_string(),
            authority: authority.as_str().to_string(),
        })
    }

    /// Value for the `Host` header
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Host name without IPv6 brackets, for connecting and TLS
    pub fn connect_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// `GET` path of a whole collection
    pub fn collection_path(&self, collection: &CollectionId) -> Result<String> {
        Ok(format!(
            "{}/collection/{}",
            self.prefix,
            segment(collection.as_str())?
        ))
    }

    /// `GET` path of the participant's held slot
    pub fn my_slot_path(&self, collection: &CollectionId) -> Result<String> {
        Ok(format!("{}/mySlot", self.collection_path(collection)?))
    }

    /// `POST` path of a book, cancel or assign action
    pub fn action_path(
        &self,
        collection: &CollectionId,
        key: &SlotKey,
        kind: &ReservationKind,
    ) -> Result<String> {
        Ok(format!(
            "{}/teams/{}/slots/{}/{}",
            self.collection_path(collection)?,
            segment(key.team_id.as_str())?,
            segment(key.slot_id.as_str())?,
            action_name(kind)
        ))
    }
}

/// Last path segment the backend expects for an action
pub fn action_name(kind: &ReservationKind) -> &'static str {
    match kind {
        ReservationKind::Book => "book",
        ReservationKind::Release => "cancel",
        ReservationKind::Assign { .. } => "assign",
    }
}

/// Identifiers go into paths unescaped, so only URL-safe characters pass
fn segment(value: &str) -> Result<&str> {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | ':' | '@'))
        && value != "."
        && value != "..";

    if safe {
        Ok(value)
    } else {
        Err(Error::InvalidSegment(value.to_string()))
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{}://{}:{}{}", scheme, self.host, self.port, self.prefix)
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
