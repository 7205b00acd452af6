use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{AtomError, Result};

/// A MIME media type such as `application/atom+xml;type=entry`.
///
/// Type and subtype are stored lowercased; the parameter section is kept as
/// written (trimmed), since AtomPub compares `type=entry` literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    type_: Cow<'static, str>,
    subtype: Cow<'static, str>,
    parameters: Option<Cow<'static, str>>,
}

impl MediaType {
    pub const SERVICE: MediaType = MediaType::constant("application", "atomsvc+xml", None);
    pub const CATEGORIES: MediaType = MediaType::constant("application", "atomcat+xml", None);
    pub const FEED: MediaType = MediaType::constant("application", "atom+xml", Some("type=feed"));
    pub const ENTRY: MediaType =
        MediaType::constant("application", "atom+xml", Some("type=entry"));

    const fn constant(type_: &'static str, subtype: &'static str, params: Option<&'static str>) -> Self {
        let parameters = match params {
            Some(p) => Some(Cow::Borrowed(p)),
            None => None,
        };
        MediaType {
            type_: Cow::Borrowed(type_),
            subtype: Cow::Borrowed(subtype),
            parameters,
        }
    }

    /// Parses `type/subtype[;parameters]`.
    pub fn parse(value: &str) -> Result<Self> {
        let (essence, parameters) = match value.split_once(';') {
            Some((essence, params)) => {
                let params = params.trim();
                (essence, (!params.is_empty()).then(|| params.to_string()))
            }
            None => (value, None),
        };
        let (type_, subtype) = essence
            .split_once('/')
            .map(|(t, s)| (t.trim(), s.trim()))
            .filter(|(t, s)| !t.is_empty() && !s.is_empty())
            .ok_or_else(|| AtomError::Validation(format!("invalid media type '{}'", value)))?;

        Ok(MediaType {
            type_: Cow::Owned(type_.to_ascii_lowercase()),
            subtype: Cow::Owned(subtype.to_ascii_lowercase()),
            parameters: parameters.map(Cow::Owned),
        })
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The structured-syntax suffix of the subtype (`atom+xml` → `xml`), or
    /// the whole subtype when there is none.
    pub fn subtype_major(&self) -> &str {
        match self.subtype.split_once('+') {
            Some((_, suffix)) if !suffix.is_empty() => suffix,
            _ => &self.subtype,
        }
    }

    pub fn parameters(&self) -> Option<&str> {
        self.parameters.as_deref()
    }

    /// `type/subtype` without parameters.
    pub fn without_parameters(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Whether this (concrete) type satisfies `pattern`.
    ///
    /// `*` in the pattern's type or subtype matches anything; parameters are
    /// only compared when both sides carry them.
    pub fn matches(&self, pattern: &MediaType) -> bool {
        if pattern.type_ == "*" {
            return true;
        }
        if pattern.type_ != self.type_ {
            return false;
        }
        if pattern.subtype == "*" {
            return true;
        }
        if pattern.subtype != self.subtype {
            return false;
        }
        match (&self.parameters, &pattern.parameters) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => true,
        }
    }

    /// [`matches`](Self::matches) against an unparsed pattern; an
    /// unparseable pattern matches nothing.
    pub fn matches_str(&self, pattern: &str) -> bool {
        MediaType::parse(pattern)
            .map(|p| self.matches(&p))
            .unwrap_or(false)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        if let Some(params) = &self.parameters {
            write!(f, ";{}", params)?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = AtomError;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::parse(s)
    }
}

impl PartialEq<str> for MediaType {
    fn eq(&self, other: &str) -> bool {
        MediaType::parse(other).map(|m| *self == m).unwrap_or(false)
    }
}

impl PartialEq<&str> for MediaType {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
