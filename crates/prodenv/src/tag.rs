// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Tags name a preferred version of a product.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

#[cfg(test)]
#[path = "./tag_test.rs"]
mod tag_test;

/// Qualifier prefix for tags owned by a single user.
pub const USER_TAG_PREFIX: &str = "user:";

/// Tag selecting the version that is currently set up.
pub const SETUP_TAG: &str = "setup";

/// Tag selecting the newest declared version.
pub const NEWEST_TAG: &str = "newest";

/// Global tags that are always recognised.
pub const BUILTIN_TAGS: &[&str] = &["current", "stable", NEWEST_TAG, SETUP_TAG];

/// Whether a tag is shared by everyone or scoped to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagScope {
    Global,
    User,
}

/// A named preference label such as `current` or `user:alice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    scope: TagScope,
    name: String,
}

impl Tag {
    pub fn global<S: Into<String>>(name: S) -> Self {
        Self {
            scope: TagScope::Global,
            name: name.into(),
        }
    }

    pub fn user<S: Into<String>>(name: S) -> Self {
        Self {
            scope: TagScope::User,
            name: name.into(),
        }
    }

    /// The bare tag name, without any qualifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> TagScope {
        self.scope
    }

    pub fn is_setup(&self) -> bool {
        self.scope == TagScope::Global && self.name == SETUP_TAG
    }

    pub fn is_newest(&self) -> bool {
        self.scope == TagScope::Global && self.name == NEWEST_TAG
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (scope, name) = match s.strip_prefix(USER_TAG_PREFIX) {
            Some(name) => (TagScope::User, name),
            None => (TagScope::Global, s.strip_prefix("global:").unwrap_or(s)),
        };
        if name.is_empty() || name.contains(char::is_whitespace) || name.contains(':') {
            return Err(Error::ValidationFailed(format!("Invalid tag name: {s:?}")));
        }
        Ok(Self {
            scope,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            TagScope::Global => f.write_str(&self.name),
            TagScope::User => write!(f, "{USER_TAG_PREFIX}{}", self.name),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a list of tag names, such as a whitespace-separated `--tag` value.
pub fn parse_tags<I, S>(names: I) -> Result<Vec<Tag>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .flat_map(|n| {
            n.as_ref()
                .split_whitespace()
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .map(|n| n.parse())
        .collect()
}

/// Ensure every tag in `tags` is one of `known`.
pub fn check_tags(tags: &[Tag], known: &[String]) -> Result<()> {
    for tag in tags {
        let text = tag.to_string();
        if known.iter().any(|k| *k == text) {
            continue;
        }
        let similar = known
            .iter()
            .filter(|k| k.contains(tag.name()) || tag.name().contains(k.as_str()))
            .cloned()
            .collect();
        return Err(Error::TagNotRecognized { tag: text, similar });
    }
    Ok(())
}
