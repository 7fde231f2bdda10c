// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Declared products and their dependency edges.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::actions::EnvOp;
use crate::tag::Tag;
use crate::GENERIC_FLAVOR;

#[cfg(test)]
#[path = "./product_test.rs"]
mod product_test;

/// Sentinel for a missing installation directory or table file.
pub const NONE: &str = "none";

/// A declared `(name, version)` of a product.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Product {
    pub name: String,

    pub version: String,

    /// Platform classifier; `generic` matches every platform.
    #[serde(default = "default_flavor")]
    pub flavor: String,

    /// Installation directory, `none` when the product has no files.
    #[serde(default, with = "none_path")]
    pub dir: Option<PathBuf>,

    /// Path of the product's table file, `none` when it has none.
    #[serde(default, rename = "table", with = "none_path")]
    pub table_file: Option<PathBuf>,

    /// Tags currently assigned to this version.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Dependency table, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Dependency>,

    /// Environment actions applied on setup and reversed on unsetup.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvOp>,

    /// Root of the stack this product was declared in (not serialized).
    #[serde(skip)]
    pub stack_root: Option<PathBuf>,
}

fn default_flavor() -> String {
    GENERIC_FLAVOR.to_string()
}

impl Product {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, version: V) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            flavor: default_flavor(),
            dir: None,
            table_file: None,
            tags: Vec::new(),
            requires: Vec::new(),
            environment: Vec::new(),
            stack_root: None,
        }
    }

    pub fn with_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.requires.push(dependency);
        self
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Does this product install on `flavor`?
    pub fn supports_flavor(&self, flavor: &str) -> bool {
        self.flavor == GENERIC_FLAVOR || self.flavor.eq_ignore_ascii_case(flavor)
    }

    /// The stack root, or `none` for display.
    pub fn stack_root_display(&self) -> String {
        self.stack_root
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| NONE.to_string())
    }

    /// Does this declaration describe the same installation as `other`?
    pub fn same_installation(&self, other: &Self) -> bool {
        self.dir == other.dir && self.table_file == other.table_file
    }

    pub fn dir_display(&self) -> String {
        display_or_none(self.dir.as_deref())
    }

    pub fn table_file_display(&self) -> String {
        display_or_none(self.table_file.as_deref())
    }
}

fn display_or_none(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| NONE.to_string())
}

/// An edge of a product's dependency table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the required product.
    pub product: String,

    /// Exact version, relative expression such as `>= 1.2`, or tag.
    /// Absent means "use the preferred tags".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional dependencies are skipped silently when unavailable.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Dependency {
    pub fn required<S: Into<String>>(product: S) -> Self {
        Self {
            product: product.into(),
            version: None,
            optional: false,
        }
    }

    pub fn optional<S: Into<String>>(product: S) -> Self {
        Self {
            optional: true,
            ..Self::required(product)
        }
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Serialize `Option<PathBuf>` with `none` standing for `None`.
mod none_path {
    use std::path::PathBuf;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::NONE;

    pub(super) fn serialize<S: Serializer>(
        path: &Option<PathBuf>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match path {
            Some(p) => serializer.collect_str(&p.display()),
            None => serializer.serialize_str(NONE),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PathBuf>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(NONE))
            .map(PathBuf::from))
    }
}
