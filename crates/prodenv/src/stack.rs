// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Product stacks and their declaration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::tag::Tag;
use crate::{Error, Product, STACK_DB_DIRNAME, STACK_DB_FILENAME};

#[cfg(test)]
#[path = "./stack_test.rs"]
mod stack_test;

/// API version for declaration files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "prodenv/v0")]
    V0,
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// The products declared in one stack root.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Stack {
    /// API version identifier.
    pub api: ApiVersion,

    /// Declared products, in declaration order.
    #[serde(default)]
    pub products: Vec<Product>,

    /// Root directory of the stack (not serialized).
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

impl Stack {
    /// An empty stack rooted at `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            api: ApiVersion::default(),
            products: Vec::new(),
            root: Some(root.into()),
        }
    }

    /// Parse a declaration file from a YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        let stack: Self = match with_version.api {
            ApiVersion::V0 => serde_yaml::from_value(value).map_err(|e| Error::InvalidYaml {
                error: e,
                yaml_content: yaml,
            })?,
        };
        stack.validate()?;
        Ok(stack)
    }

    /// Path of the declaration file for a stack root.
    pub fn db_path<P: AsRef<Path>>(root: P) -> PathBuf {
        root.as_ref().join(STACK_DB_DIRNAME).join(STACK_DB_FILENAME)
    }

    /// Load the stack rooted at `root`.
    ///
    /// A root without a declaration file is an empty stack.
    pub fn load<P: AsRef<Path>>(root: P) -> crate::Result<Self> {
        let root = root.as_ref();
        let path = Self::db_path(root);
        if !path.is_file() {
            tracing::debug!(?path, "no declaration file, stack is empty");
            return Ok(Self::new(root));
        }

        let yaml = std::fs::read_to_string(&path).map_err(|e| Error::ReadFailed {
            path: path.clone(),
            error: e,
        })?;
        let mut stack = Self::from_yaml(yaml)?;
        stack.set_root(root);
        Ok(stack)
    }

    /// Write the declaration file back to `<root>/ups_db/prodenv.yaml`.
    pub fn save(&self) -> crate::Result<PathBuf> {
        let root = self.root.as_ref().ok_or_else(|| {
            Error::ValidationFailed("Cannot save a stack without a root".to_string())
        })?;
        let path = Self::db_path(root);
        let yaml = serde_yaml::to_string(self).map_err(|e| Error::InvalidYaml {
            error: e,
            yaml_content: String::new(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::WriteFailed {
                path: parent.to_path_buf(),
                error: e,
            })?;
        }
        std::fs::write(&path, yaml).map_err(|e| Error::WriteFailed {
            path: path.clone(),
            error: e,
        })?;
        tracing::debug!(?path, "saved declarations");
        Ok(path)
    }

    pub(crate) fn set_root(&mut self, root: &Path) {
        self.root = Some(root.to_path_buf());
        for product in &mut self.products {
            product.stack_root = Some(root.to_path_buf());
        }
    }

    /// Reject duplicate `(name, version, flavor)` declarations.
    pub fn validate(&self) -> crate::Result<()> {
        for (i, product) in self.products.iter().enumerate() {
            let duplicate = self.products[..i].iter().any(|p| {
                p.name == product.name && p.version == product.version && p.flavor == product.flavor
            });
            if duplicate {
                return Err(Error::ValidationFailed(format!(
                    "{} {} ({}) is declared more than once",
                    product.name, product.version, product.flavor
                )));
            }
        }
        Ok(())
    }

    pub fn find(&self, name: &str, version: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.name == name && p.version == version)
    }

    /// Declare `product`, optionally assigning `tag` to it.
    ///
    /// Redeclaring an identical installation only assigns the tag; a
    /// different directory or table file needs `force`.
    pub fn declare(&mut self, mut product: Product, tag: Option<Tag>, force: bool) -> crate::Result<()> {
        product.stack_root = self.root.clone();
        let (name, version, flavor) = (
            product.name.clone(),
            product.version.clone(),
            product.flavor.clone(),
        );
        let existing = self
            .products
            .iter()
            .position(|p| p.name == name && p.version == version && p.flavor == flavor);

        match existing {
            Some(i) if self.products[i].same_installation(&product) => {}
            Some(i) if force => {
                let previous = std::mem::take(&mut self.products[i].tags);
                let kept: Vec<Tag> = previous
                    .into_iter()
                    .filter(|t| !product.tags.contains(t))
                    .collect();
                product.tags.extend(kept);
                self.products[i] = product;
            }
            Some(_) => return Err(Error::AlreadyDeclared { product: name, version }),
            None => {
                tracing::info!(product = %name, %version, "declared");
                self.products.push(product);
            }
        }

        if let Some(tag) = tag {
            self.assign_tag(&name, &version, &flavor, tag);
        }
        Ok(())
    }

    /// Give `tag` to one version of a product, taking it from any other.
    pub fn assign_tag(&mut self, name: &str, version: &str, flavor: &str, tag: Tag) {
        for product in self.products.iter_mut().filter(|p| p.name == name && p.flavor == flavor) {
            if product.version == version {
                if !product.tags.contains(&tag) {
                    product.tags.push(tag.clone());
                }
            } else {
                product.tags.retain(|t| *t != tag);
            }
        }
    }

    /// Remove a tag, or a whole declaration when `tag` is `None`.
    ///
    /// Returns the number of declarations changed.
    pub fn undeclare(&mut self, name: &str, version: Option<&str>, tag: Option<&Tag>) -> crate::Result<usize> {
        if let Some(tag) = tag {
            let mut changed = 0;
            for product in self
                .products
                .iter_mut()
                .filter(|p| is_match(p, name, version) && p.has_tag(tag))
            {
                product.tags.retain(|t| t != tag);
                changed += 1;
            }
            if changed == 0 {
                return Err(Error::NotFound {
                    product: name.to_string(),
                    request: format!(" tagged {tag}"),
                });
            }
            return Ok(changed);
        }

        let candidates: Vec<String> = self
            .products
            .iter()
            .filter(|p| is_match(p, name, version))
            .map(|p| p.version.clone())
            .collect();
        match candidates.len() {
            0 => Err(Error::not_found(name, version)),
            1 => {
                self.products
                    .retain(|p| !is_match(p, name, version));
                tracing::info!(product = %name, version = %candidates[0], "undeclared");
                Ok(1)
            }
            _ if version.is_some() => {
                // several flavors of one version
                let before = self.products.len();
                self.products
                    .retain(|p| !is_match(p, name, version));
                Ok(before - self.products.len())
            }
            _ => Err(Error::AmbiguousVersion {
                product: name.to_string(),
                versions: candidates,
            }),
        }
    }
}

fn is_match(product: &Product, name: &str, version: Option<&str>) -> bool {
    product.name == name && version.is_none_or(|v| product.version == v)
}
