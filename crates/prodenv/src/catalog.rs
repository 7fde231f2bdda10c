// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Lookup of declared and set-up products.

use std::cmp::Ordering;
use std::path::Path;

use crate::environment::{Environment, SetupRecord, product_dir_var, setup_var};
use crate::tag::{BUILTIN_TAGS, Tag};
use crate::version::version_cmp;
use crate::{Dependency, Product, Stack};

#[cfg(test)]
#[path = "./catalog_test.rs"]
mod catalog_test;

/// Read access to the known products and their setup state.
pub trait ProductCatalog {
    /// The declaration of exactly `version`.
    fn find_product(&self, name: &str, version: &str) -> Option<Product>;

    /// The version of `name` carrying `tag`.
    fn find_tagged_product(&self, name: &str, tag: &Tag) -> Option<Product>;

    /// The newest declared version of `name`.
    fn best_product(&self, name: &str) -> Option<Product>;

    /// The version of `name` that is currently set up.
    fn find_setup_product(&self, name: &str) -> Option<Product>;

    /// The dependency table of `product`, in declaration order.
    fn dependency_table(&self, product: &Product) -> Vec<Dependency>;

    /// Is `version` of `name` (from `root`, when given) set up?
    fn is_setup(&self, name: &str, version: &str, root: Option<&Path>) -> bool {
        self.find_setup_product(name).is_some_and(|p| {
            p.version == version && root.is_none_or(|r| p.stack_root.as_deref() == Some(r))
        })
    }

    /// Every visible declaration.
    fn products(&self) -> Vec<Product>;

    /// Every product recorded as set up, declared or not.
    fn setup_products(&self) -> Vec<Product>;

    /// Every declared version of `name`.
    fn versions(&self, name: &str) -> Vec<Product> {
        self.products()
            .into_iter()
            .filter(|p| p.name == name)
            .collect()
    }

    /// Tag names that may be used in a preferred-tag list.
    fn known_tags(&self) -> Vec<String>;
}

/// Products from the stacks in search order, viewed for one flavor and one
/// environment.
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    stacks: &'a [Stack],
    env: &'a Environment,
    flavor: &'a str,
    extra_tags: &'a [String],
}

impl<'a> Catalog<'a> {
    pub fn new(stacks: &'a [Stack], env: &'a Environment, flavor: &'a str) -> Self {
        Self {
            stacks,
            env,
            flavor,
            extra_tags: &[],
        }
    }

    /// Recognise `tags` in addition to the built-in and declared ones.
    pub fn with_tags(mut self, tags: &'a [String]) -> Self {
        self.extra_tags = tags;
        self
    }

    pub fn flavor(&self) -> &str {
        self.flavor
    }

    pub fn environment(&self) -> &Environment {
        self.env
    }

    /// Declarations for this flavor; the first stack wins for a version.
    fn visible(&self) -> impl Iterator<Item = &'a Product> + '_ {
        let flavor = self.flavor;
        let mut seen: Vec<(&'a str, &'a str)> = Vec::new();
        self.stacks
            .iter()
            .flat_map(|s| s.products.iter())
            .filter(move |p| p.supports_flavor(flavor))
            .filter(move |p| {
                let key = (p.name.as_str(), p.version.as_str());
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
    }

    /// Rebuild a product recorded as set up but declared nowhere, such as a
    /// LOCAL setup.
    fn product_from_record(&self, record: SetupRecord) -> Product {
        let mut product = Product::new(record.name, record.version);
        if let Some(flavor) = record.flavor {
            product.flavor = flavor;
        }
        product.dir = self
            .env
            .get(&product_dir_var(&product.name))
            .map(Into::into);
        product.stack_root = record.root;
        product
    }
}

impl ProductCatalog for Catalog<'_> {
    fn find_product(&self, name: &str, version: &str) -> Option<Product> {
        self.visible()
            .find(|p| p.name == name && p.version == version)
            .cloned()
    }

    fn find_tagged_product(&self, name: &str, tag: &Tag) -> Option<Product> {
        if tag.is_setup() {
            return self.find_setup_product(name);
        }
        if tag.is_newest() {
            return self.best_product(name);
        }
        self.visible()
            .find(|p| p.name == name && p.has_tag(tag))
            .cloned()
    }

    fn best_product(&self, name: &str) -> Option<Product> {
        self.visible()
            .filter(|p| p.name == name)
            .max_by(|a, b| match version_cmp(&a.version, &b.version) {
                // keep the earlier stack on ties
                Ordering::Equal => Ordering::Greater,
                other => other,
            })
            .cloned()
    }

    fn find_setup_product(&self, name: &str) -> Option<Product> {
        let record = SetupRecord::parse(self.env.get(&setup_var(name))?)?;
        if record.name != name {
            tracing::debug!(name, recorded = %record.name, "setup record names another product");
        }
        let declared = self.visible().find(|p| {
            p.name == name
                && p.version == record.version
                && (record.root.is_none() || p.stack_root == record.root)
        });
        match declared {
            Some(product) => Some(product.clone()),
            None => Some(self.product_from_record(record)),
        }
    }

    fn dependency_table(&self, product: &Product) -> Vec<Dependency> {
        product.requires.clone()
    }

    fn products(&self) -> Vec<Product> {
        self.visible().cloned().collect()
    }

    fn setup_products(&self) -> Vec<Product> {
        self.env
            .setup_records()
            .into_iter()
            .filter_map(|record| self.find_setup_product(&record.name))
            .collect()
    }

    fn known_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = BUILTIN_TAGS.iter().map(ToString::to_string).collect();
        let declared = self
            .stacks
            .iter()
            .flat_map(|s| s.products.iter())
            .flat_map(|p| p.tags.iter().map(ToString::to_string));
        for tag in self.extra_tags.iter().cloned().chain(declared) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }
}
