// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv tags` command.

use clap::Args;
use colored::Colorize;
use miette::Result;
use prodenv::{Config, ProductCatalog, Session, Tag};

/// List the tags that may be used to select versions
#[derive(Debug, Args)]
pub struct CmdTags {
    /// Also show which version of this product each tag names
    product: Option<String>,
}

impl CmdTags {
    pub fn run(&mut self, config: Config) -> Result<i32> {
        let session = Session::from_config(config)?;
        let catalog = session.catalog();
        let preferred: Vec<String> = session.preferred_tags(&[]).iter().map(Tag::to_string).collect();

        for name in catalog.known_tags() {
            let marker = if preferred.contains(&name) { "*" } else { " " };
            let Some(product) = &self.product else {
                println!("{} {}", marker.yellow(), name);
                continue;
            };
            let tag: Tag = name.parse()?;
            let version = catalog
                .find_tagged_product(product, &tag)
                .map(|p| p.version)
                .unwrap_or_default();
            println!("{} {:<20} {}", marker.yellow(), name, version.green());
        }
        Ok(0)
    }
}
