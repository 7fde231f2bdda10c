// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv uses` command.

use clap::Args;
use miette::Result;
use prodenv::{Config, Session, UsesOptions};

/// List the products that depend on a product
#[derive(Debug, Args)]
pub struct CmdUses {
    /// Product whose users are listed
    name: String,

    /// Only users of this version
    version: Option<String>,

    /// Examine this many levels of dependencies
    #[clap(long)]
    depth: Option<usize>,

    /// Include products that only depend on it optionally
    #[clap(long = "optional", short = 'o')]
    show_optional: bool,

    #[clap(flatten)]
    catalog: crate::CatalogFlags,
}

impl CmdUses {
    pub fn run(&mut self, mut config: Config) -> Result<i32> {
        self.catalog.apply(&mut config);
        let session = Session::from_config(config)?;

        let options = UsesOptions {
            depth: self.depth,
            show_optional: self.show_optional,
            tags: session.preferred_tags(&self.catalog.tags()?),
            resolve: session.config().resolve_options(),
        };

        let mut out = std::io::stdout().lock();
        let count = prodenv::print_uses(
            &mut out,
            &session.catalog(),
            &self.name,
            self.version.as_deref(),
            &options,
        )?;
        tracing::debug!(count, "users listed");
        Ok(0)
    }
}
