// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv deps` command.

use clap::Args;
use colored::Colorize;
use miette::Result;
use prodenv::{Config, DepthFilter, Session, WalkOptions};

/// List the dependencies of a product
#[derive(Debug, Args)]
pub struct CmdDeps {
    /// Product whose dependencies are listed
    name: String,

    /// Version, tag or relative expression; resolved through the
    /// preferred tags when omitted
    version: Option<String>,

    /// Report the set-up version of each dependency
    #[clap(long, short = 's')]
    setup: bool,

    /// Fail on a required dependency that cannot be found
    #[clap(long)]
    strict: bool,

    /// Depths to report: N, "== 2", "> 1" or any expression over depth
    #[clap(long, value_parser = crate::parse_depth, default_value = "")]
    depth: DepthFilter,

    #[clap(flatten)]
    catalog: crate::CatalogFlags,
}

impl CmdDeps {
    pub fn run(&mut self, mut config: Config) -> Result<i32> {
        self.catalog.apply(&mut config);
        let session = Session::from_config(config)?;

        let options = WalkOptions {
            want_setup_versions: self.setup,
            strict: self.strict,
            depth: self.depth.clone(),
            max_depth: None,
            preferred_tags: session.preferred_tags(&self.catalog.tags()?),
            resolve: session.config().resolve_options(),
        };
        let dependencies = prodenv::dependencies(
            &session.catalog(),
            &self.name,
            self.version.as_deref(),
            &options,
        )?;

        if dependencies.is_empty() {
            eprintln!("{}", format!("{} has no dependencies", self.name).dimmed());
        }
        for (name, version, depth) in dependencies {
            println!("{name:<25} {version:<15} {depth}");
        }
        Ok(0)
    }
}
