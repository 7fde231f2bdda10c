// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv list` command.

use clap::Args;
use miette::{IntoDiagnostic, Result};
use prodenv::{Config, DepthFilter, ListOptions, Session};

/// List declared products
#[derive(Debug, Args)]
pub struct CmdList {
    /// Product name or glob pattern
    name: Option<String>,

    /// Exact version or relative expression such as ">= 1.2"
    version: Option<String>,

    /// Only products carrying one of these tags
    #[clap(long = "tag", short = 't', value_name = "TAG")]
    tags: Vec<String>,

    /// Only set-up products; with --dependencies, list set-up versions
    #[clap(long, short = 's')]
    setup: bool,

    /// Print installation directories
    #[clap(long, short = 'd')]
    directory: bool,

    /// Print table file paths
    #[clap(long, short = 'm')]
    tablefile: bool,

    /// List the dependency tree of one product
    #[clap(long = "dependencies", short = 'D')]
    dependencies: bool,

    /// Print versions only
    #[clap(long = "versions", short = 'V')]
    show_version: bool,

    /// Depths to list with --dependencies: N, "== 2", "> 1" or any
    /// expression over depth
    #[clap(long, value_parser = crate::parse_depth, default_value = "")]
    pub(crate) depth: DepthFilter,

    /// Platform flavor to list products for
    #[clap(long, env = "PRODENV_FLAVOR")]
    flavor: Option<String>,
}

impl CmdList {
    pub fn run(&mut self, mut config: Config) -> Result<i32> {
        if let Some(flavor) = &self.flavor {
            config.flavor = flavor.clone();
        }
        let verbose = config.verbose;
        let session = Session::from_config(config)?;

        let options = ListOptions {
            name: self.name.clone(),
            version: self.version.clone(),
            tags: prodenv::tag::parse_tags(&self.tags)?,
            setup: self.setup,
            directory: self.directory,
            tablefile: self.tablefile,
            dependencies: self.dependencies,
            show_version: self.show_version,
            depth: self.depth.clone(),
            verbose,
            preferred_tags: session.preferred_tags(&[]),
            resolve: session.config().resolve_options(),
        };

        let mut out = std::io::stdout().lock();
        let count = prodenv::print_products(&mut out, &session.catalog(), &options)?;
        std::io::Write::flush(&mut out).into_diagnostic()?;
        tracing::debug!(count, "products listed");
        Ok(0)
    }
}
