// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv declare` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;
use prodenv::{Config, Dependency, Product, Session, Tag};

/// Declare a product in a stack
#[derive(Debug, Args)]
pub struct CmdDeclare {
    /// Product name
    name: String,

    /// Product version
    version: String,

    /// Installation directory
    #[clap(long, short = 'r')]
    dir: Option<PathBuf>,

    /// Table file describing the product's environment
    #[clap(long, short = 'm')]
    table: Option<PathBuf>,

    /// Tag to give the new declaration
    #[clap(long, short = 't')]
    tag: Option<Tag>,

    /// Replace a declaration with a different directory or table file
    #[clap(long, short = 'F')]
    force: bool,

    /// Platform flavor; generic products install everywhere
    #[clap(long, short = 'f', default_value = "generic")]
    flavor: String,

    /// Required dependency, as NAME or NAME=VERSION
    #[clap(long = "requires", value_name = "PRODUCT")]
    requires: Vec<String>,

    /// Stack to declare into, instead of the first one on PRODENV_PATH
    #[clap(long, short = 'z')]
    stack: Option<PathBuf>,
}

impl CmdDeclare {
    pub fn run(&mut self, config: Config) -> Result<i32> {
        let mut session = Session::from_config(config)?;

        let mut product = Product::new(&self.name, &self.version);
        product.flavor = self.flavor.clone();
        product.dir = self.dir.clone();
        product.table_file = self.table.clone();
        for requirement in &self.requires {
            product = product.with_dependency(parse_requirement(requirement));
        }

        let written = session.declare(
            product,
            self.tag.clone(),
            self.force,
            self.stack.as_deref(),
        )?;
        println!(
            "Declared {} {} in {}",
            self.name.green(),
            self.version.green(),
            written.display().to_string().cyan()
        );
        Ok(0)
    }
}

fn parse_requirement(requirement: &str) -> Dependency {
    match requirement.split_once('=') {
        Some((name, version)) => Dependency::required(name.trim()).with_version(version.trim()),
        None => Dependency::required(requirement.trim()),
    }
}
