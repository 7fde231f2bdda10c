// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv setup` and `prodenv unsetup` commands.
//!
//! Both print shell statements on stdout; wrap them in `eval` to change the
//! calling shell.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;
use prodenv::{Config, Session, SetupOptions, ShellScript};

/// Print the statements that set a product up
#[derive(Debug, Args)]
pub struct CmdSetup {
    /// Product to set up
    name: String,

    /// Version, tag or relative expression such as ">= 2.0"
    version: Option<String>,

    /// Set the product up from this directory as a LOCAL version
    #[clap(long = "root", short = 'r')]
    product_root: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) catalog: crate::CatalogFlags,

    #[clap(flatten)]
    pub(crate) shell: crate::ShellFlags,
}

impl CmdSetup {
    pub fn run(&mut self, mut config: Config) -> Result<i32> {
        self.catalog.apply(&mut config);
        self.shell.apply(&mut config);
        let mut session = Session::from_config(config)?;

        let options = SetupOptions {
            tags: self.catalog.tags()?,
            product_root: self.product_root.clone(),
        };
        let script = session.setup(&self.name, self.version.as_deref(), &options);
        Ok(emit(&script))
    }
}

/// Print the statements that remove a set-up product
#[derive(Debug, Args)]
pub struct CmdUnsetup {
    /// Product to remove
    name: String,

    #[clap(flatten)]
    shell: crate::ShellFlags,
}

impl CmdUnsetup {
    pub fn run(&mut self, mut config: Config) -> Result<i32> {
        self.shell.apply(&mut config);
        let mut session = Session::from_config(config)?;
        let script = session.unsetup(&self.name);
        Ok(emit(&script))
    }
}

/// Statements to stdout, diagnostics to stderr; the exit code.
fn emit(script: &ShellScript) -> i32 {
    for message in &script.diagnostics {
        if script.failed() {
            eprintln!("{}", message.red());
        } else {
            eprintln!("{}", message.yellow());
        }
    }
    for statement in &script.statements {
        println!("{statement}");
    }
    i32::from(script.failed())
}
