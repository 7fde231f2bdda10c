// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `prodenv undeclare` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;
use prodenv::{Config, Session, Tag};

/// Remove a declaration, or a tag from it
#[derive(Debug, Args)]
pub struct CmdUndeclare {
    /// Product name
    name: String,

    /// Only this version; every version when omitted
    version: Option<String>,

    /// Only remove this tag, keeping the declaration
    #[clap(long, short = 't')]
    tag: Option<Tag>,

    /// Stack to change, instead of the first one declaring the product
    #[clap(long, short = 'z')]
    stack: Option<PathBuf>,
}

impl CmdUndeclare {
    pub fn run(&mut self, config: Config) -> Result<i32> {
        let mut session = Session::from_config(config)?;
        let changed = session.undeclare(
            &self.name,
            self.version.as_deref(),
            self.tag.as_ref(),
            self.stack.as_deref(),
        )?;
        match &self.tag {
            Some(tag) => println!("Removed tag {tag} from {changed} declaration(s)"),
            None => println!("Removed {changed} declaration(s) of {}", self.name),
        }
        Ok(0)
    }
}
