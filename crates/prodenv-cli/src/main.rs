// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! prodenv - Product Version Resolution and Environment Setup CLI

use clap::{Parser, Subcommand};
use miette::Result;
use prodenv::{Config, ShellDialect, Tag};

mod cmd_declare;
mod cmd_deps;
mod cmd_list;
mod cmd_setup;
mod cmd_tags;
mod cmd_undeclare;
mod cmd_uses;

use cmd_declare::CmdDeclare;
use cmd_deps::CmdDeps;
use cmd_list::CmdList;
use cmd_setup::{CmdSetup, CmdUnsetup};
use cmd_tags::CmdTags;
use cmd_undeclare::CmdUndeclare;
use cmd_uses::CmdUses;


#[derive(Parser)]
#[clap(
    name = "prodenv",
    about = "Product Version Resolution and Environment Setup",
    version,
    long_about = "Resolve product versions through preferred tags and print the shell \
                  statements that set them up. Evaluate the output of setup and \
                  unsetup in the calling shell."
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

/// Flags shared by every command that looks products up.
#[derive(Parser, Clone, Debug, Default)]
pub struct CatalogFlags {
    /// Platform flavor to look products up for
    #[clap(long, env = "PRODENV_FLAVOR")]
    pub flavor: Option<String>,

    /// Preferred tags, tried before the configured ones
    #[clap(long = "tag", short = 't', value_name = "TAG")]
    pub tags: Vec<String>,
}

impl CatalogFlags {
    /// The `--tag` values, each of which may hold several names.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        Ok(prodenv::tag::parse_tags(&self.tags)?)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(flavor) = &self.flavor {
            config.flavor = flavor.clone();
        }
    }
}

/// Flags for commands that print shell statements.
#[derive(Parser, Clone, Debug, Default)]
pub struct ShellFlags {
    /// Shell to write statements for (sh, bash, zsh, ksh, csh, tcsh)
    #[clap(long, value_parser = parse_shell)]
    pub shell: Option<ShellDialect>,

    /// Print what would be done instead of doing it
    #[clap(long = "noaction", short = 'n')]
    pub no_action: bool,
}

impl ShellFlags {
    pub fn apply(&self, config: &mut Config) {
        if let Some(shell) = self.shell {
            config.shell = shell;
        }
        config.no_action = self.no_action;
    }
}

fn parse_shell(value: &str) -> std::result::Result<ShellDialect, String> {
    value.parse().map_err(|e: prodenv::Error| e.to_string())
}

fn parse_depth(value: &str) -> std::result::Result<prodenv::DepthFilter, String> {
    value.parse().map_err(|e: prodenv::Error| e.to_string())
}

#[derive(Subcommand)]
enum Command {
    /// List declared products
    List(CmdList),

    /// List the products that depend on a product
    Uses(CmdUses),

    /// List the dependencies of a product
    Deps(CmdDeps),

    /// Print the statements that set a product up
    Setup(CmdSetup),

    /// Print the statements that remove a set-up product
    Unsetup(CmdUnsetup),

    /// Declare a product in a stack
    Declare(CmdDeclare),

    /// Remove a declaration, or a tag from it
    Undeclare(CmdUndeclare),

    /// List the tags that may be used to select versions
    Tags(CmdTags),
}

impl Opt {
    fn run(self) -> Result<i32> {
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        // stdout carries shell statements
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(log_level)
            .init();

        let mut config = Config::from_env()?;
        config.verbose = self.logging.verbose;
        config.quiet = self.logging.quiet;

        match self.cmd {
            Command::List(mut cmd) => cmd.run(config),
            Command::Uses(mut cmd) => cmd.run(config),
            Command::Deps(mut cmd) => cmd.run(config),
            Command::Setup(mut cmd) => cmd.run(config),
            Command::Unsetup(mut cmd) => cmd.run(config),
            Command::Declare(mut cmd) => cmd.run(config),
            Command::Undeclare(mut cmd) => cmd.run(config),
            Command::Tags(mut cmd) => cmd.run(config),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
