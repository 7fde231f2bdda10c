// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Shell statements that move one environment to another.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::environment::{Environment, SETUP_VAR_PREFIX};
use crate::{Error, PRODENV_DIR_VAR, PRODENV_PATH_VAR, Result};

#[cfg(test)]
#[path = "./shell_test.rs"]
mod shell_test;

/// Variables that locate prodenv itself and are never unset.
pub const PROTECTED_VARS: &[&str] = &[PRODENV_DIR_VAR, PRODENV_PATH_VAR];

/// The statement emitted in place of a failed setup.
pub const FAILURE_STATEMENT: &str = "false";

static NEEDS_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s<>|&;()]").expect("valid regex"));

static ALREADY_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^['"].*['"]$"#).expect("valid regex"));

static BOURNE_ARGS: Lazy<Regex> = Lazy::new(|| Regex::new(r#""?\$@"?"#).expect("valid regex"));

/// The family of shell the statements are written for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShellDialect {
    /// sh, bash, zsh and ksh.
    #[default]
    Bourne,
    /// csh and tcsh.
    CShell,
}

impl ShellDialect {
    pub fn syntax(self) -> &'static dyn ShellSyntax {
        match self {
            Self::Bourne => &BourneSyntax,
            Self::CShell => &CShellSyntax,
        }
    }
}

impl FromStr for ShellDialect {
    type Err = Error;

    /// Accepts a shell name or a path to a shell binary.
    fn from_str(s: &str) -> Result<Self> {
        let name = Path::new(s.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .trim_start_matches('-');
        match name {
            "sh" | "bash" | "zsh" | "ksh" | "dash" => Ok(Self::Bourne),
            "csh" | "tcsh" => Ok(Self::CShell),
            _ => Err(Error::ValidationFailed(format!("Unsupported shell: {s}"))),
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bourne => f.write_str("sh"),
            Self::CShell => f.write_str("csh"),
        }
    }
}

/// How one dialect spells each kind of statement.
pub trait ShellSyntax {
    fn set_var(&self, name: &str, value: &str) -> String;
    fn unset_var(&self, name: &str) -> String;
    fn set_alias(&self, name: &str, command: &str) -> String;
    fn unset_alias(&self, name: &str) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct BourneSyntax;

impl ShellSyntax for BourneSyntax {
    fn set_var(&self, name: &str, value: &str) -> String {
        format!("export {name}={}", quote(value))
    }

    fn unset_var(&self, name: &str) -> String {
        format!("unset {name}")
    }

    fn set_alias(&self, name: &str, command: &str) -> String {
        format!("function {name} {{ {command} ; }}; export -f {name}")
    }

    fn unset_alias(&self, name: &str) -> String {
        format!("unset -f {name}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CShellSyntax;

impl ShellSyntax for CShellSyntax {
    fn set_var(&self, name: &str, value: &str) -> String {
        format!("setenv {name} {}", quote(value))
    }

    fn unset_var(&self, name: &str) -> String {
        format!("unsetenv {name}")
    }

    fn set_alias(&self, name: &str, command: &str) -> String {
        let command = BOURNE_ARGS.replace_all(command, r"\!*");
        format!("alias {name} '{command}'")
    }

    fn unset_alias(&self, name: &str) -> String {
        format!("unalias {name}")
    }
}

/// Single-quote values the shell would otherwise split or interpret.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && !ALREADY_QUOTED.is_match(value) && NEEDS_QUOTES.is_match(value) {
        format!("'{value}'")
    } else {
        value.to_string()
    }
}

/// Options for [`diff`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    pub dialect: ShellDialect,
    /// Echo each statement instead of running it.
    pub no_action: bool,
    /// At 2 and above, dry runs also show the `SETUP_` bookkeeping.
    pub verbose: u8,
}

/// The statements that turn `old` into `new`.
///
/// Changed and new variables come first, then removed variables, then
/// changed and new aliases, then removed aliases. Each group follows the
/// insertion order of its snapshot.
pub fn diff(old: &Environment, new: &Environment, options: &DiffOptions) -> Vec<String> {
    let syntax = options.dialect.syntax();
    let mut statements = Vec::new();

    for (name, value) in new.vars() {
        if old.get(name) == Some(value.as_str()) {
            continue;
        }
        if hide_in_dry_run(name, options) {
            continue;
        }
        statements.push(wrap(syntax.set_var(name, value), options));
    }

    for name in old.vars().keys() {
        if PROTECTED_VARS.contains(&name.as_str()) || new.get(name).is_some() {
            continue;
        }
        if hide_in_dry_run(name, options) {
            continue;
        }
        statements.push(wrap(syntax.unset_var(name), options));
    }

    for (name, command) in new.aliases() {
        if old.alias(name) == Some(command.as_str()) {
            continue;
        }
        let statement = syntax.set_alias(name, command);
        statements.push(if options.no_action {
            echo(&statement.replace('`', r"\`"))
        } else {
            statement
        });
    }

    for name in old.aliases().keys() {
        if new.alias(name).is_some() {
            continue;
        }
        statements.push(wrap(syntax.unset_alias(name), options));
    }

    tracing::debug!(count = statements.len(), dialect = %options.dialect, "environment diff");
    statements
}

fn hide_in_dry_run(name: &str, options: &DiffOptions) -> bool {
    options.no_action && options.verbose < 2 && name.starts_with(SETUP_VAR_PREFIX)
}

fn wrap(statement: String, options: &DiffOptions) -> String {
    if options.no_action {
        echo(&statement)
    } else {
        statement
    }
}

fn echo(statement: &str) -> String {
    format!("echo \"{statement}\"")
}
