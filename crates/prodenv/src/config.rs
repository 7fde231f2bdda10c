// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Settings read from the environment and the startup file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::resolve::{DEFAULT_LOCAL_VERSION_PREFIX, ResolveOptions};
use crate::shell::{DiffOptions, ShellDialect};
use crate::tag::{Tag, parse_tags};
use crate::{Error, PRODENV_DIR_VAR, PRODENV_PATH_VAR, Result, Stack};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Shell the statements are written for.
pub const PRODENV_SHELL_VAR: &str = "PRODENV_SHELL";

/// Platform flavor of this host.
pub const PRODENV_FLAVOR_VAR: &str = "PRODENV_FLAVOR";

/// Whitespace-separated default preferred tags.
pub const PRODENV_VRO_VAR: &str = "PRODENV_VRO";

/// Location of the startup file; empty disables it.
pub const PRODENV_STARTUP_VAR: &str = "PRODENV_STARTUP";

/// Startup file location under the home directory.
pub const STARTUP_FILE: &str = ".prodenv/startup.yaml";

const DEFAULT_VRO: &str = "current";

/// The optional per-user startup file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StartupFile {
    tags: Vec<String>,
    vro: Option<Vec<String>>,
    local_version_prefix: Option<String>,
    warn_on_local: Option<bool>,
}

/// Everything the library needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stack roots, searched in order.
    pub path: Vec<PathBuf>,
    /// Where prodenv itself is installed.
    pub prodenv_dir: Option<PathBuf>,
    pub shell: ShellDialect,
    pub flavor: String,
    /// Default preferred tags.
    pub vro: Vec<Tag>,
    /// Global tags beyond the built-in ones.
    pub tags: Vec<String>,
    pub local_version_prefix: String,
    pub warn_on_local: bool,
    pub verbose: u8,
    pub quiet: bool,
    pub no_action: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            prodenv_dir: None,
            shell: ShellDialect::default(),
            flavor: default_flavor(),
            vro: vec![Tag::global(DEFAULT_VRO)],
            tags: Vec::new(),
            local_version_prefix: DEFAULT_LOCAL_VERSION_PREFIX.to_string(),
            warn_on_local: false,
            verbose: 0,
            quiet: false,
            no_action: false,
        }
    }
}

impl Config {
    /// Read the configuration of the running process.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a configuration from a variable lookup.
    ///
    /// The startup file is applied first so that variables can override it.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match lookup(PRODENV_STARTUP_VAR) {
            Some(path) if path.trim().is_empty() => {}
            Some(path) => config.load_startup(Path::new(&path))?,
            None => {
                if let Some(path) = dirs::home_dir().map(|h| h.join(STARTUP_FILE)) {
                    if path.is_file() {
                        config.load_startup(&path)?;
                    }
                }
            }
        }

        if let Some(path) = lookup(PRODENV_PATH_VAR) {
            config.path = split_path(&path);
        }
        config.prodenv_dir = lookup(PRODENV_DIR_VAR)
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        config.shell = match lookup(PRODENV_SHELL_VAR).filter(|s| !s.is_empty()) {
            Some(shell) => shell.parse()?,
            None => lookup("SHELL")
                .and_then(|s| match s.parse() {
                    Ok(dialect) => Some(dialect),
                    Err(_) => {
                        tracing::debug!(shell = %s, "unrecognised login shell, using sh");
                        None
                    }
                })
                .unwrap_or_default(),
        };

        if let Some(flavor) = lookup(PRODENV_FLAVOR_VAR).filter(|f| !f.is_empty()) {
            config.flavor = flavor;
        }
        if let Some(vro) = lookup(PRODENV_VRO_VAR).filter(|v| !v.trim().is_empty()) {
            config.vro = parse_tags([vro])?;
        }

        tracing::debug!(
            path = ?config.path,
            shell = %config.shell,
            flavor = %config.flavor,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Overlay the startup file at `path`.
    pub fn load_startup(&mut self, path: &Path) -> Result<()> {
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        let startup: StartupFile = serde_yaml::from_str(&yaml).map_err(|e| Error::InvalidYaml {
            error: e,
            yaml_content: yaml.clone(),
        })?;

        for tag in startup.tags {
            let tag: Tag = tag.parse()?;
            let name = tag.to_string();
            if !self.tags.contains(&name) {
                self.tags.push(name);
            }
        }
        if let Some(vro) = startup.vro {
            self.vro = parse_tags(vro)?;
        }
        if let Some(prefix) = startup.local_version_prefix {
            self.local_version_prefix = prefix;
        }
        if let Some(warn) = startup.warn_on_local {
            self.warn_on_local = warn;
        }
        tracing::debug!(?path, "loaded startup file");
        Ok(())
    }

    /// Load every stack on the path, in search order.
    pub fn load_stacks(&self) -> Result<Vec<Stack>> {
        self.path.iter().map(Stack::load).collect()
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            local_version_prefix: self.local_version_prefix.clone(),
            warn_on_local: self.warn_on_local,
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            dialect: self.shell,
            no_action: self.no_action,
            verbose: self.verbose,
        }
    }
}

fn split_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// The flavor name of the host platform.
pub fn default_flavor() -> String {
    use std::env::consts::{ARCH, OS};
    match (OS, ARCH) {
        ("linux", "x86_64") => "Linux64".to_string(),
        ("linux", _) => "Linux".to_string(),
        ("macos", "x86_64") => "DarwinX86".to_string(),
        ("macos", "aarch64") => "DarwinARM".to_string(),
        ("macos", _) => "Darwin".to_string(),
        (os, _) => os.to_string(),
    }
}
