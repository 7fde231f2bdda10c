// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory environment snapshots and the variables that record setups.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::Product;

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// Prefix of the variables recording which products are set up.
pub const SETUP_VAR_PREFIX: &str = "SETUP_";

/// Separator used by path-like variables when none is given.
pub const DEFAULT_PATH_SEPARATOR: &str = ":";

/// Variables and aliases of a shell at one point in time.
///
/// Iteration follows insertion order so that generated statements are
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: IndexMap<String, String>,
    aliases: IndexMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the variables of the running process.
    ///
    /// Shell aliases are not visible to a child process, so the alias table
    /// starts out empty.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            aliases: IndexMap::new(),
        }
    }

    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.shift_remove(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn set_alias<K: Into<String>, V: Into<String>>(&mut self, name: K, command: V) {
        self.aliases.insert(name.into(), command.into());
    }

    pub fn remove_alias(&mut self, name: &str) -> Option<String> {
        self.aliases.shift_remove(name)
    }

    /// Put `value` at the front of a path-like variable, dropping any
    /// existing copy of it.
    pub fn prepend_path(&mut self, name: &str, value: &str, separator: &str) {
        let mut elements = self.path_elements(name, separator);
        elements.retain(|e| e != value);
        elements.insert(0, value.to_string());
        self.set(name, elements.join(separator));
    }

    /// Put `value` at the end of a path-like variable, dropping any existing
    /// copy of it.
    pub fn append_path(&mut self, name: &str, value: &str, separator: &str) {
        let mut elements = self.path_elements(name, separator);
        elements.retain(|e| e != value);
        elements.push(value.to_string());
        self.set(name, elements.join(separator));
    }

    /// Remove `value` from a path-like variable, unsetting it once empty.
    pub fn remove_path_element(&mut self, name: &str, value: &str, separator: &str) {
        if !self.vars.contains_key(name) {
            return;
        }
        let mut elements = self.path_elements(name, separator);
        elements.retain(|e| e != value);
        if elements.is_empty() {
            self.remove(name);
        } else {
            self.set(name, elements.join(separator));
        }
    }

    fn path_elements(&self, name: &str, separator: &str) -> Vec<String> {
        self.get(name)
            .map(|v| {
                v.split(separator)
                    .filter(|e| !e.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names of every product recorded as set up.
    pub fn setup_records(&self) -> Vec<SetupRecord> {
        self.vars
            .iter()
            .filter(|(k, _)| k.starts_with(SETUP_VAR_PREFIX))
            .filter_map(|(_, v)| SetupRecord::parse(v))
            .collect()
    }
}

/// Upper-case a product name and replace everything but letters and digits.
pub fn env_name(product: &str) -> String {
    product
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The variable holding a product's installation directory, `<NAME>_DIR`.
pub fn product_dir_var(product: &str) -> String {
    format!("{}_DIR", env_name(product))
}

/// The variable marking a product as set up, `SETUP_<NAME>`.
pub fn setup_var(product: &str) -> String {
    format!("{SETUP_VAR_PREFIX}{}", env_name(product))
}

/// The contents of a `SETUP_<NAME>` variable:
/// `<name> <version> -f <flavor> -Z <stack root>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRecord {
    pub name: String,
    pub version: String,
    pub flavor: Option<String>,
    pub root: Option<PathBuf>,
}

impl SetupRecord {
    pub fn for_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            version: product.version.clone(),
            flavor: Some(product.flavor.clone()),
            root: product.stack_root.clone(),
        }
    }

    /// Words holding whitespace are read back from double quotes.
    pub fn parse(value: &str) -> Option<Self> {
        let words = record_words(value);
        let mut words = words.iter().map(String::as_str);
        let name = words.next()?.to_string();
        let version = words.next()?.to_string();
        let mut record = Self {
            name,
            version,
            flavor: None,
            root: None,
        };
        while let Some(flag) = words.next() {
            let arg = words.next();
            match (flag, arg) {
                ("-f", Some(flavor)) => record.flavor = Some(flavor.to_string()),
                ("-Z", Some("none")) => record.root = None,
                ("-Z", Some(root)) => record.root = Some(PathBuf::from(root)),
                _ => tracing::debug!(value, flag, "ignoring unknown setup record flag"),
            }
        }
        Some(record)
    }
}

impl fmt::Display for SetupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", record_word(&self.name), record_word(&self.version))?;
        if let Some(flavor) = &self.flavor {
            write!(f, " -f {}", record_word(flavor))?;
        }
        match &self.root {
            Some(root) => write!(f, " -Z {}", record_word(&root.display().to_string())),
            None => f.write_str(" -Z none"),
        }
    }
}

/// Double-quote a word containing whitespace or quotes.
fn record_word(word: &str) -> String {
    if word.is_empty() || word.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\') {
        format!("\"{}\"", word.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        word.to_string()
    }
}

/// Split a setup record into words, honouring what [`record_word`] quoted.
fn record_words(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = value.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            return words;
        };
        let mut word = String::new();
        if first == '"' {
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => word.extend(chars.next()),
                    c => word.push(c),
                }
            }
        } else {
            word.push(first);
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }
}
