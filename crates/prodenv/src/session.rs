// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Setting products up and tearing them down.

use std::path::{Path, PathBuf};

use crate::actions::{EnvOp, expand};
use crate::catalog::{Catalog, ProductCatalog};
use crate::config::Config;
use crate::environment::{Environment, SetupRecord, product_dir_var, setup_var};
use crate::resolve::{ResolveOptions, VersionRequest, join_tags, resolve};
use crate::shell::{FAILURE_STATEMENT, diff};
use crate::tag::{Tag, check_tags};
use crate::version::is_relative_version;
use crate::{Error, Product, Result, Stack};

#[cfg(test)]
#[path = "./session_test.rs"]
mod session_test;

/// Options for [`Session::setup`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Tags tried before the configured ones.
    pub tags: Vec<Tag>,
    /// Set the product up straight from this directory as a LOCAL version.
    pub product_root: Option<PathBuf>,
}

/// What a setup or unsetup produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellScript {
    /// Statements for the calling shell, in order.
    pub statements: Vec<String>,
    /// Messages for the user, never meant for the shell.
    pub diagnostics: Vec<String>,
}

impl ShellScript {
    fn failure(message: String) -> Self {
        tracing::debug!("{message}");
        Self {
            statements: vec![FAILURE_STATEMENT.to_string()],
            diagnostics: vec![message],
        }
    }

    /// Did the operation fail? A failed script ends with `false`.
    pub fn failed(&self) -> bool {
        self.statements.last().is_some_and(|s| s == FAILURE_STATEMENT)
    }
}

/// The configuration, the stacks and an in-memory copy of the environment.
///
/// The environment is never written back to the process; the statements
/// returned by [`Session::setup`] and [`Session::unsetup`] are the only output.
#[derive(Debug)]
pub struct Session {
    config: Config,
    stacks: Vec<Stack>,
    env: Environment,
}

impl Session {
    pub fn new(config: Config, stacks: Vec<Stack>, env: Environment) -> Self {
        Self { config, stacks, env }
    }

    /// Load the stacks named by `config` and capture the process environment.
    pub fn from_config(config: Config) -> Result<Self> {
        let stacks = config.load_stacks()?;
        Ok(Self::new(config, stacks, Environment::from_process()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.stacks, &self.env, &self.config.flavor).with_tags(&self.config.tags)
    }

    pub fn known_tags(&self) -> Vec<String> {
        self.catalog().known_tags()
    }

    /// `first`, followed by the configured tags that are not already in it.
    pub fn preferred_tags(&self, first: &[Tag]) -> Vec<Tag> {
        let mut tags = first.to_vec();
        for tag in &self.config.vro {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// The statements that set up `name`.
    ///
    /// Failures never escape: they become a script whose last statement is
    /// `false` and whose diagnostics say what went wrong.
    pub fn setup(&mut self, name: &str, version: Option<&str>, options: &SetupOptions) -> ShellScript {
        if let Err(err) = check_tags(&options.tags, &self.known_tags()) {
            return ShellScript::failure(format!("Failed to setup {name}: {err}"));
        }
        let preferred = self.preferred_tags(&options.tags);

        let product = match &options.product_root {
            Some(root) => self.local_product(name, root),
            None => self.resolve_root(name, version, &preferred),
        };
        let (product, mut diagnostics) = match product {
            Ok(found) => found,
            Err(err @ Error::NotFound { .. }) if version.is_none() => {
                tracing::debug!("{err}");
                return ShellScript::failure(format!(
                    "Unable to find an acceptable version of {name}"
                ));
            }
            Err(err) => {
                let shown = version
                    .filter(|v| !is_relative_version(v))
                    .map(|v| format!(" {v}"))
                    .unwrap_or_default();
                return ShellScript::failure(format!("Failed to setup {name}{shown}: {err}"));
            }
        };

        if self.config.quiet {
            diagnostics.clear();
        } else if version.is_none() && options.product_root.is_none() && !options.tags.is_empty() {
            diagnostics = self
                .check_requested_tag(&product, &options.tags)
                .into_iter()
                .collect();
        }

        let existing = self.catalog().find_setup_product(name);
        if let Some(existing) = &existing {
            self.seed_aliases(existing);
        }
        let before = self.env.clone();

        if let Some(existing) = &existing {
            tracing::debug!(product = name, version = %existing.version, "replacing setup version");
            self.remove_product(existing);
        }
        let mut path = vec![name.to_string()];
        if let Err(err) = self.setup_dependencies(&product, &preferred, &mut path, &mut diagnostics) {
            self.env = before;
            return ShellScript::failure(format!(
                "Failed to setup {name} {}: {err}",
                product.version
            ));
        }
        self.apply_product(&product);
        tracing::info!(product = name, version = %product.version, "setup");

        ShellScript {
            statements: diff(&before, &self.env, &self.config.diff_options()),
            diagnostics,
        }
    }

    /// The statements that remove `name` and the dependencies it set up.
    pub fn unsetup(&mut self, name: &str) -> ShellScript {
        let Some(product) = self.catalog().find_setup_product(name) else {
            return ShellScript::failure(format!(
                "Failed to unsetup {name}: {}",
                Error::NotSetup(name.to_string())
            ));
        };

        let mut path = vec![name.to_string()];
        let mut doomed = vec![product.clone()];
        self.collect_setup_dependencies(&product, &mut path, &mut doomed);
        for product in &doomed {
            self.seed_aliases(product);
        }
        let before = self.env.clone();

        for product in &doomed {
            self.remove_product(product);
            tracing::info!(product = %product.name, version = %product.version, "unsetup");
        }

        ShellScript {
            statements: diff(&before, &self.env, &self.config.diff_options()),
            diagnostics: Vec::new(),
        }
    }

    /// Installation directory of `name`, by default the set-up version.
    ///
    /// `None` when there is no such product or it has no directory.
    pub fn product_dir(&self, name: &str, version: Option<&str>) -> Result<Option<PathBuf>> {
        let catalog = self.catalog();
        let product = match version {
            None => catalog.find_setup_product(name),
            Some(version) => {
                let request = VersionRequest::parse(version, &catalog.known_tags());
                match resolve(name, Some(&request), &[], &catalog, &self.config.resolve_options()) {
                    Ok(resolution) => Some(resolution.product),
                    Err(Error::NotFound { .. }) => None,
                    Err(err) => return Err(err),
                }
            }
        };
        Ok(product.and_then(|p| p.dir))
    }

    /// The version of `name` that is set up.
    pub fn setup_version(&self, name: &str) -> Result<String> {
        self.catalog()
            .find_setup_product(name)
            .map(|p| p.version)
            .ok_or_else(|| Error::NotFound {
                product: name.to_string(),
                request: " (not setup)".to_string(),
            })
    }

    /// Declare `product` in the stack at `root`, or the first stack on the
    /// path, and save it. Returns the file written.
    pub fn declare(
        &mut self,
        product: Product,
        tag: Option<Tag>,
        force: bool,
        root: Option<&Path>,
    ) -> Result<PathBuf> {
        let stack = self.stack_mut(root)?;
        stack.declare(product, tag, force)?;
        stack.save()
    }

    /// Remove a declaration or one of its tags and save the stack.
    ///
    /// Without `root` the first stack declaring `name` is changed.
    pub fn undeclare(
        &mut self,
        name: &str,
        version: Option<&str>,
        tag: Option<&Tag>,
        root: Option<&Path>,
    ) -> Result<usize> {
        let stack = match root {
            Some(root) => self.stack_mut(Some(root))?,
            None => self
                .stacks
                .iter_mut()
                .find(|s| {
                    s.products
                        .iter()
                        .any(|p| p.name == name && version.is_none_or(|v| p.version == v))
                })
                .ok_or_else(|| Error::not_found(name, version))?,
        };
        let changed = stack.undeclare(name, version, tag)?;
        stack.save()?;
        Ok(changed)
    }

    fn stack_mut(&mut self, root: Option<&Path>) -> Result<&mut Stack> {
        let Some(root) = root else {
            return self.stacks.first_mut().ok_or_else(|| {
                Error::ValidationFailed("No product stacks; set PRODENV_PATH".to_string())
            });
        };
        let position = self
            .stacks
            .iter()
            .position(|s| s.root.as_deref() == Some(root));
        let index = match position {
            Some(index) => index,
            None => {
                self.stacks.push(Stack::load(root)?);
                self.stacks.len() - 1
            }
        };
        Ok(&mut self.stacks[index])
    }

    fn resolve_root(
        &self,
        name: &str,
        version: Option<&str>,
        preferred: &[Tag],
    ) -> Result<(Product, Vec<String>)> {
        let catalog = self.catalog();
        let request = version.map(|v| VersionRequest::parse(v, &catalog.known_tags()));
        let resolution = resolve(
            name,
            request.as_ref(),
            preferred,
            &catalog,
            &self.config.resolve_options(),
        )?;
        let diagnostics = resolution.warning().into_iter().collect();
        Ok((resolution.product, diagnostics))
    }

    /// A product set up from a directory rather than a declaration.
    fn local_product(&self, name: &str, root: &Path) -> Result<(Product, Vec<String>)> {
        let dir = dunce::canonicalize(root).map_err(|e| Error::ReadFailed {
            path: root.to_path_buf(),
            error: e,
        })?;
        let version = format!("{}{}", self.config.local_version_prefix, dir.display());
        let mut product = Product::new(name, version).with_dir(dir);
        product.flavor = self.config.flavor.clone();
        Ok((product, Vec::new()))
    }

    /// Compare the chosen version with the one the requested tags name.
    fn check_requested_tag(&self, product: &Product, tags: &[Tag]) -> Option<String> {
        if tags.is_empty() {
            return None;
        }
        let catalog = self.catalog();
        let tagged = tags
            .iter()
            .find_map(|t| catalog.find_tagged_product(&product.name, t));
        match tagged {
            Some(tagged) if tagged.version == product.version => None,
            Some(tagged) => Some(format!(
                "Requested version tagged {} == \"{}\"; got version \"{}\"",
                join_tags(tags),
                tagged.version,
                product.version
            )),
            None => {
                let options: ResolveOptions = self.config.resolve_options();
                if options.is_local(&product.version) && !options.warn_on_local {
                    return None;
                }
                Some(format!(
                    "No versions of {} are tagged {}; setup version is {}",
                    product.name,
                    join_tags(tags),
                    product.version
                ))
            }
        }
    }

    /// Set up every dependency of `product` that is not set up yet, deepest
    /// first.
    fn setup_dependencies(
        &mut self,
        product: &Product,
        preferred: &[Tag],
        path: &mut Vec<String>,
        diagnostics: &mut Vec<String>,
    ) -> Result<()> {
        let table = self.catalog().dependency_table(product);
        let known = self.known_tags();
        for edge in table {
            if path.contains(&edge.product) {
                tracing::debug!(product = %edge.product, "dependency cycle, not descending");
                continue;
            }
            let request = edge
                .version
                .as_deref()
                .map(|v| VersionRequest::parse(v, &known));

            if let Some(existing) = self.catalog().find_setup_product(&edge.product) {
                if let Some(message) = conflict(&existing, request.as_ref())? {
                    diagnostics.push(message);
                }
                tracing::debug!(product = %edge.product, version = %existing.version, "already setup");
                continue;
            }

            let resolved = {
                let catalog = self.catalog();
                resolve(
                    &edge.product,
                    request.as_ref(),
                    preferred,
                    &catalog,
                    &self.config.resolve_options(),
                )
            };
            let dependency = match resolved {
                Ok(resolution) => {
                    if let Some(warning) = resolution.warning().filter(|_| !self.config.quiet) {
                        diagnostics.push(warning);
                    }
                    resolution.product
                }
                Err(Error::NotFound { .. }) if edge.optional => {
                    tracing::debug!(product = %edge.product, "optional dependency not found");
                    continue;
                }
                Err(err) => return Err(err),
            };

            path.push(edge.product.clone());
            let result = self.setup_dependencies(&dependency, preferred, path, diagnostics);
            path.pop();
            result?;
            self.apply_product(&dependency);
            tracing::info!(product = %dependency.name, version = %dependency.version, "setup");
        }
        Ok(())
    }

    /// Set-up products reachable from `product`, in depth-first pre-order.
    fn collect_setup_dependencies(
        &self,
        product: &Product,
        path: &mut Vec<String>,
        found: &mut Vec<Product>,
    ) {
        let catalog = self.catalog();
        for edge in catalog.dependency_table(product) {
            if path.contains(&edge.product) || found.iter().any(|p| p.name == edge.product) {
                continue;
            }
            let Some(dependency) = catalog.find_setup_product(&edge.product) else {
                continue;
            };
            found.push(dependency.clone());
            path.push(edge.product.clone());
            self.collect_setup_dependencies(&dependency, path, found);
            path.pop();
        }
    }

    fn apply_product(&mut self, product: &Product) {
        match &product.dir {
            Some(dir) => self
                .env
                .set(product_dir_var(&product.name), dir.display().to_string()),
            None => {
                self.env.remove(&product_dir_var(&product.name));
            }
        }
        self.env.set(
            setup_var(&product.name),
            SetupRecord::for_product(product).to_string(),
        );
        for op in &product.environment {
            op.apply(&mut self.env, product);
        }
    }

    fn remove_product(&mut self, product: &Product) {
        for op in product.environment.iter().rev() {
            op.revert(&mut self.env, product);
        }
        self.env.remove(&product_dir_var(&product.name));
        self.env.remove(&setup_var(&product.name));
    }

    /// Aliases are invisible to a child process, so assume the ones a set-up
    /// product defines are present in the calling shell.
    fn seed_aliases(&mut self, product: &Product) {
        for op in &product.environment {
            if let EnvOp::Alias(alias) = op {
                if self.env.alias(&alias.alias).is_none() {
                    self.env.set_alias(alias.alias.clone(), expand(&alias.value, product));
                }
            }
        }
    }
}

/// A note when an already set-up dependency is not the version asked for.
fn conflict(existing: &Product, request: Option<&VersionRequest>) -> Result<Option<String>> {
    let wanted = match request {
        Some(VersionRequest::Version(version)) if *version != existing.version => version.clone(),
        Some(VersionRequest::Expr(expr)) if !expr.matches(&existing.version)? => {
            expr.source().to_string()
        }
        _ => return Ok(None),
    };
    Ok(Some(format!(
        "{} {} is already setup; keeping it although {} was requested",
        existing.name, existing.version, wanted
    )))
}
