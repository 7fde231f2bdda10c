// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Depth-first traversal of dependency tables.

use std::str::FromStr;

use crate::catalog::ProductCatalog;
use crate::expr::{Expression, SymbolTable};
use crate::resolve::{ResolveOptions, VersionRequest, resolve};
use crate::tag::Tag;
use crate::{Error, Product, Result};

#[cfg(test)]
#[path = "./walk_test.rs"]
mod walk_test;

/// Symbol bound to the recursion depth inside a [`DepthFilter`].
const DEPTH_SYMBOL: &str = "depth";

/// Decides which recursion depths are listed.
///
/// Accepts a bare integer `N` (meaning `depth <= N`), a comparison with no
/// left operand such as `> 1` (meaning `depth > 1`), or any expression
/// mentioning `depth`. An empty filter lets everything through.
#[derive(Debug, Clone, Default)]
pub struct DepthFilter {
    expression: Option<Expression>,
}

impl DepthFilter {
    /// A filter that includes every depth.
    pub fn all() -> Self {
        Self::default()
    }

    /// Include depths up to and including `depth`.
    pub fn max(depth: usize) -> Self {
        Self {
            expression: Some(Expression::compile(format!("{DEPTH_SYMBOL} <= {depth}"))),
        }
    }

    pub fn parse(filter: &str) -> Result<Self> {
        let filter = filter.trim();
        if filter.is_empty() {
            return Ok(Self::all());
        }
        if let Ok(depth) = filter.parse::<usize>() {
            return Ok(Self::max(depth));
        }
        let source = if !filter.to_ascii_lowercase().contains(DEPTH_SYMBOL) {
            format!("{DEPTH_SYMBOL} {filter}")
        } else {
            filter.to_string()
        };
        let parsed = Self {
            expression: Some(Expression::compile(source)),
        };
        // surface syntax errors before any traversal starts
        parsed.includes(0)?;
        Ok(parsed)
    }

    /// The rewritten expression, if any.
    pub fn source(&self) -> Option<&str> {
        self.expression.as_ref().map(Expression::source)
    }

    /// Does the filter select one exact depth? Listings drop their
    /// indentation in that case.
    pub fn is_exact(&self) -> bool {
        self.source().is_some_and(|s| s.contains("=="))
    }

    pub fn includes(&self, depth: usize) -> Result<bool> {
        match &self.expression {
            None => Ok(true),
            Some(expression) => {
                expression.is_true(&SymbolTable::new().with(DEPTH_SYMBOL, depth))
            }
        }
    }
}

impl FromStr for DepthFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Options for [`walk`].
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Report the version of each dependency that is set up rather than the
    /// one its table asks for.
    pub want_setup_versions: bool,
    /// Fail on a required dependency that cannot be found, instead of
    /// warning and skipping it.
    pub strict: bool,
    /// Which depths to report. Traversal continues below excluded depths.
    pub depth: DepthFilter,
    /// Do not descend below this depth.
    pub max_depth: Option<usize>,
    /// Tags used for edges that do not name a version.
    pub preferred_tags: Vec<Tag>,
    pub resolve: ResolveOptions,
}

/// One reported dependency.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub product: Product,
    /// Edges from the root; the root's direct dependencies are at depth 1.
    pub depth: usize,
    pub optional: bool,
    /// The version the parent's table asked for, if any.
    pub requested: Option<String>,
    /// Name of the product whose table holds this edge.
    pub parent: String,
}

/// The outcome of [`walk`].
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Dependencies in depth-first pre-order.
    pub nodes: Vec<DependencyNode>,
    /// Skipped required dependencies and tag fallbacks, one message each,
    /// for the caller to report.
    pub warnings: Vec<String>,
}

/// Traverse the dependency table of `root` depth first.
pub fn walk(root: &Product, catalog: &dyn ProductCatalog, options: &WalkOptions) -> Result<Walk> {
    let mut context = WalkContext {
        catalog,
        options,
        known_tags: catalog.known_tags(),
        path: vec![root.name.clone()],
        walk: Walk::default(),
    };
    context.visit(root, 1)?;
    Ok(context.walk)
}

/// State threaded through one traversal.
struct WalkContext<'a> {
    catalog: &'a dyn ProductCatalog,
    options: &'a WalkOptions,
    known_tags: Vec<String>,
    /// Names on the branch being visited, root first.
    path: Vec<String>,
    walk: Walk,
}

impl WalkContext<'_> {
    fn visit(&mut self, parent: &Product, depth: usize) -> Result<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        for edge in self.catalog.dependency_table(parent) {
            if self.path.contains(&edge.product) {
                tracing::debug!(
                    product = %edge.product,
                    path = %self.path.join(" -> "),
                    "dependency cycle, not descending"
                );
                continue;
            }

            let Some(product) = self.find(parent, &edge.product, edge.version.as_deref(), edge.optional)?
            else {
                continue;
            };

            if self.options.depth.includes(depth)? {
                self.walk.nodes.push(DependencyNode {
                    product: product.clone(),
                    depth,
                    optional: edge.optional,
                    requested: edge.version.clone(),
                    parent: parent.name.clone(),
                });
            }

            self.path.push(edge.product.clone());
            let result = self.visit(&product, depth + 1);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    /// The product an edge points at, or `None` when it is skipped.
    fn find(
        &mut self,
        parent: &Product,
        name: &str,
        version: Option<&str>,
        optional: bool,
    ) -> Result<Option<Product>> {
        if self.options.want_setup_versions {
            if let Some(product) = self.catalog.find_setup_product(name) {
                return Ok(Some(product));
            }
            if optional {
                return Ok(None);
            }
            if self.options.strict {
                return Err(Error::DependencyUnsatisfied {
                    product: parent.name.clone(),
                    dependency: name.to_string(),
                });
            }
            self.skip(format!(
                "Product {name} is a dependency of {}, but is not setup; skipping",
                parent.name
            ));
            return Ok(None);
        }

        let request = version.map(|v| VersionRequest::parse(v, &self.known_tags));
        match resolve(
            name,
            request.as_ref(),
            &self.options.preferred_tags,
            self.catalog,
            &self.options.resolve,
        ) {
            Ok(resolution) => {
                if let Some(warning) = resolution.warning() {
                    tracing::debug!("{warning}");
                    self.walk.warnings.push(warning);
                }
                Ok(Some(resolution.product))
            }
            Err(Error::NotFound { .. }) if optional => {
                tracing::debug!(product = name, parent = %parent.name, "optional dependency not found");
                Ok(None)
            }
            Err(err @ Error::NotFound { .. }) if !self.options.strict => {
                self.skip(format!("{err} (required by {}); skipping", parent.name));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn skip(&mut self, message: String) {
        tracing::debug!("{message}");
        self.walk.warnings.push(message);
    }
}
