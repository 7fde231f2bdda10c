// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Tabular listings of products, their dependencies and their users.

use std::cmp::Ordering;
use std::io::Write;

use crate::catalog::ProductCatalog;
use crate::resolve::{ResolveOptions, VersionRequest, resolve};
use crate::tag::{SETUP_TAG, Tag, check_tags};
use crate::version::{VersionExpr, is_relative_version, version_cmp};
use crate::walk::{DepthFilter, WalkOptions, walk};
use crate::{Error, Product, Result};

#[cfg(test)]
#[path = "./listing_test.rs"]
mod listing_test;

/// Options for [`print_products`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Product name or glob pattern.
    pub name: Option<String>,
    /// Exact version or relative expression.
    pub version: Option<String>,
    /// Only products carrying one of these tags.
    pub tags: Vec<Tag>,
    /// Only set-up products; with `dependencies`, the set-up versions.
    pub setup: bool,
    pub directory: bool,
    pub tablefile: bool,
    /// List the dependency tree of a single product.
    pub dependencies: bool,
    /// Print versions only.
    pub show_version: bool,
    /// Depths listed with `dependencies`.
    pub depth: DepthFilter,
    pub verbose: u8,
    /// Tags used to pick dependency versions.
    pub preferred_tags: Vec<Tag>,
    pub resolve: ResolveOptions,
}

/// Options for [`print_uses`].
#[derive(Debug, Clone, Default)]
pub struct UsesOptions {
    /// How many dependency levels to examine; unlimited when `None`.
    pub depth: Option<usize>,
    pub show_optional: bool,
    /// Tags used to pick dependency versions.
    pub tags: Vec<Tag>,
    pub resolve: ResolveOptions,
}

/// Write a listing of products to `out` and return how many matched.
pub fn print_products(
    out: &mut dyn Write,
    catalog: &dyn ProductCatalog,
    options: &ListOptions,
) -> Result<usize> {
    let mut tags = options.tags.clone();
    if !tags.is_empty() {
        check_tags(&tags, &catalog.known_tags())?;
    } else if options.setup && !options.dependencies {
        tags.push(Tag::global(SETUP_TAG));
    }

    let name = options.name.as_deref();
    let is_glob = name.is_some_and(|n| n.contains(['[', ']', '?', '*']));
    let pattern = match name {
        Some(n) if is_glob => Some(glob::Pattern::new(n).map_err(|e| {
            Error::ValidationFailed(format!("Invalid product pattern {n:?}: {e}"))
        })?),
        _ => None,
    };
    let version = options.version.as_deref().map(VersionFilter::new);

    let mut candidates = catalog.products();
    if tags.iter().any(Tag::is_setup) {
        for product in catalog.setup_products() {
            if !candidates.iter().any(|p| same_product(p, &product)) {
                candidates.push(product);
            }
        }
    }

    let mut products = Vec::new();
    for product in candidates {
        let name_matches = match (&pattern, name) {
            (Some(pattern), _) => pattern.matches(&product.name),
            (None, Some(name)) => product.name == name,
            (None, None) => true,
        };
        if !name_matches {
            continue;
        }
        if let Some(version) = &version {
            if !version.matches(&product.version)? {
                continue;
            }
        }
        if !tags.is_empty() && !tags.iter().any(|t| carries(catalog, &product, t)) {
            continue;
        }
        products.push(product);
    }

    if products.is_empty() {
        return match name {
            Some(name) => {
                let mut request = String::new();
                if let Some(version) = &options.version {
                    request.push_str(&format!(" {version}"));
                }
                if !tags.is_empty() {
                    let names: Vec<&str> = tags.iter().map(Tag::name).collect();
                    request.push_str(&format!(" tagged {}", names.join(" ")));
                }
                Err(Error::NotFound {
                    product: name.to_string(),
                    request,
                })
            }
            None => Ok(0),
        };
    }
    products.sort_by(by_name_then_version);

    if options.dependencies {
        print_dependency_tree(out, catalog, products, options)?;
        return Ok(1);
    }

    let mut previous: Option<String> = None;
    for product in &products {
        let line = product_line(catalog, product, options, name.is_some() && !is_glob);
        if line.is_empty() || previous.as_deref() == Some(line.as_str()) {
            continue;
        }
        writeln!(out, "{line}")?;
        previous = Some(line);
    }
    Ok(products.len())
}

fn print_dependency_tree(
    out: &mut dyn Write,
    catalog: &dyn ProductCatalog,
    mut products: Vec<Product>,
    options: &ListOptions,
) -> Result<()> {
    if products.len() > 1 {
        let setup: Vec<Product> = products
            .iter()
            .filter(|p| catalog.is_setup(&p.name, &p.version, p.stack_root.as_deref()))
            .cloned()
            .collect();
        if !options.setup || setup.is_empty() {
            return Err(Error::AmbiguousVersion {
                product: products[0].name.clone(),
                versions: products.into_iter().map(|p| p.version).collect(),
            });
        }
        products = setup;
    }
    let root = &products[0];

    if options.depth.includes(0)? {
        writeln!(out, "{:<40} {}", root.name, root.version)?;
    }

    let walk_options = WalkOptions {
        want_setup_versions: options.setup,
        strict: false,
        depth: options.depth.clone(),
        max_depth: None,
        preferred_tags: options.preferred_tags.clone(),
        resolve: options.resolve.clone(),
    };
    let walk = walk(root, catalog, &walk_options)?;
    for warning in &walk.warnings {
        tracing::warn!("{warning}");
    }

    let mut printed: Vec<&str> = Vec::new();
    for node in &walk.nodes {
        let name = node.product.name.as_str();
        if options.verbose == 0 && printed.contains(&name) {
            continue;
        }
        printed.push(name);
        let indent = if options.depth.is_exact() {
            String::new()
        } else {
            tree_indent(node.depth)
        };
        writeln!(out, "{:<40} {}", format!("{indent}{name}"), node.product.version)?;
    }
    Ok(())
}

/// `| ` per two levels, and a trailing `|` on odd levels.
fn tree_indent(depth: usize) -> String {
    let mut indent = "| ".repeat(depth / 2);
    if depth % 2 == 1 {
        indent.push('|');
    }
    indent
}

fn product_line(
    catalog: &dyn ProductCatalog,
    product: &Product,
    options: &ListOptions,
    single_name: bool,
) -> String {
    let mut info = String::new();
    if options.directory || options.tablefile {
        if options.verbose > 0 {
            info.push_str(&format!("{:<10}", product.version));
        }
        if options.directory {
            info.push_str(&product.dir_display());
        }
        if options.tablefile {
            if !info.is_empty() {
                info.push('\t');
            }
            info.push_str(&product.table_file_display());
        }
    } else if options.show_version {
        info.push_str(&product.version);
    } else {
        if single_name {
            info.push_str("   ");
        } else {
            info.push_str(&format!("{:<21} ", product.name));
        }
        info.push_str(&format!("{:<10} ", product.version));
        if options.verbose > 0 {
            if options.verbose > 1 {
                info.push_str(&format!("{:<10}", product.flavor));
            }
            info.push_str(&format!(
                "{:<20} {:<55}",
                product.stack_root_display(),
                product.dir_display()
            ));
        }

        let mut extra: Vec<String> = product
            .tags
            .iter()
            .map(|t| {
                if options.verbose > 1 {
                    t.to_string()
                } else {
                    t.name().to_string()
                }
            })
            .collect();
        if catalog.is_setup(&product.name, &product.version, product.stack_root.as_deref()) {
            extra.push(SETUP_TAG.to_string());
        }
        if !extra.is_empty() {
            info.push('\t');
            info.push_str(&extra.join(" "));
        }
    }
    info.trim_end().to_string()
}

/// Does `product` carry `tag`? `setup` means "is set up".
fn carries(catalog: &dyn ProductCatalog, product: &Product, tag: &Tag) -> bool {
    if tag.is_setup() {
        catalog.is_setup(&product.name, &product.version, product.stack_root.as_deref())
    } else {
        product.has_tag(tag)
    }
}

fn same_product(a: &Product, b: &Product) -> bool {
    a.name == b.name && a.version == b.version && a.stack_root == b.stack_root
}

/// An exact version or relative expression restricting a listing.
enum VersionFilter {
    Exact(String),
    Relative(VersionExpr),
}

impl VersionFilter {
    fn new(version: &str) -> Self {
        if is_relative_version(version) {
            Self::Relative(VersionExpr::parse(version))
        } else {
            Self::Exact(version.to_string())
        }
    }

    fn matches(&self, version: &str) -> Result<bool> {
        match self {
            Self::Exact(exact) => Ok(exact == version),
            Self::Relative(expr) => expr.matches(version),
        }
    }
}

/// A product whose dependency tree reaches the product being asked about.
struct User {
    product: Product,
    /// The version of the asked-about product it uses.
    uses: String,
    optional: bool,
    depth: usize,
}

/// Write the products that depend on `name` (at `version`, when given) to
/// `out` and return how many were listed.
pub fn print_uses(
    out: &mut dyn Write,
    catalog: &dyn ProductCatalog,
    name: &str,
    version: Option<&str>,
    options: &UsesOptions,
) -> Result<usize> {
    let walk_options = WalkOptions {
        max_depth: options.depth,
        preferred_tags: options.tags.clone(),
        resolve: options.resolve.clone(),
        ..WalkOptions::default()
    };

    let mut users = Vec::new();
    let mut candidates = catalog.products();
    candidates.sort_by(by_name_then_version);
    for product in candidates {
        if product.name == name {
            continue;
        }
        let walk = walk(&product, catalog, &walk_options)?;
        let node = walk.nodes.iter().find(|n| {
            n.product.name == name && version.is_none_or(|v| n.product.version == v)
        });
        if let Some(node) = node {
            users.push(User {
                uses: node.product.version.clone(),
                optional: node.optional,
                depth: node.depth,
                product,
            });
        }
    }

    if users.is_empty() && catalog.versions(name).is_empty() {
        return Err(Error::not_found(name, version));
    }

    let mut header = format!("{:<25} {:<15}", "product", "version");
    if version.is_none() {
        header.push_str(&format!(" {:<15}", format!("{name} version")));
    }
    writeln!(out, "{}", header.trim_end())?;

    let mut listed = 0;
    for user in &users {
        if user.optional && !options.show_optional {
            continue;
        }
        let indented = format!("{}{}", " ".repeat(user.depth - 1), user.product.name);
        let mut line = format!("{indented:<25} {:<15}", user.product.version);
        if version.is_none() {
            line.push_str(&format!(" {:<15}", user.uses));
        }
        if options.show_optional && user.optional {
            line.push_str("Optional");
        }
        writeln!(out, "{}", line.trim_end())?;
        listed += 1;
    }
    Ok(listed)
}

/// The `(name, version, depth)` of every dependency of `name`.
///
/// An unknown product has no dependencies.
pub fn dependencies(
    catalog: &dyn ProductCatalog,
    name: &str,
    version: Option<&str>,
    options: &WalkOptions,
) -> Result<Vec<(String, String, usize)>> {
    let request = version.map(|v| VersionRequest::parse(v, &catalog.known_tags()));
    let root = match resolve(
        name,
        request.as_ref(),
        &options.preferred_tags,
        catalog,
        &options.resolve,
    ) {
        Ok(resolution) => resolution.product,
        Err(Error::NotFound { .. }) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let walk = walk(&root, catalog, options)?;
    for warning in &walk.warnings {
        tracing::warn!("{warning}");
    }
    Ok(walk
        .nodes
        .into_iter()
        .map(|n| (n.product.name, n.product.version, n.depth))
        .collect())
}

fn by_name_then_version(a: &Product, b: &Product) -> Ordering {
    a.name
        .cmp(&b.name)
        .then_with(|| version_cmp(&a.version, &b.version))
}
