// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Choosing one concrete version of a product.

use std::fmt;

use crate::catalog::ProductCatalog;
use crate::tag::{Tag, USER_TAG_PREFIX};
use crate::version::{VersionExpr, is_relative_version};
use crate::{Error, Product, Result};

#[cfg(test)]
#[path = "./resolve_test.rs"]
mod resolve_test;

/// Version prefix given to products set up straight from a directory.
pub const DEFAULT_LOCAL_VERSION_PREFIX: &str = "LOCAL:";

/// What the caller asked for.
#[derive(Debug, Clone)]
pub enum VersionRequest {
    /// An exact version name.
    Version(String),
    /// The version carrying a tag.
    Tag(Tag),
    /// The newest version satisfying a relative expression.
    Expr(VersionExpr),
}

impl VersionRequest {
    /// Interpret `request` as a relative expression, a tag from `known_tags`,
    /// or else a literal version.
    pub fn parse(request: &str, known_tags: &[String]) -> Self {
        let request = request.trim();
        if is_relative_version(request) {
            return Self::Expr(VersionExpr::parse(request));
        }
        if request.starts_with(USER_TAG_PREFIX) || known_tags.iter().any(|t| t == request) {
            if let Ok(tag) = request.parse() {
                return Self::Tag(tag);
            }
        }
        Self::Version(request.to_string())
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(v) => f.write_str(v),
            Self::Tag(t) => write!(f, "tagged {t}"),
            Self::Expr(e) => f.write_str(e.source()),
        }
    }
}

/// Knobs for the tag fallback heuristic.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Versions starting with this prefix are local checkouts.
    pub local_version_prefix: String,
    /// Warn about untagged local versions as well.
    pub warn_on_local: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            local_version_prefix: DEFAULT_LOCAL_VERSION_PREFIX.to_string(),
            warn_on_local: false,
        }
    }
}

impl ResolveOptions {
    pub fn is_local(&self, version: &str) -> bool {
        !self.local_version_prefix.is_empty() && version.starts_with(&self.local_version_prefix)
    }
}

/// Why a version was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveReason {
    /// The exact version was requested.
    Explicit,
    /// The first tag in preference order naming a version.
    Tagged(Tag),
    /// The newest version satisfying a relative expression.
    Relative(String),
    /// No requested tag names a version; the newest version was taken.
    Fallback { unmatched: Vec<Tag>, warn: bool },
}

/// A chosen version and how it was chosen.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub product: Product,
    pub requested_tags: Vec<Tag>,
    pub reason: ResolveReason,
}

impl Resolution {
    pub fn version(&self) -> &str {
        &self.product.version
    }

    /// The soft warning for a tag fallback, if one is due.
    pub fn warning(&self) -> Option<String> {
        match &self.reason {
            ResolveReason::Fallback { unmatched, warn: true } => Some(format!(
                "No versions of {} are tagged {}; setup version is {}",
                self.product.name,
                join_tags(unmatched),
                self.product.version
            )),
            _ => None,
        }
    }
}

pub(crate) fn join_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Pick one version of `name`.
///
/// An exact version or relative expression is looked up directly. A tag
/// request, or no request at all, walks the tags in order (`[tag]` or
/// `preferred`) and takes the first one naming a version; when none does the
/// newest version is taken with a soft warning.
pub fn resolve(
    name: &str,
    request: Option<&VersionRequest>,
    preferred: &[Tag],
    catalog: &dyn ProductCatalog,
    options: &ResolveOptions,
) -> Result<Resolution> {
    let tags: Vec<Tag> = match request {
        Some(VersionRequest::Version(version)) => {
            let product = catalog
                .find_product(name, version)
                .ok_or_else(|| Error::not_found(name, Some(version)))?;
            tracing::debug!(product = name, %version, "explicit version");
            return Ok(Resolution {
                product,
                requested_tags: Vec::new(),
                reason: ResolveReason::Explicit,
            });
        }
        Some(VersionRequest::Expr(expr)) => {
            let candidates = catalog.versions(name);
            let best = expr.best_match(candidates.iter().map(|p| p.version.as_str()))?;
            let product = best
                .and_then(|v| candidates.iter().find(|p| p.version == v))
                .cloned()
                .ok_or_else(|| Error::not_found(name, Some(expr.source())))?;
            tracing::debug!(product = name, version = %product.version, expr = expr.source(), "relative version");
            return Ok(Resolution {
                product,
                requested_tags: Vec::new(),
                reason: ResolveReason::Relative(expr.source().to_string()),
            });
        }
        Some(VersionRequest::Tag(tag)) => vec![tag.clone()],
        None => preferred.to_vec(),
    };

    let mut chosen: Option<(Product, &Tag)> = None;
    for tag in &tags {
        let Some(product) = catalog.find_tagged_product(name, tag) else {
            continue;
        };
        if let Some((first, first_tag)) = &chosen {
            if first.version != product.version {
                tracing::debug!(
                    product = name,
                    kept = %first.version,
                    tag = %first_tag,
                    ignored = %product.version,
                    later = %tag,
                    "earlier tag wins"
                );
            }
            continue;
        }
        chosen = Some((product, tag));
    }
    if let Some((product, tag)) = chosen {
        tracing::debug!(product = name, version = %product.version, %tag, "tagged version");
        let tag = tag.clone();
        return Ok(Resolution {
            product,
            requested_tags: tags,
            reason: ResolveReason::Tagged(tag),
        });
    }

    let product = catalog.best_product(name).ok_or_else(|| match request {
        Some(request) => Error::not_found(name, Some(&request.to_string())),
        None => Error::not_found(name, None),
    })?;
    let warn = !tags.is_empty() && (options.warn_on_local || !options.is_local(&product.version));
    tracing::debug!(
        product = name,
        version = %product.version,
        tags = %join_tags(&tags),
        "no tagged version, using the newest"
    );
    Ok(Resolution {
        product,
        reason: ResolveReason::Fallback {
            unmatched: tags.clone(),
            warn,
        },
        requested_tags: tags,
    })
}
