// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for prodenv operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with prodenv Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during prodenv operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// No declared product matches the request
    #[error("Unable to find product {product}{request}")]
    #[diagnostic(
        code(prodenv::not_found),
        help("Run 'prodenv list {product}' to see the declared versions")
    )]
    NotFound { product: String, request: String },

    /// A tag that no stack or configuration knows about
    #[error("Unknown tag: {tag}")]
    #[diagnostic(code(prodenv::tag_not_recognized), help("{}", suggestion_message(similar)))]
    TagNotRecognized { tag: String, similar: Vec<String> },

    /// A required dependency is not set up (strict mode only)
    #[error("Product {dependency} is a dependency of {product}, but is not setup")]
    #[diagnostic(
        code(prodenv::dependency_unsatisfied),
        help("Set up {dependency} first, or list without --strict")
    )]
    DependencyUnsatisfied { product: String, dependency: String },

    /// Malformed logical or depth expression
    #[error("Invalid expression \"{expression}\": {message}")]
    #[diagnostic(code(prodenv::syntax_error))]
    SyntaxError { expression: String, message: String },

    /// Several versions match and the caller must pick one
    #[error("Please choose the version of {product} you want ({})", .versions.join(", "))]
    #[diagnostic(code(prodenv::ambiguous_version))]
    AmbiguousVersion {
        product: String,
        versions: Vec<String>,
    },

    /// Unsetup of a product that is not set up
    #[error("{0} is not setup")]
    #[diagnostic(code(prodenv::not_setup))]
    NotSetup(String),

    /// Redeclaration with a different directory or table file
    #[error("Product {product} {version} is already declared")]
    #[diagnostic(
        code(prodenv::already_declared),
        help("Use --force to replace the existing declaration")
    )]
    AlreadyDeclared { product: String, version: String },

    /// Invalid YAML in a declaration or startup file
    #[error("Invalid declaration file: {error}")]
    #[diagnostic(
        code(prodenv::invalid_yaml),
        help("Check YAML syntax and ensure 'api: prodenv/v0' is present")
    )]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(prodenv::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(prodenv::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(prodenv::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(prodenv::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::NotFound`] for an optional version or tag request.
    pub fn not_found<S: Into<String>>(product: S, request: Option<&str>) -> Self {
        Self::NotFound {
            product: product.into(),
            request: request.map(|r| format!(" {r}")).unwrap_or_default(),
        }
    }

    pub(crate) fn syntax<E: Into<String>, M: Into<String>>(expression: E, message: M) -> Self {
        Self::SyntaxError {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

fn suggestion_message(similar: &[String]) -> String {
    if similar.is_empty() {
        "Run 'prodenv tags' to list the known tags".to_string()
    } else {
        format!("Did you mean one of: {}?", similar.join(", "))
    }
}
