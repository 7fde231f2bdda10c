// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! prodenv - Product Version Resolution and Environment Setup
//!
//! This crate tracks multiple installed versions of named products, resolves
//! which version of a product (and of each of its dependencies) should be
//! active given an ordered list of preferred tags, and computes the shell
//! statements that move the calling shell from its current environment to
//! the environment with that product set up.
//!
//! # Overview
//!
//! Products are declared in per-stack declaration files
//! (`<stack>/ups_db/prodenv.yaml`). A [`Session`] loads every stack named in
//! `PRODENV_PATH`, takes a snapshot of the environment, applies a setup or
//! unsetup in memory, and diffs the result into [`ShellScript`] statements.
//!
//! # Example
//!
//! ```yaml
//! # /opt/stack/ups_db/prodenv.yaml
//! api: prodenv/v0
//! products:
//!   - name: pkgA
//!     version: "1.0"
//!     dir: /opt/stack/pkgA/1.0
//!     tags: [current]
//!     requires:
//!       - product: pkgC
//!         version: ">= 2.0"
//!       - product: pkgB
//!         optional: true
//!     environment:
//!       - prepend: PATH
//!         value: "${PRODUCT_DIR}/bin"
//! ```

pub mod actions;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod error;
pub mod expr;
pub mod listing;
pub mod product;
pub mod resolve;
pub mod session;
pub mod shell;
pub mod stack;
pub mod tag;
pub mod version;
pub mod walk;

#[cfg(test)]
mod fixtures;

pub use actions::EnvOp;
pub use catalog::{Catalog, ProductCatalog};
pub use config::Config;
pub use environment::{Environment, SetupRecord};
pub use error::{Error, Result};
pub use expr::{Expression, SymbolTable, Value};
pub use listing::{ListOptions, UsesOptions, dependencies, print_products, print_uses};
pub use product::{Dependency, Product};
pub use resolve::{ResolveOptions, ResolveReason, Resolution, VersionRequest, resolve};
pub use session::{Session, SetupOptions, ShellScript};
pub use shell::{DiffOptions, ShellDialect, diff};
pub use stack::{ApiVersion, Stack};
pub use tag::Tag;
pub use version::{VersionExpr, version_cmp};
pub use walk::{DependencyNode, DepthFilter, Walk, WalkOptions, walk};

/// Variable locating the manager's own installation; never unset.
pub const PRODENV_DIR_VAR: &str = "PRODENV_DIR";

/// Variable listing the product stacks; never unset.
pub const PRODENV_PATH_VAR: &str = "PRODENV_PATH";

/// Directory inside a stack root that holds its declarations.
pub const STACK_DB_DIRNAME: &str = "ups_db";

/// Well-known filename for a stack's product declarations.
pub const STACK_DB_FILENAME: &str = "prodenv.yaml";

/// Flavor that matches every platform.
pub const GENERIC_FLAVOR: &str = "generic";
