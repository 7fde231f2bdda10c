// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Environment actions declared by a product.

use serde::{Deserialize, Serialize};

use crate::environment::{DEFAULT_PATH_SEPARATOR, Environment};
use crate::Product;

#[cfg(test)]
#[path = "./actions_test.rs"]
mod actions_test;

/// One environment action, written in declaration files as e.g.
/// `- prepend: PATH` followed by `value: ${PRODUCT_DIR}/bin`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EnvOp {
    Set(SetEnv),
    Prepend(PrependEnv),
    Append(AppendEnv),
    Unset(UnsetEnv),
    Alias(AliasEnv),
    Comment(CommentEnv),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetEnv {
    pub set: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PrependEnv {
    pub prepend: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppendEnv {
    pub append: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UnsetEnv {
    pub unset: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AliasEnv {
    pub alias: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommentEnv {
    pub comment: String,
}

impl EnvOp {
    /// Apply this action to `env` on behalf of `product`.
    pub fn apply(&self, env: &mut Environment, product: &Product) {
        match self {
            Self::Set(s) => env.set(&s.set, expand(&s.value, product)),
            Self::Prepend(p) => env.prepend_path(
                &p.prepend,
                &expand(&p.value, product),
                separator(p.separator.as_deref()),
            ),
            Self::Append(a) => env.append_path(
                &a.append,
                &expand(&a.value, product),
                separator(a.separator.as_deref()),
            ),
            Self::Unset(u) => {
                env.remove(&u.unset);
            }
            Self::Alias(a) => env.set_alias(&a.alias, expand(&a.value, product)),
            Self::Comment(_) => {}
        }
    }

    /// Undo what [`EnvOp::apply`] did. Unset variables cannot be restored.
    pub fn revert(&self, env: &mut Environment, product: &Product) {
        match self {
            Self::Set(s) => {
                env.remove(&s.set);
            }
            Self::Prepend(p) => env.remove_path_element(
                &p.prepend,
                &expand(&p.value, product),
                separator(p.separator.as_deref()),
            ),
            Self::Append(a) => env.remove_path_element(
                &a.append,
                &expand(&a.value, product),
                separator(a.separator.as_deref()),
            ),
            Self::Alias(a) => {
                env.remove_alias(&a.alias);
            }
            Self::Unset(_) | Self::Comment(_) => {}
        }
    }
}

fn separator(sep: Option<&str>) -> &str {
    sep.unwrap_or(DEFAULT_PATH_SEPARATOR)
}

/// Substitute `${PRODUCT_DIR}`, `${PRODUCT_NAME}`, `${PRODUCT_VERSION}` and
/// `${PRODUCT_FLAVOR}` in an action value.
pub fn expand(value: &str, product: &Product) -> String {
    value
        .replace("${PRODUCT_DIR}", &product.dir_display())
        .replace("${PRODUCT_NAME}", &product.name)
        .replace("${PRODUCT_VERSION}", &product.version)
        .replace("${PRODUCT_FLAVOR}", &product.flavor)
}
