// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Version ordering and relative version expressions.

use std::cmp::Ordering;

use crate::expr::{Comparator, Expression, SymbolTable, Token, Value, tokenize};
use crate::Result;

#[cfg(test)]
#[path = "./version_test.rs"]
mod version_test;

/// Symbol standing for the candidate version inside a [`VersionExpr`].
const VERSION_SYMBOL: &str = "version";

/// Compare two version strings.
///
/// Versions are split on `.`, `-`, `_` and `+`. Components compare
/// numerically when both are numbers, lexically when both are not, and a
/// number sorts before a word. When one version is a prefix of the other the
/// shorter one is older.
pub fn version_cmp(a: &str, b: &str) -> Ordering {
    let split = |v: &str| -> Vec<String> {
        v.split(['.', '-', '_', '+'])
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect()
    };
    let lhs = split(a);
    let rhs = split(b);

    for (l, r) in lhs.iter().zip(rhs.iter()) {
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    lhs.len().cmp(&rhs.len()).then_with(|| a.cmp(b))
}

/// Orders every operand as a version string.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionOrder;

impl Comparator for VersionOrder {
    fn compare(&self, lhs: &Value, rhs: &Value) -> Ordering {
        version_cmp(&lhs.to_string(), &rhs.to_string())
    }
}

/// True when `request` is a relative version such as `>= 1.2`.
pub fn is_relative_version(request: &str) -> bool {
    request
        .trim_start()
        .starts_with(['<', '>', '=', '!'])
}

/// A relative version request such as `>= 1.2 && < 2.0`.
///
/// Each comparison that has no left operand compares against the candidate
/// version. Clauses are joined with the usual `||`/`&&` connectives.
#[derive(Debug, Clone)]
pub struct VersionExpr {
    expression: Expression,
}

impl VersionExpr {
    pub fn parse(source: &str) -> Self {
        let mut tokens = Vec::new();
        for token in tokenize(source) {
            let needs_subject = matches!(token, Token::Cmp(_))
                && tokens
                    .last()
                    .is_none_or(|prev: &Token| prev.is_connective() || *prev == Token::LParen);
            if needs_subject {
                tokens.push(Token::Atom(VERSION_SYMBOL.to_string()));
            }
            tokens.push(token);
        }
        Self {
            expression: Expression::from_tokens(source.to_string(), tokens),
        }
    }

    pub fn source(&self) -> &str {
        self.expression.source()
    }

    /// Does `version` satisfy this expression?
    pub fn matches(&self, version: &str) -> Result<bool> {
        let symbols = SymbolTable::case_sensitive().with(VERSION_SYMBOL, Value::Str(version.into()));
        Ok(self
            .expression
            .eval_with(&symbols, &VersionOrder)?
            .is_truthy())
    }

    /// The newest of `versions` satisfying this expression.
    pub fn best_match<'a, I>(&self, versions: I) -> Result<Option<&'a str>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<&'a str> = None;
        for version in versions {
            if !self.matches(version)? {
                continue;
            }
            if best.is_none_or(|b| version_cmp(version, b) == Ordering::Greater) {
                best = Some(version);
            }
        }
        Ok(best)
    }
}
