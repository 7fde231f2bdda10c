// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};

use super::*;
use crate::fixtures::{TEST_FLAVOR, env_with_pkgc, sample_stack};
use crate::{Catalog, Environment, ProductCatalog, Stack};

#[fixture]
fn stacks() -> Vec<Stack> {
    vec![sample_stack()]
}

fn current() -> WalkOptions {
    WalkOptions {
        preferred_tags: vec![Tag::global("current")],
        ..WalkOptions::default()
    }
}

fn summary(walk: &Walk) -> Vec<(String, String, usize)> {
    walk.nodes
        .iter()
        .map(|n| (n.product.name.clone(), n.product.version.clone(), n.depth))
        .collect()
}

fn triple(name: &str, version: &str, depth: usize) -> (String, String, usize) {
    (name.to_string(), version.to_string(), depth)
}

#[rstest]
#[case("", &[(0, true), (1, true), (9, true)])]
#[case("2", &[(1, true), (2, true), (3, false)])]
#[case("> 1", &[(1, false), (2, true)])]
#[case("depth == 2", &[(1, false), (2, true), (3, false)])]
#[case("depth >= 1 && depth < 3", &[(0, false), (2, true), (3, false)])]
fn test_depth_filter(#[case] filter: &str, #[case] expected: &[(usize, bool)]) {
    let filter = DepthFilter::parse(filter).expect("Should parse depth filter");
    for (depth, included) in expected {
        assert_eq!(filter.includes(*depth).unwrap(), *included, "depth {depth}");
    }
}

#[rstest]
fn test_depth_filter_rewrites() {
    assert_eq!(DepthFilter::parse("2").unwrap().source(), Some("depth <= 2"));
    assert_eq!(DepthFilter::parse("> 1").unwrap().source(), Some("depth > 1"));
    assert_eq!(DepthFilter::parse("  ").unwrap().source(), None);
    assert!(DepthFilter::parse("== 2").unwrap().is_exact());
    assert!(!DepthFilter::max(2).is_exact());
}

#[rstest]
#[case("(depth < 2")]
#[case("depth <")]
fn test_depth_filter_syntax_error(#[case] filter: &str) {
    assert!(matches!(
        DepthFilter::parse(filter),
        Err(Error::SyntaxError { .. })
    ));
}

#[rstest]
fn test_walk_declared_versions(stacks: Vec<Stack>) {
    let env = Environment::new();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgA", "1.0").unwrap();
    let walk = walk(&root, &catalog, &current()).unwrap();
    assert_eq!(
        summary(&walk),
        vec![triple("pkgC", "2.0", 1), triple("pkgD", "1.5", 2)]
    );
    assert!(walk.warnings.is_empty(), "optional pkgB is skipped silently");
    assert_eq!(walk.nodes[1].requested.as_deref(), Some(">= 1.0"));
    assert_eq!(walk.nodes[1].parent, "pkgC");
}

#[rstest]
fn test_walk_depth_filter_keeps_traversing(stacks: Vec<Stack>) {
    let env = Environment::new();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgA", "1.0").unwrap();

    let options = WalkOptions {
        depth: DepthFilter::parse("== 2").unwrap(),
        ..current()
    };
    let walk = walk(&root, &catalog, &options).unwrap();
    assert_eq!(summary(&walk), vec![triple("pkgD", "1.5", 2)]);

    let options = WalkOptions {
        max_depth: Some(1),
        ..current()
    };
    let walk = super::walk(&root, &catalog, &options).unwrap();
    assert_eq!(summary(&walk), vec![triple("pkgC", "2.0", 1)]);
}

#[rstest]
fn test_walk_stops_at_cycles(stacks: Vec<Stack>) {
    let env = Environment::new();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgE", "1.0").unwrap();
    let walk = walk(&root, &catalog, &current()).unwrap();
    assert_eq!(summary(&walk), vec![triple("pkgF", "1.0", 1)]);
    assert_eq!(
        walk.warnings,
        vec!["No versions of pkgF are tagged current; setup version is 1.0"]
    );
}

#[rstest]
fn test_walk_setup_versions(stacks: Vec<Stack>) {
    let env = env_with_pkgc();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgA", "1.0").unwrap();
    let options = WalkOptions {
        want_setup_versions: true,
        ..current()
    };
    let walk = walk(&root, &catalog, &options).unwrap();
    assert_eq!(summary(&walk), vec![triple("pkgC", "2.0", 1)]);
    assert_eq!(walk.warnings.len(), 1);
    assert!(walk.warnings[0].contains("pkgD is a dependency of pkgC"));
}

#[rstest]
fn test_walk_setup_versions_strict(stacks: Vec<Stack>) {
    let env = env_with_pkgc();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgA", "1.0").unwrap();
    let options = WalkOptions {
        want_setup_versions: true,
        strict: true,
        ..current()
    };
    let err = walk(&root, &catalog, &options).unwrap_err();
    assert!(matches!(
        err,
        Error::DependencyUnsatisfied { ref product, ref dependency }
            if product == "pkgC" && dependency == "pkgD"
    ));
}

#[rstest]
fn test_walk_missing_required_dependency(stacks: Vec<Stack>) {
    let env = Environment::new();
    let catalog = Catalog::new(&stacks, &env, TEST_FLAVOR);
    let root = catalog.find_product("pkgH", "1.0").unwrap();

    let lenient = walk(&root, &catalog, &current()).unwrap();
    assert!(lenient.nodes.is_empty());
    assert_eq!(lenient.warnings.len(), 1);
    assert!(lenient.warnings[0].contains("pkgZ"));

    let options = WalkOptions {
        strict: true,
        ..current()
    };
    assert!(matches!(
        walk(&root, &catalog, &options),
        Err(Error::NotFound { .. })
    ));
}
