// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("1.2.0", "1.10.0", Ordering::Less)]
#[case("2.0", "1.9.9", Ordering::Greater)]
#[case("1.2", "1.2.1", Ordering::Less)]
#[case("1.2.0", "1.2.0", Ordering::Equal)]
#[case("1.2.rc1", "1.2.3", Ordering::Greater)]
#[case("v1", "v2", Ordering::Less)]
#[case("10.0-beta", "10.0-alpha", Ordering::Greater)]
fn test_version_cmp(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
    assert_eq!(version_cmp(a, b), expected, "{a} vs {b}");
}

#[rstest]
#[case(">= 1.2", true)]
#[case("== 1.2", true)]
#[case("<2", true)]
#[case("1.2", false)]
#[case("current", false)]
fn test_is_relative_version(#[case] request: &str, #[case] expected: bool) {
    assert_eq!(is_relative_version(request), expected);
}

#[rstest]
#[case(">= 1.2", "1.2.0", true)]
#[case(">= 1.2", "1.1.9", false)]
#[case(">= 1.2 && < 2.0", "1.10", true)]
#[case(">= 1.2 && < 2.0", "2.0", false)]
#[case("== 1.3 || == 1.5", "1.5", true)]
#[case("== 1.3 || == 1.5", "1.4", false)]
#[case("(> 3)", "3.1", true)]
fn test_version_expr_matches(#[case] expr: &str, #[case] version: &str, #[case] expected: bool) {
    let parsed = VersionExpr::parse(expr);
    assert_eq!(parsed.matches(version).unwrap(), expected, "{version} {expr}");
}

#[rstest]
fn test_version_expr_best_match() {
    let expr = VersionExpr::parse(">= 1.2 && < 2.0");
    let versions = ["1.1", "1.2", "1.9.3", "2.0", "1.10"];
    assert_eq!(expr.best_match(versions).unwrap(), Some("1.10"));

    let none = VersionExpr::parse("> 5");
    assert_eq!(none.best_match(versions).unwrap(), None);
}
