// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("current", TagScope::Global, "current")]
#[case("global:stable", TagScope::Global, "stable")]
#[case("user:alice", TagScope::User, "alice")]
fn test_parse_tag(#[case] text: &str, #[case] scope: TagScope, #[case] name: &str) {
    let tag: Tag = text.parse().expect("Should parse tag");
    assert_eq!(tag.scope(), scope);
    assert_eq!(tag.name(), name);
}

#[rstest]
#[case("")]
#[case("user:")]
#[case("two words")]
fn test_parse_invalid_tag(#[case] text: &str) {
    assert!(text.parse::<Tag>().is_err());
}

#[rstest]
fn test_display_keeps_user_qualifier() {
    assert_eq!(Tag::user("alice").to_string(), "user:alice");
    assert_eq!(Tag::global("current").to_string(), "current");
}

#[rstest]
fn test_special_tags() {
    assert!(Tag::global("setup").is_setup());
    assert!(Tag::global("newest").is_newest());
    assert!(!Tag::user("setup").is_setup());
}

#[rstest]
fn test_parse_tags_splits_whitespace() {
    let tags = parse_tags(["current stable", "user:bob"]).unwrap();
    assert_eq!(
        tags,
        vec![Tag::global("current"), Tag::global("stable"), Tag::user("bob")]
    );
}

#[rstest]
fn test_check_tags_reports_similar() {
    let known = vec!["current".to_string(), "stable".to_string()];
    assert!(check_tags(&[Tag::global("stable")], &known).is_ok());

    let err = check_tags(&[Tag::global("curr")], &known).unwrap_err();
    match err {
        Error::TagNotRecognized { tag, similar } => {
            assert_eq!(tag, "curr");
            assert_eq!(similar, vec!["current".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}
