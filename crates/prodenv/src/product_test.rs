// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
fn test_parse_product_with_none_sentinels() {
    let yaml = r#"
name: pkgA
version: "1.0"
dir: none
table: none
"#;
    let product: Product = serde_yaml::from_str(yaml).expect("Should parse product");
    assert_eq!(product.name, "pkgA");
    assert_eq!(product.flavor, GENERIC_FLAVOR);
    assert!(product.dir.is_none());
    assert!(product.table_file.is_none());
    assert_eq!(product.dir_display(), "none");
}

#[rstest]
fn test_serialize_writes_none_sentinel() {
    let product = Product::new("pkgA", "1.0");
    let yaml = serde_yaml::to_string(&product).unwrap();
    assert!(yaml.contains("dir: none"), "{yaml}");
    assert!(yaml.contains("table: none"), "{yaml}");
    assert!(!yaml.contains("requires"), "{yaml}");
}

#[rstest]
fn test_parse_dependencies() {
    let yaml = r#"
name: pkgA
version: "1.0"
dir: /opt/pkgA
requires:
  - product: pkgC
    version: ">= 2.0"
  - product: pkgB
    optional: true
"#;
    let product: Product = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(product.dir, Some(PathBuf::from("/opt/pkgA")));
    assert_eq!(
        product.requires,
        vec![
            Dependency::required("pkgC").with_version(">= 2.0"),
            Dependency::optional("pkgB"),
        ]
    );
}

#[rstest]
#[case("generic", "Linux64", true)]
#[case("Linux64", "linux64", true)]
#[case("DarwinX86", "Linux64", false)]
fn test_supports_flavor(#[case] declared: &str, #[case] wanted: &str, #[case] expected: bool) {
    let mut product = Product::new("pkgA", "1.0");
    product.flavor = declared.to_string();
    assert_eq!(product.supports_flavor(wanted), expected);
}
