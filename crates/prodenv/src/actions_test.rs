// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn pkg() -> Product {
    Product::new("pkgA", "1.0").with_dir("/opt/pkgA/1.0")
}

#[rstest]
fn test_parse_actions() {
    let yaml = r#"
- set: FOO
  value: bar
- prepend: PATH
  value: ${PRODUCT_DIR}/bin
- append: LD_LIBRARY_PATH
  value: ${PRODUCT_DIR}/lib
  separator: ":"
- unset: OLD
- alias: runA
  value: ${PRODUCT_DIR}/bin/a "$@"
- comment: "nothing to do"
"#;
    let ops: Vec<EnvOp> = serde_yaml::from_str(yaml).expect("Should parse actions");
    assert_eq!(ops.len(), 6);
    assert!(matches!(ops[0], EnvOp::Set(_)));
    assert!(matches!(ops[1], EnvOp::Prepend(_)));
    assert!(matches!(ops[2], EnvOp::Append(_)));
    assert!(matches!(ops[3], EnvOp::Unset(_)));
    assert!(matches!(ops[4], EnvOp::Alias(_)));
    assert!(matches!(ops[5], EnvOp::Comment(_)));
}

#[rstest]
fn test_expand_product_variables() {
    assert_eq!(
        expand("${PRODUCT_DIR}/bin:${PRODUCT_NAME}-${PRODUCT_VERSION}", &pkg()),
        "/opt/pkgA/1.0/bin:pkgA-1.0"
    );
}

#[rstest]
fn test_apply_then_revert_restores_paths() {
    let product = pkg();
    let mut env = Environment::from_vars([("PATH", "/usr/bin:/bin")]);
    let ops = vec![
        EnvOp::Prepend(PrependEnv {
            prepend: "PATH".into(),
            value: "${PRODUCT_DIR}/bin".into(),
            separator: None,
        }),
        EnvOp::Append(AppendEnv {
            append: "MANPATH".into(),
            value: "${PRODUCT_DIR}/man".into(),
            separator: None,
        }),
        EnvOp::Set(SetEnv {
            set: "PKGA_HOME".into(),
            value: "${PRODUCT_DIR}".into(),
        }),
        EnvOp::Alias(AliasEnv {
            alias: "runA".into(),
            value: "a \"$@\"".into(),
        }),
    ];

    for op in &ops {
        op.apply(&mut env, &product);
    }
    assert_eq!(env.get("PATH"), Some("/opt/pkgA/1.0/bin:/usr/bin:/bin"));
    assert_eq!(env.get("MANPATH"), Some("/opt/pkgA/1.0/man"));
    assert_eq!(env.get("PKGA_HOME"), Some("/opt/pkgA/1.0"));
    assert_eq!(env.alias("runA"), Some("a \"$@\""));

    for op in ops.iter().rev() {
        op.revert(&mut env, &product);
    }
    assert_eq!(env, Environment::from_vars([("PATH", "/usr/bin:/bin")]));
}

#[rstest]
fn test_prepend_does_not_duplicate() {
    let product = pkg();
    let mut env = Environment::from_vars([("PATH", "/opt/pkgA/1.0/bin:/usr/bin")]);
    let op = EnvOp::Prepend(PrependEnv {
        prepend: "PATH".into(),
        value: "${PRODUCT_DIR}/bin".into(),
        separator: None,
    });
    op.apply(&mut env, &product);
    assert_eq!(env.get("PATH"), Some("/opt/pkgA/1.0/bin:/usr/bin"));
}
