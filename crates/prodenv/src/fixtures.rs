// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Shared declarations for unit tests.

use std::path::Path;

use crate::{Environment, Stack};

pub(crate) const STACK_ROOT: &str = "/opt/stack";

pub(crate) const TEST_FLAVOR: &str = "Linux64";

/// pkgA depends on pkgC (required) and pkgB (optional, never declared);
/// pkgC 2.0 depends on pkgD; pkgE and pkgF depend on each other; pkgH
/// depends on the undeclared pkgZ.
pub(crate) const SAMPLE_STACK: &str = r#"
api: prodenv/v0
products:
  - name: pkgA
    version: "1.0"
    dir: /opt/stack/pkgA/1.0
    table: /opt/stack/pkgA/1.0/ups/pkgA.table
    tags: [current]
    requires:
      - product: pkgC
      - product: pkgB
        optional: true
    environment:
      - prepend: PATH
        value: ${PRODUCT_DIR}/bin
      - alias: runA
        value: ${PRODUCT_DIR}/bin/a "$@"
  - name: pkgA
    version: "1.1"
    dir: /opt/stack/pkgA/1.1
    tags: [beta]
  - name: pkgC
    version: "1.0"
    dir: /opt/stack/pkgC/1.0
    tags: [stable]
  - name: pkgC
    version: "2.0"
    dir: /opt/stack/pkgC/2.0
    tags: [current]
    requires:
      - product: pkgD
        version: ">= 1.0"
  - name: pkgD
    version: "1.0"
    dir: /opt/stack/pkgD/1.0
  - name: pkgD
    version: "1.5"
    dir: /opt/stack/pkgD/1.5
  - name: pkgE
    version: "1.0"
    dir: none
    requires:
      - product: pkgF
  - name: pkgF
    version: "1.0"
    dir: none
    requires:
      - product: pkgE
  - name: pkgG
    version: "3.0"
    flavor: NoSuchPlatform
    dir: /opt/stack/pkgG/3.0
  - name: pkgH
    version: "1.0"
    dir: /opt/stack/pkgH/1.0
    requires:
      - product: pkgZ
"#;

pub(crate) fn sample_stack() -> Stack {
    let mut stack = Stack::from_yaml(SAMPLE_STACK).expect("sample stack parses");
    stack.set_root(Path::new(STACK_ROOT));
    stack
}

/// An environment in which pkgC 2.0 is already set up.
pub(crate) fn env_with_pkgc() -> Environment {
    Environment::from_vars([
        ("PATH", "/usr/bin:/bin"),
        ("PRODENV_DIR", "/opt/prodenv"),
        ("PRODENV_PATH", STACK_ROOT),
        ("PKGC_DIR", "/opt/stack/pkgC/2.0"),
        ("SETUP_PKGC", "pkgC 2.0 -f generic -Z /opt/stack"),
    ])
}
