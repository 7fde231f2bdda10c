// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;
use crate::{Dependency, ShellDialect};
use crate::fixtures::{TEST_FLAVOR, env_with_pkgc, sample_stack};

fn config() -> Config {
    Config {
        flavor: TEST_FLAVOR.to_string(),
        ..Config::default()
    }
}

fn session(env: Environment) -> Session {
    Session::new(config(), vec![sample_stack()], env)
}

fn tagged(name: &str) -> SetupOptions {
    SetupOptions {
        tags: vec![Tag::global(name)],
        ..SetupOptions::default()
    }
}

#[rstest]
fn test_setup_keeps_setup_dependencies() {
    let mut session = session(env_with_pkgc());
    let script = session.setup("pkgA", None, &tagged("current"));

    assert!(!script.failed());
    assert!(script.diagnostics.is_empty(), "{:?}", script.diagnostics);
    assert_eq!(
        script.statements,
        vec![
            "export PATH=/opt/stack/pkgA/1.0/bin:/usr/bin:/bin",
            "export PKGA_DIR=/opt/stack/pkgA/1.0",
            "export SETUP_PKGA='pkgA 1.0 -f generic -Z /opt/stack'",
            "function runA { /opt/stack/pkgA/1.0/bin/a \"$@\" ; }; export -f runA",
        ]
    );
    assert!(script.statements.iter().all(|s| !s.contains("pkgB") && !s.contains("PKGB")));
    assert!(script.statements.iter().all(|s| !s.contains("PKGC")));
    assert_eq!(
        session.environment().get("PKGC_DIR"),
        Some("/opt/stack/pkgC/2.0")
    );
}

#[rstest]
fn test_setup_sets_up_missing_dependencies_first() {
    let mut session = session(Environment::from_vars([("PATH", "/bin")]));
    let script = session.setup("pkgA", None, &SetupOptions::default());
    assert!(!script.failed());

    let position = |needle: &str| {
        script
            .statements
            .iter()
            .position(|s| s.starts_with(needle))
            .unwrap_or_else(|| panic!("no statement for {needle}"))
    };
    assert!(position("export SETUP_PKGD") < position("export SETUP_PKGC"));
    assert!(position("export SETUP_PKGC") < position("export SETUP_PKGA"));
    assert_eq!(session.setup_version("pkgC").unwrap(), "2.0");
    assert_eq!(session.setup_version("pkgD").unwrap(), "1.5");
}

#[rstest]
fn test_setup_twice_is_silent() {
    let mut session = session(env_with_pkgc());
    assert!(!session.setup("pkgA", None, &SetupOptions::default()).statements.is_empty());
    let again = session.setup("pkgA", None, &SetupOptions::default());
    assert!(again.statements.is_empty(), "{:?}", again.statements);
}

#[rstest]
fn test_setup_other_version_replaces_it() {
    let mut session = session(env_with_pkgc());
    let script = session.setup("pkgC", Some("1.0"), &SetupOptions::default());
    assert_eq!(
        script.statements,
        vec![
            "export PKGC_DIR=/opt/stack/pkgC/1.0",
            "export SETUP_PKGC='pkgC 1.0 -f generic -Z /opt/stack'",
        ]
    );
}

#[rstest]
fn test_setup_csh() {
    let config = Config {
        shell: ShellDialect::CShell,
        ..config()
    };
    let mut session = Session::new(config, vec![sample_stack()], env_with_pkgc());
    let script = session.setup("pkgA", None, &SetupOptions::default());
    assert!(script.statements.contains(&"setenv PKGA_DIR /opt/stack/pkgA/1.0".to_string()));
    assert_eq!(
        script.statements.last().map(String::as_str),
        Some("alias runA '/opt/stack/pkgA/1.0/bin/a \\!*'")
    );
}

#[rstest]
fn test_setup_no_action_hides_bookkeeping() {
    let config = Config {
        no_action: true,
        ..config()
    };
    let mut session = Session::new(config, vec![sample_stack()], env_with_pkgc());
    let script = session.setup("pkgA", None, &SetupOptions::default());
    assert!(script.statements.iter().all(|s| s.starts_with("echo ")));
    assert!(script.statements.iter().all(|s| !s.contains("SETUP_PKGA")));
}

#[rstest]
#[case("nothing", None, "Unable to find an acceptable version of nothing")]
#[case("pkgC", Some("7.0"), "Failed to setup pkgC 7.0: Unable to find product pkgC 7.0")]
#[case("pkgD", Some(">= 9"), "Failed to setup pkgD: Unable to find product pkgD >= 9")]
fn test_setup_failure(
    #[case] name: &str,
    #[case] version: Option<&str>,
    #[case] message: &str,
) {
    let mut session = session(env_with_pkgc());
    let script = session.setup(name, version, &SetupOptions::default());
    assert!(script.failed());
    assert_eq!(script.statements, vec!["false"]);
    assert_eq!(script.diagnostics, vec![message]);
}

#[rstest]
fn test_setup_failure_in_dependency_changes_nothing() {
    let env = env_with_pkgc();
    let mut session = session(env.clone());
    let script = session.setup("pkgH", None, &SetupOptions::default());
    assert_eq!(script.statements, vec!["false"]);
    assert!(script.diagnostics[0].starts_with("Failed to setup pkgH 1.0: "));
    assert!(script.diagnostics[0].contains("pkgZ"));
    assert_eq!(session.environment(), &env);
}

#[rstest]
fn test_setup_unknown_tag() {
    let mut session = session(env_with_pkgc());
    let script = session.setup("pkgA", None, &tagged("nonesuch"));
    assert!(script.failed());
    assert!(script.diagnostics[0].contains("Unknown tag: nonesuch"));
}

#[rstest]
fn test_setup_reports_untagged_version() {
    let mut session = session(Environment::new());
    let script = session.setup("pkgD", None, &tagged("stable"));
    assert!(!script.failed());
    assert_eq!(
        script.diagnostics,
        vec!["No versions of pkgD are tagged stable; setup version is 1.5"]
    );

    let config = Config {
        quiet: true,
        ..config()
    };
    let mut quiet = Session::new(config, vec![sample_stack()], Environment::new());
    assert!(quiet.setup("pkgD", None, &tagged("stable")).diagnostics.is_empty());
}

#[rstest]
fn test_setup_reports_untagged_dependency() {
    let mut stack = Stack::new("/opt/other");
    stack
        .declare(
            Product::new("top", "1.0").with_dependency(Dependency::required("lib")),
            Some(Tag::global("current")),
            false,
        )
        .unwrap();
    for version in ["1.0", "2.0"] {
        stack.declare(Product::new("lib", version), None, false).unwrap();
    }

    let mut session = Session::new(config(), vec![stack.clone()], Environment::new());
    let script = session.setup("top", None, &SetupOptions::default());
    assert!(!script.failed(), "{:?}", script.diagnostics);
    assert_eq!(session.setup_version("lib").unwrap(), "2.0");
    assert_eq!(
        script.diagnostics,
        vec!["No versions of lib are tagged current; setup version is 2.0"]
    );

    let config = Config {
        quiet: true,
        ..config()
    };
    let mut quiet = Session::new(config, vec![stack], Environment::new());
    assert!(quiet.setup("top", None, &SetupOptions::default()).diagnostics.is_empty());
}

#[rstest]
fn test_setup_reports_conflicting_dependency() {
    let env = Environment::from_vars([
        ("PKGD_DIR", "/elsewhere/pkgD"),
        ("SETUP_PKGD", "pkgD 0.9 -f generic -Z none"),
    ]);
    let mut session = session(env);
    let script = session.setup("pkgC", Some("2.0"), &SetupOptions::default());
    assert!(!script.failed());
    assert_eq!(
        script.diagnostics,
        vec!["pkgD 0.9 is already setup; keeping it although >= 1.0 was requested"]
    );
}

#[rstest]
fn test_setup_local_product() {
    let tmp = TempDir::new().unwrap();
    let mut session = session(Environment::new());
    let options = SetupOptions {
        product_root: Some(tmp.path().to_path_buf()),
        ..tagged("current")
    };
    let script = session.setup("mine", None, &options);
    assert!(!script.failed(), "{:?}", script.diagnostics);
    assert!(script.diagnostics.is_empty());

    let dir = dunce::canonicalize(tmp.path()).unwrap();
    let version = session.setup_version("mine").unwrap();
    assert_eq!(version, format!("LOCAL:{}", dir.display()));
    assert_eq!(session.product_dir("mine", None).unwrap(), Some(dir));
}

#[rstest]
fn test_setup_local_product_with_space_in_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("my dir");
    std::fs::create_dir(&root).unwrap();
    let mut session = session(Environment::new());
    let script = session.setup("mine", None, &SetupOptions {
        product_root: Some(root.clone()),
        ..SetupOptions::default()
    });
    assert!(!script.failed(), "{:?}", script.diagnostics);

    let dir = dunce::canonicalize(&root).unwrap();
    let version = format!("LOCAL:{}", dir.display());
    assert_eq!(session.setup_version("mine").unwrap(), version);
    assert!(session.catalog().is_setup("mine", &version, None));
    assert_eq!(session.product_dir("mine", None).unwrap(), Some(dir));
}

#[rstest]
fn test_unsetup_reverses_setup() {
    let original = env_with_pkgc();
    let mut session = session(original.clone());
    session.setup("pkgA", None, &SetupOptions::default());

    let script = session.unsetup("pkgA");
    assert!(!script.failed());
    for expected in [
        "export PATH=/usr/bin:/bin",
        "unset PKGA_DIR",
        "unset SETUP_PKGA",
        "unset PKGC_DIR",
        "unset SETUP_PKGC",
        "unset -f runA",
    ] {
        assert!(
            script.statements.contains(&expected.to_string()),
            "missing {expected} in {:?}",
            script.statements
        );
    }
    assert_eq!(session.environment().get("PATH"), original.get("PATH"));
    assert!(session.environment().aliases().is_empty());
}

#[rstest]
fn test_unsetup_fresh_session_unaliases() {
    let env = Environment::from_vars([
        ("PATH", "/opt/stack/pkgA/1.0/bin:/bin"),
        ("PKGA_DIR", "/opt/stack/pkgA/1.0"),
        ("SETUP_PKGA", "pkgA 1.0 -f generic -Z /opt/stack"),
    ]);
    let mut session = session(env);
    let script = session.unsetup("pkgA");
    assert_eq!(
        script.statements,
        vec![
            "export PATH=/bin",
            "unset PKGA_DIR",
            "unset SETUP_PKGA",
            "unset -f runA",
        ]
    );
}

#[rstest]
fn test_unsetup_not_setup() {
    let mut session = session(Environment::new());
    let script = session.unsetup("pkgA");
    assert_eq!(script.statements, vec!["false"]);
    assert_eq!(script.diagnostics, vec!["Failed to unsetup pkgA: pkgA is not setup"]);
}

#[rstest]
fn test_product_dir_and_setup_version() {
    let session = session(env_with_pkgc());
    assert_eq!(
        session.product_dir("pkgC", None).unwrap(),
        Some(PathBuf::from("/opt/stack/pkgC/2.0"))
    );
    assert_eq!(
        session.product_dir("pkgC", Some("stable")).unwrap(),
        Some(PathBuf::from("/opt/stack/pkgC/1.0"))
    );
    assert_eq!(session.product_dir("pkgE", Some("1.0")).unwrap(), None);
    assert_eq!(session.product_dir("nothing", Some("1.0")).unwrap(), None);

    assert_eq!(session.setup_version("pkgC").unwrap(), "2.0");
    assert!(matches!(
        session.setup_version("pkgA"),
        Err(Error::NotFound { .. })
    ));
}

#[rstest]
fn test_declare_and_undeclare() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        path: vec![tmp.path().to_path_buf()],
        ..config()
    };
    let stacks = config.load_stacks().unwrap();
    let mut session = Session::new(config, stacks, Environment::new());

    let product = Product::new("pkgX", "1.0").with_dir(tmp.path().join("pkgX"));
    let written = session
        .declare(product, Some(Tag::global("current")), false, None)
        .unwrap();
    assert_eq!(written, Stack::db_path(tmp.path()));

    let reloaded = Stack::load(tmp.path()).unwrap();
    assert!(reloaded.find("pkgX", "1.0").unwrap().has_tag(&Tag::global("current")));
    assert!(!session.setup("pkgX", None, &SetupOptions::default()).failed());

    assert_eq!(session.undeclare("pkgX", None, None, None).unwrap(), 1);
    assert!(Stack::load(tmp.path()).unwrap().products.is_empty());
    assert!(matches!(
        session.undeclare("pkgX", None, None, None),
        Err(Error::NotFound { .. })
    ));
}

#[rstest]
fn test_declare_without_stacks() {
    let mut session = Session::new(config(), Vec::new(), Environment::new());
    let result = session.declare(Product::new("pkgX", "1.0"), None, false, None);
    assert!(matches!(result, Err(Error::ValidationFailed(_))));
}
