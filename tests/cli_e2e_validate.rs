//! End-to-end tests for the `validate` command.

mod common;
use common::prelude::*;

#[test]
fn test_validate_valid_project() {
    let fixture = TestFixture::new()
        .with_properties(props::COREMOD)
        .with_sources();

    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Feature set resolved"))
        .stdout(predicate::str::contains("[OK] Repository CleanroomMC Maven"))
        .stdout(predicate::str::contains("Project is valid"));
}

#[test]
fn test_validate_invalid_yaml() {
    let fixture = TestFixture::new()
        .with_properties(props::PLAIN)
        .with_descriptor("minecraft: [unclosed\n");

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERR] Project descriptor parsed"));
}

#[test]
fn test_validate_unknown_descriptor_field() {
    let fixture = TestFixture::new()
        .with_properties(props::PLAIN)
        .with_descriptor("minecraft:\n  version: 1.12.2\nbogus: true\n");

    fixture.command().arg("validate").assert().failure();
}

#[test]
fn test_validate_missing_coremod_class() {
    let fixture = TestFixture::new().with_properties(props::PLAIN);

    fixture
        .command()
        .args(["-P", "use_coremod=true", "-P", "include_mod=true", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("coremod_plugin_class_name"));
}

#[test]
fn test_validate_gate_flag_required() {
    let fixture = TestFixture::new()
        .with_properties(props::PLAIN)
        .with_descriptor(
            r#"
dependencies:
  - compile-only: curse.maven:jei-238222:2995910
    when: use_jei
"#,
        );

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("use_jei"));

    fixture
        .command()
        .args(["-P", "use_jei=false", "validate"])
        .assert()
        .success();
}

#[test]
fn test_validate_warns_without_access_transformer_file() {
    let fixture = TestFixture::new().with_properties(props::PLAIN);

    fixture
        .command()
        .args(["-P", "use_access_transformer=true", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARN]"));
}

#[test]
fn test_validate_explicit_properties_file_must_exist() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["--properties", "missing.properties", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERR] Flags loaded"));
}
