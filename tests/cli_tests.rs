mod common;

use common::{fasta_ids, seqpick_cmd, TestEnvironment};
use predicates::prelude::*;
use pretty_assertions::assert_eq;

/// Config with every external tool pointing at a binary that cannot exist
const MISSING_TOOLS_CONFIG: &str = r#"
[cdhit]
binary = "seqpick-missing-cd-hit"

[tools]
mafft_binary = "seqpick-missing-mafft"
alipid_binary = "seqpick-missing-esl-alipid"
"#;

fn isolated_config(env: &TestEnvironment) -> std::path::PathBuf {
    env.write("seqpick.toml", MISSING_TOOLS_CONFIG)
}

#[test]
fn reduce_with_identity_table() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();
    let identities = env.sample_identities();
    let output = env.path("picked.fasta");

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["--repset-only", "-m", "4", "-q"])
        .arg("--identities")
        .arg(&identities)
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .success();

    assert_eq!(fasta_ids(&output), vec!["seq1", "seq4", "seq6", "seq9"]);
}

#[test]
fn reduce_prints_summary() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();
    let identities = env.sample_identities();

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .args(["--repset-only", "-m", "2"])
        .arg("--identities")
        .arg(&identities)
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected 2 of 10"));

    assert!(env.path("sample_reduced.fasta").exists());
}

#[test]
fn invalid_mixture_weight_exits_with_configuration_code() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .args(["--repset-only", "--mixture-weight", "1.5"])
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .failure()
        .code(8)
        .stderr(predicate::str::contains("Error [ConfigurationError]"));
}

#[test]
fn missing_input_exits_with_io_code() {
    let env = TestEnvironment::new();

    seqpick_cmd()
        .arg("reduce")
        .arg(env.path("absent.fasta"))
        .args(["--repset-only", "-q"])
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Error [IoError]"))
        .stderr(predicate::str::contains("absent.fasta"));
}

#[test]
fn missing_cdhit_exits_with_tool_code() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .args(["--cdhit-only", "-q"])
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("Error [ExternalToolError]"))
        .stderr(predicate::str::contains("CD-HIT"));
}

#[test]
fn low_cdhit_threshold_is_rejected() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .args(["--cdhit-only", "-s", "0.3", "-q"])
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .failure()
        .code(8)
        .stderr(predicate::str::contains("ConfigurationError"));
}

#[test]
fn exclusive_mode_flags_conflict() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();

    seqpick_cmd()
        .arg("reduce")
        .arg(&input)
        .args(["--cdhit-only", "--repset-only"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("ConfigurationError").not());
}

#[test]
fn missing_env_config_is_named_in_error() {
    let env = TestEnvironment::new();
    let input = env.sample_fasta();

    seqpick_cmd()
        .env("SEQPICK_CONFIG", env.path("nowhere.toml"))
        .arg("reduce")
        .arg(&input)
        .args(["--repset-only", "-q"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("nowhere.toml"));
}

#[test]
fn config_prints_toml() {
    let env = TestEnvironment::new();

    seqpick_cmd()
        .arg("config")
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .success()
        .stdout(predicate::str::contains("[selection]"))
        .stdout(predicate::str::contains("seqpick-missing-cd-hit"));
}

#[test]
fn config_writes_file() {
    let env = TestEnvironment::new();
    let target = env.path("written.toml");

    seqpick_cmd()
        .arg("config")
        .arg("-o")
        .arg(&target)
        .arg("-c")
        .arg(isolated_config(&env))
        .assert()
        .success();

    let text = std::fs::read_to_string(&target).unwrap();
    assert!(text.contains("mixture_weight"));
}
