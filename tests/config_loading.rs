// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use boundrun::config::{load_and_validate, load_from_path, parse_duration, BatchFile, ExecutorConfig};
use boundrun::errors::BoundrunError;
use boundrun_test_utils::builders::BatchFileBuilder;
use boundrun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: boundrun::errors::Result<BatchFile>) -> String {
    match result {
        Err(BoundrunError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

/// Sanity-check that demos/basic.toml is wired the way its comment says.
#[test]
fn basic_demo_config_is_parsed_correctly() -> TestResult {
    init_tracing();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/basic.toml"))?;

    assert_eq!(cfg.task.len(), 3);
    assert_eq!(cfg.task_names().collect::<Vec<_>>(), vec!["date", "hello", "nap"]);
    assert_eq!(cfg.task.get("hello").map(|t| t.cmd.as_str()), Some("echo hello"));

    let exec = cfg.executor_config();
    assert_eq!(exec.concurrency_limit, 2);
    assert_eq!(exec.per_task_timeout, Some(Duration::from_secs(10)));

    Ok(())
}

#[test]
fn failing_demo_config_is_parsed_correctly() -> TestResult {
    init_tracing();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/failing.toml"))?;

    assert_eq!(cfg.task.len(), 3);
    assert_eq!(
        cfg.executor_config(),
        ExecutorConfig::new(3).with_timeout(Duration::from_millis(500))
    );

    Ok(())
}

#[test]
fn missing_config_section_uses_defaults() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
"#,
    );

    let cfg = load_and_validate(file.path())?;
    let exec = cfg.executor_config();
    assert!(exec.concurrency_limit >= 1);
    assert_eq!(exec.concurrency_limit, ExecutorConfig::default().concurrency_limit);
    assert_eq!(exec.per_task_timeout, None);

    Ok(())
}

#[test]
fn zero_concurrency_limit_is_rejected() {
    let file = write_config(
        r#"
[config]
concurrency_limit = 0

[task.A]
cmd = "echo A"
"#,
    );

    let msg = expect_config_error(load_and_validate(file.path()));
    assert!(msg.contains("concurrency_limit"));
    assert!(msg.contains(">= 1"));
}

#[test]
fn bad_timeout_is_rejected() {
    let file = write_config(
        r#"
[config]
per_task_timeout = "ten seconds"

[task.A]
cmd = "echo A"
"#,
    );

    let msg = expect_config_error(load_and_validate(file.path()));
    assert!(msg.contains("per_task_timeout"));
}

#[test]
fn empty_task_table_is_rejected() {
    let file = write_config(
        r#"
[config]
concurrency_limit = 2
"#,
    );

    let msg = expect_config_error(load_and_validate(file.path()));
    assert!(msg.contains("at least one"));
}

#[test]
fn blank_command_is_rejected() {
    let file = write_config(
        r#"
[task.A]
cmd = "   "
"#,
    );

    let msg = expect_config_error(load_and_validate(file.path()));
    assert!(msg.contains("'A'"));
    assert!(msg.contains("empty"));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[task.A\ncmd = ");

    match load_and_validate(file.path()) {
        Err(BoundrunError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    match load_from_path("/definitely/not/here/Boundrun.toml") {
        Err(BoundrunError::IoError(_)) => {}
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn raw_load_skips_validation() -> TestResult {
    let file = write_config(
        r#"
[config]
concurrency_limit = 0
"#,
    );

    let raw = load_from_path(file.path())?;
    assert_eq!(raw.config.concurrency_limit, Some(0));
    assert!(raw.task.is_empty());
    assert!(BatchFile::try_from(raw).is_err());

    Ok(())
}

#[test]
fn builder_produces_validated_batch() {
    let batch = BatchFileBuilder::new()
        .with_task("lint", "cargo clippy")
        .with_task("test", "cargo test")
        .concurrency_limit(4)
        .per_task_timeout("2m")
        .build();

    assert_eq!(batch.task.len(), 2);
    assert_eq!(
        batch.executor_config(),
        ExecutorConfig::new(4).with_timeout(Duration::from_secs(120))
    );
}

#[test]
fn executor_config_validation() {
    assert!(ExecutorConfig::new(1).validate().is_ok());
    assert!(matches!(
        ExecutorConfig::new(0).validate(),
        Err(BoundrunError::ConfigError(_))
    ));
}

#[test]
fn duration_strings() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("0ms"), Ok(Duration::ZERO));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("ms").is_err());
    assert!(parse_duration("5d").is_err());
}
