use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn docex() -> Command {
    Command::cargo_bin("docex").unwrap()
}

/// Config file whose API key variable is never set.
fn keyless_config(dir: &TempDir) -> String {
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"llm": {"api_key_env": "DOCEX_TEST_UNSET_KEY"}, "retry": {"base_delay_ms": 0}}"#,
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn test_version() {
    docex()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_prompt_for_license() {
    docex()
        .args(["prompt", "driving_license"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("### ROLE & GOAL ###"))
        .stdout(predicate::str::contains("\"license_number\": \"The driver's license or ID card number.\""));
}

#[test]
fn test_prompt_unknown_type() {
    docex()
        .args(["prompt", "passport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid document type 'passport'. Available types: driving_license, shop_receipt, resume",
        ));
}

#[test]
fn test_prompt_custom_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terse.txt");
    std::fs::write(&path, "  Return the resume as JSON.\n").unwrap();

    docex()
        .args(["prompt", "resume", "--custom-prompt"])
        .arg(&path)
        .assert()
        .success()
        .stdout("Return the resume as JSON.\n");
}

#[test]
fn test_extract_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = keyless_config(&dir);

    docex()
        .args(["--config", &config, "extract", "--type", "resume", "--dataset"])
        .arg(dir.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dataset directory not found"));
}

#[test]
fn test_extract_empty_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = keyless_config(&dir);
    let dataset = dir.path().join("empty");
    std::fs::create_dir(&dataset).unwrap();
    std::fs::write(dataset.join("notes.txt"), "not a document").unwrap();

    docex()
        .args(["--config", &config, "extract", "-t", "shop_receipt", "-d"])
        .arg(&dataset)
        .assert()
        .success()
        .stdout(predicate::str::contains("No supported files found"))
        .stdout(predicate::str::contains(".jpg, .jpeg, .png, .pdf, .tiff, .bmp"));
}

#[test]
fn test_extract_empty_dataset_reports_missing_prompt_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = keyless_config(&dir);
    let dataset = dir.path().join("empty");
    std::fs::create_dir(&dataset).unwrap();

    docex()
        .args(["--config", &config, "extract", "-t", "resume", "-d"])
        .arg(&dataset)
        .arg("-p")
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("custom prompt file not readable"));
}

#[test]
fn test_extract_without_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = keyless_config(&dir);
    let dataset = dir.path().join("licenses");
    std::fs::create_dir(&dataset).unwrap();
    std::fs::write(dataset.join("scan.png"), "placeholder").unwrap();

    docex()
        .env_remove("DOCEX_TEST_UNSET_KEY")
        .args(["--config", &config, "extract", "-t", "driving_license", "-d"])
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing API key: set DOCEX_TEST_UNSET_KEY"));
}

#[test]
fn test_process_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = keyless_config(&dir);

    docex()
        .args(["--config", &config, "process", "missing.png", "--type", "resume"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found: missing.png"));
}

#[test]
fn test_config_init_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let path = path.to_str().unwrap();

    docex()
        .args(["--config", path, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    docex()
        .args(["--config", path, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    docex()
        .args(["--config", path, "config", "get", "retry.max_attempts"])
        .assert()
        .success()
        .stdout("3\n");

    docex()
        .args(["--config", path, "config", "set", "retry.max_attempts", "5"])
        .assert()
        .success();

    docex()
        .args(["--config", path, "config", "get", "retry.max_attempts"])
        .assert()
        .success()
        .stdout("5\n");

    docex()
        .args(["--config", path, "config", "set", "retry.max_attempts", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("retry.max_attempts"));

    docex()
        .args(["--config", path, "config", "get", "llm.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
