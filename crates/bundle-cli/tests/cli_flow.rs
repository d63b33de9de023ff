use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

fn bundle_cmd() -> Command {
    Command::cargo_bin("bundle").unwrap()
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is valid json")
}

#[test]
fn create_add_sign_verify_export_import_round_trip() {
    let workdir = tempdir().unwrap();
    let bundle_dir = workdir.path().join("demo-bundle");

    let create_out = bundle_cmd()
        .args(["create", "Demo Bundle", "--version", "1.0.0", "--type", "templates", "--out"])
        .arg(&bundle_dir)
        .assert()
        .success()
        .get_output()
        .clone();
    let create_json = json_stdout(&create_out);
    let key_path = create_json["signing_key_path"].as_str().unwrap().to_string();

    let payload = workdir.path().join("hello.json");
    fs::write(&payload, br#"{"greeting":"hi"}"#).unwrap();

    bundle_cmd()
        .args(["add"])
        .arg(&bundle_dir)
        .args(["--file"])
        .arg(&payload)
        .args(["--type", "template", "--id", "hello"])
        .assert()
        .success();

    bundle_cmd()
        .args(["sign"])
        .arg(&bundle_dir)
        .args(["--key", &key_path])
        .assert()
        .success();

    let pubkey_path = bundle_dir.join("signatures/public-key.pem");
    bundle_cmd()
        .args(["verify"])
        .arg(&bundle_dir)
        .args(["--pubkey"])
        .arg(&pubkey_path)
        .assert()
        .success();

    let archive_path = workdir.path().join("demo-bundle.tar");
    bundle_cmd()
        .args(["export"])
        .arg(&bundle_dir)
        .args(["--out"])
        .arg(&archive_path)
        .assert()
        .success();
    assert!(archive_path.is_file());

    let target_dir = workdir.path().join("installed");
    bundle_cmd()
        .args(["import"])
        .arg(&archive_path)
        .args(["--target"])
        .arg(&target_dir)
        .args(["--pubkey"])
        .arg(&pubkey_path)
        .assert()
        .success();

    assert_eq!(
        fs::read(target_dir.join("templates/hello.json")).unwrap(),
        br#"{"greeting":"hi"}"#
    );
}

#[test]
fn verify_rejects_tampered_content() {
    let workdir = tempdir().unwrap();
    let bundle_dir = workdir.path().join("demo-bundle");

    let create_out = bundle_cmd()
        .args(["create", "Demo Bundle", "--version", "1.0.0", "--type", "templates", "--out"])
        .arg(&bundle_dir)
        .assert()
        .success()
        .get_output()
        .clone();
    let create_json = json_stdout(&create_out);
    let key_path = create_json["signing_key_path"].as_str().unwrap().to_string();

    let payload = workdir.path().join("hello.json");
    fs::write(&payload, b"original").unwrap();
    bundle_cmd()
        .args(["add"])
        .arg(&bundle_dir)
        .args(["--file"])
        .arg(&payload)
        .args(["--type", "template", "--id", "hello"])
        .assert()
        .success();
    bundle_cmd()
        .args(["sign"])
        .arg(&bundle_dir)
        .args(["--key", &key_path])
        .assert()
        .success();

    fs::write(bundle_dir.join("templates/hello.json"), b"tampered").unwrap();

    let pubkey_path = bundle_dir.join("signatures/public-key.pem");
    bundle_cmd()
        .args(["verify"])
        .arg(&bundle_dir)
        .args(["--pubkey"])
        .arg(&pubkey_path)
        .assert()
        .failure()
        .code(3);
}

#[test]
fn import_without_force_blocks_on_existing_file() {
    let workdir = tempdir().unwrap();
    let bundle_dir = workdir.path().join("demo-bundle");

    let create_out = bundle_cmd()
        .args(["create", "Demo Bundle", "--version", "1.0.0", "--type", "templates", "--out"])
        .arg(&bundle_dir)
        .assert()
        .success()
        .get_output()
        .clone();
    let create_json = json_stdout(&create_out);
    let key_path = create_json["signing_key_path"].as_str().unwrap().to_string();

    let payload = workdir.path().join("hello.json");
    fs::write(&payload, b"content").unwrap();
    bundle_cmd()
        .args(["add"])
        .arg(&bundle_dir)
        .args(["--file"])
        .arg(&payload)
        .args(["--type", "template", "--id", "hello"])
        .assert()
        .success();
    bundle_cmd()
        .args(["sign"])
        .arg(&bundle_dir)
        .args(["--key", &key_path])
        .assert()
        .success();

    let archive_path = workdir.path().join("demo-bundle.tar");
    bundle_cmd()
        .args(["export"])
        .arg(&bundle_dir)
        .args(["--out"])
        .arg(&archive_path)
        .assert()
        .success();

    let target_dir = workdir.path().join("installed");
    fs::create_dir_all(target_dir.join("templates")).unwrap();
    fs::write(target_dir.join("templates/hello.json"), b"pre-existing").unwrap();

    let pubkey_path = bundle_dir.join("signatures/public-key.pem");
    bundle_cmd()
        .args(["import"])
        .arg(&archive_path)
        .args(["--target"])
        .arg(&target_dir)
        .args(["--pubkey"])
        .arg(&pubkey_path)
        .assert()
        .failure()
        .code(4);
}
