use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

const ROWS: &str = "DUPONT|Jean|01/02/1980|3 rue Haute|75001|Paris|06 12 34 56 78|jean@example.fr|FR7611111111111111111111111|BNPAFRPP|\n\
MARTIN|Claire|02/03/1985|1 place Nette|69001|Lyon|+33 7 12 34 56 78|claire@example.fr|FR7622222222222222222222222|CRLYFRPP|\n";

fn command(temp: &TempDir, db_path: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fiches");
    cmd.env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .env_remove("RUST_LOG")
        .args(["--db-path", db_path.to_str().expect("db path")]);
    cmd
}

fn run_cmd(temp: &TempDir, db_path: &Path, args: &[&str]) -> String {
    let output = command(temp, db_path)
        .args(args)
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).expect("utf8")
}

fn run_cmd_json(temp: &TempDir, db_path: &Path, args: &[&str]) -> Value {
    let output = command(temp, db_path)
        .arg("--json")
        .args(args)
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

fn run_failing(temp: &TempDir, db_path: &Path, args: &[&str]) -> Output {
    let output = command(temp, db_path)
        .args(args)
        .output()
        .expect("run command");
    assert!(!output.status.success(), "command succeeded: {:?}", output);
    output
}

#[test]
fn import_show_and_exit_codes() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");
    let input = temp.path().join("rows.txt");
    fs::write(&input, ROWS).expect("write input");

    let out = run_cmd(&temp, &db_path, &["import", input.to_str().expect("input")]);
    assert!(out.contains("added 2, updated 0, duplicate 0"));

    let body = run_cmd(&temp, &db_path, &["show", "+33 6 12 34 56 78"]);
    assert!(body.starts_with("Fiche pour DUPONT Jean\n"));

    let detail = run_cmd_json(&temp, &db_path, &["show", "0712345678"]);
    assert_eq!(detail["key"], "0712345678");
    assert_eq!(detail["fields"]["email"], "claire@example.fr");
    assert_eq!(detail["fields"]["iban"], "FR7622222222222222222222222");

    let missing = run_failing(&temp, &db_path, &["show", "0123456789"]);
    assert_eq!(missing.status.code(), Some(2));
    let invalid = run_failing(&temp, &db_path, &["show", "12"]);
    assert_eq!(invalid.status.code(), Some(3));
}

#[test]
fn stdin_import_reports_json_counts() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");

    let output = command(&temp, &db_path)
        .args(["--json", "import"])
        .write_stdin("Jean 0612345678\n\nrien ici\n\nJean encore 06 12 34 56 78")
        .output()
        .expect("run command");
    assert!(output.status.success(), "command failed: {:?}", output);
    let reports: Value = serde_json::from_slice(&output.stdout).expect("parse json");
    let report = &reports[0];
    assert_eq!(report["source"], "stdin");
    assert_eq!(report["added"], 1);
    assert_eq!(report["skipped"], 2);
    assert_eq!(report["format"]["kind"], "free-text");
}

#[test]
fn export_reimports_into_fresh_store() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");
    let input = temp.path().join("rows.txt");
    fs::write(&input, ROWS).expect("write input");
    run_cmd(&temp, &db_path, &["import", input.to_str().expect("input")]);

    let export_path = temp.path().join("export.txt");
    run_cmd(
        &temp,
        &db_path,
        &["export", "--out", export_path.to_str().expect("export")],
    );
    let document = fs::read_to_string(&export_path).expect("read export");
    assert!(document.starts_with("===== 0612345678 =====\n"));
    assert_eq!(document, run_cmd(&temp, &db_path, &["export"]));

    let other = temp.path().join("other.sqlite3");
    let reports = run_cmd_json(
        &temp,
        &other,
        &["import", export_path.to_str().expect("export")],
    );
    assert_eq!(reports[0]["added"], 2);
    assert_eq!(run_cmd(&temp, &other, &["export"]), document);
}

#[test]
fn stat_and_backup() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");

    let stat = run_cmd_json(&temp, &db_path, &["stat"]);
    assert_eq!(stat["records"], 0);
    assert_eq!(stat["exists"], false);
    assert_eq!(stat["format"], "sqlite");

    let input = temp.path().join("rows.txt");
    fs::write(&input, ROWS).expect("write input");
    run_cmd(&temp, &db_path, &["import", input.to_str().expect("input")]);
    let stat = run_cmd_json(&temp, &db_path, &["stat"]);
    assert_eq!(stat["records"], 2);
    assert_eq!(stat["exists"], true);

    let backup = run_cmd_json(&temp, &db_path, &["backup"]);
    let output = backup["output"].as_str().expect("output");
    assert!(output.contains("backups"));
    assert!(Path::new(output).exists());

    let refused = run_failing(
        &temp,
        &db_path,
        &["backup", "--out", db_path.to_str().expect("db path")],
    );
    assert_eq!(refused.status.code(), Some(3));
}

#[test]
fn config_layout_is_applied() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");
    let config_path = temp.path().join("fiches.toml");
    fs::write(
        &config_path,
        "[layout]\nseparator = \";\"\nmin_fields = 3\nphone = 2\naddress = []\n\
         birth_date = false\nemail = false\niban = false\nbic = false\n",
    )
    .expect("write config");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600)).expect("chmod");
    }

    let input = temp.path().join("rows.txt");
    fs::write(&input, "LEROY;Paul;0612345678\nMOREAU;Anne;0712345678\n").expect("write input");
    let reports = run_cmd_json(
        &temp,
        &db_path,
        &[
            "--config",
            config_path.to_str().expect("config"),
            "import",
            input.to_str().expect("input"),
        ],
    );
    assert_eq!(reports[0]["added"], 2);
    assert_eq!(reports[0]["format"]["kind"], "delimited-row");

    let body = run_cmd(&temp, &db_path, &["show", "0712345678"]);
    assert_eq!(body, "Fiche pour MOREAU Anne\n");
}

#[test]
fn missing_explicit_config_is_invalid_input() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("fiches.sqlite3");
    let missing = temp.path().join("nope.toml");
    let output = run_failing(
        &temp,
        &db_path,
        &["--config", missing.to_str().expect("config"), "stat"],
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn completions_are_generated() {
    let output = cargo_bin_cmd!("fiches")
        .args(["completions", "bash"])
        .output()
        .expect("run command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("fiches"));
}

#[test]
fn help_describes_every_subcommand() {
    let output = cargo_bin_cmd!("fiches")
        .arg("--help")
        .output()
        .expect("run command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in [
        "Show the record count, store path and format",
        "Write every record as one text document",
        "Copy the store to a SQLite backup file",
    ] {
        assert!(stdout.contains(line), "missing {line:?} in:\n{stdout}");
    }
}
