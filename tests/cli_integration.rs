//! Integration tests for the slugsync CLI.
//!
//! These tests run the binary against tree files in temporary directories.
//! HOME and XDG_CONFIG_HOME point into the temp dir so no user
//! configuration leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A temp dir with a config-free environment.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn tree(&self) -> String {
        self.dir.child("site.json").path().display().to_string()
    }

    /// A command for running slugsync in this workspace.
    fn slugsync(&self) -> Command {
        let mut cmd = Command::cargo_bin("slugsync").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env_remove("SLUGSYNC_CONFIG")
            .env_remove("SLUGSYNC_LOG");
        cmd
    }

    /// Run a tree command that must succeed.
    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.slugsync()
            .args(args)
            .args(["--tree", &self.tree()])
            .assert()
            .success()
    }

    /// root(1) -> shop(2) -> running-shoes(3)
    fn shop() -> Self {
        let ws = Self::new();
        ws.run(&["init"]);
        ws.run(&["create", "--parent", "1", "--field", "title=Shop", "--admin"]);
        ws.run(&[
            "create",
            "--parent",
            "2",
            "--field",
            "title=Running Shoes",
            "--admin",
        ]);
        ws
    }
}

#[test]
fn version_flag_works() {
    Workspace::new()
        .slugsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slugsync"));
}

#[test]
fn help_flag_works() {
    Workspace::new()
        .slugsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("slug"));
}

#[test]
fn init_creates_tree_with_site_root() {
    let ws = Workspace::new();
    ws.run(&["init"])
        .stdout(predicate::str::contains("with site root 1"));

    ws.dir
        .child("site.json")
        .assert(predicate::str::contains("slugsync.tree"));
}

#[test]
fn init_refuses_existing_tree() {
    let ws = Workspace::new();
    ws.run(&["init"]);
    ws.slugsync()
        .args(["init", "--tree", &ws.tree()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create tree"));
}

#[test]
fn create_generates_slugs_from_fields() {
    let ws = Workspace::shop();
    ws.run(&["show"])
        .stdout(predicate::str::contains("/shop"))
        .stdout(predicate::str::contains("/shop/running-shoes"));
}

#[test]
fn rename_cascades_and_reports_redirects() {
    let ws = Workspace::shop();

    ws.run(&["edit", "--node", "2", "--slug", "/store", "--admin"])
        .stdout(predicate::str::contains("updated node 2: /shop -> /store"))
        .stdout(predicate::str::contains("cascade: 1 updated"))
        .stdout(predicate::str::contains(
            "~ 3 /shop/running-shoes -> /store/running-shoes",
        ))
        .stdout(predicate::str::contains("redirects:"));

    ws.run(&["show"])
        .stdout(predicate::str::contains("/store/running-shoes"));
    ws.run(&["check"])
        .stdout(predicate::str::contains("ok: 3 records, no issues"));
}

#[test]
fn locked_child_stays_on_rename() {
    let ws = Workspace::shop();
    ws.run(&["edit", "--node", "3", "--sync", "off", "--admin"]);
    ws.run(&["edit", "--node", "3", "--lock", "on", "--admin"]);

    ws.run(&["edit", "--node", "2", "--slug", "/store", "--admin"])
        .stdout(predicate::str::contains("= 3 (locked)"));

    ws.run(&["show"])
        .stdout(predicate::str::contains("/shop/running-shoes"));
}

#[test]
fn editor_outside_prefix_gets_warning_and_keeps_slug() {
    let ws = Workspace::shop();

    ws.run(&[
        "edit",
        "--node",
        "3",
        "--slug",
        "/elsewhere/x",
        "--user-editable",
        "3",
        "--user",
        "jane",
    ])
    .stderr(predicate::str::contains("warning:"))
    .stderr(predicate::str::contains("leaves the permitted prefix '/shop'"))
    .stdout(predicate::str::contains("updated node 3: /shop/running-shoes"));

    ws.run(&["show"])
        .stdout(predicate::str::contains("/shop/running-shoes"));
}

#[test]
fn unlock_without_permission_fails() {
    let ws = Workspace::shop();
    ws.run(&["edit", "--node", "2", "--lock", "on", "--admin"]);

    ws.slugsync()
        .args(["edit", "--tree", &ws.tree(), "--node", "2", "--lock", "off"])
        .args(["--user-editable", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to update node 2"));
}

#[test]
fn duplicate_create_is_suffixed() {
    let ws = Workspace::shop();
    ws.run(&["create", "--parent", "1", "--slug", "/shop", "--admin"])
        .stdout(predicate::str::contains("created node 4: /shop-1"));
}

#[test]
fn propose_reports_conflict() {
    let ws = Workspace::shop();
    ws.slugsync()
        .args(["propose", "--tree", &ws.tree()])
        .write_stdin("mode=manual&parentPageId=1&values[manual]=/Shop\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""proposal":"/shop-1""#))
        .stdout(predicate::str::contains(r#""hasConflicts":true"#))
        .stdout(predicate::str::contains(r#""slug":"/shop""#));
}

#[test]
fn propose_checks_signature() {
    let ws = Workspace::shop();
    ws.slugsync()
        .args(["propose", "--tree", &ws.tree(), "--signature", "s3cret"])
        .write_stdin("mode=auto&recordId=3&signature=wrong")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Proposal request failed"));
}

#[test]
fn delete_and_restore() {
    let ws = Workspace::shop();
    ws.run(&["delete", "--node", "2"])
        .stdout(predicate::str::contains("deleted 2 record(s)"));
    ws.run(&["show"])
        .stdout(predicate::str::contains("/shop").not());
    ws.run(&["restore", "--node", "2"])
        .stdout(predicate::str::contains("restored node 2: /shop"));
    ws.run(&["show"])
        .stdout(predicate::str::contains("/shop"))
        .stdout(predicate::str::contains("running-shoes").not());
}

#[test]
fn check_reports_duplicates() {
    let ws = Workspace::new();
    ws.dir
        .child("site.json")
        .write_str(
            r#"{
  "kind": "slugsync.tree",
  "schema_version": 1,
  "nodes": [
    { "id": 1, "is_site_root": true, "slug": "/" },
    { "id": 2, "parent_id": 1, "slug": "/about" },
    { "id": 3, "parent_id": 1, "slug": "/about" }
  ]
}"#,
        )
        .unwrap();

    ws.slugsync()
        .args(["check", "--tree", &ws.tree()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("issue: nodes 2 and 3 share slug '/about'"))
        .stderr(predicate::str::contains("1 issue(s) found"));
}

#[test]
fn missing_tree_fails_with_context() {
    let ws = Workspace::new();
    ws.slugsync()
        .args(["show", "--tree", &ws.tree()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open tree"));
}

#[test]
fn config_shows_defaults() {
    Workspace::new()
        .slugsync()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("# no config file found"))
        .stdout(predicate::str::contains("[sync]"))
        .stdout(predicate::str::contains("max_attempts = 1000"));
}

#[test]
fn explicit_config_is_used() {
    let ws = Workspace::new();
    ws.dir
        .child("slugsync.toml")
        .write_str("[generator]\nfields = [[\"nav_title\", \"title\"]]\n")
        .unwrap();
    let config = ws.dir.child("slugsync.toml").path().display().to_string();

    ws.run(&["init"]);
    ws.slugsync()
        .args(["--config", &config, "create", "--tree", &ws.tree()])
        .args(["--parent", "1", "--field", "title=Long Title", "--field", "nav_title=Short"])
        .args(["--admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created node 2: /short"));
}

#[test]
fn invalid_config_fails() {
    let ws = Workspace::new();
    ws.dir
        .child("bad.toml")
        .write_str("[sync]\nnonsense = 1\n")
        .unwrap();
    let config = ws.dir.child("bad.toml").path().display().to_string();

    ws.slugsync()
        .args(["--config", &config, "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
