use assert_cmd::Command;
use predicates::prelude::*;
use suitekit::test_utils::SuiteDir;

const SUITE: &str = r"
host: hpc1
lib_dir: /suite/lib
data_dir: /suite/data
tools:
  modules:
    python3: {version: '3.10'}
  packages:
    mypackage:
      type: rsync
      source: /src/mypackage
      depends: [python3]
static_data:
  grids: {type: rsync, source: '{lib_dir}/../grids'}
";

fn suite() -> SuiteDir {
    SuiteDir::new().file("suite.yaml", SUITE).profile("user", &["suite.yaml"])
}

fn suitekit(suite: &SuiteDir) -> Command {
    let mut cmd = Command::cargo_bin("suitekit").unwrap();
    cmd.current_dir(suite.root()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_render_prints_resolved_yaml() {
    let suite = suite();
    suitekit(&suite)
        .args(["render", "user", "-s", "host=hpc2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("host: hpc2"))
        .stdout(predicate::str::contains("source: /suite/lib/../grids"));
}

#[test]
fn test_render_single_key_as_json() {
    let suite = suite();
    let output = suitekit(&suite)
        .args(["render", "-p", "profiles.yaml", "user", "--key", "tools", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["modules"]["python3"]["version"], "3.10");
}

#[test]
fn test_tools_load_and_unload() {
    let suite = suite();
    suitekit(&suite)
        .args(["tools", "user", "load", "mypackage"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# load tools and activate environment"))
        .stdout(predicate::str::contains("module load python3/3.10"));

    suitekit(&suite)
        .args(["tools", "user", "unload", "python3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("module unload python3"));
}

#[test]
fn test_tools_setup_as_json() {
    let suite = suite();
    let output = suitekit(&suite)
        .args(["tools", "user", "--lib-dir", "/other/lib", "--format", "json", "setup", "mypackage"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let fragments: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(fragments[0], "# load tools and activate environment");
    assert!(fragments.iter().any(|f| f.contains("dest_dir=/other/lib/build/${ENV_NAME:-}/mypackage")));
}

#[test]
fn test_tools_depends() {
    let suite = suite();
    suitekit(&suite)
        .args(["tools", "user", "depends", "mypackage"])
        .assert()
        .success()
        .stdout("python3\n");
}

#[test]
fn test_unknown_tool_fails() {
    let suite = suite();
    suitekit(&suite)
        .args(["tools", "user", "setup", "missing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_data_script() {
    let suite = suite();
    suitekit(&suite)
        .args(["data", "user", "grids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mkdir -p /suite/data"))
        .stdout(predicate::str::contains("dest_dir=/suite/data/grids"));

    suitekit(&suite)
        .args(["data", "user", "--data-dir", "/elsewhere", "grids"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dest_dir=/elsewhere/grids"));
}

#[test]
fn test_data_lists_items() {
    let suite = suite();
    suitekit(&suite).args(["data", "user"]).assert().success().stdout("grids\n");
}

#[test]
fn test_missing_profile_fails() {
    let suite = suite();
    suitekit(&suite)
        .args(["render", "hpc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hpc"));
}
