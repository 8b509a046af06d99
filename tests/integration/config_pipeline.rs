use indexmap::IndexMap;
use serde_yaml::Value;
use serial_test::serial;
use suitekit::config::{
    ConfigLoader, Document, Substituter, apply_overrides, merge_documents, parse_submit_arguments,
    substitute_variables,
};
use suitekit::core::SuiteError;
use suitekit::test_utils::{SuiteDir, init_test_logging, test_environment};

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_merge_then_substitute() {
    init_test_logging(None);
    let documents = vec![Document::new(
        "inline",
        yaml("user: dummy\nroot: /scratch\npath: '{root}/{user}'"),
    )];

    let mut tree = merge_documents(&documents, &["ecflow_variables"]).unwrap();
    Substituter::new().with_environment(test_environment()).substitute_in_place(&mut tree).unwrap();

    assert_eq!(tree["path"], Value::from("/scratch/dummy"));
}

#[test]
fn test_profile_with_overrides_and_globals() {
    let suite = SuiteDir::new()
        .file(
            "configs/user.yaml",
            "user: '{USER}'\nhost: hpc1\nlib_dir: '{HOME}/{suite_name}/lib'\nlogs: '{lib_dir}/logs'\n",
        )
        .file(
            "configs/vars.yaml",
            "ecflow_variables:\n  HOST: '{host}'\n  ACCOUNT: '{user}'\n",
        )
        .file("configs/more_vars.yaml", "ecflow_variables:\n  QUEUE: normal\n")
        .profile("user", &["configs/user.yaml", "configs/vars.yaml", "configs/more_vars.yaml"]);

    let mut globals = IndexMap::new();
    globals.insert("suite_name".to_string(), Value::from("demo"));

    let tree = ConfigLoader::new()
        .with_environment(test_environment())
        .with_globals(globals)
        .with_overrides(["host=hpc2"])
        .require("host")
        .load_profile(&suite.profiles_path(), "user")
        .unwrap();

    assert_eq!(tree["user"], Value::from("dummy"));
    assert_eq!(tree["lib_dir"], Value::from("/home/dummy/demo/lib"));
    assert_eq!(tree["logs"], Value::from("/home/dummy/demo/lib/logs"));
    assert_eq!(tree["ecflow_variables"]["HOST"], Value::from("hpc2"));
    assert_eq!(tree["ecflow_variables"]["ACCOUNT"], Value::from("dummy"));
    assert_eq!(tree["ecflow_variables"]["QUEUE"], Value::from("normal"));
}

#[test]
fn test_toml_documents_join_the_profile() {
    let suite = SuiteDir::new()
        .file("base.yaml", "root: /scratch\n")
        .file("tools.toml", "[modules.python3]\nversion = \"3.10\"\n\n[paths]\nbin = \"{root}/bin\"\n")
        .profile("mixed", &["base.yaml", "tools.toml"]);

    let tree = ConfigLoader::new()
        .with_environment(test_environment())
        .load_profile(&suite.profiles_path(), "mixed")
        .unwrap();

    assert_eq!(tree["modules"]["python3"]["version"], Value::from("3.10"));
    assert_eq!(tree["paths"]["bin"], Value::from("/scratch/bin"));
}

#[test]
fn test_duplicate_top_level_keys_are_rejected() {
    let suite = SuiteDir::new()
        .file("a.yaml", "host: hpc1\nuser: a\n")
        .file("b.yaml", "host: hpc2\nuser: b\n")
        .profile("clash", &["a.yaml", "b.yaml"]);

    let err = ConfigLoader::new()
        .with_environment(test_environment())
        .load_profile(&suite.profiles_path(), "clash")
        .unwrap_err();
    match err {
        SuiteError::DuplicateKeys { keys, .. } => assert_eq!(keys, vec!["host", "user"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_profile() {
    let suite = SuiteDir::new().file("a.yaml", "a: 1\n").profile("user", &["a.yaml"]);
    let err = ConfigLoader::new().load_profile(&suite.profiles_path(), "hpc").unwrap_err();
    assert!(matches!(err, SuiteError::ProfileNotFound { profile, .. } if profile == "hpc"));
}

#[test]
fn test_missing_required_key() {
    let suite = SuiteDir::new().file("a.yaml", "user: me\n").profile("user", &["a.yaml"]);
    let err = ConfigLoader::new()
        .with_environment(test_environment())
        .require("ecflow_server")
        .load_profile(&suite.profiles_path(), "user")
        .unwrap_err();
    assert!(matches!(err, SuiteError::MissingRequiredKey { key } if key == "ecflow_server"));
}

#[test]
fn test_shell_syntax_passes_through() {
    let mut tree = yaml("dest: /data\nscript: 'cd ${dest:-/tmp} && echo {{literal}} {dest}'");
    Substituter::new().with_environment(test_environment()).substitute_in_place(&mut tree).unwrap();
    assert_eq!(tree["script"], Value::from("cd ${dest:-/tmp} && echo {literal} /data"));
}

#[test]
fn test_forward_reference_is_an_error() {
    let tree = yaml("early: '{late}'\nlate: value\n");
    let err = Substituter::new().with_environment(test_environment()).substitute(tree).unwrap_err();
    assert!(matches!(err, SuiteError::UsedBeforeAssignment { key, name } if key == "early" && name == "late"));
}

#[test]
fn test_unset_environment_variable_is_an_error() {
    let tree = yaml("scratch: '{SCRATCH}/runs'\n");
    let err = Substituter::new().with_environment(test_environment()).substitute(tree).unwrap_err();
    assert!(matches!(err, SuiteError::EnvironmentVariableUnset { name } if name == "SCRATCH"));
}

#[test]
#[serial]
fn test_process_environment_is_captured() {
    // SAFETY: tests touching the process environment are serialized
    unsafe { std::env::set_var("SCRATCH", "/scratch/ci") };
    let result = substitute_variables(yaml("runs: '{SCRATCH}/runs'\n"), None);
    unsafe { std::env::remove_var("SCRATCH") };

    assert_eq!(result.unwrap()["runs"], Value::from("/scratch/ci/runs"));
}

#[test]
fn test_overrides_keep_leaf_types() {
    let mut tree = yaml("jobs: 4\ndebug: true\nqueues: [a]\nnested:\n  ratio: 0.5\n");
    apply_overrides(&mut tree, &["jobs=8", "debug=false", "queues=[b, c]", "nested.ratio=0.25"]).unwrap();
    assert_eq!(tree, yaml("jobs: 8\ndebug: false\nqueues: [b, c]\nnested:\n  ratio: 0.25\n"));
}

#[test]
fn test_override_of_falsy_leaf_is_a_string() {
    let mut tree = yaml("retries: 0\n");
    apply_overrides(&mut tree, &["retries=3"]).unwrap();
    assert_eq!(tree["retries"], Value::from("3"));
}

#[test]
fn test_override_of_missing_path() {
    let mut tree = yaml("nested:\n  a: 1\n");
    let err = apply_overrides(&mut tree, &["missing.b=2"]).unwrap_err();
    assert!(matches!(err, SuiteError::OverridePathNotFound { segment, .. } if segment == "missing"));

    apply_overrides(&mut tree, &["nested.b=2"]).unwrap();
    assert_eq!(tree["nested"]["b"], Value::from("2"));
}

#[test]
fn test_submit_arguments_layer_defaults() {
    let options = yaml(
        "defaults:\n  sthost: /fast\n  tmpdir: /tmp/ssd\n  queue: nf\nparallel:\n  queue: np\n  tasks: 8\n",
    );
    let contexts = parse_submit_arguments(&options).unwrap();

    let parallel = contexts.get("parallel").unwrap();
    assert_eq!(parallel.get("queue"), Some(&Value::from("np")));
    assert_eq!(parallel.get("sthost"), Some(&Value::from("/fast")));
    assert!(contexts.default_variables.contains_key("SSDTMP"));
    assert!(!contexts.default_variables.contains_key("STHOST"));
}
