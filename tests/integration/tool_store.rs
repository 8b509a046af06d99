use serde_yaml::Value;
use suitekit::config::ConfigLoader;
use suitekit::core::SuiteError;
use suitekit::test_utils::{SuiteDir, test_environment};
use suitekit::tools::{LOAD_HEADER, ScriptRole, ToolKind, ToolSection, ToolStore, UNLOAD_HEADER};

const TOOLS: &str = r"
lib_dir: '{HOME}/suite/lib'
modules:
  python3:
    version: '3.10'
  gcc: {name: gnu, version: 12.2, modulefiles: /opt/modules}
packages:
  mypackage:
    type: git
    source: git@github.com:org/mypackage.git
    branch: main
    depends: [myenv]
environments:
  myenv:
    type: venv
    extra_packages: [numpy, xarray]
    depends: python3
env_variables:
  bin: {variable: PATH, value: '{lib_dir}/bin'}
  OMP_NUM_THREADS: {value: 4, depends: [gcc]}
";

fn store() -> ToolStore {
    let suite = SuiteDir::new().file("tools.yaml", TOOLS).profile("user", &["tools.yaml"]);
    let tree = ConfigLoader::new()
        .with_environment(test_environment())
        .load_profile(&suite.profiles_path(), "user")
        .unwrap();
    let lib_dir = tree["lib_dir"].as_str().unwrap().to_string();
    ToolStore::new(&lib_dir, &tree).unwrap()
}

#[test]
fn test_tools_built_from_every_section() {
    let store = store();
    assert_eq!(store.len(), 6);
    assert_eq!(store.lib_dir(), "/home/dummy/suite/lib");
    assert_eq!(store.section_names(ToolSection::Modules), vec!["python3", "gcc"]);
    assert_eq!(store.get("gcc").unwrap().kind, ToolKind::PrivateModule);
    assert_eq!(store.get("myenv").unwrap().kind, ToolKind::Venv);
    assert_eq!(store.get("bin").unwrap().kind, ToolKind::EnvVar);
}

#[test]
fn test_load_follows_dependencies() {
    let store = store();
    let script = store.load(&["mypackage"]).unwrap();
    let fragments = script.fragments();

    assert_eq!(fragments[0], LOAD_HEADER);
    let python = fragments.iter().position(|f| f.contains("module load python3/3.10")).unwrap();
    let venv = fragments.iter().position(|f| f.contains("source /home/dummy/suite/lib/myenv/bin/activate")).unwrap();
    assert!(python < venv);
    // packages have no load script of their own
    assert!(!script.render().contains("mypackage"));
}

#[test]
fn test_unload_is_reverse_of_load() {
    let store = store();
    let load: Vec<String> = store
        .script_for(ScriptRole::Load, "myenv")
        .unwrap()
        .into_keys()
        .collect();
    let unload: Vec<String> = store
        .script_for(ScriptRole::Unload, "myenv")
        .unwrap()
        .into_keys()
        .collect();
    assert_eq!(load, vec!["python3", "myenv"]);
    assert_eq!(unload, load);

    let script = store.unload(&["myenv"]).unwrap();
    assert_eq!(script.fragments()[0], UNLOAD_HEADER);
    assert_eq!(script.fragments()[1], "deactivate");
    assert!(script.fragments()[2].contains("module unload python3"));
}

#[test]
fn test_setup_of_package() {
    let store = store();
    let script = store.setup("mypackage").unwrap();
    let text = script.render();

    assert!(text.starts_with(LOAD_HEADER));
    assert!(text.contains("module load python3/3.10"));
    assert!(text.contains("source /home/dummy/suite/lib/myenv/bin/activate"));
    assert!(text.contains("mkdir -p /home/dummy/suite/lib/build/${ENV_NAME:-}"));
    assert!(text.contains("dest_dir=/home/dummy/suite/lib/build/${ENV_NAME:-}/mypackage"));
    assert!(text.contains("git clone $giturl --branch $gitbranch --single-branch --depth 1 $dest_dir"));
    assert!(text.contains("version.txt"));
}

#[test]
fn test_setup_of_venv_installs_extra_packages() {
    let store = store();
    let script = store.setup("myenv").unwrap();
    let text = script.render();
    assert!(text.contains("rm -rf /home/dummy/suite/lib/myenv"));
    assert!(text.contains("python3 -m venv /home/dummy/suite/lib/myenv"));
    assert!(text.ends_with("pip install numpy xarray"));
}

#[test]
fn test_depends_and_install_order() {
    let store = store();
    assert_eq!(store.depends("mypackage").unwrap(), vec!["myenv", "python3"]);
    assert_eq!(store.install_order(&["mypackage", "OMP_NUM_THREADS"]).unwrap(), vec![
        "python3",
        "myenv",
        "mypackage",
        "gcc",
        "OMP_NUM_THREADS"
    ]);
}

#[test]
fn test_path_variables_are_extended() {
    let store = store();
    let bin = store.get("bin").unwrap();
    assert!(bin.load.render().contains("/home/dummy/suite/lib/bin"));
    assert!(bin.load.render().contains("PATH"));

    let threads = store.get("OMP_NUM_THREADS").unwrap();
    assert_eq!(threads.load.render(), "export OMP_NUM_THREADS=4");
    assert_eq!(threads.unload.render(), "unset OMP_NUM_THREADS");
}

#[test]
fn test_package_with_environment_dependency() {
    let options: Value = serde_yaml::from_str(
        r"
environments:
  python3: {type: folder}
packages:
  mypackage: {type: rsync, source: /src/mypackage, depends: [python3]}
",
    )
    .unwrap();
    let store = ToolStore::new("/lib", &options).unwrap();
    assert_eq!(store.depends("mypackage").unwrap(), vec!["python3"]);
}

#[test]
fn test_cycle_reports_chain() {
    let options: Value = serde_yaml::from_str(
        "modules:\n  a: {depends: b}\n  b: {depends: c}\n  c: {depends: a}\n",
    )
    .unwrap();
    match ToolStore::new("/lib", &options).unwrap_err() {
        SuiteError::CircularDependency { chain } => assert_eq!(chain, "a → b → c → a"),
        other => panic!("unexpected error: {other}"),
    }
}
