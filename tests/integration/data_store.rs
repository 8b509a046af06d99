use std::io::Write;

use serde_yaml::Value;
use suitekit::core::SuiteError;
use suitekit::data::{DataKind, StaticDataStore, parse_data_item};
use tempfile::NamedTempFile;

fn options(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn test_rsync_item_script() {
    let item = parse_data_item("path/to/data", "rsync_data", &options("type: rsync\nsource: dir/to/sync")).unwrap();
    let text = item.script.render();

    assert!(text.contains("mkdir -p path/to/data"));
    assert!(text.contains("dest_dir=path/to/data/rsync_data"));
    assert!(text.contains("rsync -avzpL dir/to/sync $dest_dir/"));
}

#[test]
fn test_git_item_with_files_is_staged() {
    let item = parse_data_item(
        "/data",
        "grids",
        &options("type: git\nsource: https://git.example.org/grids.git\nbranch: v2\nfiles: [a.txt, b.txt]"),
    )
    .unwrap();
    let fragments = item.script.fragments();

    let clone = fragments.iter().position(|f| f.contains("dest_dir=/data/git/grids")).unwrap();
    let sync = fragments
        .iter()
        .position(|f| f.contains("rsync -avzpL /data/git/grids/a.txt /data/git/grids/b.txt $dest_dir/"))
        .unwrap();
    let cleanup = fragments.iter().position(|f| f == "rm -rf /data/git/grids").unwrap();
    assert!(clone < sync && sync < cleanup);
    assert!(fragments[sync].contains("dest_dir=/data/grids"));
}

#[test]
fn test_pre_and_post_scripts_from_files() {
    let mut post = NamedTempFile::new().unwrap();
    writeln!(post, "echo 1.2.0 > version.txt").unwrap();

    let text = format!(
        "type: copy\nsource: remote:/archive\nfiles: [a.grib]\npre_script: module load ecfs\npost_script: {}",
        post.path().display()
    );
    let item = parse_data_item("/data", "archive", &options(&text)).unwrap();
    let fragments = item.script.fragments();

    assert_eq!(fragments[0], "# Pre-script");
    assert_eq!(fragments[1], "module load ecfs");
    assert!(fragments.iter().any(|f| f.contains("scp remote:/archive/a.grib $dest_dir/")));
    let post_index = fragments.iter().position(|f| f == "# Post-script").unwrap();
    assert_eq!(fragments[post_index + 1], "echo 1.2.0 > version.txt");
}

#[test]
fn test_web_item_checks_md5() {
    let item = parse_data_item(
        "/data",
        "coastlines",
        &options("type: web\nurl: https://example.org/files/coast.zip\nmd5: abc123"),
    )
    .unwrap();
    let text = item.script.render();
    assert!(text.contains("wget -O coast.zip https://example.org/files/coast.zip"));
    assert!(text.contains("test \"abc123\" == \"$(md5sum coast.zip | awk '{print $1}')\""));
}

#[test]
fn test_store_from_config() {
    let tree = options(
        r"
data_dir: /scratch/data
static_data:
  climatology: {type: link, source: /shared/clim}
  era5: {type: ecfs, source: 'ec:/archive/era5', files: [t.grib, q.grib]}
  notes: {type: custom, post_script: echo done}
",
    );
    let store = StaticDataStore::from_config(&tree, Some("data_dir")).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["climatology", "era5", "notes"]);
    assert_eq!(store.get("climatology").unwrap().kind, DataKind::Link);
    assert!(store.get("era5").unwrap().script.render().contains("ecp ec:/archive/era5/t.grib ec:/archive/era5/q.grib"));
    assert!(store.get("notes").unwrap().script.render().ends_with("echo done\n"));
}

#[test]
fn test_unsupported_type_suggests_closest() {
    match parse_data_item("/data", "x", &options("type: rsnyc\nsource: /src")).unwrap_err() {
        SuiteError::UnsupportedType { suggestion, .. } => assert_eq!(suggestion.as_deref(), Some("rsync")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_source() {
    let err = parse_data_item("/data", "x", &options("type: rsync")).unwrap_err();
    assert!(matches!(err, SuiteError::MissingOption { option, .. } if option == "source"));
}
