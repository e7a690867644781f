//! Integration tests for cascade loading.
//!
//! Covers queue ordering with includes, overwrite policies, list appends,
//! externals, and missing/skipped classification.

use config_cascade::loader::Loader;
use config_cascade::parser::ParserOptions;
use config_cascade::settings::{FlatSettings, NestedSettings, Settings};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `content` to `name` under `dir`, returning the full path.
fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_includes_run_after_queued_files() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x=a\ninclude=c.conf\n");
    let b = write(temp.path(), "b.conf", "x=b\ny=b\n");
    let c = write(temp.path(), "c.conf", "x=c\n");

    let mut loader = Loader::new([&a, &b], NestedSettings::new());
    loader.load().unwrap();

    let report = loader.report();
    assert_eq!(report.processed, vec![a, b, c]);
    assert_eq!(loader.settings().get("x"), Some(json!("c")));
    assert_eq!(loader.settings().get("y"), Some(json!("b")));
    assert!(!loader.settings().has("include"));
}

#[test]
fn test_first_write_wins_without_overwrite() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x=a\n");
    let b = write(temp.path(), "b.conf", "x=b\nz=${x}\n");

    let options = ParserOptions::default().with_overwrite(false);
    let mut loader = Loader::new([&a, &b], NestedSettings::new()).with_options(options);
    loader.load().unwrap();

    assert_eq!(loader.settings().get("x"), Some(json!("a")));
    assert_eq!(loader.settings().get("z"), Some(json!("a")));
    assert!(loader.externals().is_empty());
}

#[test]
fn test_later_file_overwrites_by_default() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.json", r#"{"db": {"host": "a"}}"#);
    let b = write(temp.path(), "b.conf", "db__host=b\n");

    let mut loader = Loader::new([&a, &b], NestedSettings::new());
    loader.load().unwrap();
    assert_eq!(loader.settings().get("db::host"), Some(json!("b")));
}

#[test]
fn test_append_across_files() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x[]=1\nx[]=2\n");
    let b = write(temp.path(), "b.conf", "x[]=3\n");

    let mut loader = Loader::new([&a, &b], NestedSettings::new());
    loader.load().unwrap();
    assert_eq!(loader.settings().get("x"), Some(json!([1, 2, 3])));
}

#[test]
fn test_externals_resolved_by_later_definition() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x=${y}\n");
    let b = write(temp.path(), "b.conf", "y=1\n");

    let mut loader = Loader::new([&a], NestedSettings::new());
    loader.load().unwrap();
    assert_eq!(loader.externals(), vec!["y"]);

    let mut loader = Loader::new([&a, &b], NestedSettings::new());
    loader.load().unwrap();
    assert!(loader.externals().is_empty());
    let definition = loader.dependencies().definition("x").unwrap();
    assert_eq!(definition.dependencies, vec!["y"]);
    assert_eq!(definition.context, a.display().to_string());
}

#[test]
fn test_missing_and_skipped_are_disjoint_from_processed() {
    let temp = TempDir::new().unwrap();
    let absent = temp.path().join("absent.conf");
    let notes = write(temp.path(), "notes.txt", "A=1\n");
    let good = write(temp.path(), "good.conf", "A=1\n");

    let mut loader = Loader::new([&absent, &notes, &good], NestedSettings::new());
    loader.load().unwrap();

    let report = loader.report();
    assert_eq!(report.missing, vec![absent]);
    assert_eq!(report.skipped, vec![notes]);
    assert_eq!(report.processed, vec![good]);
    assert_eq!(loader.report(), report);
}

#[test]
fn test_bad_document_does_not_abort_run() {
    let temp = TempDir::new().unwrap();
    let bad = write(temp.path(), "bad.json", "{ not json");
    let list = write(temp.path(), "list.json", "[1, 2]");
    let good = write(temp.path(), "good.conf", "ok=true\n");

    let mut loader = Loader::new([&bad, &list, &good], NestedSettings::new());
    loader.load().unwrap();

    assert_eq!(loader.settings().get("ok"), Some(json!(true)));
    assert_eq!(loader.settings().variables().len(), 1);
    assert_eq!(loader.report().processed, vec![bad, list, good]);
}

#[test]
fn test_include_cycle_terminates() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "include=b.conf\nn[]=a\n");
    let b = write(temp.path(), "b.conf", "include=a.conf\nn[]=b\n");

    let mut loader = Loader::new([&a], NestedSettings::new());
    loader.load().unwrap();

    assert_eq!(loader.report().processed, vec![a, b]);
    assert_eq!(loader.settings().get("n"), Some(json!(["a", "b"])));
}

#[test]
fn test_missing_include_is_reported() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "include=local.conf\n");

    let mut loader = Loader::new([&a], NestedSettings::new());
    loader.load().unwrap();
    assert_eq!(loader.report().missing, vec![temp.path().join("local.conf")]);
}

#[test]
fn test_json_includes_relative_to_file() {
    let temp = TempDir::new().unwrap();
    let main = write(
        temp.path(),
        "app.json",
        r#"{"include": ["conf.d/db.conf", "conf.d/cache.yaml"], "name": "app"}"#,
    );
    let db = write(temp.path(), "conf.d/db.conf", "db__host=${db_host:-localhost}\n");
    let cache = write(temp.path(), "conf.d/cache.yaml", "cache:\n  ttl: 60\n");

    let mut loader = Loader::new([&main], NestedSettings::new());
    loader.load().unwrap();

    assert_eq!(loader.report().processed, vec![main, db, cache]);
    assert_eq!(loader.settings().get("db::host"), Some(json!("localhost")));
    assert_eq!(loader.settings().get("cache::ttl"), Some(json!(60)));
    assert!(!loader.settings().has("include"));
    assert_eq!(loader.externals(), vec!["db_host"]);
}

#[test]
fn test_absolute_include() {
    let temp = TempDir::new().unwrap();
    let shared = write(temp.path(), "shared/base.conf", "base=1\n");
    let a = write(
        temp.path(),
        "app/a.conf",
        &format!("include=\"{}\"\n", shared.display()),
    );

    let mut loader = Loader::new([&a], NestedSettings::new());
    loader.load().unwrap();
    assert_eq!(loader.report().processed, vec![a, shared]);
}

#[test]
fn test_flat_store_keeps_paths_opaque() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.json", r#"{"Server": {"Port": 80}}"#);

    let mut loader = Loader::new([&a], FlatSettings::new());
    loader.load().unwrap();
    let vars = loader.settings().variables();
    assert_eq!(vars.get("server::port"), Some(&json!(80)));
    assert_eq!(vars.len(), 1);
}

#[test]
fn test_report_serializes_all_fields() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x=$HOME/app\n");

    let mut loader = Loader::new([&a], NestedSettings::new());
    loader.load().unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&loader.report().to_pretty_json().unwrap()).unwrap();
    assert_eq!(value["externals"], json!(["home"]));
    assert_eq!(value["missing"], json!([]));
    assert_eq!(value["skipped"], json!([]));
    assert_eq!(value["processed"].as_array().unwrap().len(), 1);
}

#[test]
fn test_relative_cascade_paths_resolve_includes() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "app.conf", "x=app\ninclude=local.conf\n");
    write(temp.path(), "app.json", r#"{"include": "local2.json", "y": "app"}"#);
    write(temp.path(), "local.conf", "x=local\n");
    write(temp.path(), "local2.json", r#"{"y": "local2"}"#);

    // The only test in this binary that relies on the working directory
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp.path()).unwrap();
    let mut loader = Loader::new(["app.conf", "app.json"], NestedSettings::new());
    loader.load().unwrap();
    std::env::set_current_dir(previous).unwrap();

    let report = loader.report();
    assert_eq!(
        report.processed,
        ["app.conf", "app.json", "local.conf", "local2.json"]
            .map(PathBuf::from)
            .to_vec()
    );
    assert!(report.missing.is_empty());
    assert_eq!(loader.settings().get("x"), Some(json!("local")));
    assert_eq!(loader.settings().get("y"), Some(json!("local2")));
}

#[test]
fn test_file_listed_twice_applies_twice() {
    let temp = TempDir::new().unwrap();
    let a = write(temp.path(), "a.conf", "x=a\n");
    let b = write(temp.path(), "b.conf", "x=b\n");

    let mut loader = Loader::new([&a, &b, &a], NestedSettings::new());
    loader.load().unwrap();

    assert_eq!(loader.report().processed, vec![a.clone(), b, a]);
    assert_eq!(loader.settings().get("x"), Some(json!("a")));
}
