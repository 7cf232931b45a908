use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use typebind::prelude::*;
use uuid::Uuid;

const UID: &str = "7a72f169-f8c3-4b3e-8041-021a62a2d87f";

#[config_model]
struct LocalInput {
    path: PathBuf,
}

#[config_model]
struct RemoteInput {
    url: String,
    token: Token,
}

#[config_model(tag = "kind")]
enum Input {
    RemoteInput(RemoteInput),
    LocalInput(LocalInput),
}

#[config_model]
struct Config {
    name: String,
    answer: i64,
    tags: Vec<String>,
    inputs: BTreeMap<String, Input>,
}

const CONFIG_TOML: &str = r#"
name = "foo"
answer = 42
tags = ["a", "b"]

[inputs.default_local_input]
path = "/data"

[inputs.default_remote_input]
url = "https://foo/bar"
token = "7a72f169-f8c3-4b3e-8041-021a62a2d87f:my_token"

[inputs.extra_local_input]
path = "/data_extra"
"#;

fn config_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), CONFIG_TOML).unwrap();
    dir
}

#[test]
fn entry_point_composes_binds_and_calls() {
    let dir = config_dir();
    let entry = EntryPoint::builder(dir.path()).build().unwrap();

    let name = entry
        .run(|config: Config| {
            assert_eq!(config.answer, 42);
            assert_eq!(config.tags, ["a", "b"]);
            assert_eq!(
                config.inputs["default_local_input"],
                Input::LocalInput(LocalInput { path: PathBuf::from("/data") })
            );
            assert_eq!(
                config.inputs["default_remote_input"],
                Input::RemoteInput(RemoteInput {
                    url: "https://foo/bar".to_owned(),
                    token: Token::new(Uuid::parse_str(UID).unwrap(), "my_token"),
                })
            );
            config.name
        })
        .unwrap();
    assert_eq!(name, "foo");
}

#[test]
fn overrides_win_over_the_document() {
    let dir = config_dir();
    let entry = EntryPoint::builder(dir.path())
        .override_("answer", "43")
        .args(["name=bar"])
        .build()
        .unwrap();

    let (name, answer) = entry.run(|config: Config| (config.name, config.answer)).unwrap();
    assert_eq!(name, "bar");
    assert_eq!(answer, 43);
}

#[test]
fn malformed_override_arguments_fail_at_build_time() {
    let dir = config_dir();
    let err = EntryPoint::builder(dir.path()).args(["answer"]).build().unwrap_err();
    assert!(matches!(err, EntryError::Compose { .. }));
}

#[test]
fn shape_errors_fire_before_any_composition() {
    // The directory does not exist; a composition attempt would fail with an
    // engine error, so a shape error proves the eager check ran first.
    let entry = EntryPoint::builder("/definitely/not/here").build().unwrap();
    let err = entry.run(|_config: String| ()).unwrap_err();
    assert!(matches!(err, EntryError::Shape { .. }));
}

#[test]
fn missing_document_is_a_compose_error() {
    let entry = EntryPoint::builder("/definitely/not/here").build().unwrap();
    let err = entry.run(|_config: Config| ()).unwrap_err();
    assert!(matches!(err, EntryError::Compose { .. }));
}

#[test]
fn bind_failures_carry_the_field_path() {
    let dir = config_dir();
    let entry = EntryPoint::builder(dir.path())
        .override_("inputs.default_remote_input.token", "oops")
        .build()
        .unwrap();

    let err = entry.run(|_config: Config| ()).unwrap_err();
    assert!(matches!(err, EntryError::Bind { .. }));
    assert!(err.to_string().contains("inputs.default_remote_input.token"), "{err}");
}

#[test]
fn run_on_skips_composition() {
    let entry = EntryPoint::builder("/unused").build().unwrap();
    let tree = Value::from(json!({
        "name": "hosted",
        "answer": 7,
        "tags": [],
        "inputs": {}
    }));

    let answer = entry.run_on(&tree, |config: Config| config.answer).unwrap();
    assert_eq!(answer, 7);
}

#[test]
fn alternate_root_documents_are_honored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pipeline.toml"), CONFIG_TOML).unwrap();

    let entry = EntryPoint::builder(dir.path()).root("pipeline").build().unwrap();
    let name = entry.run(|config: Config| config.name).unwrap();
    assert_eq!(name, "foo");
}
