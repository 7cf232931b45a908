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

fn bind<T: Bind>(tree: &serde_json::Value) -> Result<T, BindError> {
    Binder::new().bind(&Value::from(tree.clone()))
}

fn sample_tree() -> serde_json::Value {
    json!({
        "name": "foo",
        "answer": 42,
        "tags": ["a", "b"],
        "inputs": {
            "default_local_input": { "path": "/data" },
            "default_remote_input": {
                "url": "https://foo/bar",
                "token": format!("{UID}:my_token")
            },
            "extra_local_input": { "path": "/data_extra" }
        }
    })
}

fn sample_config() -> Config {
    Config {
        name: "foo".to_owned(),
        answer: 42,
        tags: vec!["a".to_owned(), "b".to_owned()],
        inputs: BTreeMap::from([
            (
                "default_local_input".to_owned(),
                Input::LocalInput(LocalInput { path: PathBuf::from("/data") }),
            ),
            (
                "default_remote_input".to_owned(),
                Input::RemoteInput(RemoteInput {
                    url: "https://foo/bar".to_owned(),
                    token: Token::new(Uuid::parse_str(UID).unwrap(), "my_token"),
                }),
            ),
            (
                "extra_local_input".to_owned(),
                Input::LocalInput(LocalInput { path: PathBuf::from("/data_extra") }),
            ),
        ]),
    }
}

#[test]
fn record_parse_matches_the_literal_value() {
    let config: Config = bind(&sample_tree()).unwrap();
    assert_eq!(config, sample_config());
}

#[test]
fn binding_is_idempotent() {
    let tree = sample_tree();
    let first: Config = bind(&tree).unwrap();
    let second: Config = bind(&tree).unwrap();
    assert_eq!(first, second);
}

#[test]
fn union_resolves_local_by_shape() {
    let input: Input = bind(&json!({ "path": "/data" })).unwrap();
    assert_eq!(input, Input::LocalInput(LocalInput { path: PathBuf::from("/data") }));
}

#[test]
fn union_resolves_remote_by_shape() {
    let input: Input =
        bind(&json!({ "url": "https://foo/bar", "token": format!("{UID}:my_token") })).unwrap();
    assert_eq!(
        input,
        Input::RemoteInput(RemoteInput {
            url: "https://foo/bar".to_owned(),
            token: Token::new(Uuid::parse_str(UID).unwrap(), "my_token"),
        })
    );
}

#[test]
fn union_resolves_by_discriminator() {
    let input: Input = bind(&json!({ "kind": "LocalInput", "path": "/data" })).unwrap();
    assert_eq!(input, Input::LocalInput(LocalInput { path: PathBuf::from("/data") }));
}

#[test]
fn unknown_discriminator_value_fails() {
    let err = bind::<Input>(&json!({ "kind": "FtpInput", "path": "/data" })).unwrap_err();
    let BindError::UnionResolution { reason, .. } = err else { panic!("expected resolution error") };
    assert!(reason.contains("FtpInput"), "{reason}");
}

#[test]
fn unmatched_shape_reports_every_variant() {
    let err = bind::<Input>(&json!({ "address": "10.0.0.1" })).unwrap_err();
    let BindError::UnionResolution { reason, .. } = err else { panic!("expected resolution error") };
    assert!(reason.contains("RemoteInput"), "{reason}");
    assert!(reason.contains("LocalInput"), "{reason}");
}

#[test]
fn missing_required_field_fails_with_path() {
    let mut tree = sample_tree();
    let remote = tree["inputs"]["default_remote_input"].as_object_mut().unwrap();
    remote.remove("url");
    remote.insert("kind".to_owned(), json!("RemoteInput"));

    let err = bind::<Config>(&tree).unwrap_err();
    assert!(matches!(err, BindError::MissingField { field: "url", .. }));
    assert!(err.to_string().contains("inputs.default_remote_input.url"), "{err}");
}

#[test]
fn missing_field_without_discriminator_fails_resolution() {
    let mut tree = sample_tree();
    tree["inputs"]["default_remote_input"].as_object_mut().unwrap().remove("url");

    let err = bind::<Config>(&tree).unwrap_err();
    let BindError::UnionResolution { reason, at, .. } = err else {
        panic!("expected resolution error")
    };
    assert!(reason.contains("url"), "{reason}");
    assert_eq!(at.to_string(), "inputs.default_remote_input");
}

#[test]
fn unknown_field_is_rejected() {
    let mut tree = sample_tree();
    tree.as_object_mut().unwrap().insert("surprise".to_owned(), json!(1));

    let err = bind::<Config>(&tree).unwrap_err();
    let BindError::UnknownField { record, field, .. } = err else { panic!("expected unknown field") };
    assert_eq!(record, "Config");
    assert_eq!(field, "surprise");
}

#[test]
fn malformed_token_fails_with_path() {
    let mut tree = sample_tree();
    tree["inputs"]["default_remote_input"]["token"] = json!("not-a-uuid:key");

    let err = bind::<Config>(&tree).unwrap_err();
    assert!(matches!(err, BindError::Scalar { scalar: "token", .. }));
    assert!(err.to_string().contains("inputs.default_remote_input.token"), "{err}");
}

#[test]
fn type_mismatch_names_expected_and_found() {
    let mut tree = sample_tree();
    tree["answer"] = json!("forty-two");

    let err = bind::<Config>(&tree).unwrap_err();
    let BindError::TypeMismatch { expected, found, at } = err else { panic!("expected mismatch") };
    assert_eq!(expected, "integer");
    assert_eq!(found, typebind::Kind::String);
    assert_eq!(at.to_string(), "answer");
}

fn default_retries() -> i64 {
    3
}

#[config_model]
struct Tuning {
    #[bind(rename = "type")]
    type_name: String,
    #[bind(default)]
    verbose: bool,
    #[bind(default = default_retries)]
    retries: i64,
    limit: Option<u32>,
}

#[test]
fn declared_defaults_fill_absent_fields() {
    let tuning: Tuning = bind(&json!({ "type": "fast" })).unwrap();
    assert_eq!(tuning.type_name, "fast");
    assert!(!tuning.verbose);
    assert_eq!(tuning.retries, 3);
    assert_eq!(tuning.limit, None);
}

#[test]
fn present_values_beat_defaults() {
    let tuning: Tuning =
        bind(&json!({ "type": "slow", "verbose": true, "retries": 9, "limit": 4 })).unwrap();
    assert!(tuning.verbose);
    assert_eq!(tuning.retries, 9);
    assert_eq!(tuning.limit, Some(4));
}

#[config_model]
enum UntaggedInput {
    RemoteInput(RemoteInput),
    LocalInput(LocalInput),
}

#[test]
fn untagged_unions_resolve_by_shape_alone() {
    let input: UntaggedInput = bind(&json!({ "path": "/data" })).unwrap();
    assert_eq!(input, UntaggedInput::LocalInput(LocalInput { path: PathBuf::from("/data") }));
}

#[test]
fn untagged_unions_with_identical_variants_fail_check() {
    #[config_model]
    enum Twins {
        First(LocalInput),
        Second(LocalInput),
    }

    #[config_model]
    struct TwinsConfig {
        input: Twins,
    }

    let err = Binder::new().check::<TwinsConfig>().unwrap_err();
    assert!(matches!(err, ShapeError::AmbiguousVariants { .. }));
}

#[test]
fn sample_config_passes_eager_validation() {
    Binder::new().check::<Config>().unwrap();
}
