use std::collections::BTreeMap;
use std::path::PathBuf;
use typebind::prelude::*;

#[config_model]
pub struct LocalInput {
    pub path: PathBuf,
}

#[config_model]
pub struct RemoteInput {
    pub url: String,
    pub token: Token,
}

#[config_model(tag = "kind")]
pub enum Input {
    RemoteInput(RemoteInput),
    LocalInput(LocalInput),
}

#[config_model]
pub struct Config {
    pub name: String,
    #[bind(default)]
    pub answer: i64,
    #[bind(rename = "type")]
    pub type_name: Option<String>,
    pub inputs: BTreeMap<String, Input>,
}

fn main() {
    let tree = Value::from(serde_json::json!({
        "name": "demo",
        "inputs": { "local": { "path": "/data" } }
    }));

    let config: Config = Binder::new().bind(&tree).unwrap();
    assert_eq!(config.answer, 0);
    assert_eq!(config.type_name, None);
    assert_eq!(
        config.inputs["local"],
        Input::LocalInput(LocalInput { path: PathBuf::from("/data") })
    );
}
