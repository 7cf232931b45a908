#[test]
fn config_model_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/config_model_pass.rs");
}
