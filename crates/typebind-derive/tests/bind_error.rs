#[test]
fn bind_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/bind_error_pass.rs");
}
