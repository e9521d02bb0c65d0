#[test]
fn imo_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/imo_error_pass.rs");
}
