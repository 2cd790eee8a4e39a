use kestrel_lib::{FuelLimits, Interpreter};

use super::exec::report;

fn linked(source: &str) -> Interpreter {
    let mut interp = Interpreter::builder()
        .limits(FuelLimits::new().exec_fuel(100))
        .build();
    interp.compile(source).unwrap();
    interp.link().unwrap();
    interp
}

#[test]
fn report_after_clean_run() {
    let mut interp = linked("print 6 * 7;");
    interp.run().unwrap();

    let json = serde_json::to_string(&report(&interp, None)).unwrap();
    insta::assert_snapshot!(json, @r#"{"printed":[42],"registers":{"eax":42,"ebx":0,"ecx":0,"edx":0,"esi":0,"edi":0,"esp":131072,"ebp":131072},"steps":7}"#);
}

#[test]
fn report_carries_the_fault() {
    let mut interp = linked("x = 0; print 1; print 5 / x;");
    let err = interp.run().unwrap_err();

    let value = serde_json::to_value(report(&interp, Some(err.to_string()))).unwrap();
    assert_eq!(value["printed"], serde_json::json!([1]));
    assert!(
        value["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("runtime error: division by zero at "))
    );
}

#[test]
fn float_values_serialize_as_numbers() {
    let mut interp = linked("float f = 2.5; print f;");
    interp.run().unwrap();

    let value = serde_json::to_value(report(&interp, None)).unwrap();
    assert_eq!(value["printed"], serde_json::json!([2.5]));
    assert!(value.get("error").is_none());
}
