use super::*;

#[test]
fn defaults_use_declared_ordering() {
    let o = BridgeOpts::default();
    assert_eq!(o.input_ordering, InputOrdering::Declared);
    assert_eq!(o.max_upstream_depth, 64);
    assert!(o.validate().is_ok());
}

#[test]
fn json_fills_missing_fields() {
    let o = BridgeOpts::from_json_str(r#"{"input_ordering":"reversed"}"#).unwrap();
    assert_eq!(o.input_ordering, InputOrdering::Reversed);
    assert_eq!(o.max_upstream_depth, 64);
}

#[test]
fn json_rejects_unknown_fields_and_zero_depth() {
    assert!(BridgeOpts::from_json_str(r#"{"ordering":"reversed"}"#).is_err());
    let err = BridgeOpts::from_json_str(r#"{"max_upstream_depth":0}"#).unwrap_err();
    assert!(err.to_string().contains("max_upstream_depth"));
}
