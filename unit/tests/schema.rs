/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

#[cfg(feature = "schemars")]
#[test]
fn tolerance_schema() {
    use schemars::schema_for;
    use serde_json::json;
    use typed_unit::Tolerance;

    let schema = jsonschema::validator_for(
        &serde_json::to_value(schema_for!(Tolerance)).unwrap(),
    )
    .unwrap();

    let example = serde_json::to_value(Tolerance::default()).unwrap();
    schema.validate(&example).expect("schema validation failed");
    assert!(schema.validate(&json!({ "relative": 0.1 })).is_err());
}

#[cfg(feature = "schemars")]
#[test]
fn error_schema() {
    use schemars::schema_for;
    use typed_unit::{Operator, UnitError};

    let schema = jsonschema::validator_for(
        &serde_json::to_value(schema_for!(UnitError)).unwrap(),
    )
    .unwrap();

    let example = serde_json::to_value(UnitError::UnsupportedDerivation {
        op: Operator::Divide,
        left: "second".to_string(),
        right: "celsius".to_string(),
    })
    .unwrap();
    schema.validate(&example).expect("schema validation failed");
}
