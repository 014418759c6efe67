use json_vo::{
    Decl, Deserializer, Error, Failure, FailureKind, Namespace, PropertyType, RecordType, Val,
    define_property_type,
};
use serde_json::json;

#[test]
fn constructs_simple_records() {
    let currency = RecordType::define("Currency", [("code", "string")]).unwrap();
    let gbp = currency.construct(json!({"code": "GBP"})).unwrap();
    assert_eq!(gbp.get("code").and_then(Val::as_str), Some("GBP"));
}

#[test]
fn zero_arguments_name_expected_shape() {
    let ty = RecordType::define("Pair", [("a", "number"), ("b", "string")]).unwrap();
    let error = ty.construct_args(vec![]).unwrap_err();
    let construction = error.construction().unwrap();
    assert_eq!(construction.kind(), FailureKind::Arity);
    assert_eq!(construction.expected, "{ a:number, b:string }");
    assert_eq!(construction.actual.to_string(), "0 arguments");
}

#[test]
fn unparseable_dates_are_invalid_dates() {
    let ty = RecordType::define("Event", [("date", Decl::Date)]).unwrap();
    let error = ty.construct(json!({"date": "not a date"})).unwrap_err();
    assert_eq!(error.construction().unwrap().failure("date"), Some(&Failure::InvalidDate));
    assert_eq!(
        error.to_string(),
        "Event was constructed with invalid property values\n\
         \x20 Expected: { date:Date }\n\
         \x20 Actual:   { date:string }\n\
         \x20 date is invalid:\n\
         \x20   Invalid Date"
    );
}

#[test]
fn nested_structs_compare_structurally() {
    let ty = RecordType::define("Outer", [("x", Decl::structure([("y", "string")]))]).unwrap();
    let a = ty.construct(json!({"x": {"y": "ok"}})).unwrap();
    let b = ty.construct(json!({"x": {"y": "ok"}})).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, b.with(json!({"x": {"y": "changed"}})).unwrap());
}

#[test]
fn nested_records_round_trip_through_tagged_json() {
    let other = RecordType::define("OtherType", [("n", "number"), ("when", "Date")]).unwrap();
    let me = RecordType::define("Self", [("bar", Decl::from(&other))]).unwrap();
    let record = me.construct(json!({"bar": {"n": 3, "when": "2020-02-29T12:00:00Z"}})).unwrap();

    let tagged = record.to_json();
    assert_eq!(
        tagged,
        json!({"__type__": "Self", "bar": {"__type__": "OtherType", "n": 3, "when": "2020-02-29T12:00:00.000Z"}})
    );

    let namespace: Namespace = [me, other].into_iter().collect();
    let deserializer = Deserializer::for_namespaces([Some(&namespace)]).unwrap();
    let revived = deserializer.parse_record(&tagged.to_string()).unwrap();
    assert_eq!(revived, record);
}

#[test]
fn sub_millisecond_dates_survive_revival() {
    let when = RecordType::define("When", [("at", "Date")]).unwrap();
    let record = when.construct(json!({"at": "2020-01-01T00:00:00.123456Z"})).unwrap();
    let text = serde_json::to_string(&record).unwrap();
    assert_eq!(text, r#"{"__type__":"When","at":"2020-01-01T00:00:00.123Z"}"#);

    let namespace: Namespace = [when].into_iter().collect();
    let deserializer = Deserializer::for_namespaces([Some(&namespace)]).unwrap();
    assert_eq!(deserializer.parse_record(&text).unwrap(), record);
}

#[test]
fn every_invalid_property_is_reported() {
    let ty = RecordType::define(
        "Form",
        [
            ("name", Decl::from("string")),
            ("age", Decl::from("number")),
            ("tags", Decl::list("string")),
            ("address", Decl::structure([("city", "string"), ("zip", "number")])),
        ],
    )
    .unwrap();
    let error = ty
        .construct(json!({
            "name": 1,
            "age": "old",
            "tags": ["a", 2, "c", false],
            "address": {"city": null, "zip": "N1"}
        }))
        .unwrap_err();
    assert_eq!(
        error.construction().unwrap().paths(),
        vec![
            "name is invalid: Expected string, was number",
            "age is invalid: Expected number, was string",
            "tags[1] is invalid: Expected string, was number",
            "tags[3] is invalid: Expected string, was boolean",
            "address.zip is invalid: Expected number, was string",
        ]
    );
}

#[test]
fn subtypes_require_parent_and_child_properties() {
    let base = RecordType::define("Named", [("name", "string")]).unwrap();
    let sub = base.extend("Located").property("city", "string").build().unwrap();
    assert!(sub.construct(json!({"name": "a", "city": "b"})).is_ok());
    for input in [json!({"name": "a"}), json!({"city": "b"})] {
        let error = sub.construct(input).unwrap_err();
        assert_eq!(error.construction().unwrap().kind(), FailureKind::PropertySetMismatch);
    }
}

#[test]
fn declaration_errors_are_immediate() {
    assert!(matches!(
        RecordType::define("Bad", [("a", Decl::List(vec![]))]),
        Err(Error::MalformedArrayDeclaration)
    ));
    assert!(matches!(
        RecordType::define("Bad", [("a", "strnig")]),
        Err(Error::UnsupportedTypeDeclaration(value)) if value == "\"strnig\""
    ));
}

struct MoneyKind;

impl PropertyType for MoneyKind {
    fn coerce(&self, value: &Val) -> Result<Val, String> {
        let (currency, amount) = match value {
            Val::String(text) => {
                let (currency, amount) = text
                    .split_once(' ')
                    .ok_or_else(|| format!("Expected \"CUR amount\", was {text:?}"))?;
                let amount = amount.parse::<f64>().map_err(|e| e.to_string())?;
                (currency.to_string(), amount)
            }
            Val::Object(_) => {
                let currency = value.get("currency").and_then(Val::as_str);
                let amount = value.get("amount").and_then(Val::as_f64);
                match (currency, amount) {
                    (Some(c), Some(a)) => (c.to_string(), a),
                    _ => return Err("Expected { currency, amount }".to_string()),
                }
            }
            other => return Err(format!("Expected money, was {}", other.kind())),
        };
        Ok(Val::object([("amount", Val::from(amount)), ("currency", Val::from(currency))]))
    }
}

#[test]
fn plugin_kinds_coerce_and_survive_with() {
    define_property_type("money", MoneyKind).unwrap();
    let ty = RecordType::define("Invoice", [("total", "money"), ("memo", "string")]).unwrap();
    let from_text = ty.construct(json!({"total": "GBP 12.5", "memo": "x"})).unwrap();
    let from_object = ty
        .construct(json!({"total": {"currency": "GBP", "amount": 12.5}, "memo": "x"}))
        .unwrap();
    assert_eq!(from_text, from_object);
    assert_eq!(from_text.to_plain_object(), json!({"total": {"amount": 12.5, "currency": "GBP"}, "memo": "x"}));

    let edited = from_text.with(json!({"memo": "y"})).unwrap();
    assert_eq!(edited.get("total"), from_text.get("total"));

    let error = ty.construct(json!({"total": 5, "memo": "x"})).unwrap_err();
    assert_eq!(error.construction().unwrap().paths(), vec!["total is invalid: Expected money, was number"]);
}
