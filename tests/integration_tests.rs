use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_orient::{
    from_str, from_value, to_record, to_string, to_string_with_options, to_value, CodecOptions,
    Error, Number, Value,
};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Status {
    Active,
    Renamed(String),
    Suspended { days: u32 },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Account {
    login: String,
    status: Status,
    nickname: Option<String>,
    limits: HashMap<String, i64>,
    weight: f32,
}

#[test]
fn test_simple_struct() {
    let user = User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    };

    let text = to_string(&user).unwrap();
    assert_eq!(
        text,
        r#"User@id:123l,name:"Alice",active:true,tags:["admin","developer"]"#
    );

    let user_back: User = from_str(&text).unwrap();
    assert_eq!(user, user_back);
}

#[test]
fn test_nested_struct() {
    let order = Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string()],
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.5,
                quantity: 1,
            },
        ],
        total: 109.48,
    };

    let text = to_string(&order).unwrap();
    assert!(text.starts_with("Order@order_id:12345l,customer:(User@id:123l,"));
    assert!(text.contains("items:[(Product@sku:\"WIDGET-001\",price:29.99d,quantity:2l),"));

    let order_back: Order = from_str(&text).unwrap();
    assert_eq!(order, order_back);
}

#[test]
fn test_enums_options_and_maps() {
    let mut limits = HashMap::new();
    limits.insert("daily".to_string(), 500);

    for status in [
        Status::Active,
        Status::Renamed("bob".to_string()),
        Status::Suspended { days: 3 },
    ] {
        let account = Account {
            login: "alice".to_string(),
            status,
            nickname: Some("Al".to_string()),
            limits: limits.clone(),
            weight: 61.5,
        };
        let text = to_string(&account).unwrap();
        let back: Account = from_str(&text).unwrap();
        assert_eq!(account, back, "{}", text);
    }
}

#[test]
fn test_enum_encodings() {
    let account = Account {
        login: "a".to_string(),
        status: Status::Suspended { days: 3 },
        nickname: None,
        limits: HashMap::new(),
        weight: 1.0,
    };
    assert_eq!(
        to_string(&account).unwrap(),
        r#"Account@login:"a",status:{"Suspended":(days:3l)},nickname:,limits:{},weight:1f"#
    );
}

#[test]
fn test_heterogeneous_tuple_is_commingling() {
    #[derive(Serialize)]
    struct Pair {
        pair: (i32, bool),
    }

    assert!(matches!(
        to_string(&Pair { pair: (1, true) }),
        Err(Error::TypeCommingling { .. })
    ));
}

#[test]
fn test_homogeneous_tuple_round_trip() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Span {
        bounds: (i64, i64),
    }

    let span = Span { bounds: (-5, 5) };
    let text = to_string(&span).unwrap();
    assert_eq!(text, "Span@bounds:[-5l,5l]");
    assert_eq!(from_str::<Span>(&text).unwrap(), span);
}

#[test]
fn test_chrono_fields_travel_as_strings() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Event {
        at: DateTime<Utc>,
    }

    let event = Event {
        at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
    };
    let text = to_string(&event).unwrap();
    assert_eq!(text, r#"Event@at:"2024-03-15T12:00:00Z""#);
    assert_eq!(from_str::<Event>(&text).unwrap(), event);
}

#[test]
fn test_to_value_widths() {
    #[derive(Serialize)]
    struct Widths {
        a: i8,
        b: u16,
        c: i32,
        d: u32,
        e: i64,
        f: f32,
        g: f64,
    }

    let value = to_value(&Widths {
        a: 1,
        b: 2,
        c: 3,
        d: 4,
        e: 5,
        f: 6.5,
        g: 7.5,
    })
    .unwrap();
    let rec = value.as_record().unwrap();
    assert_eq!(rec.get("a"), Some(&Value::Number(Number::Int(1))));
    assert_eq!(rec.get("b"), Some(&Value::Number(Number::Int(2))));
    assert_eq!(rec.get("c"), Some(&Value::Number(Number::Int(3))));
    assert_eq!(rec.get("d"), Some(&Value::Number(Number::Long(4))));
    assert_eq!(rec.get("e"), Some(&Value::Number(Number::Long(5))));
    assert_eq!(rec.get("f"), Some(&Value::Number(Number::Float(6.5))));
    assert_eq!(rec.get("g"), Some(&Value::Number(Number::Double(7.5))));
}

#[test]
fn test_to_record_and_from_value() {
    let user = User {
        id: 1,
        name: "n".to_string(),
        active: false,
        tags: vec![],
    };
    let rec = to_record(&user).unwrap();
    assert_eq!(rec.class_name(), Some("User"));
    assert_eq!(rec.get("tags"), Some(&Value::Collection(vec![])));

    let back: User = from_value(Value::Embedded(rec)).unwrap();
    assert_eq!(back, user);

    assert!(matches!(to_record(&"text"), Err(Error::UnsupportedType(_))));
}

#[test]
fn test_options_pass_through() {
    #[derive(Serialize)]
    struct Quote {
        text: String,
    }

    let quote = Quote {
        text: "\"hi\"".to_string(),
    };
    assert_eq!(to_string(&quote).unwrap(), r#"Quote@text:"\"hi\"""#);
    assert_eq!(
        to_string_with_options(&quote, CodecOptions::legacy()).unwrap(),
        r#"Quote@text:""hi"""#
    );
}

#[test]
fn test_value_field_and_json_cross_check() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Envelope {
        kind: String,
        payload: Value,
    }

    let envelope = Envelope {
        kind: "count".to_string(),
        payload: Value::from(7),
    };
    let text = to_string(&envelope).unwrap();
    assert_eq!(text, r#"Envelope@kind:"count",payload:7"#);
    assert_eq!(from_str::<Envelope>(&text).unwrap(), envelope);

    let json = serde_json::to_string(&envelope).unwrap();
    assert_eq!(json, r#"{"kind":"count","payload":7}"#);
    let from_json: Envelope = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, envelope);
}

#[test]
fn test_wrong_shape_is_an_error() {
    let result = from_str::<User>("id:\"not a number\",name:\"x\",active:true,tags:[]");
    assert!(result.is_err());
}
