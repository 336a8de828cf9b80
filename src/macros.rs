/// Builds a [`Value`](crate::Value) from a literal-like syntax.
///
/// `null`, `true` and `false` map to their variants, `[..]` builds a
/// collection, `{ "key": value }` a map; anything else goes through
/// `Value::from`. Negative numbers inside `[..]`/`{..}` need parentheses.
///
/// ```rust
/// use serde_orient::{value, Value};
///
/// let v = value!({ "tags": ["a", "b"], "n": 3 });
/// assert_eq!(v.as_map().and_then(|m| m.get("n")), Some(&Value::from(3)));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Collection(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Collection(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::ValueMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::ValueMap::new();
        $(
            map.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

/// Builds a [`Record`](crate::Record), optionally tagged with a class name.
///
/// ```rust
/// use serde_orient::{record, Value};
///
/// let rec = record!("Person", { "name": "John", "age": 29 });
/// assert_eq!(rec.class_name(), Some("Person"));
/// assert_eq!(rec.get("age"), Some(&Value::from(29)));
///
/// let anonymous = record!({ "flag": true });
/// assert_eq!(anonymous.class_name(), None);
/// ```
#[macro_export]
macro_rules! record {
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut rec = $crate::Record::new();
        $(
            rec.insert($key, $crate::value!($value));
        )*
        rec
    }};

    ($class:expr, { $($key:literal : $value:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut rec = $crate::Record::with_class($class);
        $(
            rec.insert($key, $crate::value!($value));
        )*
        rec
    }};
}

#[cfg(test)]
mod tests {
    use crate::{Number, Record, Value, ValueMap};

    #[test]
    fn test_value_macro_primitives() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(false), Value::Bool(false));
        assert_eq!(value!(42), Value::Number(Number::Int(42)));
        assert_eq!(value!(42i64), Value::Number(Number::Long(42)));
        assert_eq!(value!(3.5), Value::Number(Number::Double(3.5)));
        assert_eq!(value!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_value_macro_collections() {
        assert_eq!(value!([]), Value::Collection(vec![]));
        assert_eq!(
            value!([1, 2, (-3)]),
            Value::Collection(vec![Value::from(1), Value::from(2), Value::from(-3)])
        );
    }

    #[test]
    fn test_value_macro_maps() {
        assert_eq!(value!({}), Value::Map(ValueMap::new()));

        let map = value!({ "name": "Alice", "nested": { "ok": true } });
        let map = map.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::from("Alice")));
        assert_eq!(
            map.get("nested").and_then(Value::as_map).and_then(|m| m.get("ok")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_record_macro() {
        assert_eq!(record!({}), Record::new());
        assert_eq!(record!("Tag", {}), Record::with_class("Tag"));

        let rec = record!("Person", {
            "name": "John",
            "tags": ["a", "b"],
            "friend": null,
        });
        assert_eq!(rec.len(), 3);
        assert_eq!(rec.get("friend"), Some(&Value::Null));
        let names: Vec<_> = rec.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["name", "tags", "friend"]);
    }
}
