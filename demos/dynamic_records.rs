//! Walking a decoded record without a schema.
//!
//! Run with: cargo run --example dynamic_records

use serde_orient::{decode, Value};
use std::error::Error;

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Collection(items) => format!("collection of {}", items.len()),
        Value::Map(map) => format!("map with keys {:?}", map.keys().collect::<Vec<_>>()),
        Value::Embedded(rec) => format!(
            "embedded {} with {} fields",
            rec.class_name().unwrap_or("record"),
            rec.len()
        ),
        Value::Link(link) => format!(
            "link to cluster {} position {}",
            link.cluster(),
            link.position()
        ),
        other => format!("{} {:?}", other.kind(), other),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let text = concat!(
        r#"Invoice@number:1042l,paid:false,total:249.9d,"#,
        r#"lines:[(sku:"A-1",qty:2),(sku:"B-7",qty:1)],"#,
        r#"meta:{"channel":"web","priority":3},"#,
        r#"customer:#12:345,attachment:_SGVsbG8=_,note:"#
    );

    let decoded = decode(text)?;
    println!(
        "class {:?}, {} fields, {} bytes consumed",
        decoded.class_name(),
        decoded.fields().len(),
        decoded.consumed
    );

    for (name, value) in decoded.fields() {
        println!("  {:<10} {}", name, describe(value));
    }

    if let Some(Value::Collection(lines)) = decoded.fields().get("lines") {
        let units: i64 = lines
            .iter()
            .filter_map(Value::as_record)
            .filter_map(|line| line.get("qty").and_then(Value::as_i64))
            .sum();
        println!("total units: {}", units);
    }

    Ok(())
}
