//! Building records and values with the `record!` and `value!` macros.
//!
//! Run with: cargo run --example macro

use serde_orient::{encode, record, value, RecordLink};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let address = record!("Address", { "city": "Rome", "zip": "00118" });

    let mut person = record!("Person", {
        "name": "John",
        "age": 29,
        "tags": ["admin", "editor"],
        "prefs": { "theme": "dark", "beta": true },
        "nickname": null,
        "home": (address),
    });
    person.insert("manager", RecordLink::new(12, 345));

    println!("{}", encode(&person)?);

    let scores = value!([90, 85, 77]);
    println!("scores: {:?}", scores);

    Ok(())
}
