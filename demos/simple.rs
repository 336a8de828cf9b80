//! Basic record serialization and deserialization.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use serde_orient::{from_str, to_string};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
    address: Address,
    roles: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let user = User {
        id: 42,
        name: "Alice Johnson".to_string(),
        email: "alice@example.com".to_string(),
        address: Address {
            city: "Rome".to_string(),
            zip: "00118".to_string(),
        },
        roles: vec!["admin".to_string(), "editor".to_string()],
    };

    let text = to_string(&user)?;
    println!("Record text:\n{}\n", text);

    let user_back: User = from_str(&text)?;
    assert_eq!(user, user_back);
    println!("✓ Round-trip successful");

    Ok(())
}
