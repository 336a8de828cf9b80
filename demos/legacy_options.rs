//! Comparing default and legacy encoder options, and limiting nesting depth.
//!
//! Run with: cargo run --example legacy_options

use serde_orient::{
    decode, decode_with_options, encode_with_options, BinaryBuffer, CodecOptions, Record,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let rec = Record::with_class("Note")
        .with_field("text", r#"she said "hi" \o/"#)
        .with_field("blob", BinaryBuffer::new("SGVsbG8="));

    let escaped = encode_with_options(&rec, CodecOptions::default())?;
    println!("default: {}", escaped);
    assert_eq!(decode(&escaped)?.record, rec);

    let legacy = encode_with_options(&rec, CodecOptions::legacy())?;
    println!("legacy:  {}", legacy);
    match decode(&legacy) {
        Ok(decoded) => println!("legacy output decoded to {:?}", decoded.record),
        Err(err) => println!("legacy output does not decode back: {}", err),
    }

    let shallow = CodecOptions::new().with_max_depth(2);
    match decode_with_options("a:[[[1]]]", shallow) {
        Ok(_) => println!("decoded within depth 2"),
        Err(err) => println!("depth-limited decode failed: {}", err),
    }

    Ok(())
}
