//! Configuration options for the record codec.
//!
//! [`CodecOptions`] is shared by the encoder and the decoder:
//!
//! - `max_depth` bounds how deeply collections, maps and embedded records may
//!   nest while decoding
//! - `escape_strings` and `delimit_buffers` control how the encoder writes
//!   strings and binary buffers
//!
//! ## Examples
//!
//! ```rust
//! use serde_orient::{encode_with_options, record, CodecOptions};
//!
//! let rec = record!({ "quote": "say \"hi\"" });
//!
//! let strict = encode_with_options(&rec, CodecOptions::new()).unwrap();
//! assert_eq!(strict, r#"quote:"say \"hi\"""#);
//!
//! // Byte-for-byte the historical output, which never escapes
//! let legacy = encode_with_options(&rec, CodecOptions::legacy()).unwrap();
//! assert_eq!(legacy, r#"quote:"say "hi"""#);
//! ```

/// Default nesting limit for decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration options for encoding and decoding records.
///
/// # Examples
///
/// ```rust
/// use serde_orient::CodecOptions;
///
/// let options = CodecOptions::new()
///     .with_max_depth(8)
///     .with_buffer_delimiters(false);
/// assert_eq!(options.max_depth, 8);
/// assert!(options.escape_strings);
/// assert!(!options.delimit_buffers);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    pub max_depth: usize,
    pub escape_strings: bool,
    pub delimit_buffers: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            escape_strings: true,
            delimit_buffers: true,
        }
    }
}

impl CodecOptions {
    /// Creates default options (escaped strings, delimited buffers, depth 64).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::CodecOptions;
    ///
    /// let options = CodecOptions::new();
    /// assert_eq!(options.max_depth, 64);
    /// assert!(options.escape_strings);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options matching the lenient historical encoder: strings are
    /// written without escaping and buffer payloads without `_` markers.
    ///
    /// Output produced this way does not always decode back to the same
    /// record; use it only when a peer depends on the exact legacy bytes.
    #[must_use]
    pub fn legacy() -> Self {
        CodecOptions {
            escape_strings: false,
            delimit_buffers: false,
            ..Default::default()
        }
    }

    /// Sets the maximum nesting depth accepted by the decoder.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables escaping of `"` and `\` on encode.
    #[must_use]
    pub fn with_string_escaping(mut self, escape: bool) -> Self {
        self.escape_strings = escape;
        self
    }

    /// Enables or disables writing `_` markers around buffer payloads.
    #[must_use]
    pub fn with_buffer_delimiters(mut self, delimit: bool) -> Self {
        self.delimit_buffers = delimit;
        self
    }
}
