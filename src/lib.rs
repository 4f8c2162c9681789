//! # Adaptive Huffman
//!
//! Adaptive Huffman coding via Vitter's Algorithm Λ: a single dynamic
//! prefix-code tree kept synchronised between an encoder and a decoder
//! without ever transmitting a code table.
//!
//! * `model` is the coder itself: the tree, the weight-class block
//!   structure, and `encode`/`decode`/`update_model`.
//! * `driver` is a thin, line-oriented I/O shell around the model, used by
//!   the `adaptive-huffman` binary.
//!
//! The wire format is a textual sequence of `'0'`/`'1'` characters, not a
//! packed bitstream; there is no framing, length prefix, or interoperability
//! with any standard Huffman file format.
//!
//! ## Example
//!
//! ```rs
//! use adaptive_huffman::Model;
//! let mut encoder = Model::new(false);
//! let mut bits = String::new();
//! for &b in b"ABRACADABRA" {
//!     bits.push_str(&encoder.encode(b));
//!     encoder.update_model(b);
//! }
//! let mut decoder = Model::new(false);
//! assert_eq!(decoder.decode(&bits), b"ABRACADABRA");
//! ```

pub mod driver;
mod model;

pub use model::Model;

/// Driver-level errors. The coder itself (`Model`) never fails.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open {path}")]
    CouldNotOpen { path: String, source: std::io::Error },
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Options controlling the line-oriented driver.
#[derive(Clone, Copy, Default)]
pub struct Options {
    /// cosmetic grouping of the encoder's output into per-symbol groups
    /// separated by spaces; the decoder ignores any separators regardless
    pub split: bool,
}
