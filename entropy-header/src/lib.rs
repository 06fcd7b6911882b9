/*!
A memory-safe, pure-Rust reader for FSE and Huffman table headers.

Entropy coded blocks of FSE based formats (such as Zstandard) start with a
compact description of the model needed to decode them. This crate reads
the two kinds of such descriptions:

- [`read_ncount`] decodes the normalized-count header of an FSE table, which
  assigns each symbol a share of a table of `2^table_log` slots.
- [`read_stats`] decodes a Huffman weight header, which is either stored as
  packed 4-bit values or FSE compressed. In the latter case, the normalized
  counts are read by this crate, while the FSE payload itself is decoded by a
  caller-provided [`WeightDecoder`].

Building the actual decoding tables and decoding the payload that follows
the headers is out of scope.

# Example
```rust
use entropy_header::{Error, read_ncount};

let mut counts = [0_i16; 256];
let header = read_ncount(&mut counts, 255, &[0x10, 0xB3, 0x07]).unwrap();

assert_eq!(header.table_log, 5);
assert_eq!(header.max_symbol, 3);
assert_eq!(header.header_size, 3);
assert_eq!(counts[..4], [16, 8, 4, 4]);

assert_eq!(
    read_ncount(&mut counts, 255, &[0x0B]),
    Err(Error::TableLogTooLarge)
);
```

# Logging
Enable the `logging` feature to forward diagnostics about rejected headers
to the `log` crate.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

mod bit_reader;
mod error;
mod huffman;
mod log;
mod ncount;

pub use error::{Error, Result};
pub use huffman::{HuffmanStats, HuffmanWeights, RankStats, WeightDecoder, read_stats};
pub use ncount::{CountTable, NCountHeader, NormalizedCounts, read_ncount};

/// The smallest table log of an FSE table.
pub const FSE_MIN_TABLELOG: u32 = 5;
/// The largest table log a normalized-count header can describe.
pub const FSE_TABLELOG_ABSOLUTE_MAX: u32 = 15;
/// The largest table log used by FSE encoders by default.
pub const FSE_MAX_TABLELOG: u32 = 12;
/// The table log FSE encoders pick if not told otherwise.
pub const FSE_DEFAULT_TABLELOG: u32 = 11;
/// The largest symbol value of an FSE alphabet.
pub const FSE_MAX_SYMBOL_VALUE: u32 = 255;

/// The largest Huffman table log (maximum code length).
pub const HUF_TABLELOG_MAX: u32 = 12;
/// The largest symbol value of a Huffman alphabet.
pub const HUF_SYMBOLVALUE_MAX: u32 = 255;
/// The largest table log of the FSE table used to compress Huffman weights.
pub const HUF_WEIGHTS_MAX_TABLELOG: u32 = 6;
