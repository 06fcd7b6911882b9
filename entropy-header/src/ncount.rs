//! Reading of FSE normalized-count headers.
//!
//! A normalized-count header describes the probability distribution of an
//! FSE (tANS) table. It starts with 4 bits holding `table_log - 5`, followed
//! by one variable-width count per symbol. The width of each count depends on
//! the probability mass that is still left to be distributed, and a count of
//! zero is followed by a run-length encoded number of further zero counts.
//! All fields are stored LSB-first.

use alloc::vec;
use alloc::vec::Vec;

use crate::bit_reader::BitReader;
use crate::error::{Error, Result, bail};
use crate::log::{ltrace, lwarn};
use crate::{FSE_MIN_TABLELOG, FSE_TABLELOG_ABSOLUTE_MAX};

/// Information about a decoded normalized-count header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NCountHeader {
    /// The largest symbol value that is present in the table.
    pub max_symbol: u32,
    /// The log2 of the sum of all counts.
    pub table_log: u32,
    /// The number of bytes the header occupies in the input.
    pub header_size: usize,
}

/// A borrowed normalized-count table, as handed to a table-based decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountTable<'a> {
    /// The normalized counts of symbols `0..=max_symbol`. A count of `-1`
    /// stands for a "less than one" probability and occupies one table slot.
    pub counts: &'a [i16],
    /// The log2 of the table size.
    pub table_log: u32,
}

impl CountTable<'_> {
    /// The largest symbol value covered by the table.
    pub fn max_symbol(&self) -> u32 {
        self.counts.len().saturating_sub(1) as u32
    }
}

/// Read a normalized-count header from `src`.
///
/// `max_symbol` is the largest symbol value the caller is prepared to handle,
/// and `counts` needs to hold at least `max_symbol + 1` entries. On success,
/// `counts[..=header.max_symbol]` holds the decoded counts and all other
/// entries up to `max_symbol` are zero. Entries after `max_symbol` are left
/// untouched.
///
/// Inputs shorter than 4 bytes are accepted as long as the header fits into
/// them.
pub fn read_ncount(counts: &mut [i16], max_symbol: u32, src: &[u8]) -> Result<NCountHeader> {
    if src.len() < 4 {
        let mut buf = [0_u8; 4];
        buf[..src.len()].copy_from_slice(src);

        let header = read_ncount(counts, max_symbol, &buf)?;

        if header.header_size > src.len() {
            lwarn!(
                "normalized-count header needs {} bytes, but only {} are available",
                header.header_size,
                src.len()
            );

            bail!(Error::CorruptedHeader);
        }

        return Ok(header);
    }

    let max_symbol = max_symbol as usize;

    if max_symbol >= counts.len() {
        bail!(Error::MaxSymbolTooLarge);
    }

    let mut reader = BitReader::new(src);

    let table_log = (reader.peek() & 0xF) + FSE_MIN_TABLELOG;

    if table_log > FSE_TABLELOG_ABSOLUTE_MAX {
        lwarn!("table log {} is too large", table_log);

        bail!(Error::TableLogTooLarge);
    }

    reader.consume(4);

    let counts = &mut counts[..=max_symbol];
    counts.fill(0);

    // One more than the table size, since each count is stored with an offset
    // of one.
    let mut remaining = (1_i32 << table_log) + 1;
    let mut threshold = 1_i32 << table_log;
    let mut num_bits = table_log + 1;
    let mut symbol = 0;
    let mut previous_zero = false;

    while remaining > 1 && symbol <= max_symbol {
        if previous_zero {
            let end = symbol + read_zero_run(&mut reader);

            if end > max_symbol {
                lwarn!("zero run up to symbol {} exceeds max symbol {}", end, max_symbol);

                bail!(Error::MaxSymbolTooSmall);
            }

            counts[symbol..end].fill(0);
            symbol = end;
            reader.realign();
        }

        let max = (2 * threshold - 1) - remaining;
        let bits = reader.peek();

        let mut count = if ((bits & (threshold as u32 - 1)) as i32) < max {
            reader.skip(num_bits - 1);
            (bits & (threshold as u32 - 1)) as i32
        } else {
            reader.skip(num_bits);
            let count = (bits & (2 * threshold as u32 - 1)) as i32;

            if count >= threshold {
                count - max
            } else {
                count
            }
        };

        count -= 1;
        remaining -= count.abs();
        counts[symbol] = i16::try_from(count).map_err(|_| Error::CorruptedHeader)?;
        symbol += 1;
        previous_zero = count == 0;

        while remaining < threshold {
            num_bits -= 1;
            threshold >>= 1;
        }

        reader.refill();
    }

    if remaining != 1 {
        lwarn!("normalized counts don't sum up to the table size");

        bail!(Error::CorruptedHeader);
    }

    if reader.bit_count() > 32 {
        lwarn!("normalized-count header overflows the input");

        bail!(Error::CorruptedHeader);
    }

    let header = NCountHeader {
        max_symbol: (symbol - 1) as u32,
        table_log,
        header_size: reader.bytes_consumed(),
    };

    ltrace!(
        "read normalized counts: max symbol {}, table log {}, {} bytes",
        header.max_symbol,
        header.table_log,
        header.header_size
    );

    Ok(header)
}

/// Read the number of additional zero counts following a zero count.
///
/// The run length is stored in 2-bit groups, where `0b11` means "three more
/// and continue". Sixteen set bits in a row are skipped as a block of 24.
/// The final group is only accounted for in the bit count, so the reader
/// needs to be realigned afterwards.
fn read_zero_run(reader: &mut BitReader<'_>) -> usize {
    let mut run = 0;

    while reader.peek() & 0xFFFF == 0xFFFF {
        run += 24;
        reader.skip_block();
    }

    while reader.peek() & 3 == 3 {
        run += 3;
        reader.consume(2);
    }

    run += (reader.peek() & 3) as usize;
    reader.skip(2);

    run
}

/// An owned normalized-count table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCounts {
    counts: Vec<i16>,
    table_log: u32,
    header_size: usize,
}

impl NormalizedCounts {
    /// Read a normalized-count header with symbols up to `max_symbol`.
    pub fn parse(src: &[u8], max_symbol: u32) -> Result<Self> {
        let mut counts = vec![0; max_symbol as usize + 1];
        let header = read_ncount(&mut counts, max_symbol, src)?;
        counts.truncate(header.max_symbol as usize + 1);

        Ok(Self {
            counts,
            table_log: header.table_log,
            header_size: header.header_size,
        })
    }

    /// The counts of all symbols up to the largest present one.
    pub fn counts(&self) -> &[i16] {
        &self.counts
    }

    /// The largest symbol value present in the table.
    pub fn max_symbol(&self) -> u32 {
        (self.counts.len() - 1) as u32
    }

    /// The log2 of the table size.
    pub fn table_log(&self) -> u32 {
        self.table_log
    }

    /// The number of bytes the header occupied in the input.
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// A borrowed view of the table.
    pub fn table(&self) -> CountTable<'_> {
        CountTable {
            counts: &self.counts,
            table_log: self.table_log,
        }
    }
}
