//! Reading of Huffman weight headers.
//!
//! The first byte of a weight header selects its representation:
//!
//! - Values of 128 and above announce `byte - 127` weights packed as 4-bit
//!   nibbles, high nibble first.
//! - Smaller values give the size of an FSE compressed weight stream, which
//!   consists of a normalized-count header followed by the FSE payload.
//!
//! The weight of the last symbol is never transmitted. It is implied by the
//! requirement that the weights describe a complete prefix code.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result, bail};
use crate::log::{ltrace, lwarn};
use crate::ncount::{CountTable, read_ncount};
use crate::{FSE_MAX_SYMBOL_VALUE, HUF_SYMBOLVALUE_MAX, HUF_TABLELOG_MAX, HUF_WEIGHTS_MAX_TABLELOG};

/// The number of symbols per weight, indexed by weight.
pub type RankStats = [u32; HUF_TABLELOG_MAX as usize + 1];

/// A decoder for FSE compressed Huffman weights.
///
/// The weight header reader only understands the normalized-count header that
/// precedes the compressed weights. Building the FSE decoding table from it
/// and decoding the payload is delegated to an implementation of this trait.
pub trait WeightDecoder {
    /// Decode the FSE compressed weights in `src` into `dst`, using the
    /// normalized counts in `table`.
    ///
    /// Returns the number of weights written to `dst`.
    fn decode(&mut self, table: &CountTable<'_>, src: &[u8], dst: &mut [u8]) -> Result<usize>;
}

/// Information about a decoded Huffman weight header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanStats {
    /// The number of symbols, including the one with the implied weight.
    pub num_symbols: u32,
    /// The maximum code length.
    pub table_log: u32,
    /// The number of bytes the header occupies in the input.
    pub header_size: usize,
}

/// Read a Huffman weight header from `src`.
///
/// The weights are written to `weights`, which must leave room for the
/// implied last weight, and the number of symbols per weight is written to
/// `rank_stats`. FSE compressed weights are decoded with `decoder`.
pub fn read_stats(
    weights: &mut [u8],
    rank_stats: &mut RankStats,
    src: &[u8],
    decoder: &mut impl WeightDecoder,
) -> Result<HuffmanStats> {
    let Some((&first, tail)) = src.split_first() else {
        bail!(Error::SrcSizeWrong);
    };

    let (num_weights, body_size) = if first >= 128 {
        let num_weights = first as usize - 127;
        let body_size = num_weights.div_ceil(2);

        ltrace!("reading {} packed Huffman weights", num_weights);

        let packed = tail.get(..body_size).ok_or(Error::SrcSizeWrong)?;

        if num_weights >= weights.len() {
            lwarn!("{} Huffman weights don't fit into the weight buffer", num_weights);

            bail!(Error::CorruptedHeader);
        }

        for (i, weight) in weights[..num_weights].iter_mut().enumerate() {
            let byte = packed[i / 2];
            *weight = if i.is_multiple_of(2) { byte >> 4 } else { byte & 0xF };
        }

        (num_weights, body_size)
    } else {
        let body_size = first as usize;

        ltrace!("reading {} bytes of FSE compressed Huffman weights", body_size);

        let body = tail.get(..body_size).ok_or(Error::SrcSizeWrong)?;
        let num_weights = decode_compressed_weights(weights, body, decoder)?;

        (num_weights, body_size)
    };

    let (table_log, last_weight) = collect_stats(&weights[..num_weights], rank_stats)?;

    weights[num_weights] = last_weight;
    rank_stats[last_weight as usize] += 1;

    // A complete prefix code always has an even number of longest codes,
    // and at least two of them.
    if rank_stats[1] < 2 || !rank_stats[1].is_multiple_of(2) {
        lwarn!("invalid number of weight-1 symbols: {}", rank_stats[1]);

        bail!(Error::CorruptedHeader);
    }

    Ok(HuffmanStats {
        num_symbols: num_weights as u32 + 1,
        table_log,
        header_size: body_size + 1,
    })
}

fn decode_compressed_weights(
    weights: &mut [u8],
    body: &[u8],
    decoder: &mut impl WeightDecoder,
) -> Result<usize> {
    // The smallest possible normalized-count header alone takes two bytes.
    if body.len() < 2 {
        bail!(Error::SrcSizeWrong);
    }

    let mut counts = [0_i16; FSE_MAX_SYMBOL_VALUE as usize + 1];
    let header = read_ncount(&mut counts, FSE_MAX_SYMBOL_VALUE, body)?;

    if header.table_log > HUF_WEIGHTS_MAX_TABLELOG {
        lwarn!(
            "table log {} of compressed Huffman weights is too large",
            header.table_log
        );

        bail!(Error::TableLogTooLarge);
    }

    let table = CountTable {
        counts: &counts[..=header.max_symbol as usize],
        table_log: header.table_log,
    };

    // The last weight is implied, so leave room for it.
    let capacity = weights.len().checked_sub(1).ok_or(Error::DstSizeTooSmall)?;
    let num_weights = decoder.decode(&table, &body[header.header_size..], &mut weights[..capacity])?;

    if num_weights > capacity {
        lwarn!(
            "weight decoder reported {} weights for a buffer of {}",
            num_weights,
            capacity
        );

        bail!(Error::CorruptedHeader);
    }

    Ok(num_weights)
}

/// Fill `rank_stats` from the transmitted weights, and derive the table log
/// and the implied weight of the last symbol.
fn collect_stats(weights: &[u8], rank_stats: &mut RankStats) -> Result<(u32, u8)> {
    rank_stats.fill(0);

    let mut weight_total = 0_u32;

    for &weight in weights {
        if weight as u32 >= HUF_TABLELOG_MAX {
            lwarn!("Huffman weight {} is too large", weight);

            bail!(Error::CorruptedHeader);
        }

        rank_stats[weight as usize] += 1;
        weight_total = weight_total
            .checked_add((1 << weight) >> 1)
            .ok_or(Error::CorruptedHeader)?;
    }

    if weight_total == 0 {
        bail!(Error::CorruptedHeader);
    }

    let table_log = highest_bit(weight_total) + 1;

    if table_log > HUF_TABLELOG_MAX {
        bail!(Error::CorruptedHeader);
    }

    // The remaining weight has to be a power of two.
    let rest = (1 << table_log) - weight_total;
    let rest_log = highest_bit(rest);

    if 1 << rest_log != rest {
        lwarn!("implied Huffman weight is not a power of two");

        bail!(Error::CorruptedHeader);
    }

    Ok((table_log, (rest_log + 1) as u8))
}

#[inline]
fn highest_bit(val: u32) -> u32 {
    debug_assert!(val != 0);

    31 - val.leading_zeros()
}

/// An owned set of Huffman weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanWeights {
    weights: Vec<u8>,
    rank_stats: RankStats,
    table_log: u32,
    header_size: usize,
}

impl HuffmanWeights {
    /// Read a Huffman weight header for an alphabet of up to 256 symbols.
    pub fn parse(src: &[u8], decoder: &mut impl WeightDecoder) -> Result<Self> {
        let mut weights = vec![0; HUF_SYMBOLVALUE_MAX as usize + 1];
        let mut rank_stats = RankStats::default();
        let stats = read_stats(&mut weights, &mut rank_stats, src, decoder)?;
        weights.truncate(stats.num_symbols as usize);

        Ok(Self {
            weights,
            rank_stats,
            table_log: stats.table_log,
            header_size: stats.header_size,
        })
    }

    /// The weights of all symbols, including the implied last one.
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }

    /// The number of symbols per weight.
    pub fn rank_stats(&self) -> &RankStats {
        &self.rank_stats
    }

    /// The number of symbols.
    pub fn num_symbols(&self) -> u32 {
        self.weights.len() as u32
    }

    /// The maximum code length.
    pub fn table_log(&self) -> u32 {
        self.table_log
    }

    /// The number of bytes the header occupied in the input.
    pub fn header_size(&self) -> usize {
        self.header_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A decoder for headers that must not contain compressed weights.
    struct Unreachable;

    impl WeightDecoder for Unreachable {
        fn decode(&mut self, _: &CountTable<'_>, _: &[u8], _: &mut [u8]) -> Result<usize> {
            panic!("unexpected compressed weights");
        }
    }

    /// A decoder that writes fixed weights and remembers its inputs.
    #[derive(Default)]
    struct Fixed {
        weights: Vec<u8>,
        counts: Vec<i16>,
        table_log: u32,
        payload: Vec<u8>,
        capacity: usize,
    }

    impl Fixed {
        fn new(weights: &[u8]) -> Self {
            Self {
                weights: weights.to_vec(),
                ..Self::default()
            }
        }
    }

    impl WeightDecoder for Fixed {
        fn decode(&mut self, table: &CountTable<'_>, src: &[u8], dst: &mut [u8]) -> Result<usize> {
            self.counts = table.counts.to_vec();
            self.table_log = table.table_log;
            self.payload = src.to_vec();
            self.capacity = dst.len();

            let dst = dst
                .get_mut(..self.weights.len())
                .ok_or(Error::DstSizeTooSmall)?;
            dst.copy_from_slice(&self.weights);

            Ok(self.weights.len())
        }
    }

    fn read_raw(src: &[u8]) -> Result<(Vec<u8>, RankStats, HuffmanStats)> {
        let mut weights = [0xEE; 256];
        let mut rank_stats = RankStats::default();
        let stats = read_stats(&mut weights, &mut rank_stats, src, &mut Unreachable)?;

        Ok((
            weights[..stats.num_symbols as usize].to_vec(),
            rank_stats,
            stats,
        ))
    }

    #[test]
    fn single_packed_weight() {
        let (weights, rank_stats, stats) = read_raw(&[0x80, 0x10]).unwrap();

        assert_eq!(weights, [1, 1]);
        assert_eq!(stats.num_symbols, 2);
        assert_eq!(stats.table_log, 1);
        assert_eq!(stats.header_size, 2);
        assert_eq!(rank_stats[1], 2);
    }

    #[test]
    fn packed_weights() {
        let (weights, rank_stats, stats) = read_raw(&[0x82, 0x11, 0x20, 0xFF]).unwrap();

        assert_eq!(weights, [1, 1, 2, 3]);
        assert_eq!(stats.num_symbols, 4);
        assert_eq!(stats.table_log, 3);
        assert_eq!(stats.header_size, 3);
        assert_eq!(rank_stats[..4], [0, 2, 1, 1]);
        assert!(rank_stats[4..].iter().all(|&r| r == 0));
    }

    #[test]
    fn zero_weights_are_counted() {
        let (weights, rank_stats, stats) = read_raw(&[0x83, 0x10, 0x01]).unwrap();

        assert_eq!(weights, [1, 0, 0, 1, 2]);
        assert_eq!(stats.table_log, 2);
        assert_eq!(rank_stats[..3], [2, 2, 1]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(read_raw(&[]), Err(Error::SrcSizeWrong));
    }

    #[test]
    fn truncated_input() {
        assert_eq!(read_raw(&[0x82, 0x11]), Err(Error::SrcSizeWrong));
        assert_eq!(read_raw(&[0x80]), Err(Error::SrcSizeWrong));
        assert_eq!(read_raw(&[0x05, 0x11, 0x20]), Err(Error::SrcSizeWrong));
    }

    #[test]
    fn empty_compressed_weights() {
        assert_eq!(read_raw(&[0x00]), Err(Error::SrcSizeWrong));
        assert_eq!(read_raw(&[0x01, 0x50]), Err(Error::SrcSizeWrong));
    }

    #[test]
    fn rest_not_power_of_two() {
        assert_eq!(read_raw(&[0x81, 0x13]), Err(Error::CorruptedHeader));
    }

    #[test]
    fn missing_weight_one_symbols() {
        assert_eq!(read_raw(&[0x80, 0x20]), Err(Error::CorruptedHeader));
        assert_eq!(read_raw(&[0x81, 0x02]), Err(Error::CorruptedHeader));
    }

    #[test]
    fn all_weights_zero() {
        assert_eq!(read_raw(&[0x80, 0x00]), Err(Error::CorruptedHeader));
        assert_eq!(read_raw(&[0x83, 0x00, 0x00]), Err(Error::CorruptedHeader));
    }

    #[test]
    fn weight_too_large() {
        assert_eq!(read_raw(&[0x81, 0x1C]), Err(Error::CorruptedHeader));
        assert_eq!(read_raw(&[0x80, 0xF0]), Err(Error::CorruptedHeader));
    }

    #[test]
    fn weight_buffer_too_small() {
        let mut weights = [0; 2];
        let mut rank_stats = RankStats::default();

        assert_eq!(
            read_stats(&mut weights, &mut rank_stats, &[0x81, 0x11], &mut Unreachable),
            Err(Error::CorruptedHeader)
        );

        let mut weights = [0; 3];
        let stats = read_stats(&mut weights, &mut rank_stats, &[0x81, 0x11], &mut Unreachable).unwrap();
        assert_eq!(stats.num_symbols, 3);
        assert_eq!(weights, [1, 1, 2]);
    }

    #[test]
    fn compressed_weights() {
        let mut decoder = Fixed::new(&[1, 1, 2]);
        let mut weights = [0; 256];
        let mut rank_stats = RankStats::default();

        let src = [0x04, 0x50, 0x1F, 0xAA, 0xBB, 0xCC];
        let stats = read_stats(&mut weights, &mut rank_stats, &src, &mut decoder).unwrap();

        assert_eq!(stats.num_symbols, 4);
        assert_eq!(stats.table_log, 3);
        assert_eq!(stats.header_size, 5);
        assert_eq!(weights[..4], [1, 1, 2, 3]);

        assert_eq!(decoder.counts, [20, 12]);
        assert_eq!(decoder.table_log, 5);
        assert_eq!(decoder.payload, [0xAA, 0xBB]);
        assert_eq!(decoder.capacity, 255);
    }

    #[test]
    fn compressed_weights_table_log_limit() {
        // A table log of 6 is still fine.
        let src = [0x03, 0x11, 0xFE, 0x00];
        let table = HuffmanWeights::parse(&src, &mut Fixed::new(&[2, 1, 1])).unwrap();
        assert_eq!(table.weights(), [2, 1, 1, 3]);

        let src = [0x04, 0x12, 0xFC, 0x03, 0x00];
        assert_eq!(
            HuffmanWeights::parse(&src, &mut Fixed::new(&[2, 1, 1])),
            Err(Error::TableLogTooLarge)
        );
    }

    #[test]
    fn compressed_weights_invalid_ncount() {
        let src = [0x04, 0x0B, 0x00, 0x00, 0x00];
        assert_eq!(
            HuffmanWeights::parse(&src, &mut Fixed::new(&[1, 1])),
            Err(Error::TableLogTooLarge)
        );

        let src = [0x02, 0x00, 0x00];
        assert_eq!(
            HuffmanWeights::parse(&src, &mut Fixed::new(&[1, 1])),
            Err(Error::CorruptedHeader)
        );
    }

    #[test]
    fn decoder_errors_are_forwarded() {
        let mut weights = [0; 3];
        let mut rank_stats = RankStats::default();
        let src = [0x02, 0x50, 0x1F];

        assert_eq!(
            read_stats(&mut weights, &mut rank_stats, &src, &mut Fixed::new(&[1, 1, 2])),
            Err(Error::DstSizeTooSmall)
        );
    }

    #[test]
    fn decoder_reporting_too_many_weights() {
        struct Liar;

        impl WeightDecoder for Liar {
            fn decode(&mut self, _: &CountTable<'_>, _: &[u8], dst: &mut [u8]) -> Result<usize> {
                Ok(dst.len() + 1)
            }
        }

        let src = [0x02, 0x50, 0x1F];
        assert_eq!(HuffmanWeights::parse(&src, &mut Liar), Err(Error::CorruptedHeader));
    }

    #[test]
    fn weight_sums() {
        let table = HuffmanWeights::parse(&[0x86, 0x11, 0x20, 0x34, 0x50], &mut Unreachable).unwrap();
        let weights = table.weights();
        let total: u32 = weights
            .iter()
            .filter(|&&w| w > 0)
            .map(|&w| 1 << (w - 1))
            .sum();

        assert_eq!(weights, [1, 1, 2, 0, 3, 4, 5, 6]);
        assert_eq!(total, 1 << table.table_log());
        assert_eq!(table.table_log(), 6);
        assert_eq!(table.num_symbols(), 8);
        assert_eq!(table.header_size(), 5);
        assert_eq!(table.rank_stats()[1] % 2, 0);
    }
}
