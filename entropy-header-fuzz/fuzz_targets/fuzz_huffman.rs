#![no_main]

use entropy_header::{CountTable, RankStats, Result};
use libfuzzer_sys::fuzz_target;

/// A decoder that produces weights straight from the low nibbles of the
/// payload.
struct Decoder;

impl entropy_header::WeightDecoder for Decoder {
    fn decode(&mut self, table: &CountTable<'_>, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        assert!(table.table_log <= entropy_header::HUF_WEIGHTS_MAX_TABLELOG);

        let len = src.len().min(dst.len());

        for (weight, byte) in dst.iter_mut().zip(src) {
            *weight = byte & 0xF;
        }

        Ok(len)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut weights = [0_u8; 256];
    let mut rank_stats = RankStats::default();

    if let Ok(stats) = entropy_header::read_stats(&mut weights, &mut rank_stats, data, &mut Decoder) {
        assert!(stats.header_size <= data.len());
        assert!(rank_stats[1] >= 2 && rank_stats[1] % 2 == 0);

        let total: u32 = weights[..stats.num_symbols as usize]
            .iter()
            .filter(|&&w| w > 0)
            .map(|&w| 1 << (w - 1))
            .sum();
        assert_eq!(total, 1 << stats.table_log);
    }
});
