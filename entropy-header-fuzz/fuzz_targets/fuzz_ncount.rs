#![no_main]

use libfuzzer_sys::fuzz_target;

// Header layout (1 byte):
// [0]     max symbol value
// [1..]   normalized-count header

fuzz_target!(|data: &[u8]| {
    let Some((&max_symbol, src)) = data.split_first() else {
        return;
    };

    let mut counts = [0_i16; 256];

    if let Ok(header) = entropy_header::read_ncount(&mut counts, max_symbol as u32, src) {
        assert!(header.max_symbol <= max_symbol as u32);
        assert!(header.header_size <= src.len());

        let mass: u32 = counts[..=header.max_symbol as usize]
            .iter()
            .map(|c| c.unsigned_abs() as u32)
            .sum();
        assert_eq!(mass, 1 << header.table_log);
    }
});
