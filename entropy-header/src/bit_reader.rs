//! Little-endian bit cursor for normalized-count headers.
//!
//! The cursor keeps a 32-bit window of the input starting at `byte_pos`,
//! already shifted by the number of bits consumed inside that window. Reads
//! are refilled from the byte position, and close to the end of the input the
//! byte position stops at the last full 32-bit window while the consumed bit
//! count keeps growing. A bit count beyond 32 at the end of decoding therefore
//! means that more bits were consumed than the input holds.

/// Read a little-endian `u32` at `pos`, padding with zeros past the end of
/// `data`.
#[inline(always)]
pub(crate) fn read_le32(data: &[u8], pos: usize) -> u32 {
    match data.get(pos..).and_then(|tail| tail.first_chunk::<4>()) {
        Some(bytes) => u32::from_le_bytes(*bytes),
        None => {
            let mut bytes = [0_u8; 4];

            if let Some(tail) = data.get(pos..) {
                bytes[..tail.len()].copy_from_slice(tail);
            }

            u32::from_le_bytes(bytes)
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_count: u32,
    window: u32,
}

impl<'a> BitReader<'a> {
    /// Create a new reader. `data` needs to be at least 4 bytes long.
    #[inline(always)]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= 4);

        Self {
            data,
            byte_pos: 0,
            bit_count: 0,
            window: read_le32(data, 0),
        }
    }

    /// The current window. The lowest bit is the next unread bit.
    #[inline(always)]
    pub(crate) fn peek(&self) -> u32 {
        self.window
    }

    /// Consume `num_bits` bits from the current window.
    #[inline(always)]
    pub(crate) fn consume(&mut self, num_bits: u32) {
        self.window >>= num_bits;
        self.bit_count += num_bits;
    }

    /// Mark `num_bits` bits as consumed without touching the window. The
    /// window becomes valid again after the next [`Self::refill`].
    #[inline(always)]
    pub(crate) fn skip(&mut self, num_bits: u32) {
        self.bit_count += num_bits;
    }

    /// Skip a block of 16 bits in the middle of a zero run.
    #[inline(always)]
    pub(crate) fn skip_block(&mut self) {
        if self.byte_pos + 5 < self.data.len() {
            self.byte_pos += 2;
            self.window = read_le32(self.data, self.byte_pos) >> self.bit_count;
        } else {
            self.consume(16);
        }
    }

    /// Realign the window after a zero run whose final 2-bit group was
    /// accounted for with [`Self::skip`].
    #[inline(always)]
    pub(crate) fn realign(&mut self) {
        if self.can_advance() {
            debug_assert!(self.bit_count >> 3 <= 3);

            self.byte_pos += (self.bit_count >> 3) as usize;
            self.bit_count &= 7;
            self.window = read_le32(self.data, self.byte_pos) >> self.bit_count;
        } else {
            self.window >>= 2;
        }
    }

    /// Move the window forward over all fully consumed bytes.
    #[inline(always)]
    pub(crate) fn refill(&mut self) {
        if self.can_advance() {
            self.byte_pos += (self.bit_count >> 3) as usize;
            self.bit_count &= 7;
        } else {
            let last = self.last_window_pos();
            self.bit_count -= 8 * (last - self.byte_pos) as u32;
            self.byte_pos = last;
        }

        self.window = read_le32(self.data, self.byte_pos).wrapping_shr(self.bit_count);
    }

    /// The number of bits consumed past the current byte position.
    #[inline(always)]
    pub(crate) fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// The number of bytes touched so far, counting a partially consumed
    /// byte as a full one.
    #[inline(always)]
    pub(crate) fn bytes_consumed(&self) -> usize {
        self.byte_pos + self.bit_count.div_ceil(8) as usize
    }

    #[inline(always)]
    fn can_advance(&self) -> bool {
        self.byte_pos + 7 <= self.data.len()
            || self.byte_pos + (self.bit_count >> 3) as usize + 4 <= self.data.len()
    }

    #[inline(always)]
    fn last_window_pos(&self) -> usize {
        self.data.len() - 4
    }
}
