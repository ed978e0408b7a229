// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! MSB-first bit reader over an RBSP, with Exp-Golomb decoding.

use crate::error::Error;
use crate::error::Result;

/// Longest unary prefix accepted by [`BitCursor::get_uvlc`].
pub const MAX_UVLC_LEADING_ZEROS: u32 = 20;
/// Returned by [`BitCursor::get_uvlc`] and [`BitCursor::get_svlc`] for a malformed code.
pub const UVLC_ERROR: i32 = -99999;

const REGISTER_BITS: u32 = u64::BITS;

/// A bit reader over a borrowed RBSP buffer.
///
/// Bits are pulled into a 64-bit left-aligned register a byte at a time. Reading past the end of
/// the buffer is not an error: the missing bits read as zero, so truncated input degrades into
/// zero-valued syntax elements instead of failing or panicking.
pub struct BitCursor<'a> {
    data: &'a [u8],
    /// Index of the next byte to load into `nextbits`.
    pos: usize,
    /// Left-aligned lookahead register.
    nextbits: u64,
    /// Number of valid bits in `nextbits`, within `0..=64`.
    nextbits_cnt: u32,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            nextbits: 0,
            nextbits_cnt: 0,
        }
    }

    /// Restarts reading at the beginning of `data`.
    pub fn init(&mut self, data: &'a [u8]) {
        *self = Self::new(data);
    }

    /// Number of bytes not yet loaded into the register.
    pub fn bytes_remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Number of real (not past-the-end) bits left to read.
    pub fn bits_remaining(&self) -> usize {
        self.bytes_remaining() * 8 + self.nextbits_cnt as usize
    }

    /// Offset in bits of the next unread bit, relative to the start of the buffer.
    pub fn bit_position(&self) -> usize {
        self.pos * 8 - self.nextbits_cnt as usize
    }

    /// Bytes following the last one loaded into the register.
    ///
    /// After [`prepare_for_cabac`](Self::prepare_for_cabac) the register is empty and this is the
    /// byte-aligned remainder of the payload.
    pub fn remaining_data(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Loads bytes until the register holds at least 57 bits or the input runs out.
    pub fn refill(&mut self) {
        let mut shift = REGISTER_BITS - self.nextbits_cnt;

        while shift >= 8 && self.pos < self.data.len() {
            let byte = u64::from(self.data[self.pos]);
            self.pos += 1;
            shift -= 8;
            self.nextbits |= byte << shift;
        }

        self.nextbits_cnt = REGISTER_BITS - shift;
    }

    /// Reads `n` bits (at most 32) as an unsigned value.
    pub fn get_bits(&mut self, n: u32) -> u32 {
        if self.nextbits_cnt < n {
            self.refill();
        }
        self.get_bits_fast(n)
    }

    /// Like [`get_bits`](Self::get_bits), but the caller guarantees that `n` bits are already
    /// buffered.
    pub fn get_bits_fast(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }

        let val = self.nextbits >> (REGISTER_BITS - n);
        self.consume(n);
        val as u32
    }

    /// Returns the next `n` bits (at most 32) without consuming them.
    pub fn peek_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        if n == 0 {
            return 0;
        }

        if self.nextbits_cnt < n {
            self.refill();
        }
        (self.nextbits >> (REGISTER_BITS - n)) as u32
    }

    pub fn skip_bits(&mut self, n: u32) {
        if self.nextbits_cnt < n {
            self.refill();
        }
        self.skip_bits_fast(n);
    }

    pub fn skip_bits_fast(&mut self, n: u32) {
        if n > 0 {
            self.consume(n);
        }
    }

    pub fn next_bit(&mut self) -> u32 {
        self.get_bits(1)
    }

    pub fn next_bit_norefill(&mut self) -> u32 {
        self.get_bits_fast(1)
    }

    /// Drops the bits up to the next byte boundary of the input.
    pub fn skip_to_byte_boundary(&mut self) {
        let nskip = self.nextbits_cnt & 7;
        self.skip_bits_fast(nskip);
    }

    /// Byte-aligns the cursor and gives back the whole bytes still in the register, so that
    /// [`remaining_data`](Self::remaining_data) starts exactly at the arithmetic-coded data.
    pub fn prepare_for_cabac(&mut self) {
        self.skip_to_byte_boundary();

        let rewind = (self.nextbits_cnt / 8) as usize;
        self.pos = self.pos.saturating_sub(rewind);
        self.nextbits = 0;
        self.nextbits_cnt = 0;
    }

    /// Reads an unsigned Exp-Golomb code, or returns [`UVLC_ERROR`] if the prefix is longer than
    /// [`MAX_UVLC_LEADING_ZEROS`].
    pub fn get_uvlc(&mut self) -> i32 {
        let mut num_zeros = 0;

        while self.get_bits(1) == 0 {
            num_zeros += 1;
            if num_zeros > MAX_UVLC_LEADING_ZEROS {
                return UVLC_ERROR;
            }
        }

        if num_zeros == 0 {
            return 0;
        }

        let offset = self.get_bits(num_zeros);
        (offset + (1 << num_zeros) - 1) as i32
    }

    /// Reads a signed Exp-Golomb code, or returns [`UVLC_ERROR`].
    pub fn get_svlc(&mut self) -> i32 {
        let v = self.get_uvlc();
        if v == 0 || v == UVLC_ERROR {
            return v;
        }

        if v & 1 == 0 {
            -(v / 2)
        } else {
            (v + 1) / 2
        }
    }

    /// `get_uvlc` for callers that propagate errors with `?`.
    pub fn read_ue(&mut self) -> Result<u32> {
        match self.get_uvlc() {
            UVLC_ERROR => Err(Error::MalformedExpGolomb),
            v => Ok(v as u32),
        }
    }

    /// `get_svlc` for callers that propagate errors with `?`.
    pub fn read_se(&mut self) -> Result<i32> {
        match self.get_svlc() {
            UVLC_ERROR => Err(Error::MalformedExpGolomb),
            v => Ok(v),
        }
    }

    /// Checks that the rest of the payload is `rbsp_stop_one_bit` followed by zero bits only.
    pub fn check_rbsp_trailing_bits(&mut self) -> bool {
        if self.get_bits(1) != 1 {
            return false;
        }

        while self.nextbits_cnt > 0 || self.pos < self.data.len() {
            if self.get_bits(1) != 0 {
                return false;
            }
        }

        true
    }

    fn consume(&mut self, n: u32) {
        if n >= REGISTER_BITS {
            self.nextbits = 0;
        } else {
            self.nextbits <<= n;
        }
        self.nextbits_cnt = self.nextbits_cnt.saturating_sub(n);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::*;

    /// Packs a sequence of bits MSB-first, zero-padding the last byte.
    fn pack_bits(bits: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; (bits.len() + 7) / 8];
        for (i, bit) in bits.iter().enumerate() {
            if *bit != 0 {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }

    fn exp_golomb_bits(leading_zeros: usize, suffix: u32) -> Vec<u8> {
        let mut bits = vec![0u8; leading_zeros];
        bits.push(1);
        for i in (0..leading_zeros).rev() {
            bits.push(((suffix >> i) & 1) as u8);
        }
        bits
    }

    #[test]
    fn read_stream_without_trailing_zero_bytes() {
        const RBSP: [u8; 6] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xa0];

        let mut reader = BitCursor::new(&RBSP);
        assert_eq!(reader.get_bits(1), 0);
        assert_eq!(reader.bits_remaining(), 47);

        assert_eq!(reader.get_bits(8), 0x02);
        assert_eq!(reader.bits_remaining(), 39);

        assert_eq!(reader.get_bits(31), 0x23456789);
        assert_eq!(reader.bits_remaining(), 8);

        assert_eq!(reader.peek_bits(1), 1);
        assert!(!reader.check_rbsp_trailing_bits());
    }

    #[test]
    fn get_bits_32_wide() {
        let data = [0xde, 0xad, 0xbe, 0xef, 0x12];
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_bits(32), 0xdeadbeef);
        assert_eq!(reader.get_bits(8), 0x12);
    }

    #[test]
    fn reads_reproduce_the_input() {
        let mut rng = StdRng::seed_from_u64(0x265);
        let data: Vec<u8> = (0..257).map(|_| rng.gen()).collect();

        let mut reader = BitCursor::new(&data);
        let mut bits = Vec::new();
        let mut total = 0;
        while total < data.len() * 8 {
            let n = rng.gen_range(1..=32).min((data.len() * 8 - total) as u32);
            let v = reader.get_bits(n);
            for i in (0..n).rev() {
                bits.push(((v >> i) & 1) as u8);
            }
            total += n as usize;
        }

        assert_eq!(pack_bits(&bits), data);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn past_end_reads_zero() {
        let data = [0xff];
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_bits(4), 0xf);
        // Four real bits followed by zero fill.
        assert_eq!(reader.get_bits(8), 0xf0);
        for _ in 0..100 {
            assert_eq!(reader.get_bits(32), 0);
        }
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn empty_input() {
        let mut reader = BitCursor::new(&[]);
        assert_eq!(reader.get_bits(17), 0);
        assert_eq!(reader.peek_bits(32), 0);
        assert_eq!(reader.get_uvlc(), UVLC_ERROR);
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn refill_fills_at_least_57_bits() {
        let data = [0u8; 16];
        let mut reader = BitCursor::new(&data);
        reader.refill();
        assert!(reader.nextbits_cnt >= 57);
        reader.get_bits_fast(3);
        reader.refill();
        assert!(reader.nextbits_cnt >= 57);
        assert!(reader.nextbits_cnt <= 64);
    }

    #[test]
    fn peek_does_not_consume() {
        let data = [0b1010_0000];
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.peek_bits(3), 0b101);
        assert_eq!(reader.peek_bits(3), 0b101);
        assert_eq!(reader.get_bits(3), 0b101);
    }

    #[test]
    fn skip_and_byte_alignment() {
        let data = [0xff, 0x5a, 0x3c];
        let mut reader = BitCursor::new(&data);
        reader.skip_bits(3);
        reader.skip_to_byte_boundary();
        assert_eq!(reader.bit_position(), 8);
        assert_eq!(reader.get_bits(8), 0x5a);
        // Already aligned: no-op.
        reader.skip_to_byte_boundary();
        assert_eq!(reader.get_bits(8), 0x3c);
    }

    #[test]
    fn prepare_for_cabac_rewinds_to_aligned_byte() {
        let data = [0xaa, 0xbb, 0xcc, 0xdd];
        let mut reader = BitCursor::new(&data);
        reader.get_bits(5);
        reader.prepare_for_cabac();
        assert_eq!(reader.remaining_data(), &data[1..]);
        assert_eq!(reader.get_bits(8), 0xbb);
    }

    #[test]
    fn uvlc_small_values() {
        // 1 | 010 | 011 | 00100 | 00101
        let bits = [1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 1];
        let data = pack_bits(&bits);
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_uvlc(), 0);
        assert_eq!(reader.get_uvlc(), 1);
        assert_eq!(reader.get_uvlc(), 2);
        assert_eq!(reader.get_uvlc(), 3);
        assert_eq!(reader.get_uvlc(), 4);
    }

    #[test]
    fn svlc_zigzag() {
        let mut bits = Vec::new();
        for k in 0..7u32 {
            let len = 32 - (k + 1).leading_zeros() as usize - 1;
            bits.extend(exp_golomb_bits(len, k + 1 - (1 << len)));
        }
        let data = pack_bits(&bits);
        let mut reader = BitCursor::new(&data);
        let decoded: Vec<i32> = (0..7).map(|_| reader.get_svlc()).collect();
        assert_eq!(decoded, [0, 1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn uvlc_twenty_leading_zeros_decodes() {
        let data = pack_bits(&exp_golomb_bits(20, 0xfffff));
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_uvlc(), (1 << 21) - 2);
    }

    #[test]
    fn uvlc_twenty_one_leading_zeros_is_error() {
        let data = pack_bits(&exp_golomb_bits(21, 0));
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_uvlc(), UVLC_ERROR);

        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.get_svlc(), UVLC_ERROR);

        let mut reader = BitCursor::new(&data);
        assert!(matches!(reader.read_ue(), Err(Error::MalformedExpGolomb)));
    }

    #[test]
    fn read_ue_and_se() {
        // ue(v) = 3, se(v) = -2
        let data = pack_bits(&[0, 0, 1, 0, 0, 0, 0, 1, 0, 1]);
        let mut reader = BitCursor::new(&data);
        assert_eq!(reader.read_ue().unwrap(), 3);
        assert_eq!(reader.read_se().unwrap(), -2);
    }

    #[test]
    fn trailing_bits() {
        assert!(BitCursor::new(&[0x80]).check_rbsp_trailing_bits());
        assert!(BitCursor::new(&[0x80, 0x00, 0x00]).check_rbsp_trailing_bits());
        assert!(!BitCursor::new(&[0x00]).check_rbsp_trailing_bits());
        assert!(!BitCursor::new(&[0x80, 0x01]).check_rbsp_trailing_bits());

        let mut reader = BitCursor::new(&[0xab, 0x80]);
        reader.get_bits(8);
        assert!(reader.check_rbsp_trailing_bits());

        let mut reader = BitCursor::new(&[0x18]);
        reader.get_bits(4);
        assert!(reader.check_rbsp_trailing_bits());
    }
}
