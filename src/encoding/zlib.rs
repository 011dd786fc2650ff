// Copyright 2025 the doomvnc authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Synthetic zlib streams built from stored DEFLATE blocks.
//!
//! Tight encoding wraps its pixel data in zlib (RFC 1950) framing, but
//! RFC 1951 permits a stream made entirely of uncompressed "stored"
//! blocks. Emitting only those reproduces the input byte-for-byte inside
//! a container every compliant inflater accepts, so no compression
//! library is needed. Each stored block is a 1-byte header (`BFINAL` in
//! bit 0, `BTYPE=00`), a little-endian u16 length, its one's complement,
//! and the literal bytes. The stream ends with a big-endian Adler-32
//! over all literals.

use bytes::{BufMut, BytesMut};

/// CMF byte: DEFLATE compression method, 32K window.
const ZLIB_CMF: u8 = (1 << 6) | (1 << 5) | (1 << 4) | (1 << 3);

/// FLG byte: no preset dictionary, fastest level, and check bits chosen
/// so that `(CMF << 8 | FLG) % 31 == 0` as RFC 1950 requires.
const ZLIB_FLG: u8 = 1;

/// Largest payload a single stored block can carry.
const STORED_BLOCK_MAX: usize = 0xffff;

/// Rolling Adler-32 state (RFC 1950 section 2.2).
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    const MOD: u32 = 65521;

    /// Starts a fresh checksum (`s1 = 1`, `s2 = 0`).
    pub fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// Folds `data` into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.s1 = (self.s1 + u32::from(byte)) % Self::MOD;
            self.s2 = (self.s2 + self.s1) % Self::MOD;
        }
    }

    /// The current checksum value, `s2` in the high half.
    pub fn checksum(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact size in bytes of the stream [`write_stored_stream`] emits for
/// `data_len` input bytes: 2 bytes of zlib header, 5 bytes of block
/// framing per started 64K-1 chunk, the literals, and the 4-byte trailer.
///
/// Tight's compact-length field must be written before the stream, so
/// the size has to be known ahead of time.
pub fn stored_stream_len(data_len: usize) -> usize {
    let blocks = data_len.div_ceil(STORED_BLOCK_MAX).max(1);
    2 + data_len + 5 * blocks + 4
}

/// Appends a complete zlib stream holding `data` uncompressed.
///
/// All blocks carry `LEN = 0xFFFF` except the last, which holds the
/// remainder and sets `BFINAL`. Empty input still produces one final
/// empty block so the stream terminates.
pub fn write_stored_stream(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u8(ZLIB_CMF);
    buf.put_u8(ZLIB_FLG);

    let mut adler = Adler32::new();

    if data.is_empty() {
        buf.put_u8(1); // BFINAL, BTYPE=00
        buf.put_u16_le(0);
        buf.put_u16_le(0xffff);
    } else {
        let mut chunks = data.chunks(STORED_BLOCK_MAX).peekable();
        while let Some(chunk) = chunks.next() {
            let len = chunk.len() as u16;
            buf.put_u8(u8::from(chunks.peek().is_none()));
            buf.put_u16_le(len);
            buf.put_u16_le(!len);
            buf.put_slice(chunk);
            adler.update(chunk);
        }
    }

    buf.put_u32(adler.checksum());
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn inflate(stream: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(stream).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn adler_matches_known_vectors() {
        // "Wikipedia" is the classic worked example.
        let mut adler = Adler32::new();
        adler.update(b"Wikipedia");
        assert_eq!(adler.checksum(), 0x11e6_0398);

        assert_eq!(Adler32::new().checksum(), 1);

        let mut adler = Adler32::new();
        adler.update(&[0, 1]);
        assert_eq!(adler.checksum(), 0x0003_0002);
    }

    #[test]
    fn single_block_layout() {
        let mut buf = BytesMut::new();
        write_stored_stream(&mut buf, &[0, 1]);

        assert_eq!(
            &buf[..],
            &[
                0x78, 0x01, // CMF, FLG
                0x01, 0x02, 0x00, 0xfd, 0xff, // BFINAL, LEN=2, ~LEN
                0x00, 0x01, // literals
                0x00, 0x03, 0x00, 0x02, // Adler-32
            ]
        );
        assert_eq!(buf.len(), stored_stream_len(2));
    }

    #[test]
    fn header_check_value_is_valid() {
        assert_eq!((u32::from(ZLIB_CMF) << 8 | u32::from(ZLIB_FLG)) % 31, 0);
    }

    #[test]
    fn block_framing_invariants() {
        // Three blocks: 0xffff + 0xffff + 2.
        let data = vec![0xabu8; 2 * STORED_BLOCK_MAX + 2];
        let mut buf = BytesMut::new();
        write_stored_stream(&mut buf, &data);
        assert_eq!(buf.len(), stored_stream_len(data.len()));

        let mut pos = 2;
        let mut total = 0usize;
        let mut finals = 0;
        while total < data.len() {
            let header = buf[pos];
            let len = u16::from_le_bytes([buf[pos + 1], buf[pos + 2]]);
            let nlen = u16::from_le_bytes([buf[pos + 3], buf[pos + 4]]);
            assert_eq!(len ^ nlen, 0xffff);
            finals += usize::from(header & 1);
            total += usize::from(len);
            pos += 5 + usize::from(len);
        }
        assert_eq!(total, data.len());
        assert_eq!(finals, 1);
        assert_eq!(buf[2] & 1, 0); // first block is not final
        assert_eq!(pos, buf.len() - 4); // trailer is last

        assert_eq!(inflate(&buf), data);
    }

    #[test]
    fn empty_input_still_terminates() {
        let mut buf = BytesMut::new();
        write_stored_stream(&mut buf, &[]);
        assert_eq!(buf.len(), stored_stream_len(0));
        assert!(inflate(&buf).is_empty());
    }

    #[test]
    fn inflater_round_trip_frame_sized() {
        // A full 320x200 frame of varied indices.
        let data: Vec<u8> = (0..320usize * 200).map(|i| (i % 251) as u8).collect();
        let mut buf = BytesMut::new();
        write_stored_stream(&mut buf, &data);
        assert_eq!(buf.len(), stored_stream_len(data.len()));
        assert_eq!(inflate(&buf), data);
    }
}
