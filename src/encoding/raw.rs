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

//! Raw encoding: uncompressed 32-bit pixels.
//!
//! The fallback every viewer supports. Four bytes per pixel makes this
//! the largest message the server sends, which is why the scratch
//! buffer is sized for it.

use super::{write_update_header, Encoding};
use crate::protocol::EncodingType;
use crate::translate::{expand_bgrx, PALETTE_BYTES};
use bytes::BytesMut;

/// Whole-screen Raw rectangle encoder.
pub struct RawEncoding;

impl Encoding for RawEncoding {
    fn encode(
        &self,
        frame: &[u8],
        palette: &[u8; PALETTE_BYTES],
        width: u16,
        height: u16,
        out: &mut BytesMut,
    ) {
        write_update_header(width, height, EncodingType::Raw, out);
        expand_bgrx(frame, palette, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_reconstructs_palette_colors() {
        let mut palette = [0u8; PALETTE_BYTES];
        palette[0..3].copy_from_slice(&[0xaa, 0xbb, 0xcc]);
        palette[3..6].copy_from_slice(&[0x11, 0x22, 0x33]);

        let mut out = BytesMut::new();
        RawEncoding.encode(&[0, 1], &palette, 2, 1, &mut out);

        assert_eq!(out.len(), 16 + 2 * 4);
        assert_eq!(&out[12..16], &[0, 0, 0, 0]); // Raw encoding code
        // Pixel 0: B,G,R,X from entry 0.
        assert_eq!(&out[16..20], &[0xcc, 0xbb, 0xaa, 0]);
        // Pixel 1: B,G,R,X from entry 1.
        assert_eq!(&out[20..24], &[0x33, 0x22, 0x11, 0]);
    }
}
