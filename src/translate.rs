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

//! Pixel translation from the engine's format to the client's.
//!
//! The engine renders 8-bit palette indices; the negotiated client
//! format is fixed 32-bit BGRX (red at bits 16..24, green at 8..16,
//! blue at 0..8, little-endian). Translation is therefore a single
//! palette expansion with no scaling.

use bytes::{BufMut, BytesMut};

/// Size of the owned palette: 256 entries of R,G,B.
pub const PALETTE_BYTES: usize = 256 * 3;

/// One palette entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

/// Expands palette indices to 32-bit BGRX wire pixels.
///
/// Every index becomes the four bytes `B, G, R, 0` looked up from
/// `palette`, which keeps the red component at bits 16..24 of the
/// little-endian pixel value.
pub fn expand_bgrx(frame: &[u8], palette: &[u8; PALETTE_BYTES], out: &mut BytesMut) {
    out.reserve(frame.len() * 4);
    for &index in frame {
        let entry = usize::from(index) * 3;
        out.put_u8(palette[entry + 2]);
        out.put_u8(palette[entry + 1]);
        out.put_u8(palette[entry]);
        out.put_u8(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_orders_bytes_bgrx() {
        let mut palette = [0u8; PALETTE_BYTES];
        palette[0..3].copy_from_slice(&[0x10, 0x20, 0x30]); // entry 0
        palette[3..6].copy_from_slice(&[0xaa, 0xbb, 0xcc]); // entry 1

        let mut out = BytesMut::new();
        expand_bgrx(&[1, 0], &palette, &mut out);

        assert_eq!(&out[..], &[0xcc, 0xbb, 0xaa, 0, 0x30, 0x20, 0x10, 0]);
    }

    #[test]
    fn decoded_pixel_matches_palette_entry() {
        let mut palette = [0u8; PALETTE_BYTES];
        palette[3 * 7..3 * 7 + 3].copy_from_slice(&[0x12, 0x34, 0x56]);

        let mut out = BytesMut::new();
        expand_bgrx(&[7], &palette, &mut out);

        // A little-endian u32 read must place red at bits 16..24.
        let pixel = u32::from_le_bytes([out[0], out[1], out[2], out[3]]);
        assert_eq!((pixel >> 16) & 0xff, 0x12);
        assert_eq!((pixel >> 8) & 0xff, 0x34);
        assert_eq!(pixel & 0xff, 0x56);
    }
}
