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

//! Tight encoding with the palette filter.
//!
//! Tight's indexed-palette mode fits an 8-bit engine exactly: the
//! rectangle carries a 256-entry color table and one byte per pixel,
//! so the frame's palette indices go on the wire unmodified. The pixel
//! bytes travel inside a zlib stream on compression stream 0; that
//! stream is the synthetic stored-block one from [`super::zlib`], reset
//! on every rectangle so no inter-frame compressor state exists.
//!
//! Wire layout after the rectangle header:
//!
//! ```text
//! [control][filter=1][255][256 x RGB][compact length][zlib stream]
//! ```
//!
//! The control byte sets the stream-0 reset bit and selects basic
//! compression on stream 0. The compact length is Tight's 7-bit
//! variable-width integer, written before the stream, which is why the
//! stream size must be computed rather than measured.

use super::{write_update_header, zlib, Encoding};
use crate::protocol::EncodingType;
use crate::translate::PALETTE_BYTES;
use bytes::{BufMut, BytesMut};
use log::debug;

/// Control byte: reset zlib stream 0, basic compression on stream 0.
const TIGHT_CONTROL: u8 = (1 << 6) | 1;

/// Filter ID: indexed palette.
const TIGHT_FILTER_PALETTE: u8 = 1;

/// Whole-screen palette-filtered Tight encoder.
pub struct TightEncoding;

impl Encoding for TightEncoding {
    fn encode(
        &self,
        frame: &[u8],
        palette: &[u8; PALETTE_BYTES],
        width: u16,
        height: u16,
        out: &mut BytesMut,
    ) {
        write_update_header(width, height, EncodingType::Tight, out);

        out.put_u8(TIGHT_CONTROL);
        out.put_u8(TIGHT_FILTER_PALETTE);
        out.put_u8(255); // palette size, encoded as count - 1

        // Tight palettes are R,G,B in that order with no endian
        // adjustment, which is the layout we already hold.
        out.put_slice(palette);

        let stream_len = zlib::stored_stream_len(frame.len());
        write_compact_length(out, stream_len);
        zlib::write_stored_stream(out, frame);

        debug!(
            "Tight indexed: {}x{}, {} byte stream",
            width, height, stream_len
        );
    }
}

/// Writes Tight's variable-width length: 7 bits per byte, little-end
/// first, high bit flagging a continuation.
fn write_compact_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        buf.put_u8(len as u8);
    } else if len < 0x4000 {
        buf.put_u8(((len & 0x7f) | 0x80) as u8);
        buf.put_u8((len >> 7) as u8);
    } else {
        buf.put_u8(((len & 0x7f) | 0x80) as u8);
        buf.put_u8((((len >> 7) & 0x7f) | 0x80) as u8);
        buf.put_u8((len >> 14) as u8);
    }
}
