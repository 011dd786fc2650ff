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

//! Framebuffer update encoders.
//!
//! Each encoder turns one full engine frame into a complete
//! FramebufferUpdate message: the message header, a single rectangle
//! covering the whole screen, and the encoded pixel data.

use crate::protocol::{EncodingType, Rectangle, SERVER_MSG_FRAMEBUFFER_UPDATE};
use crate::translate::PALETTE_BYTES;
use bytes::{BufMut, BytesMut};

pub mod raw;
pub mod tight;
pub mod zlib;

pub use raw::RawEncoding;
pub use tight::TightEncoding;

/// Interface shared by the frame encoders.
pub trait Encoding {
    /// Appends a full FramebufferUpdate for `frame` to `out`.
    ///
    /// `frame` holds `width * height` palette indices in row-major
    /// order; `palette` holds the 256 R,G,B triplets they refer to.
    fn encode(
        &self,
        frame: &[u8],
        palette: &[u8; PALETTE_BYTES],
        width: u16,
        height: u16,
        out: &mut BytesMut,
    );
}

/// Returns the encoder for the negotiated encoding type.
#[must_use]
pub fn get_encoder(encoding: EncodingType) -> &'static dyn Encoding {
    match encoding {
        EncodingType::Raw => &RawEncoding,
        EncodingType::Tight => &TightEncoding,
    }
}

/// Writes the 16-byte message preamble: FramebufferUpdate header plus
/// the single whole-screen rectangle header.
pub(crate) fn write_update_header(width: u16, height: u16, encoding: EncodingType, out: &mut BytesMut) {
    out.put_u8(SERVER_MSG_FRAMEBUFFER_UPDATE);
    out.put_u8(0); // padding
    out.put_u16(1); // number of rectangles
    Rectangle {
        x: 0,
        y: 0,
        width,
        height,
        encoding: encoding.code(),
    }
    .write_header(out);
}
