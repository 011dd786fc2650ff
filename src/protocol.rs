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

//! RFB (Remote Framebuffer) protocol constants and structures.
//!
//! The subset of RFC 6143 this server speaks: protocol version 3.8, the
//! None security type, a fixed 32-bit true-color pixel format, and the
//! Raw and Tight encodings. Multi-byte wire integers are big-endian.

use bytes::{Buf, BufMut, BytesMut};
use std::io;

/// The RFB protocol version string exchanged during the handshake.
///
/// Exactly 12 bytes including the newline. Versions below 3.8 use a
/// different handshake and are rejected.
pub const PROTOCOL_VERSION: &str = "RFB 003.008\n";

// Client-to-server message types.

/// Client requests a different pixel format for updates.
pub const CLIENT_MSG_SET_PIXEL_FORMAT: u8 = 0;

/// Client lists the encodings it supports, in preference order.
pub const CLIENT_MSG_SET_ENCODINGS: u8 = 2;

/// Client asks for a framebuffer update.
pub const CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST: u8 = 3;

/// Client reports a key press or release.
pub const CLIENT_MSG_KEY_EVENT: u8 = 4;

/// Client reports pointer position and button state.
pub const CLIENT_MSG_POINTER_EVENT: u8 = 5;

/// Client transfers clipboard text. Accepted and discarded.
pub const CLIENT_MSG_CLIENT_CUT_TEXT: u8 = 6;

// Server-to-client message types.

/// Server sends one or more rectangles of pixel data.
pub const SERVER_MSG_FRAMEBUFFER_UPDATE: u8 = 0;

// Encodings.

/// Raw encoding: uncompressed pixel data.
pub const ENCODING_RAW: i32 = 0;

/// Tight encoding. Only the palette filter over a basic-compression
/// stream is produced here.
pub const ENCODING_TIGHT: i32 = 7;

// Security.

/// Security type None: no authentication.
pub const SECURITY_TYPE_NONE: u8 = 1;

/// SecurityResult: handshake continues.
pub const SECURITY_RESULT_OK: u32 = 0;

/// SecurityResult: handshake failed, reason string follows.
pub const SECURITY_RESULT_FAILED: u32 = 1;

/// The wire encoding negotiated for framebuffer updates.
///
/// Starts out as [`EncodingType::Raw`]; a SetEncodings message that
/// advertises Tight switches every following update to Tight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    /// Uncompressed 32-bit pixels.
    Raw,
    /// Palette-filtered Tight rectangle.
    Tight,
}

impl EncodingType {
    /// The rectangle-header code for this encoding.
    pub fn code(self) -> i32 {
        match self {
            EncodingType::Raw => ENCODING_RAW,
            EncodingType::Tight => ENCODING_TIGHT,
        }
    }
}

/// Pixel format description, as carried in ServerInit and SetPixelFormat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormat {
    /// Number of bits per pixel on the wire.
    pub bits_per_pixel: u8,
    /// Number of significant color bits.
    pub depth: u8,
    /// Non-zero if multi-byte pixels are big-endian.
    pub big_endian_flag: u8,
    /// Non-zero for true color, zero for a color map.
    pub true_colour_flag: u8,
    /// Maximum red component value.
    pub red_max: u16,
    /// Maximum green component value.
    pub green_max: u16,
    /// Maximum blue component value.
    pub blue_max: u16,
    /// Left shift of the red component within a pixel.
    pub red_shift: u8,
    /// Left shift of the green component within a pixel.
    pub green_shift: u8,
    /// Left shift of the blue component within a pixel.
    pub blue_shift: u8,
}

impl PixelFormat {
    /// The one format this server produces: 32 bpp, depth 24,
    /// little-endian true color with red at bits 16..24, green at 8..16
    /// and blue at 0..8. In memory that is B,G,R,X byte order.
    #[must_use]
    pub fn bgrx32() -> Self {
        Self {
            bits_per_pixel: 32,
            depth: 24,
            big_endian_flag: 0,
            true_colour_flag: 1,
            red_max: 255,
            green_max: 255,
            blue_max: 255,
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
        }
    }

    /// Whether a client-requested format can be served without
    /// translation. Anything that is not 32-bpp true color is refused;
    /// the component layout is the client's own concern when decoding.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.bits_per_pixel == 32 && self.true_colour_flag != 0
    }

    /// Serializes the 16-byte wire form.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits_per_pixel);
        buf.put_u8(self.depth);
        buf.put_u8(self.big_endian_flag);
        buf.put_u8(self.true_colour_flag);
        buf.put_u16(self.red_max);
        buf.put_u16(self.green_max);
        buf.put_u16(self.blue_max);
        buf.put_u8(self.red_shift);
        buf.put_u8(self.green_shift);
        buf.put_u8(self.blue_shift);
        buf.put_bytes(0, 3); // padding
    }

    /// Deserializes the 16-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 16 bytes are available.
    pub fn from_bytes(mut buf: &[u8]) -> io::Result<Self> {
        if buf.len() < 16 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Not enough bytes for PixelFormat",
            ));
        }

        Ok(Self {
            bits_per_pixel: buf.get_u8(),
            depth: buf.get_u8(),
            big_endian_flag: buf.get_u8(),
            true_colour_flag: buf.get_u8(),
            red_max: buf.get_u16(),
            green_max: buf.get_u16(),
            blue_max: buf.get_u16(),
            red_shift: buf.get_u8(),
            green_shift: buf.get_u8(),
            blue_shift: buf.get_u8(),
        })
    }
}

/// The ServerInit message closing the handshake.
#[derive(Debug, Clone)]
pub struct ServerInit {
    /// Framebuffer width in pixels.
    pub framebuffer_width: u16,
    /// Framebuffer height in pixels.
    pub framebuffer_height: u16,
    /// The fixed server pixel format.
    pub pixel_format: PixelFormat,
    /// Desktop name shown in the viewer's title bar.
    pub name: String,
}

impl ServerInit {
    /// Serializes the message: width, height, pixel format, u32 name
    /// length, name bytes.
    #[allow(clippy::cast_possible_truncation)] // name length limited to u32 by the protocol
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u16(self.framebuffer_width);
        buf.put_u16(self.framebuffer_height);
        self.pixel_format.write_to(buf);

        let name_bytes = self.name.as_bytes();
        buf.put_u32(name_bytes.len() as u32);
        buf.put_slice(name_bytes);
    }
}

/// Rectangle header inside a FramebufferUpdate message.
#[derive(Debug)]
pub struct Rectangle {
    /// X coordinate of the top-left corner.
    pub x: u16,
    /// Y coordinate of the top-left corner.
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Encoding of the pixel data that follows.
    pub encoding: i32,
}

impl Rectangle {
    /// Writes the 12-byte rectangle header.
    pub fn write_header(&self, buf: &mut BytesMut) {
        buf.put_u16(self.x);
        buf.put_u16(self.y);
        buf.put_u16(self.width);
        buf.put_u16(self.height);
        buf.put_i32(self.encoding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_init_wire_form() {
        let init = ServerInit {
            framebuffer_width: 320,
            framebuffer_height: 200,
            pixel_format: PixelFormat::bgrx32(),
            name: "DOOM".to_string(),
        };

        let mut buf = BytesMut::new();
        init.write_to(&mut buf);

        assert_eq!(buf.len(), 28);
        assert_eq!(&buf[0..4], &[0x01, 0x40, 0x00, 0xc8]); // 320 x 200
        assert_eq!(&buf[4..8], &[32, 24, 0, 1]); // bpp, depth, LE, true color
        assert_eq!(&buf[8..14], &[0, 255, 0, 255, 0, 255]); // component maxima
        assert_eq!(&buf[14..17], &[16, 8, 0]); // R/G/B shifts
        assert_eq!(&buf[17..20], &[0, 0, 0]); // padding
        assert_eq!(&buf[20..24], &[0, 0, 0, 4]);
        assert_eq!(&buf[24..28], b"DOOM");
    }

    #[test]
    fn pixel_format_round_trip() {
        let mut buf = BytesMut::new();
        PixelFormat::bgrx32().write_to(&mut buf);
        let parsed = PixelFormat::from_bytes(&buf).unwrap();
        assert!(parsed.is_supported());
        assert_eq!(parsed.red_shift, 16);
        assert_eq!(parsed.blue_shift, 0);
    }

    #[test]
    fn rejects_unservable_formats() {
        let mut pf = PixelFormat::bgrx32();
        pf.bits_per_pixel = 16;
        assert!(!pf.is_supported());

        let mut pf = PixelFormat::bgrx32();
        pf.true_colour_flag = 0;
        assert!(!pf.is_supported());
    }
}
