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

//! Incremental parsing of client messages.
//!
//! Bytes arrive in arbitrary chunks; messages are parsed only once all
//! their bytes are buffered. The buffer is a fixed array with a cursor:
//! after each pump, any unparsed tail is compacted to offset zero so the
//! next read appends to a message prefix. RFB has no framing delimiters,
//! so a message type the parser does not know leaves the stream
//! position unrecoverable; the whole buffer is dropped and parsing
//! resumes at whatever boundary the next read happens to start on.

use crate::protocol::{
    PixelFormat, CLIENT_MSG_CLIENT_CUT_TEXT, CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST,
    CLIENT_MSG_KEY_EVENT, CLIENT_MSG_POINTER_EVENT, CLIENT_MSG_SET_ENCODINGS,
    CLIENT_MSG_SET_PIXEL_FORMAT, ENCODING_TIGHT,
};
use bytes::Buf;

/// Capacity of the receive buffer. Any message that cannot fit is
/// handled by the desync path.
pub const CLIENT_PACKET_SIZE: usize = 1024;

/// Fixed receive buffer with a fill cursor.
///
/// `data[..cursor]` always starts at a (possible) message boundary.
pub(crate) struct PacketBuffer {
    data: [u8; CLIENT_PACKET_SIZE],
    cursor: usize,
}

impl PacketBuffer {
    pub(crate) fn new() -> Self {
        Self {
            data: [0; CLIENT_PACKET_SIZE],
            cursor: 0,
        }
    }

    /// The buffered, not-yet-parsed bytes.
    pub(crate) fn valid(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// The writable tail for the next socket read.
    pub(crate) fn free_space(&mut self) -> &mut [u8] {
        &mut self.data[self.cursor..]
    }

    /// Marks `n` freshly received bytes as valid.
    pub(crate) fn commit(&mut self, n: usize) {
        debug_assert!(self.cursor + n <= CLIENT_PACKET_SIZE);
        self.cursor += n;
    }

    /// Moves the unparsed tail starting at `from` down to offset zero.
    pub(crate) fn compact(&mut self, from: usize) {
        debug_assert!(from <= self.cursor);
        self.data.copy_within(from..self.cursor, 0);
        self.cursor -= from;
    }

    /// Drops everything buffered.
    pub(crate) fn clear(&mut self) {
        self.cursor = 0;
    }
}

/// A fully buffered client message.
#[derive(Debug, PartialEq)]
pub(crate) enum ClientMessage {
    /// SetPixelFormat; the requested format still needs validation.
    SetPixelFormat(PixelFormat),
    /// SetEncodings; only whether Tight was advertised matters.
    SetEncodings { tight: bool },
    /// FramebufferUpdateRequest; region and incremental flag are
    /// ignored, the whole screen is always sent.
    UpdateRequest,
    /// KeyEvent.
    Key { down: bool, keysym: u32 },
    /// PointerEvent with absolute coordinates.
    Pointer { mask: u8, x: u16, y: u16 },
    /// ClientCutText; the payload is discarded.
    CutText,
}

/// Outcome of one parse attempt at the front of a byte slice.
#[derive(Debug, PartialEq)]
pub(crate) enum Parse {
    /// One message was fully buffered; `size` bytes were consumed.
    Complete { message: ClientMessage, size: usize },
    /// The message at the front is not fully buffered yet.
    Incomplete,
    /// The stream position is unrecoverable: unknown message type, or
    /// a message too large to ever fit the buffer.
    Desync,
}

/// Parses the message starting at `data[0]`, if complete.
///
/// `data` is the unparsed region of the receive buffer; multi-byte
/// fields are big-endian at the offsets RFC 6143 assigns them.
pub(crate) fn next_message(data: &[u8]) -> Parse {
    if data.is_empty() {
        return Parse::Incomplete;
    }

    match data[0] {
        CLIENT_MSG_SET_PIXEL_FORMAT => {
            if data.len() < 20 {
                return Parse::Incomplete;
            }
            // 3 padding bytes, then the 16-byte format.
            match PixelFormat::from_bytes(&data[4..20]) {
                Ok(format) => Parse::Complete {
                    message: ClientMessage::SetPixelFormat(format),
                    size: 20,
                },
                Err(_) => Parse::Incomplete,
            }
        }

        CLIENT_MSG_SET_ENCODINGS => {
            if data.len() < 4 {
                return Parse::Incomplete;
            }
            let count = usize::from(u16::from_be_bytes([data[2], data[3]]));
            let total = 4 + count * 4;
            if total > CLIENT_PACKET_SIZE {
                return Parse::Desync;
            }
            if data.len() < total {
                return Parse::Incomplete;
            }

            let mut tight = false;
            let mut encodings = &data[4..total];
            while encodings.has_remaining() {
                if encodings.get_i32() == ENCODING_TIGHT {
                    tight = true;
                    break;
                }
            }
            Parse::Complete {
                message: ClientMessage::SetEncodings { tight },
                size: total,
            }
        }

        CLIENT_MSG_FRAMEBUFFER_UPDATE_REQUEST => {
            if data.len() < 10 {
                return Parse::Incomplete;
            }
            Parse::Complete {
                message: ClientMessage::UpdateRequest,
                size: 10,
            }
        }

        CLIENT_MSG_KEY_EVENT => {
            if data.len() < 8 {
                return Parse::Incomplete;
            }
            let down = data[1] != 0;
            let keysym = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
            Parse::Complete {
                message: ClientMessage::Key { down, keysym },
                size: 8,
            }
        }

        CLIENT_MSG_POINTER_EVENT => {
            if data.len() < 6 {
                return Parse::Incomplete;
            }
            let mask = data[1];
            let x = u16::from_be_bytes([data[2], data[3]]);
            let y = u16::from_be_bytes([data[4], data[5]]);
            Parse::Complete {
                message: ClientMessage::Pointer { mask, x, y },
                size: 6,
            }
        }

        CLIENT_MSG_CLIENT_CUT_TEXT => {
            if data.len() < 8 {
                return Parse::Incomplete;
            }
            let length = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
            // A cut-text that cannot fit will never complete; drop the
            // buffer and wait for the stream to land on a boundary.
            if length > CLIENT_PACKET_SIZE - 8 {
                return Parse::Desync;
            }
            let total = 8 + length;
            if data.len() < total {
                return Parse::Incomplete;
            }
            Parse::Complete {
                message: ClientMessage::CutText,
                size: total,
            }
        }

        _ => Parse::Desync,
    }
}
