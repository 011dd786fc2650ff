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

//! The VNC server driven by the engine's game loop.
//!
//! [`VncServer::accept`] blocks until one viewer completes the RFB 3.8
//! handshake, then the listener closes; the session lives on that single
//! connection until either side goes away. Each game tic the engine
//! calls [`VncServer::pump_messages`] (translating buffered input into
//! game events without ever blocking) and [`VncServer::send_frame`]
//! (answering an outstanding update request). Losing the peer mid-game
//! would corrupt the game's timing on reconnect, so it is terminal: the
//! server closes up and posts [`GameEvent::Quit`].

use crate::client::{next_message, ClientMessage, PacketBuffer, Parse};
use crate::encoding::get_encoder;
use crate::error::{Result, VncError};
use crate::events::{EventSink, GameEvent};
use crate::input::{self, PointerBatch};
use crate::net;
use crate::protocol::{
    EncodingType, PixelFormat, ServerInit, PROTOCOL_VERSION, SECURITY_RESULT_FAILED,
    SECURITY_RESULT_OK, SECURITY_TYPE_NONE,
};
use crate::translate::{Rgb, PALETTE_BYTES};
use bytes::{BufMut, BytesMut};
use log::{error, info, warn};
use std::io::Read;
use std::net::{TcpListener, TcpStream};

/// Desktop name sent in ServerInit.
const DESKTOP_NAME: &str = "DOOM";

/// What one receive attempt produced.
enum ReadOutcome {
    /// Bytes were appended to the packet buffer.
    Data,
    /// Nothing buffered on the socket (or no peer); stop pumping.
    Quiet,
    /// The readiness probe itself failed.
    PollError,
    /// EOF or read error: the peer is gone.
    Dead,
}

/// Whether a message's side effect allows the pump to continue.
#[derive(PartialEq)]
enum Flow {
    Continue,
    Fatal,
}

/// Single-client RFB server state.
pub struct VncServer {
    /// The serving connection; `None` once the session has ended.
    peer: Option<TcpStream>,
    /// Set by FramebufferUpdateRequest, cleared by a successful send.
    /// Requests arriving between sends coalesce into one frame.
    send_frame: bool,
    encoding: EncodingType,
    /// When set, key-down events also carry the typed character.
    text_input: bool,
    packet: PacketBuffer,
    /// Reused output buffer, sized for a full Raw frame.
    scratch: BytesMut,
    /// Owned copy of the engine palette; `None` until first prepared.
    palette: Option<Box<[u8; PALETTE_BYTES]>>,
    /// Last absolute pointer position, for delta synthesis.
    mouse_x: i32,
    mouse_y: i32,
    width: u16,
    height: u16,
}

impl VncServer {
    /// Binds the listening socket and blocks until a viewer completes
    /// the handshake, then closes the listener and returns the serving
    /// state. Clients that fail any handshake step are dropped and the
    /// next connection is awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if the listening socket cannot be bound.
    pub fn accept(width: u16, height: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", crate::DEFAULT_PORT))?;

        loop {
            info!("Waiting for a viewer on port {}", crate::DEFAULT_PORT);
            let (stream, addr) = match listener.accept() {
                Ok(pair) => pair,
                Err(err) => {
                    warn!("Failed to accept a viewer: {err}");
                    continue;
                }
            };

            match handshake(&stream, width, height) {
                Ok(()) => {
                    info!("Viewer {addr} connected, starting with Raw encoding");
                    return Ok(Self::serving(stream, width, height));
                }
                Err(err) => info!("Dropped viewer {addr}: {err}"),
            }
        }
    }

    fn serving(stream: TcpStream, width: u16, height: u16) -> Self {
        let frame_bytes = usize::from(width) * usize::from(height) * 4;
        Self {
            peer: Some(stream),
            send_frame: false,
            encoding: EncodingType::Raw,
            text_input: false,
            packet: PacketBuffer::new(),
            scratch: BytesMut::with_capacity(frame_bytes + 1024),
            palette: None,
            mouse_x: 0,
            mouse_y: 0,
            width,
            height,
        }
    }

    /// Whether the peer connection is still open.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Drains and processes everything buffered on the socket without
    /// blocking, posting the resulting game events to `sink`.
    ///
    /// Key events post in wire order; all pointer packets fold into at
    /// most one mouse event posted after them. A dead peer posts
    /// [`GameEvent::Quit`].
    pub fn pump_messages(&mut self, sink: &mut impl EventSink) {
        let mut pointer = PointerBatch::default();

        loop {
            match self.read_available() {
                ReadOutcome::Quiet => break,
                ReadOutcome::PollError => return,
                ReadOutcome::Dead => {
                    error!("Viewer connection lost, shutting down");
                    self.shutdown();
                    sink.post(GameEvent::Quit);
                    return;
                }
                ReadOutcome::Data => {}
            }

            // Consume every complete message now in the buffer.
            let mut scan = 0;
            loop {
                match next_message(&self.packet.valid()[scan..]) {
                    Parse::Complete { message, size } => {
                        scan += size;
                        if self.apply_message(message, &mut pointer, sink) == Flow::Fatal {
                            return;
                        }
                    }
                    Parse::Incomplete => {
                        self.packet.compact(scan);
                        break;
                    }
                    Parse::Desync => {
                        warn!(
                            "Flushing {} buffered bytes after an unparseable message",
                            self.packet.valid().len() - scan
                        );
                        self.packet.clear();
                        break;
                    }
                }
            }
        }

        pointer.flush(&mut self.mouse_x, &mut self.mouse_y, sink);
    }

    /// Polls and, when the socket is readable, appends to the packet
    /// buffer.
    fn read_available(&mut self) -> ReadOutcome {
        let Self { peer, packet, .. } = self;
        let Some(stream) = peer.as_ref() else {
            return ReadOutcome::Quiet;
        };

        match net::poll_readable(stream) {
            Ok(true) => {}
            Ok(false) => return ReadOutcome::Quiet,
            Err(err) => {
                warn!("Could not poll the viewer connection: {err}");
                return ReadOutcome::PollError;
            }
        }

        let mut reader = stream;
        match reader.read(packet.free_space()) {
            Ok(0) => ReadOutcome::Dead,
            Ok(n) => {
                packet.commit(n);
                ReadOutcome::Data
            }
            Err(err) => {
                warn!("Socket read failure: {err}");
                ReadOutcome::Dead
            }
        }
    }

    /// Applies one parsed message's side effect.
    fn apply_message(
        &mut self,
        message: ClientMessage,
        pointer: &mut PointerBatch,
        sink: &mut impl EventSink,
    ) -> Flow {
        match message {
            ClientMessage::SetPixelFormat(format) => {
                if !format.is_supported() {
                    error!(
                        "Viewer requested an unsupported pixel format \
                         ({} bpp, true color {})",
                        format.bits_per_pixel, format.true_colour_flag
                    );
                    self.shutdown();
                    sink.post(GameEvent::Quit);
                    return Flow::Fatal;
                }
                Flow::Continue
            }

            ClientMessage::SetEncodings { tight } => {
                self.encoding = if tight {
                    EncodingType::Tight
                } else {
                    EncodingType::Raw
                };
                info!("Viewer encodings set, using {:?}", self.encoding);
                Flow::Continue
            }

            ClientMessage::UpdateRequest => {
                self.send_frame = true;
                Flow::Continue
            }

            ClientMessage::Key { down, keysym } => {
                if let Some(event) = input::translate_key(down, keysym, self.text_input) {
                    sink.post(event);
                }
                Flow::Continue
            }

            ClientMessage::Pointer { mask, x, y } => {
                pointer.stage(mask, x, y);
                Flow::Continue
            }

            // Clipboard text is accepted and thrown away.
            ClientMessage::CutText => Flow::Continue,
        }
    }

    /// Stores a copy of the engine palette for the following frames.
    /// The caller's buffer is typically cache-scoped, so it is never
    /// aliased.
    pub fn prepare_palette(&mut self, colors: &[Rgb; 256]) {
        let palette = self
            .palette
            .get_or_insert_with(|| Box::new([0u8; PALETTE_BYTES]));

        for (entry, color) in palette.chunks_exact_mut(3).zip(colors) {
            entry[0] = color.r;
            entry[1] = color.g;
            entry[2] = color.b;
        }
    }

    /// Sends `frame` (one palette index per pixel, row-major) if the
    /// viewer has an update request outstanding and a palette has been
    /// prepared; otherwise does nothing. A send failure ends the
    /// session and posts [`GameEvent::Quit`].
    pub fn send_frame(&mut self, frame: &[u8], sink: &mut impl EventSink) {
        if !self.send_frame {
            return;
        }
        let Some(palette) = self.palette.as_deref() else {
            info!("Deferring frame until a palette is available");
            return;
        };
        let Some(stream) = self.peer.as_ref() else {
            return;
        };
        debug_assert_eq!(
            frame.len(),
            usize::from(self.width) * usize::from(self.height)
        );

        self.scratch.clear();
        get_encoder(self.encoding).encode(frame, palette, self.width, self.height, &mut self.scratch);

        if let Err(err) = net::send_all(stream, &self.scratch) {
            error!("Framebuffer send failure: {err}");
            self.shutdown();
            sink.post(GameEvent::Quit);
            return;
        }

        self.send_frame = false;
    }

    /// Controls whether key-down events carry the typed character.
    pub fn set_text_input(&mut self, enabled: bool) {
        self.text_input = enabled;
    }

    /// Ends the session: closes the peer and releases the palette and
    /// scratch buffers. Also invoked internally on any transport
    /// failure.
    pub fn shutdown(&mut self) {
        self.palette = None;
        self.scratch = BytesMut::new();
        self.peer = None;
    }

    #[cfg(test)]
    pub(crate) fn for_tests(stream: TcpStream) -> Self {
        stream.set_nodelay(true).unwrap();
        Self::serving(stream, 4, 2)
    }
}

/// Runs the server side of the RFB 3.8 handshake on a fresh connection.
fn handshake(stream: &TcpStream, width: u16, height: u16) -> Result<()> {
    stream.set_nodelay(true)?;

    net::send_all(stream, PROTOCOL_VERSION.as_bytes())?;

    let mut version = [0u8; 12];
    net::recv_exact(stream, &mut version)?;
    if &version[..] != PROTOCOL_VERSION.as_bytes() {
        reject_version(stream, "Unsupported version");
        return Err(VncError::Protocol(format!(
            "unsupported version {:?}",
            String::from_utf8_lossy(&version)
        )));
    }

    // Offer exactly one security type: None.
    net::send_all(stream, &[1, SECURITY_TYPE_NONE])?;

    let mut choice = [0u8; 1];
    net::recv_exact(stream, &mut choice)?;
    if choice[0] != SECURITY_TYPE_NONE {
        reject_security(stream, "Illegal auth type");
        return Err(VncError::Protocol(format!(
            "illegal security type {}",
            choice[0]
        )));
    }

    let mut result = BytesMut::with_capacity(4);
    result.put_u32(SECURITY_RESULT_OK);
    net::send_all(stream, &result)?;

    // ClientInit. The shared flag is irrelevant with a single client.
    let mut shared = [0u8; 1];
    net::recv_exact(stream, &mut shared)?;

    let mut init = BytesMut::new();
    ServerInit {
        framebuffer_width: width,
        framebuffer_height: height,
        pixel_format: PixelFormat::bgrx32(),
        name: DESKTOP_NAME.to_string(),
    }
    .write_to(&mut init);
    net::send_all(stream, &init)?;

    Ok(())
}

/// Best-effort rejection after a bad version: zero security types on
/// offer, then the reason.
fn reject_version(stream: &TcpStream, reason: &str) {
    let mut buf = BytesMut::new();
    buf.put_u8(0);
    buf.put_u32(reason.len() as u32);
    buf.put_slice(reason.as_bytes());
    let _ = net::send_all(stream, &buf);
}

/// Best-effort rejection after a bad security choice: failed
/// SecurityResult, then the reason.
fn reject_security(stream: &TcpStream, reason: &str) {
    let mut buf = BytesMut::new();
    buf.put_u32(SECURITY_RESULT_FAILED);
    buf.put_u32(reason.len() as u32);
    buf.put_slice(reason.as_bytes());
    let _ = net::send_all(stream, &buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::time::Duration;

    /// A connected (client, server) stream pair on the loopback.
    fn stream_pair() -> (TcpStream, VncServer) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        client.set_nodelay(true).unwrap();
        let (stream, _) = listener.accept().unwrap();
        (client, VncServer::for_tests(stream))
    }

    fn wait_readable(server: &VncServer) {
        let stream = server.peer.as_ref().unwrap();
        for _ in 0..200 {
            if net::poll_readable(stream).unwrap() {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("no data arrived");
    }

    fn key_event(down: u8, keysym: u32) -> Vec<u8> {
        let mut msg = vec![4, down, 0, 0];
        msg.extend_from_slice(&keysym.to_be_bytes());
        msg
    }

    fn pointer_event(mask: u8, x: u16, y: u16) -> Vec<u8> {
        let mut msg = vec![5, mask];
        msg.extend_from_slice(&x.to_be_bytes());
        msg.extend_from_slice(&y.to_be_bytes());
        msg
    }

    #[test]
    fn quiet_socket_pumps_no_events() {
        let (_client, mut server) = stream_pair();
        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn message_split_across_reads_still_parses() {
        let (mut client, mut server) = stream_pair();
        let msg = key_event(1, 0x41);

        client.write_all(&msg[..3]).unwrap();
        wait_readable(&server);
        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert!(events.is_empty());

        client.write_all(&msg[3..]).unwrap();
        wait_readable(&server);
        server.pump_messages(&mut events);
        assert_eq!(
            events,
            vec![GameEvent::KeyDown {
                key: 0x61,
                localized: 0x61,
                ch: 0
            }]
        );
    }

    #[test]
    fn pointer_events_coalesce_into_one_mouse_event() {
        let (mut client, mut server) = stream_pair();
        server.mouse_x = 10;
        server.mouse_y = 20;

        let mut batch = pointer_event(0x01, 10, 20);
        batch.extend_from_slice(&pointer_event(0x01, 12, 22));
        batch.extend_from_slice(&pointer_event(0x01, 15, 20));
        client.write_all(&batch).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert_eq!(
            events,
            vec![GameEvent::Mouse {
                buttons: 1,
                dx: 5,
                dy: 0
            }]
        );
        assert_eq!((server.mouse_x, server.mouse_y), (15, 20));
    }

    #[test]
    fn keys_post_before_the_coalesced_mouse_event() {
        let (mut client, mut server) = stream_pair();

        let mut batch = pointer_event(0x00, 3, 4);
        batch.extend_from_slice(&key_event(1, 0x20));
        client.write_all(&batch).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert!(matches!(events[0], GameEvent::KeyDown { .. }));
        assert!(matches!(events[1], GameEvent::Mouse { .. }));
    }

    #[test]
    fn unknown_message_flushes_buffer_without_events() {
        let (mut client, mut server) = stream_pair();
        client.write_all(&[0xfe, 1, 2, 3, 4]).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert!(events.is_empty());
        assert!(server.packet.valid().is_empty());
        assert!(server.connected());
    }

    #[test]
    fn update_requests_coalesce_and_arm_the_next_send() {
        let (mut client, mut server) = stream_pair();
        let request = [3u8, 1, 0, 0, 0, 0, 0, 4, 0, 2];
        client.write_all(&request).unwrap();
        client.write_all(&request).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert!(server.send_frame);

        // Palette prepared: the send drains the request and writes one
        // update message.
        server.prepare_palette(&[Rgb::default(); 256]);
        let frame = [0u8; 8];
        server.send_frame(&frame, &mut events);
        assert!(!server.send_frame);
        assert!(events.is_empty());
    }

    #[test]
    fn frame_without_palette_is_deferred() {
        let (mut client, mut server) = stream_pair();
        client.write_all(&[3u8, 1, 0, 0, 0, 0, 0, 4, 0, 2]).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        server.send_frame(&[0u8; 8], &mut events);

        // Still armed; nothing was sent.
        assert!(server.send_frame);
        assert!(events.is_empty());
    }

    #[test]
    fn peer_hangup_posts_quit_and_closes() {
        let (client, mut server) = stream_pair();
        drop(client);
        std::thread::sleep(Duration::from_millis(10));

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert_eq!(events, vec![GameEvent::Quit]);
        assert!(!server.connected());

        // Further pumps and sends are inert.
        server.pump_messages(&mut events);
        server.send_frame(&[0u8; 8], &mut events);
        assert_eq!(events, vec![GameEvent::Quit]);
    }

    #[test]
    fn unsupported_pixel_format_is_fatal() {
        let (mut client, mut server) = stream_pair();
        let mut msg = vec![0u8, 0, 0, 0];
        let mut pf = BytesMut::new();
        let mut format = PixelFormat::bgrx32();
        format.bits_per_pixel = 8;
        format.write_to(&mut pf);
        msg.extend_from_slice(&pf);
        client.write_all(&msg).unwrap();
        wait_readable(&server);

        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert_eq!(events, vec![GameEvent::Quit]);
        assert!(!server.connected());
    }

    #[test]
    fn set_encodings_switches_to_tight_and_back() {
        let (mut client, mut server) = stream_pair();

        let mut msg = vec![2u8, 0, 0, 1];
        msg.extend_from_slice(&7i32.to_be_bytes());
        client.write_all(&msg).unwrap();
        wait_readable(&server);
        let mut events: Vec<GameEvent> = Vec::new();
        server.pump_messages(&mut events);
        assert_eq!(server.encoding, EncodingType::Tight);

        let mut msg = vec![2u8, 0, 0, 1];
        msg.extend_from_slice(&0i32.to_be_bytes());
        client.write_all(&msg).unwrap();
        wait_readable(&server);
        server.pump_messages(&mut events);
        assert_eq!(server.encoding, EncodingType::Raw);
    }
}
