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

//! Engine-facing video layer.
//!
//! The thin layer a DOOM-family engine talks to instead of a local
//! window: it owns the 8-bit screen buffer the renderer draws into,
//! keeps the gamma-corrected palette, and forwards everything else to
//! the [`VncServer`]. WAD loading, configuration binding, and the
//! process timer stay with the engine; the tic counter for the FPS dots
//! is passed in for that reason.

use crate::error::Result;
use crate::events::EventSink;
use crate::server::VncServer;
use crate::translate::Rgb;
use log::info;

/// Width of the engine framebuffer in pixels.
pub const SCREENWIDTH: usize = 320;

/// Height of the engine framebuffer in pixels.
pub const SCREENHEIGHT: usize = 200;

/// Number of gamma correction levels, 0 (off) through 4 (brightest).
pub const GAMMA_LEVELS: usize = 5;

/// Engine video state: screen buffer, palette, and the VNC session.
pub struct Video {
    server: VncServer,
    /// One palette index per pixel, row-major.
    buffer: Vec<u8>,
    /// Gamma-corrected palette as last applied.
    palette: [Rgb; 256],
    gamma: usize,
    display_fps_dots: bool,
    last_tic: i32,
}

impl Video {
    /// Allocates and clears the screen buffer, waits for a viewer, and
    /// applies the initial palette (the engine's PLAYPAL lump).
    ///
    /// # Errors
    ///
    /// Returns an error if the listening socket cannot be bound.
    pub fn init(playpal: &[u8; 768]) -> Result<Self> {
        let server = VncServer::accept(SCREENWIDTH as u16, SCREENHEIGHT as u16)?;
        let mut video = Self::with_server(server);
        video.set_palette(playpal);
        info!("Video subsystem up at {}x{}", SCREENWIDTH, SCREENHEIGHT);
        Ok(video)
    }

    fn with_server(server: VncServer) -> Self {
        Self {
            server,
            buffer: vec![0; SCREENWIDTH * SCREENHEIGHT],
            palette: [Rgb::default(); 256],
            gamma: 0,
            display_fps_dots: false,
            last_tic: 0,
        }
    }

    /// The screen buffer the renderer draws into.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Copies the current screen contents into `dst`.
    pub fn read_screen(&self, dst: &mut [u8]) {
        dst[..self.buffer.len()].copy_from_slice(&self.buffer);
    }

    /// Applies the raw engine palette: gamma correction per channel,
    /// the engine's `& !3` quantization, then hands the result to the
    /// server.
    pub fn set_palette(&mut self, doom_palette: &[u8; 768]) {
        for (color, triplet) in self.palette.iter_mut().zip(doom_palette.chunks_exact(3)) {
            color.r = gamma_correct(self.gamma, triplet[0]) & !3;
            color.g = gamma_correct(self.gamma, triplet[1]) & !3;
            color.b = gamma_correct(self.gamma, triplet[2]) & !3;
        }

        self.server.prepare_palette(&self.palette);
    }

    /// Nearest palette entry to the given color by squared Euclidean
    /// distance. An exact match wins immediately.
    #[must_use]
    pub fn palette_index(&self, r: u8, g: u8, b: u8) -> usize {
        let square = |a: u8, b: u8| {
            let d = i32::from(a) - i32::from(b);
            d * d
        };

        let mut best = 0;
        let mut best_diff = i32::MAX;
        for (i, color) in self.palette.iter().enumerate() {
            let diff = square(r, color.r) + square(g, color.g) + square(b, color.b);
            if diff < best_diff {
                best = i;
                best_diff = diff;
            }
            if diff == 0 {
                break;
            }
        }
        best
    }

    /// Presents the frame: optional FPS dots on the bottom row, then
    /// the frame send (which is a no-op unless the viewer asked).
    /// `now_tic` is the engine's current tic count.
    pub fn finish_update(&mut self, now_tic: i32, sink: &mut impl EventSink) {
        if self.display_fps_dots {
            let tics = (now_tic - self.last_tic).min(20);
            self.last_tic = now_tic;

            let row = (SCREENHEIGHT - 1) * SCREENWIDTH;
            let mut i = 0;
            while i < tics * 4 {
                self.buffer[row + i as usize] = 0xff;
                i += 4;
            }
            while i < 20 * 4 {
                self.buffer[row + i as usize] = 0x00;
                i += 4;
            }
        }

        self.server.send_frame(&self.buffer, sink);
    }

    /// Pumps viewer input at the start of a tic.
    pub fn start_tic(&mut self, sink: &mut impl EventSink) {
        self.server.pump_messages(sink);
    }

    /// Enables the FPS dots overlay.
    pub fn set_display_fps_dots(&mut self, on: bool) {
        self.display_fps_dots = on;
    }

    /// Sets the gamma level; takes effect at the next palette change.
    pub fn set_gamma(&mut self, level: usize) {
        self.gamma = level.min(GAMMA_LEVELS - 1);
    }

    /// Forwards the menu's text-input state to the key translator.
    pub fn set_text_input(&mut self, on: bool) {
        self.server.set_text_input(on);
    }

    /// Whether the viewer is still connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.server.connected()
    }

    /// Releases the screen buffer and ends the VNC session.
    pub fn shutdown(&mut self) {
        self.buffer = Vec::new();
        self.server.shutdown();
    }
}

/// Gamma-corrects one channel value. Level 0 is the identity; higher
/// levels brighten with a power curve.
fn gamma_correct(level: usize, value: u8) -> u8 {
    if level == 0 {
        return value;
    }

    let exponent = 1.0 - 0.125 * level as f32;
    let normalized = f32::from(value) / 255.0;
    (255.0 * normalized.powf(exponent)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;
    use std::net::{TcpListener, TcpStream};

    fn test_video() -> (TcpStream, Video) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let mut video = Video::with_server(VncServer::for_tests(stream));
        video.buffer = vec![0; SCREENWIDTH * SCREENHEIGHT];
        (client, video)
    }

    fn palette_with(entries: &[(usize, [u8; 3])]) -> [u8; 768] {
        let mut pal = [0u8; 768];
        for (index, rgb) in entries {
            pal[index * 3..index * 3 + 3].copy_from_slice(rgb);
        }
        pal
    }

    #[test]
    fn gamma_level_zero_is_identity() {
        for value in [0u8, 1, 63, 128, 200, 255] {
            assert_eq!(gamma_correct(0, value), value);
        }
    }

    #[test]
    fn higher_gamma_levels_brighten() {
        assert!(gamma_correct(1, 100) > 100);
        assert!(gamma_correct(4, 100) > gamma_correct(1, 100));
        // Endpoints are fixed at every level.
        for level in 0..GAMMA_LEVELS {
            assert_eq!(gamma_correct(level, 0), 0);
            assert_eq!(gamma_correct(level, 255), 255);
        }
    }

    #[test]
    fn set_palette_quantizes_low_bits() {
        let (_client, mut video) = test_video();
        video.set_palette(&palette_with(&[(0, [0xff, 0x01, 0x82])]));
        assert_eq!(
            video.palette[0],
            Rgb {
                r: 0xfc,
                g: 0x00,
                b: 0x80
            }
        );
    }

    #[test]
    fn palette_index_finds_nearest_and_exact() {
        let (_client, mut video) = test_video();
        video.set_palette(&palette_with(&[
            (0, [0, 0, 0]),
            (1, [0xfc, 0x00, 0x00]),
            (2, [0x00, 0xfc, 0x00]),
            (3, [0xfc, 0xfc, 0xfc]),
        ]));

        assert_eq!(video.palette_index(0xfc, 0, 0), 1); // exact
        assert_eq!(video.palette_index(0xff, 8, 8), 1); // nearest
        assert_eq!(video.palette_index(4, 4, 4), 0);
        assert_eq!(video.palette_index(0xe0, 0xe0, 0xe0), 3);
    }

    #[test]
    fn fps_dots_draw_on_the_bottom_row() {
        let (_client, mut video) = test_video();
        video.set_display_fps_dots(true);
        video.last_tic = 0;

        let mut events: Vec<GameEvent> = Vec::new();
        video.finish_update(5, &mut events);

        let row = (SCREENHEIGHT - 1) * SCREENWIDTH;
        // Five tics elapsed: dots at every fourth column, then cleared.
        for i in (0..5 * 4).step_by(4) {
            assert_eq!(video.buffer[row + i], 0xff);
        }
        for i in (5 * 4..20 * 4).step_by(4) {
            assert_eq!(video.buffer[row + i], 0x00);
        }
        assert_eq!(video.last_tic, 5);
    }
}
