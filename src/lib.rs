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

//! # doomvnc
//!
//! A single-client VNC (RFB, RFC 6143) server that stands in for a
//! DOOM-family engine's local video and input subsystem. The engine
//! keeps rendering into its 8-bit paletted framebuffer; this crate
//! streams those frames to one remote VNC viewer and turns the viewer's
//! keyboard and mouse traffic into engine input events.
//!
//! ## Design
//!
//! The game loop drives everything. There is no runtime and no thread:
//! the engine calls [`Video::start_tic`] to pump buffered viewer input
//! (a zero-timeout readiness probe keeps a quiet socket from stalling
//! the tic) and [`Video::finish_update`] to answer an outstanding
//! framebuffer request. Exactly one client is served; when it
//! disconnects, a [`GameEvent::Quit`] asks the engine to shut down.
//!
//! Frames go out either as Raw 32-bit pixels or as Tight rectangles
//! using the palette filter, where the 8-bit frame rides unmodified
//! inside a zlib stream synthesized from stored DEFLATE blocks — wire
//! compatible with every inflater, with no compression dependency.
//!
//! ## Quick start
//!
//! ```no_run
//! use doomvnc::{GameEvent, Video};
//!
//! fn main() -> doomvnc::Result<()> {
//!     let playpal = [0u8; 768]; // engine palette lump
//!     let mut video = Video::init(&playpal)?; // blocks for a viewer
//!
//!     let mut events: Vec<GameEvent> = Vec::new();
//!     loop {
//!         video.start_tic(&mut events);
//!         for event in events.drain(..) {
//!             if event == GameEvent::Quit {
//!                 return Ok(());
//!             }
//!             // feed the engine's event queue
//!         }
//!
//!         // ... engine renders into video.buffer_mut() ...
//!
//!         video.finish_update(0, &mut events);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod events;
pub mod keys;
pub mod protocol;
pub mod server;
pub mod video;

// Internal modules
mod client;
mod input;
mod net;
mod translate;
pub mod encoding;

// Re-exports
pub use encoding::Encoding;
pub use error::{Result, VncError};
pub use events::{EventSink, GameEvent};
pub use protocol::{EncodingType, PixelFormat, PROTOCOL_VERSION};
pub use server::VncServer;
pub use translate::{Rgb, PALETTE_BYTES};
pub use video::{Video, SCREENHEIGHT, SCREENWIDTH};

pub use client::CLIENT_PACKET_SIZE;

/// TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 5902;
