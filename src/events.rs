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

//! Game events produced by the VNC backend.
//!
//! The backend never interprets the events it emits; it hands them to an
//! [`EventSink`] supplied by the engine, which queues them for the game
//! loop the same way a local input driver would.

/// Events emitted towards the engine's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A key was pressed.
    KeyDown {
        /// Translated key: an engine key code or an ASCII character.
        key: i32,
        /// Localized key: the unshifted character under the pressed key.
        localized: i32,
        /// Typed character; zero unless text input is enabled.
        ch: i32,
    },

    /// A key was released.
    KeyUp {
        /// Translated key, as in [`GameEvent::KeyDown`].
        key: i32,
    },

    /// Coalesced pointer motion and button state.
    Mouse {
        /// Engine button mask (bit 0 = left, 1 = right, 2 = middle,
        /// 3 = scroll up, 4 = scroll down).
        buttons: i32,
        /// Horizontal movement since the previous mouse event.
        dx: i32,
        /// Vertical movement since the previous mouse event.
        dy: i32,
    },

    /// The peer is gone and the game should shut down.
    Quit,
}

/// Destination for events produced by the backend.
///
/// The engine implements this on its event queue. The `Vec<GameEvent>`
/// implementation collects events, which is what the tests and simple
/// hosts use.
pub trait EventSink {
    /// Accepts one event. Must not block.
    fn post(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn post(&mut self, event: GameEvent) {
        self.push(event);
    }
}
