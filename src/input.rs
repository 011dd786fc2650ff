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

//! Translation of RFB input events into engine events.
//!
//! RFB carries X11 keysyms, which describe the character a key press
//! produced, while the engine wants the key that was hit. For a US
//! layout the two differ only by Shift, so shifted characters are
//! mapped back through an "unshift" table. Keysyms above ASCII that are
//! not in the named-key table do not exist on a US layout and are
//! dropped.
//!
//! Pointer events arrive with absolute coordinates; the engine wants
//! relative motion. All pointer packets seen during one pump are staged
//! and folded into a single mouse event carrying the net delta.

use crate::events::{EventSink, GameEvent};
use crate::keys;

/// Maps each shifted US-layout character to its unshifted key.
/// Zero means the character is already the key cap.
const UNSHIFT: [u8; 128] = [
    // Control characters have no meaningful casing.
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0,     // space
    b'1',  // !
    b'\'', // "
    b'3',  // #
    b'4',  // $
    b'5',  // %
    b'7',  // &
    0,     // '
    b'9',  // (
    b'0',  // )
    b'8',  // *
    b'=',  // +
    0,     // ,
    0,     // -
    0,     // .
    0,     // /
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // digits
    b';',  // :
    0,     // ;
    b',',  // <
    0,     // =
    b'.',  // >
    b'/',  // ?
    b'2',  // @
    b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', //
    b'n', b'o', b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', //
    0,     // [
    0,     // backslash
    0,     // ]
    b'6',  // ^
    b'-',  // _
    0,     // `
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // lower case maps to itself
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    b'[',  // {
    b'\\', // |
    b']',  // }
    b'`',  // ~
    0,     // DEL
];

/// Maps an RFB keysym to an engine key code.
///
/// ASCII keysyms pass through unchanged (unshifting happens later);
/// named keysyms translate to their engine codes; anything else has no
/// US-layout key behind it and returns `None`.
fn translate_keysym(keysym: u32) -> Option<i32> {
    if keysym <= 0x7f {
        return Some(keysym as i32);
    }

    let key = match keysym {
        0xff1b => keys::KEY_ESCAPE,
        0xff08 => 0x08, // backspace has a real ASCII mapping
        0xff09 => keys::KEY_TAB,
        0xff0d => keys::KEY_ENTER,
        0xffff => keys::KEY_ESCAPE, // delete shares escape's code
        0xffbe => keys::KEY_F1,
        0xffbf => keys::KEY_F2,
        0xffc0 => keys::KEY_F3,
        0xffc1 => keys::KEY_F4,
        0xffc2 => keys::KEY_F5,
        0xffc3 => keys::KEY_F6,
        0xffc4 => keys::KEY_F7,
        0xffc5 => keys::KEY_F8,
        0xffc6 => keys::KEY_F9,
        0xffc7 => keys::KEY_F10,
        0xffc8 => keys::KEY_F11,
        0xffc9 => keys::KEY_F12,
        0xff51 => keys::KEY_LEFTARROW,
        0xff52 => keys::KEY_UPARROW,
        0xff53 => keys::KEY_RIGHTARROW,
        0xff54 => keys::KEY_DOWNARROW,
        0xff13 => keys::KEY_PAUSE,
        0xffe1 | 0xffe2 => keys::KEY_RSHIFT, // either shift
        0xffe3 | 0xffe4 => keys::KEY_RCTRL,  // either control
        0xffe9 | 0xffea => keys::KEY_RALT,   // either alt
        0xffe5 => keys::KEY_CAPSLOCK,
        0xff14 => keys::KEY_SCRLCK,
        0xff7f => keys::KEY_NUMLOCK,
        0xff61 => keys::KEY_PRTSCR,
        0xff50 => keys::KEY_HOME,
        0xff57 => keys::KEY_END,
        0xff55 => keys::KEY_PGUP,
        0xff56 => keys::KEY_PGDN,
        0xff63 => keys::KEY_INS,
        _ => return None,
    };
    Some(key)
}

/// Removes Shift from an ASCII key; extended codes pass through.
fn unshift(key: i32) -> i32 {
    if (0..=0x7f).contains(&key) && UNSHIFT[key as usize] != 0 {
        i32::from(UNSHIFT[key as usize])
    } else {
        key
    }
}

/// Builds the engine event for one RFB key event, or `None` when the
/// keysym has no engine key.
///
/// With `text_input` set, key-down events additionally carry the typed
/// character: the translated keysym with its shift state intact.
pub(crate) fn translate_key(down: bool, keysym: u32, text_input: bool) -> Option<GameEvent> {
    let translated = translate_keysym(keysym)?;
    let localized = unshift(translated);

    Some(if down {
        GameEvent::KeyDown {
            key: localized,
            localized,
            ch: if text_input { translated } else { 0 },
        }
    } else {
        GameEvent::KeyUp { key: localized }
    })
}

/// Repacks the RFB pointer button mask (bit 0 = left, 1 = middle,
/// 2 = right, 3 = scroll up, 4 = scroll down) into the engine's order
/// (left, right, middle, scroll up, scroll down).
fn pack_buttons(mask: u8) -> i32 {
    let left = i32::from(mask & 0x01 != 0);
    let middle = i32::from(mask & 0x02 != 0);
    let right = i32::from(mask & 0x04 != 0);
    let scroll_up = i32::from(mask & 0x08 != 0);
    let scroll_down = i32::from(mask & 0x10 != 0);

    left | right << 1 | middle << 2 | scroll_up << 3 | scroll_down << 4
}

/// Staging area that folds every pointer packet of one pump into a
/// single mouse event.
#[derive(Default)]
pub(crate) struct PointerBatch {
    pending: Option<(i32, i32, i32)>, // x, y, engine buttons
}

impl PointerBatch {
    /// Records the latest absolute position and button state. Earlier
    /// positions from the same pump are superseded.
    pub(crate) fn stage(&mut self, mask: u8, x: u16, y: u16) {
        self.pending = Some((i32::from(x), i32::from(y), pack_buttons(mask)));
    }

    /// Posts one mouse event with the net movement since the previous
    /// pump, if any pointer packet arrived, and advances the tracked
    /// position.
    pub(crate) fn flush(
        self,
        mouse_x: &mut i32,
        mouse_y: &mut i32,
        sink: &mut impl EventSink,
    ) {
        if let Some((x, y, buttons)) = self.pending {
            sink.post(GameEvent::Mouse {
                buttons,
                dx: x - *mouse_x,
                dy: y - *mouse_y,
            });
            *mouse_x = x;
            *mouse_y = y;
        }
    }
}
