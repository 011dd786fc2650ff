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

//! Engine key codes.
//!
//! The key values the engine's event queue understands. Values at or
//! below 0x7f coincide with ASCII; the rest are extended codes in the
//! 0x80.. range shared by all DOOM-family ports.

/// Escape. Also what the Delete key translates to.
pub const KEY_ESCAPE: i32 = 0x1b;
/// Enter / Return.
pub const KEY_ENTER: i32 = 0x0d;
/// Tab.
pub const KEY_TAB: i32 = 0x09;

/// Left arrow.
pub const KEY_LEFTARROW: i32 = 0xac;
/// Up arrow.
pub const KEY_UPARROW: i32 = 0xad;
/// Right arrow.
pub const KEY_RIGHTARROW: i32 = 0xae;
/// Down arrow.
pub const KEY_DOWNARROW: i32 = 0xaf;

/// Function key F1.
pub const KEY_F1: i32 = 0x80 + 0x3b;
/// Function key F2.
pub const KEY_F2: i32 = 0x80 + 0x3c;
/// Function key F3.
pub const KEY_F3: i32 = 0x80 + 0x3d;
/// Function key F4.
pub const KEY_F4: i32 = 0x80 + 0x3e;
/// Function key F5.
pub const KEY_F5: i32 = 0x80 + 0x3f;
/// Function key F6.
pub const KEY_F6: i32 = 0x80 + 0x40;
/// Function key F7.
pub const KEY_F7: i32 = 0x80 + 0x41;
/// Function key F8.
pub const KEY_F8: i32 = 0x80 + 0x42;
/// Function key F9.
pub const KEY_F9: i32 = 0x80 + 0x43;
/// Function key F10.
pub const KEY_F10: i32 = 0x80 + 0x44;
/// Function key F11.
pub const KEY_F11: i32 = 0x80 + 0x57;
/// Function key F12.
pub const KEY_F12: i32 = 0x80 + 0x58;

/// Shift. Both shift keys map here; the engine does not distinguish
/// sides.
pub const KEY_RSHIFT: i32 = 0x80 + 0x36;
/// Control. Both control keys map here.
pub const KEY_RCTRL: i32 = 0x80 + 0x1d;
/// Alt. Both alt keys map here.
pub const KEY_RALT: i32 = 0x80 + 0x38;

/// Caps Lock.
pub const KEY_CAPSLOCK: i32 = 0x80 + 0x3a;
/// Num Lock.
pub const KEY_NUMLOCK: i32 = 0x80 + 0x45;
/// Scroll Lock.
pub const KEY_SCRLCK: i32 = 0x80 + 0x46;
/// Print Screen.
pub const KEY_PRTSCR: i32 = 0x80 + 0x59;

/// Home.
pub const KEY_HOME: i32 = 0x80 + 0x47;
/// End.
pub const KEY_END: i32 = 0x80 + 0x4f;
/// Page Up.
pub const KEY_PGUP: i32 = 0x80 + 0x49;
/// Page Down.
pub const KEY_PGDN: i32 = 0x80 + 0x51;
/// Insert.
pub const KEY_INS: i32 = 0x80 + 0x52;

/// Pause.
pub const KEY_PAUSE: i32 = 0xff;
