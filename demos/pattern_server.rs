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

//! Minimal stand-in for an engine: serves a scrolling test pattern and
//! prints every input event the viewer produces.
//!
//! Run with `cargo run --example pattern_server`, then connect any VNC
//! viewer to port 5902.

use doomvnc::{GameEvent, Video, SCREENHEIGHT, SCREENWIDTH};
use std::thread;
use std::time::Duration;

fn main() -> doomvnc::Result<()> {
    env_logger::init();

    // A gradient palette so every index is a distinct color.
    let mut playpal = [0u8; 768];
    for i in 0..256 {
        playpal[i * 3] = i as u8;
        playpal[i * 3 + 1] = (255 - i) as u8;
        playpal[i * 3 + 2] = (i * 2 % 256) as u8;
    }

    println!("Connect a VNC viewer to port {}", doomvnc::DEFAULT_PORT);
    let mut video = Video::init(&playpal)?;

    let mut events: Vec<GameEvent> = Vec::new();
    let mut tic: i32 = 0;
    loop {
        video.start_tic(&mut events);
        for event in events.drain(..) {
            match event {
                GameEvent::Quit => {
                    println!("Viewer disconnected, exiting");
                    video.shutdown();
                    return Ok(());
                }
                other => println!("{other:?}"),
            }
        }

        let frame = video.buffer_mut();
        for y in 0..SCREENHEIGHT {
            for x in 0..SCREENWIDTH {
                frame[y * SCREENWIDTH + x] = ((x + y + tic as usize) % 256) as u8;
            }
        }

        video.finish_update(tic, &mut events);

        tic += 1;
        thread::sleep(Duration::from_millis(1000 / 35)); // one game tic
    }
}
