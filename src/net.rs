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

//! Blocking socket primitives.
//!
//! These three functions are the only places the crate touches the
//! network. Everything is blocking except [`poll_readable`], which the
//! message pump uses so a quiet socket never stalls the game loop.

use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Writes the whole buffer, looping over short writes.
pub fn send_all(mut stream: &TcpStream, buf: &[u8]) -> io::Result<()> {
    stream.write_all(buf)
}

/// Reads exactly `buf.len()` bytes, looping over short reads.
pub fn recv_exact(mut stream: &TcpStream, buf: &mut [u8]) -> io::Result<()> {
    stream.read_exact(buf)
}

/// Zero-timeout readiness probe.
///
/// Returns `Ok(true)` when a read would not block. A peer that has hung
/// up counts as readable so the caller's next read observes the EOF.
pub fn poll_readable(stream: &TcpStream) -> io::Result<bool> {
    stream.set_nonblocking(true)?;
    let mut probe = [0u8; 1];
    let result = stream.peek(&mut probe);
    stream.set_nonblocking(false)?;

    match result {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn poll_reflects_buffered_data_and_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();

        assert!(!poll_readable(&server).unwrap());

        client.write_all(b"x").unwrap();
        // Give the loopback a moment to deliver.
        for _ in 0..100 {
            if poll_readable(&server).unwrap() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!(poll_readable(&server).unwrap());

        let mut byte = [0u8; 1];
        recv_exact(&server, &mut byte).unwrap();
        assert_eq!(&byte, b"x");
        assert!(!poll_readable(&server).unwrap());

        drop(client);
        for _ in 0..100 {
            if poll_readable(&server).unwrap() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        // EOF reads as "readable" so the pump sees the hangup.
        assert!(poll_readable(&server).unwrap());
    }
}
