// Copyright 2025 RisingWave Labs
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

//! Wire messages exchanged between nodes.
//!
//! Every frame is the braced message kind, a kind-specific body, and a `\n`
//! terminator. The newline is the frame delimiter used for reassembly, so
//! blobs carried inside `Put` and `Reply` must not contain one; the chunk
//! and dataframe encodings never produce it.

use bytes::Bytes;
use eddy_common::catalog::Key;
use eddy_common::codec::{self, Decoder, Encoder};

/// Discriminants are part of the wire format; do not reorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum MsgKind {
    Ack = 0,
    Put = 1,
    Reply = 2,
    Get = 3,
    WaitAndGet = 4,
    Register = 5,
    Directory = 6,
}

impl MsgKind {
    pub fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(MsgKind::Ack),
            1 => Some(MsgKind::Put),
            2 => Some(MsgKind::Reply),
            3 => Some(MsgKind::Get),
            4 => Some(MsgKind::WaitAndGet),
            5 => Some(MsgKind::Register),
            6 => Some(MsgKind::Directory),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Confirms a `Put` was applied on its home node.
    Ack,
    /// Store `blob` under `key` on the key's home node.
    Put { key: Key, blob: Bytes },
    /// Answer to a `Get` or `WaitAndGet`; `request` says which.
    Reply { request: MsgKind, blob: Bytes },
    Get { key: Key },
    WaitAndGet { key: Key },
    /// A node announcing itself on a fresh connection.
    Register { ip: String, sender: usize },
    /// The seed's full list of `(ip, node index)` pairs.
    Directory { addresses: Vec<String>, indices: Vec<usize> },
}

impl Message {
    pub fn kind(&self) -> MsgKind {
        match self {
            Message::Ack => MsgKind::Ack,
            Message::Put { .. } => MsgKind::Put,
            Message::Reply { .. } => MsgKind::Reply,
            Message::Get { .. } => MsgKind::Get,
            Message::WaitAndGet { .. } => MsgKind::WaitAndGet,
            Message::Register { .. } => MsgKind::Register,
            Message::Directory { .. } => MsgKind::Directory,
        }
    }

    /// Encodes the full frame, including the trailing newline.
    pub fn encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        enc.uint(self.kind() as u64);
        match self {
            Message::Ack => {}
            Message::Put { key, blob } => {
                key.encode(&mut enc);
                enc.raw(blob);
            }
            Message::Reply { request, blob } => {
                enc.uint(*request as u64);
                enc.raw(blob);
            }
            Message::Get { key } | Message::WaitAndGet { key } => key.encode(&mut enc),
            Message::Register { ip, sender } => {
                enc.str(ip);
                enc.uint(*sender as u64);
            }
            Message::Directory { addresses, indices } => {
                enc.uint(addresses.len() as u64);
                for ip in addresses {
                    enc.str(ip);
                }
                enc.uint(indices.len() as u64);
                for idx in indices {
                    enc.uint(*idx as u64);
                }
            }
        }
        enc.tag(b'\n');
        enc.finish()
    }

    /// Decodes one frame body. The caller strips the newline delimiter.
    pub fn decode(frame: &[u8]) -> codec::Result<Self> {
        let mut dec = Decoder::new(frame);
        let raw_kind = dec.uint()?;
        let kind = MsgKind::from_u64(raw_kind).ok_or(codec::Error::UnknownMsgKind(raw_kind))?;
        let msg = match kind {
            MsgKind::Ack => Message::Ack,
            MsgKind::Put => {
                let key = Key::decode(&mut dec)?;
                let blob = Bytes::copy_from_slice(dec.rest());
                Message::Put { key, blob }
            }
            MsgKind::Reply => {
                let raw_request = dec.uint()?;
                let request = MsgKind::from_u64(raw_request)
                    .ok_or(codec::Error::UnknownMsgKind(raw_request))?;
                let blob = Bytes::copy_from_slice(dec.rest());
                Message::Reply { request, blob }
            }
            MsgKind::Get => Message::Get {
                key: Key::decode(&mut dec)?,
            },
            MsgKind::WaitAndGet => Message::WaitAndGet {
                key: Key::decode(&mut dec)?,
            },
            MsgKind::Register => {
                let ip = dec.string()?;
                let sender = dec.uint()? as usize;
                Message::Register { ip, sender }
            }
            MsgKind::Directory => {
                let count = dec.uint()? as usize;
                let mut addresses = Vec::with_capacity(count);
                for _ in 0..count {
                    addresses.push(dec.string()?);
                }
                let count = dec.uint()? as usize;
                let mut indices = Vec::with_capacity(count);
                for _ in 0..count {
                    indices.push(dec.uint()? as usize);
                }
                Message::Directory { addresses, indices }
            }
        };
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn roundtrip(msg: Message) {
        let frame = msg.encode();
        assert_eq!(frame.last(), Some(&b'\n'));
        let decoded = Message::decode(&frame[..frame.len() - 1]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_ack_roundtrip() {
        let frame = Message::Ack.encode();
        assert_eq!(&frame[..], b"{0}\n");
        roundtrip(Message::Ack);
    }

    #[test]
    fn test_register_roundtrip() {
        roundtrip(Message::Register {
            ip: "127.0.0.3".to_owned(),
            sender: 1,
        });
    }

    #[test]
    fn test_directory_roundtrip() {
        roundtrip(Message::Directory {
            addresses: vec![
                "127.0.0.2".to_owned(),
                "127.0.0.3".to_owned(),
                "127.0.0.4".to_owned(),
                "127.0.0.5".to_owned(),
            ],
            indices: vec![1, 2, 3, 4],
        });
    }

    #[test]
    fn test_put_roundtrip() {
        roundtrip(Message::Put {
            key: Key::new("triv-c0-0", 0),
            blob: Bytes::from_static(b"{0}{2}[F{1.0000000}F{2.0000000}]"),
        });
    }

    #[test]
    fn test_get_and_reply_roundtrip() {
        roundtrip(Message::Get {
            key: Key::new("main", 0),
        });
        roundtrip(Message::WaitAndGet {
            key: Key::new("verif", 0),
        });
        roundtrip(Message::Reply {
            request: MsgKind::WaitAndGet,
            blob: Bytes::from_static(b"[I{1}[{6}ints-0{0}]]"),
        });
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(matches!(
            Message::decode(b"{9}"),
            Err(codec::Error::UnknownMsgKind(9))
        ));
    }
}
