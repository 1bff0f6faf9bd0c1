//! Incremental server-sent event decoder.
//!
//! The wire format is blocks of `field: value` lines separated by a blank
//! line:
//! ```text
//! event: message
//! data: {"type":"update","timestamp":1700000000,"data":{"booking_id":7}}
//! ```
//! Chunks from the network can split a block anywhere, even inside a UTF-8
//! character or a `\r\n` pair, so the decoder keeps raw bytes between calls
//! and only decodes text once a block is complete.

use serde_json::Value;

use crate::ports::StreamFrame;

#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Unfinished bytes with line endings already folded to `\n`.
    buffer: Vec<u8>,
    /// The last byte seen was `\r`, so a following `\n` is part of it.
    after_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        for &byte in chunk {
            let after_cr = std::mem::replace(&mut self.after_cr, byte == b'\r');
            match byte {
                b'\n' if after_cr => {}
                b'\r' => self.buffer.push(b'\n'),
                _ => self.buffer.push(byte),
            }
        }

        let mut frames = Vec::new();
        while let Some(end) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_block(&String::from_utf8_lossy(&block)) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn parse_block(block: &str) -> Option<StreamFrame> {
    let mut event = "message";
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = value,
            "data" => data.push(value),
            _ => {}
        }
    }

    let data = data.join("\n");
    match event {
        "connected" => Some(StreamFrame::Connected(
            serde_json::from_str(&data).unwrap_or(Value::Null),
        )),
        "heartbeat" => Some(StreamFrame::Heartbeat),
        "message" if !data.is_empty() => Some(StreamFrame::Message(data)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_event_kinds() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(
            b"event: connected\ndata: {\"scope\":\"admin\"}\n\n\
              event: heartbeat\ndata: {\"time\":1}\n\n\
              event: message\ndata: {\"type\":\"create\"}\n\n",
        );

        assert_eq!(frames.len(), 3);
        assert!(matches!(&frames[0], StreamFrame::Connected(v) if v["scope"] == "admin"));
        assert_eq!(frames[1], StreamFrame::Heartbeat);
        assert_eq!(frames[2], StreamFrame::Message("{\"type\":\"create\"}".into()));
    }

    #[test]
    fn keeps_partial_blocks_until_complete() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"event: mess").is_empty());
        assert!(decoder.push(b"age\ndata: {\"a\":").is_empty());
        let frames = decoder.push(b"1}\n\n");

        assert_eq!(frames, vec![StreamFrame::Message("{\"a\":1}".into())]);
    }

    #[test]
    fn handles_crlf_and_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\r\n\r\ndata: hi\r\n\r\n");
        assert_eq!(frames, vec![StreamFrame::Message("hi".into())]);
    }

    #[test]
    fn multibyte_characters_survive_a_chunk_split() {
        let raw = "data: {\"client_name\":\"Ștefan\"}\n\n".as_bytes();
        let split = raw.iter().position(|&b| b >= 0x80).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&raw[..split]).is_empty());
        let frames = decoder.push(&raw[split..]);

        assert_eq!(
            frames,
            vec![StreamFrame::Message("{\"client_name\":\"Ștefan\"}".into())]
        );
    }

    #[test]
    fn crlf_split_across_chunks_still_ends_the_block() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push(b"event: heartbeat\r\ndata: {}\r\n\r");
        assert_eq!(frames, vec![StreamFrame::Heartbeat]);

        assert!(decoder.push(b"\ndata: nex").is_empty());
        let frames = decoder.push(b"t\r");
        assert!(frames.is_empty());
        let frames = decoder.push(b"\n\r\n");

        assert_eq!(frames, vec![StreamFrame::Message("next".into())]);
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: a\r\r");
        assert_eq!(frames, vec![StreamFrame::Message("a".into())]);
    }

    #[test]
    fn unknown_events_are_skipped() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: other\ndata: x\n\n").is_empty());
    }
}
