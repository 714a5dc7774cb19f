/// A complete newline-delimited frame, or notice that one was discarded for size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    Oversized(usize),
}

/// Splits a byte stream into `\n`-terminated frames. Bytes are buffered raw so
/// multi-byte characters split across reads survive. A frame that grows past
/// `max_frame_bytes` is dropped whole rather than truncated.
#[derive(Debug, Default)]
pub struct LineFrames {
    buffer: Vec<u8>,
    max_frame_bytes: Option<usize>,
    discarding: bool,
    discarded_bytes: usize,
}

impl LineFrames {
    pub fn new(max_frame_bytes: Option<usize>) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_bytes,
            discarding: false,
            discarded_bytes: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = chunk;

        while let Some(newline) = rest.iter().position(|byte| *byte == b'\n') {
            let (head, tail) = rest.split_at(newline);
            rest = &tail[1..];
            if self.discarding {
                let dropped = self.discarded_bytes + head.len();
                self.discarding = false;
                self.discarded_bytes = 0;
                frames.push(Frame::Oversized(dropped));
                continue;
            }
            self.buffer.extend_from_slice(head);
            if let Some(frame) = self.take_frame() {
                frames.push(frame);
            }
        }

        if self.discarding {
            self.discarded_bytes += rest.len();
        } else {
            self.buffer.extend_from_slice(rest);
            if let Some(max) = self.max_frame_bytes {
                if self.buffer.len() > max {
                    self.discarding = true;
                    self.discarded_bytes = self.buffer.len();
                    self.buffer.clear();
                }
            }
        }
        frames
    }

    /// Whatever is left once the stream ends.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.discarding {
            self.discarding = false;
            return Some(Frame::Oversized(std::mem::take(&mut self.discarded_bytes)));
        }
        self.take_frame()
    }

    fn take_frame(&mut self) -> Option<Frame> {
        let raw = std::mem::take(&mut self.buffer);
        if let Some(max) = self.max_frame_bytes {
            if raw.len() > max {
                return Some(Frame::Oversized(raw.len()));
            }
        }
        let text = String::from_utf8_lossy(&raw);
        let line = text.trim_end_matches('\r').trim();
        if line.is_empty() {
            None
        } else {
            Some(Frame::Line(line.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, LineFrames};

    fn line(text: &str) -> Frame {
        Frame::Line(text.to_string())
    }

    #[test]
    fn splits_frames_and_skips_blank_lines() {
        let mut frames = LineFrames::new(None);
        assert_eq!(frames.push(b"{\"a\":1}\r\n\n{\"b\""), vec![line("{\"a\":1}")]);
        assert_eq!(frames.push(b":2}\n"), vec![line("{\"b\":2}")]);
        assert_eq!(frames.finish(), None);
    }

    #[test]
    fn keeps_multibyte_characters_split_across_reads() {
        let mut frames = LineFrames::new(None);
        let bytes = "\"€\"\n".as_bytes();
        assert!(frames.push(&bytes[..2]).is_empty());
        assert_eq!(frames.push(&bytes[2..]), vec![line("\"€\"")]);
    }

    #[test]
    fn drops_oversized_frames_whole() {
        let mut frames = LineFrames::new(Some(4));
        assert!(frames.push(b"abcdef").is_empty());
        assert_eq!(frames.push(b"gh\nok\n"), vec![Frame::Oversized(8), line("ok")]);
    }

    #[test]
    fn frame_that_overflows_in_its_final_chunk_is_dropped() {
        let mut frames = LineFrames::new(Some(4));
        assert!(frames.push(b"abc").is_empty());
        assert_eq!(frames.push(b"defgh\nok\n"), vec![Frame::Oversized(8), line("ok")]);
        assert_eq!(frames.push(b"abcd\n"), vec![line("abcd")]);
    }

    #[test]
    fn unterminated_tail_is_returned_on_finish() {
        let mut frames = LineFrames::new(Some(64));
        assert!(frames.push(b"{\"id\":1}").is_empty());
        assert_eq!(frames.finish(), Some(line("{\"id\":1}")));
    }
}
