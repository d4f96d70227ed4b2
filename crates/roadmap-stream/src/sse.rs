//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; frames are dispatched on a blank line.
//! Handles `\n`, `\r\n` and lone `\r` line endings, multi-line `data:` fields (joined
//! with `\n`), `:` comment lines and a final frame without a trailing blank
//! line (see [`SseDecoder::finish`]).

/// One dispatched event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field, if any
    pub event: Option<String>,
    /// Joined `data:` lines
    pub data: String,
    /// `id:` field, if any
    pub id: Option<String>,
}

/// Stateful frame decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl SseDecoder {
    /// Create an empty decoder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every frame it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n' || *b == b'\r') {
            let end = start + offset;
            let next = match self.buffer[end] {
                b'\r' => match self.buffer.get(end + 1) {
                    Some(b'\n') => end + 2,
                    Some(_) => end + 1,
                    // CR ends the chunk; an LF may follow in the next one
                    None => break,
                },
                _ => end + 1,
            };
            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            start = next;

            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        self.buffer.drain(..start);
        frames
    }

    /// End of stream: process a trailing partial line and dispatch what is pending
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches('\r').to_string();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // retry and unknown fields
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.clone(),
        })
    }
}
