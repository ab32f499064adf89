//! Incremental parser for the daemon's server-sent event stream

/// One complete SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Accumulates raw chunks and yields frames as blank lines complete them
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body; returns every frame it completed
    pub fn feed(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.finish_frame() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue; // keep-alive comment
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        frames
    }

    fn finish_frame(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frames_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed("event: timerUpdate\nda").is_empty());
        let frames = parser.feed("ta: {\"remainingSeconds\":5}\n\nevent: alert\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "timerUpdate".to_string(),
                data: "{\"remainingSeconds\":5}".to_string(),
            }]
        );

        let frames = parser.feed("data: {}\r\n\r\n");
        assert_eq!(frames[0].event, "alert");
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn ignores_keep_alive_comments_and_empty_frames() {
        let mut parser = SseParser::new();
        assert!(parser.feed(":\n\n: ping\n\n").is_empty());
        assert!(parser.feed("event: lonely\n\n").is_empty());

        // A dangling event name does not leak into the next frame
        let frames = parser.feed("data: x\n\n");
        assert_eq!(frames[0].event, "message");
    }

    #[test]
    fn joins_multi_line_data() {
        let mut parser = SseParser::new();
        let frames = parser.feed("event: e\ndata: a\ndata: b\n\n");
        assert_eq!(frames[0].data, "a\nb");
    }
}
