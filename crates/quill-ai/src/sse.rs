//! Incremental assembly of `data:`-prefixed, newline-delimited stream records
//!
//! The transport delivers bytes in arbitrarily sized chunks: a multi-byte
//! character or a protocol line may straddle any chunk boundary. Assembly is
//! layered accordingly: [`Utf8Decoder`] turns chunks into text while holding
//! incomplete sequences, [`LineBuffer`] carries the unfinished tail line, and
//! [`RecordAssembler`] scans completed lines for protocol records.

/// Literal prefix marking a protocol record.
const DATA_PREFIX: &str = "data: ";

/// Payload signaling logical end of the event stream.
const DONE_SENTINEL: &str = "[DONE]";

/// A protocol record extracted from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseRecord {
    /// A `data:` payload (expected to carry a JSON chunk).
    Data(String),
    /// The `[DONE]` sentinel. Consumed and ignored by the client; the read
    /// loop ends at transport end-of-stream, not here.
    Done,
}

/// Stateful UTF-8 decoder for chunked input.
///
/// Bytes of a multi-byte character split across chunks are held until the
/// sequence completes. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode the next chunk, returning all text completed so far.
    pub fn decode(&mut self, input: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(input);

        let mut out = String::new();
        let mut pos = 0;
        while pos < bytes.len() {
            match std::str::from_utf8(&bytes[pos..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    pos = bytes.len();
                }
                Err(err) => {
                    let valid_end = pos + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&bytes[pos..valid_end]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            pos = valid_end + len;
                        }
                        // Incomplete trailing sequence: hold it for the next chunk.
                        None => {
                            self.pending = bytes[valid_end..].to_vec();
                            return out;
                        }
                    }
                }
            }
        }
        out
    }
}

/// Carry-over buffer that splits decoded text on newline boundaries.
///
/// The fragment after the last newline is retained until a later chunk
/// completes it; it is never parsed prematurely.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    /// Append text and drain every newline-terminated line, trimmed.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            lines.push(line.trim().to_string());
        }
        lines
    }

    /// Whether an unterminated fragment is currently held.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }
}

/// Incremental assembler for the line-oriented event protocol.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    decoder: Utf8Decoder,
    lines: LineBuffer,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk, returning every record it completes.
    ///
    /// Blank lines and lines without the `data: ` prefix (comments,
    /// keep-alives, other event fields) are skipped. A truncated final line
    /// left behind at transport end-of-stream is simply never returned.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseRecord> {
        let text = self.decoder.decode(chunk);
        self.lines
            .push(&text)
            .iter()
            .filter_map(|line| parse_line(line))
            .collect()
    }

    /// Whether an unterminated line is pending.
    pub fn has_partial(&self) -> bool {
        self.lines.has_partial()
    }
}

fn parse_line(line: &str) -> Option<SseRecord> {
    if line.is_empty() {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload == DONE_SENTINEL {
        Some(SseRecord::Done)
    } else {
        Some(SseRecord::Data(payload.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(s: &str) -> SseRecord {
        SseRecord::Data(s.to_string())
    }

    // --- Utf8Decoder ---

    #[test]
    fn test_decoder_whole_chunk() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decoder_multibyte_split_across_chunks() {
        // "€" is E2 82 AC; split it at every boundary.
        let bytes = "a€b".as_bytes();
        for split in 1..bytes.len() {
            let mut decoder = Utf8Decoder::default();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            assert_eq!(out, "a€b", "split at {}", split);
        }
    }

    #[test]
    fn test_decoder_emoji_byte_at_a_time() {
        let bytes = "🦀".as_bytes();
        let mut decoder = Utf8Decoder::default();
        let mut out = String::new();
        for b in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        assert_eq!(out, "🦀");
    }

    #[test]
    fn test_decoder_invalid_byte_replaced() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_decoder_emits_prefix_before_held_tail() {
        let mut decoder = Utf8Decoder::default();
        // Complete text followed by the first byte of a 3-byte sequence.
        let mut input = b"ok".to_vec();
        input.push(0xE2);
        assert_eq!(decoder.decode(&input), "ok");
        assert_eq!(decoder.decode(&[0x82, 0xAC]), "€");
    }

    // --- LineBuffer ---

    #[test]
    fn test_line_buffer_retains_tail() {
        let mut lines = LineBuffer::default();
        assert_eq!(lines.push("one\ntwo\npart"), vec!["one", "two"]);
        assert!(lines.has_partial());
        assert_eq!(lines.push("ial\n"), vec!["partial"]);
        assert!(!lines.has_partial());
    }

    #[test]
    fn test_line_buffer_trims_carriage_return() {
        let mut lines = LineBuffer::default();
        assert_eq!(lines.push("data: x\r\n"), vec!["data: x"]);
    }

    // --- RecordAssembler ---

    #[test]
    fn test_records_from_single_chunk() {
        let mut assembler = RecordAssembler::new();
        let records = assembler.push(b"data: {\"a\":1}\ndata: [DONE]\n");
        assert_eq!(records, vec![data("{\"a\":1}"), SseRecord::Done]);
    }

    #[test]
    fn test_record_split_mid_line() {
        let mut assembler = RecordAssembler::new();
        assert!(assembler.push(b"data: {\"a\"").is_empty());
        assert_eq!(assembler.push(b":1}\n"), vec![data("{\"a\":1}")]);
    }

    #[test]
    fn test_record_split_mid_multibyte() {
        let line = "data: {\"content\":\"é\"}\n".as_bytes();
        // é is two bytes; split inside it.
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut assembler = RecordAssembler::new();
        assert!(assembler.push(&line[..split]).is_empty());
        assert_eq!(
            assembler.push(&line[split..]),
            vec![data("{\"content\":\"é\"}")]
        );
    }

    #[test]
    fn test_blank_and_non_record_lines_skipped() {
        let mut assembler = RecordAssembler::new();
        let records = assembler.push(b"\n: keep-alive\nevent: ping\ndata: x\n\n");
        assert_eq!(records, vec![data("x")]);
    }

    #[test]
    fn test_prefix_requires_trailing_space() {
        let mut assembler = RecordAssembler::new();
        assert!(assembler.push(b"data:x\n").is_empty());
    }

    #[test]
    fn test_payload_is_trimmed() {
        let mut assembler = RecordAssembler::new();
        assert_eq!(assembler.push(b"data:  spaced  \n"), vec![data("spaced")]);
    }

    #[test]
    fn test_done_sentinel_recognized_mid_stream() {
        let mut assembler = RecordAssembler::new();
        let records = assembler.push(b"data: [DONE]\ndata: after\n");
        assert_eq!(records, vec![SseRecord::Done, data("after")]);
    }

    #[test]
    fn test_truncated_final_line_never_emitted() {
        let mut assembler = RecordAssembler::new();
        assert!(assembler.push(b"data: {\"never\":\"finished\"}").is_empty());
        assert!(assembler.has_partial());
    }

    #[test]
    fn test_chunk_split_invariance() {
        // However the byte stream is sliced, the same records come out.
        let stream = "data: {\"c\":\"CTP \"}\ndata: {\"c\":\"is…\"}\ndata: [DONE]\n".as_bytes();
        let expected = vec![data("{\"c\":\"CTP \"}"), data("{\"c\":\"is…\"}"), SseRecord::Done];

        for size in 1..=stream.len() {
            let mut assembler = RecordAssembler::new();
            let mut records = Vec::new();
            for chunk in stream.chunks(size) {
                records.extend(assembler.push(chunk));
            }
            assert_eq!(records, expected, "chunk size {}", size);
        }
    }
}
