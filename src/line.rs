// ABOUTME: Byte-stream line framing and response parameter parsing
// ABOUTME: Splits on CR/LF, trims, surfaces the newline-less ">" prompt as its own line

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reassembles the modem's byte stream into trimmed, non-empty lines.
///
/// Frames are split on CR, LF or CRLF. The PDU-mode `>` prompt is never
/// newline-terminated, so a residual buffer whose content trims to `>` is
/// emitted as a line of its own instead of waiting for more bytes.
pub(crate) struct LineReader<R> {
    reader: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        LineReader {
            reader,
            buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// The next line, or `None` on a clean end of stream. Partial data left
    /// in the buffer at end of stream is discarded.
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            while let Some(pos) = self.buf.iter().position(|&b| b == b'\r' || b == b'\n') {
                let raw = self.buf.split_to(pos + 1);
                let line = String::from_utf8_lossy(&raw[..pos]);
                let line = line.trim();
                if !line.is_empty() {
                    return Ok(Some(line.to_string()));
                }
            }

            if !self.buf.is_empty() {
                let pending = String::from_utf8_lossy(&self.buf);
                if pending.trim() == ">" {
                    self.buf.clear();
                    return Ok(Some(">".to_string()));
                }
            }

            if 0 == self.reader.read_buf(&mut self.buf).await? {
                return Ok(None);
            }
        }
    }
}

/// Parse a response line of the form `LABEL: v1,v2,...` into the label and
/// its positional parameters. Values are whitespace-trimmed and lose one
/// matched pair of surrounding `"` or `'` quotes. A line without a colon is
/// its own label with no parameters. Commas inside quoted values are not
/// treated specially.
pub fn parse_params(line: &str) -> (String, Vec<String>) {
    let Some((label, rest)) = line.split_once(':') else {
        return (line.to_string(), Vec::new());
    };
    let params = rest
        .trim()
        .split(',')
        .map(|value| strip_quotes(value.trim()).to_string())
        .collect();
    (label.trim().to_string(), params)
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// The `+NAME` response label an AT command will answer with, e.g.
/// `AT+CLCC` answers with `+CLCC`. Commands without a `+` label (such as
/// `ATD`) have none.
pub fn command_label(command: &str) -> Option<String> {
    let start = command.find('+')?;
    let rest = &command[start + 1..];
    let end = rest
        .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit()))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(format!("+{}", &rest[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    async fn lines_from(input: &str) -> Vec<String> {
        let mut reader = LineReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn splits_on_any_line_ending() {
        assert_eq!(lines_from("a\r\nb\nc\rd\r\n").await, ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn empty_lines_are_suppressed() {
        assert_eq!(lines_from("\r\n\r\nOK\r\n\r\n").await, ["OK"]);
    }

    #[tokio::test]
    async fn whitespace_is_trimmed() {
        assert_eq!(lines_from("  +CSQ: 15,0  \r\n").await, ["+CSQ: 15,0"]);
    }

    #[tokio::test]
    async fn prompt_without_newline_is_emitted() {
        assert_eq!(lines_from("\r\n> ").await, [">"]);
    }

    #[tokio::test]
    async fn partial_trailing_line_is_dropped_at_eof() {
        assert_eq!(lines_from("OK\r\n+CREG").await, ["OK"]);
    }

    #[test]
    fn parse_basic_parameters() {
        let (label, params) = parse_params("+CSQ: 15,0");
        assert_eq!(label, "+CSQ");
        assert_eq!(params, ["15", "0"]);
    }

    #[test]
    fn parse_strips_matched_quotes() {
        let (label, params) = parse_params("+CMTI: \"SM\",3");
        assert_eq!(label, "+CMTI");
        assert_eq!(params, ["SM", "3"]);

        let (_, params) = parse_params("+X: 'a',\"b\",c");
        assert_eq!(params, ["a", "b", "c"]);
    }

    #[test]
    fn unmatched_quotes_are_kept() {
        let (_, params) = parse_params("+X: \"a,b'");
        assert_eq!(params, ["\"a", "b'"]);
    }

    #[test]
    fn line_without_colon_is_label_only() {
        let (label, params) = parse_params("RING");
        assert_eq!(label, "RING");
        assert!(params.is_empty());
    }

    #[test]
    fn command_label_extraction() {
        assert_eq!(command_label("AT+CLCC").as_deref(), Some("+CLCC"));
        assert_eq!(command_label("AT+CMGL=1").as_deref(), Some("+CMGL"));
        assert_eq!(command_label("AT+C5GREG?").as_deref(), Some("+C5GREG"));
        assert_eq!(command_label("ATD10086;"), None);
        assert_eq!(command_label("AT"), None);
    }
}
