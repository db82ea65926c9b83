//! Byte streams to lines
//!
//! [`LineReader`] is the line source used for files and stdin. Phone exports
//! come either as single-byte text or as UTF-16; the reader sniffs the first
//! two bytes (a byte-order mark, or an ASCII character paired with a zero
//! byte), decodes accordingly and accepts `\n`, `\r\n` and a lone `\r` as
//! terminators. Single-byte input is read as ISO-8859-1, so decoding itself
//! never fails. [`split_lines`] applies the same terminator rules to text
//! that is already decoded.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read};

/// Byte encoding detected at the start of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Latin1,
    Utf16Le,
    Utf16Be,
}

/// Iterator of decoded lines over any reader
#[derive(Debug)]
pub struct LineReader<R> {
    reader: BufReader<R>,
    encoding: Option<Encoding>,
    pending: VecDeque<String>,
    buffer: Vec<u8>,
    done: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            encoding: None,
            pending: VecDeque::new(),
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Encoding in use, known once the first line has been requested
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Moves the first two bytes into `buffer` and sniffs them
    ///
    /// The bytes stay in `buffer` as the start of the first chunk unless
    /// they are a byte-order mark.
    fn detect_encoding(&mut self) -> io::Result<Encoding> {
        while self.buffer.len() < 2 {
            let available = self.reader.fill_buf()?;
            let wanted = 2 - self.buffer.len();
            let Some(head) = available.get(..wanted.min(available.len())) else {
                break;
            };
            if head.is_empty() {
                break;
            }
            let taken = head.len();
            self.buffer.extend_from_slice(head);
            self.reader.consume(taken);
        }

        let (encoding, bom) = match self.buffer.as_slice() {
            [0xFF, 0xFE] => (Encoding::Utf16Le, true),
            [0xFE, 0xFF] => (Encoding::Utf16Be, true),
            [first, 0] if *first != 0 => (Encoding::Utf16Le, false),
            [0, second] if *second != 0 => (Encoding::Utf16Be, false),
            _ => (Encoding::Latin1, false),
        };
        if bom {
            self.buffer.clear();
        }
        Ok(encoding)
    }

    fn fill_pending(&mut self) -> io::Result<()> {
        let encoding = match self.encoding {
            Some(encoding) => encoding,
            None => {
                let detected = self.detect_encoding()?;
                self.encoding = Some(detected);
                detected
            }
        };

        match encoding {
            Encoding::Latin1 => self.fill_latin1(),
            Encoding::Utf16Le => self.fill_utf16(u16::from_le_bytes),
            Encoding::Utf16Be => self.fill_utf16(u16::from_be_bytes),
        }
    }

    fn fill_latin1(&mut self) -> io::Result<()> {
        let read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if read == 0 && self.buffer.is_empty() {
            self.done = true;
            return Ok(());
        }
        let decoded: String = self.buffer.iter().copied().map(char::from).collect();
        self.pending.extend(split_lines(&decoded).map(str::to_string));
        self.buffer.clear();
        Ok(())
    }

    /// UTF-16 exports are small, so the rest of the stream is decoded at once
    fn fill_utf16(&mut self, to_unit: fn([u8; 2]) -> u16) -> io::Result<()> {
        self.reader.read_to_end(&mut self.buffer)?;
        self.done = true;

        let units = self
            .buffer
            .chunks_exact(2)
            .map(|pair| to_unit(pair.try_into().unwrap_or_default()));
        let decoded: String = char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        self.buffer.clear();

        self.pending.extend(split_lines(&decoded).map(str::to_string));
        Ok(())
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() && !self.done {
            if let Err(e) = self.fill_pending() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.pending.pop_front().map(Ok)
    }
}

/// Splits decoded text on `\n`, `\r\n` and a lone `\r`
///
/// A terminator at the very end does not produce a trailing empty line.
pub fn split_lines(input: &str) -> impl Iterator<Item = &str> {
    input.split_inclusive('\n').flat_map(|chunk| {
        let chunk = chunk.strip_suffix('\n').unwrap_or(chunk);
        let chunk = chunk.strip_suffix('\r').unwrap_or(chunk);
        chunk.split('\r')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[u8]) -> Vec<String> {
        LineReader::new(input)
            .collect::<io::Result<Vec<_>>>()
            .unwrap_or_default()
    }

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    #[test]
    fn test_all_terminators() {
        assert_eq!(lines(b"a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_no_trailing_empty_line() {
        assert_eq!(
            lines(b"BEGIN:VMSG\r\nEND:VMSG\r\n"),
            vec!["BEGIN:VMSG", "END:VMSG"]
        );
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn test_blank_lines_are_kept() {
        assert_eq!(lines(b"a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(lines(b"a\r\r\n"), vec!["a", ""]);
    }

    #[test]
    fn test_latin1_decoding() {
        assert_eq!(lines(b"caf\xe9\n"), vec!["caf\u{e9}"]);
    }

    #[test]
    fn test_utf16_with_bom() {
        let input = utf16le("BEGIN:VMSG\r\nText \u{e9}\r\nEND:VMSG\r\n", true);
        let mut reader = LineReader::new(input.as_slice());
        let first = reader.next().and_then(Result::ok);
        assert_eq!(first.as_deref(), Some("BEGIN:VMSG"));
        assert_eq!(reader.encoding(), Some(Encoding::Utf16Le));
        let rest: Vec<String> = reader.filter_map(Result::ok).collect();
        assert_eq!(rest, vec!["Text \u{e9}", "END:VMSG"]);
    }

    #[test]
    fn test_utf16_without_bom_is_sniffed() {
        let input = utf16le("BEGIN:VMSG\r\nEND:VMSG\r\n", false);
        assert_eq!(lines(&input), vec!["BEGIN:VMSG", "END:VMSG"]);
    }

    #[test]
    fn test_utf16_big_endian() {
        let text = "BEGIN:VMSG\r\nEND:VMSG\r\n";
        let mut with_bom = vec![0xFE, 0xFF];
        with_bom.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(lines(&with_bom), vec!["BEGIN:VMSG", "END:VMSG"]);

        let without_bom: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        let mut reader = LineReader::new(without_bom.as_slice());
        let all: Vec<String> = reader.by_ref().filter_map(Result::ok).collect();
        assert_eq!(all, vec!["BEGIN:VMSG", "END:VMSG"]);
        assert_eq!(reader.encoding(), Some(Encoding::Utf16Be));
    }

    /// Hands out one byte per read call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&byte, rest)), Some(slot)) => {
                    *slot = byte;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_sniffing_survives_short_reads() {
        let input = utf16le("BEGIN:VMSG\r\nEND:VMSG\r\n", true);
        let parsed: Vec<String> = LineReader::new(Trickle(&input))
            .filter_map(Result::ok)
            .collect();
        assert_eq!(parsed, vec!["BEGIN:VMSG", "END:VMSG"]);

        let parsed: Vec<String> = LineReader::new(Trickle(b"\nab\r\nc"))
            .filter_map(Result::ok)
            .collect();
        assert_eq!(parsed, vec!["", "ab", "c"]);
    }

    #[test]
    fn test_tiny_inputs() {
        assert_eq!(lines(b"a"), vec!["a"]);
        assert_eq!(lines(b"\n"), vec![""]);
        assert_eq!(lines(b"\r"), vec![""]);
    }

    #[test]
    fn test_split_lines_matches_reader() {
        let input = "a\nb\r\nc\rd\r\n\ne";
        let split: Vec<&str> = split_lines(input).collect();
        assert_eq!(split, lines(input.as_bytes()));
        assert_eq!(split, vec!["a", "b", "c", "d", "", "e"]);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn test_read_error_is_reported_once() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let mut reader = LineReader::new(Failing);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
