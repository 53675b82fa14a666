//! Pkt-line codec: 4-hex-digit length prefix framing used by the smart protocol.

use std::io::{self, Read, Write};

use crate::error::ProtocolError;

pub const FLUSH: &[u8] = b"0000";
pub const DELIM: &[u8] = b"0001";
pub const RESPONSE_END: &[u8] = b"0002";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    Data(Vec<u8>),
    Flush,
    Delimiter,
    ResponseEnd,
}

/// Encodes `payload` as a length-prefixed data pkt-line.
pub fn encode_data(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() + 4;
    let mut out = format!("{len:04x}").into_bytes();
    out.extend_from_slice(payload);
    out
}

pub struct PktLineReader<R> {
    inner: R,
}

impl<R: Read> PktLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads the next pkt-line frame, returning `Ok(None)` at end of stream.
    pub fn read(&mut self) -> anyhow::Result<Option<PktLine>> {
        let mut len_buf = [0u8; 4];
        match self.inner.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len_str = std::str::from_utf8(&len_buf)
            .map_err(|_| ProtocolError::MalformedPktLine("length prefix not ascii".into()))?;
        let len = u32::from_str_radix(len_str, 16)
            .map_err(|_| ProtocolError::MalformedPktLine(format!("bad length prefix '{len_str}'")))?;

        match len {
            0 => Ok(Some(PktLine::Flush)),
            1 => Ok(Some(PktLine::Delimiter)),
            2 => Ok(Some(PktLine::ResponseEnd)),
            n if n < 4 => Err(ProtocolError::MalformedPktLine(format!("length {n} below minimum")).into()),
            n => {
                let mut payload = vec![0u8; (n - 4) as usize];
                self.inner.read_exact(&mut payload)?;
                Ok(Some(PktLine::Data(payload)))
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

pub struct PktLineWriter<W> {
    inner: W,
}

impl<W: Write> PktLineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_data(&mut self, payload: &[u8]) -> io::Result<()> {
        self.inner.write_all(&encode_data(payload))
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_data(line.as_bytes())
    }

    pub fn flush_pkt(&mut self) -> io::Result<()> {
        self.inner.write_all(FLUSH)
    }

    pub fn delim_pkt(&mut self) -> io::Result<()> {
        self.inner.write_all(DELIM)
    }

    pub fn finish(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn encode_data_matches_reference_length_prefix() {
        assert_eq!(&encode_data(b"hello\n")[..4], b"000a");
    }

    #[test]
    fn writer_then_reader_round_trips() {
        let mut buf = Vec::new();
        {
            let mut writer = PktLineWriter::new(&mut buf);
            writer.write_line("command=ls-refs\n").unwrap();
            writer.flush_pkt().unwrap();
        }

        let mut reader = PktLineReader::new(Cursor::new(buf));
        let first = reader.read().unwrap().unwrap();
        assert_eq!(first, PktLine::Data(b"command=ls-refs\n".to_vec()));
        let second = reader.read().unwrap().unwrap();
        assert_eq!(second, PktLine::Flush);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn reader_recognizes_delimiter_and_response_end() {
        let mut reader = PktLineReader::new(Cursor::new(b"00010002".to_vec()));
        assert_eq!(reader.read().unwrap().unwrap(), PktLine::Delimiter);
        assert_eq!(reader.read().unwrap().unwrap(), PktLine::ResponseEnd);
        assert!(reader.read().unwrap().is_none());
    }
}
