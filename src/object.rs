//! Object codec: canonical header framing, SHA-1 fingerprinting, zlib-at-rest storage.

use std::fmt;
use std::io::prelude::*;
use std::str::FromStr;

use anyhow::{bail, Context};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};

/// The four object kinds the reference VCS stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Commit => "commit",
            Kind::Tree => "tree",
            Kind::Blob => "blob",
            Kind::Tag => "tag",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "commit" => Ok(Kind::Commit),
            "tree" => Ok(Kind::Tree),
            "blob" => Ok(Kind::Blob),
            "tag" => Ok(Kind::Tag),
            other => bail!("unrecognized object kind '{other}'"),
        }
    }
}

/// A 20-byte SHA-1 object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; 20]);

impl Id {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Id(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        anyhow::ensure!(bytes.len() == 20, "object id must be exactly 20 bytes");
        let mut buf = [0u8; 20];
        buf.copy_from_slice(bytes);
        Ok(Id(buf))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Splits the hex id into the fanout path components: (first two hex chars, remaining 38).
    pub fn fanout_path(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Id {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        anyhow::ensure!(s.len() == 40, "object id '{s}' is not 40 hex characters");
        let bytes = hex::decode(s).with_context(|| format!("decoding object id '{s}'"))?;
        Id::from_slice(&bytes)
    }
}

fn canonical_frame(kind: Kind, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(payload.len() + 24);
    framed.extend_from_slice(kind.as_str().as_bytes());
    framed.push(b' ');
    framed.extend_from_slice(payload.len().to_string().as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    framed
}

/// Computes the id of `(kind, payload)` without compressing it.
pub fn hash(kind: Kind, payload: &[u8]) -> Id {
    let framed = canonical_frame(kind, payload);
    let digest = Sha1::digest(&framed);
    Id::from_slice(&digest).expect("SHA-1 digest is always 20 bytes")
}

/// Encodes `(kind, payload)` into its id and zlib-compressed canonical bytes.
pub fn encode(kind: Kind, payload: &[u8]) -> anyhow::Result<(Id, Vec<u8>)> {
    let framed = canonical_frame(kind, payload);
    let id = hash(kind, payload);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&framed)
        .context("deflating object for storage")?;
    let stored = encoder.finish().context("finishing object deflate stream")?;

    Ok((id, stored))
}

/// Inflates `stored_bytes` and validates the canonical header, returning `(kind, payload)`.
pub fn decode(stored_bytes: &[u8]) -> anyhow::Result<(Kind, Vec<u8>)> {
    let mut decoder = ZlibDecoder::new(stored_bytes);
    let mut framed = Vec::new();
    decoder
        .read_to_end(&mut framed)
        .context("inflating object bytes")?;

    let nul = framed
        .iter()
        .position(|&b| b == 0)
        .context("corrupt object: missing NUL header terminator")?;
    let header = std::str::from_utf8(&framed[..nul]).context("corrupt object: header not utf8")?;
    let (kind_str, size_str) = header
        .split_once(' ')
        .with_context(|| format!("corrupt object: malformed header '{header}'"))?;
    let kind: Kind = kind_str.parse()?;
    let declared_len: usize = size_str
        .parse()
        .with_context(|| format!("corrupt object: non-numeric size '{size_str}'"))?;

    let payload = framed[nul + 1..].to_vec();
    anyhow::ensure!(
        payload.len() == declared_len,
        "corrupt object: header declares {declared_len} bytes, found {}",
        payload.len()
    );

    Ok((kind, payload))
}
