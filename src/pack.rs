//! Packfile decoder: header, per-object size varint, base objects, and ref-delta dispatch.

use std::io::Read;

use anyhow::Context;
use bytes::{Buf, Bytes};
use flate2::read::ZlibDecoder;
use sha1::{Digest, Sha1};

use crate::delta;
use crate::error::PackError;
use crate::object::{Id, Kind};
use crate::store::ObjectStore;

const PACK_SIGNATURE: &[u8; 4] = b"PACK";

#[derive(Debug, Default, Clone, Copy)]
pub struct UnpackReport {
    pub objects_written: usize,
    pub deltas_resolved: usize,
}

fn kind_from_type_id(type_id: u8) -> anyhow::Result<Kind> {
    match type_id {
        1 => Ok(Kind::Commit),
        2 => Ok(Kind::Tree),
        3 => Ok(Kind::Blob),
        4 => Ok(Kind::Tag),
        other => Err(PackError::UnknownObjectType(other).into()),
    }
}

fn require(buf: &Bytes, n: usize) -> anyhow::Result<()> {
    if buf.remaining() < n {
        return Err(PackError::Truncated {
            expected: n,
            found: buf.remaining(),
        }
        .into());
    }
    Ok(())
}

/// Reads the type+size varint at the start of a packed object header.
fn read_type_and_size(buf: &mut Bytes) -> anyhow::Result<(u8, usize)> {
    require(buf, 1)?;
    let first = buf.get_u8();
    let type_id = (first >> 4) & 0x7;
    let mut size = (first & 0x0f) as usize;
    let mut shift = 4u32;
    let mut more = first & 0x80 != 0;

    while more {
        require(buf, 1)?;
        let b = buf.get_u8();
        more = b & 0x80 != 0;
        size |= ((b & 0x7f) as usize) << shift;
        shift += 7;
    }

    Ok((type_id, size))
}

/// Inflates exactly `expected` bytes from the start of `buf`, returning the payload and the
/// number of compressed bytes consumed (so the caller can advance past this object).
fn inflate_exact(buf: &Bytes, expected: usize) -> anyhow::Result<(Vec<u8>, usize)> {
    let reader = buf.clone().reader();
    let mut decoder = ZlibDecoder::new(reader);
    let mut out = vec![0u8; expected];

    if expected == 0 {
        // `Read::read_exact` on an empty buffer is a documented no-op: it never calls
        // `read`, so the decompressor never runs and `total_in()` stays 0. Probe with a
        // throwaway one-byte buffer instead, so the zlib stream (header, empty deflate
        // block, Adler-32 trailer) is actually consumed and the cursor advances past it.
        let mut probe = [0u8; 1];
        let n = decoder
            .read(&mut probe)
            .context("inflating packfile object")?;
        anyhow::ensure!(n == 0, "expected zero-byte object payload, found trailing data");
    } else {
        decoder
            .read_exact(&mut out)
            .context("inflating packfile object")?;
    }

    let consumed = decoder.total_in() as usize;
    Ok((out, consumed))
}

/// Parses a packfile and stores every object (resolving ref-deltas against already-stored
/// bases). Returns a summary of how many base objects and deltas were materialized.
pub fn unpack(store: &ObjectStore, data: &[u8]) -> anyhow::Result<UnpackReport> {
    let full = Bytes::copy_from_slice(data);
    let mut buf = full.clone();

    require(&buf, 12)?;
    let sig = buf.copy_to_bytes(4);
    if sig.as_ref() != PACK_SIGNATURE {
        return Err(PackError::BadSignature.into());
    }
    let version = buf.get_u32();
    if version != 2 {
        return Err(PackError::UnsupportedVersion(version).into());
    }
    let count = buf.get_u32();

    let mut report = UnpackReport::default();

    for _ in 0..count {
        let (type_id, size) = read_type_and_size(&mut buf)?;

        match type_id {
            1..=4 => {
                let kind = kind_from_type_id(type_id)?;
                let (payload, consumed) = inflate_exact(&buf, size)?;
                buf.advance(consumed);
                store.put(kind, &payload)?;
                report.objects_written += 1;
            }
            6 => {
                return Err(PackError::UnsupportedOfsDelta.into());
            }
            7 => {
                require(&buf, 20)?;
                let mut base_id_bytes = [0u8; 20];
                buf.copy_to_slice(&mut base_id_bytes);
                let base_id = Id::from_bytes(base_id_bytes);

                let (delta_bytes, consumed) = inflate_exact(&buf, size)?;
                buf.advance(consumed);

                let (base_kind, base_payload) = store
                    .get(&base_id)
                    .with_context(|| format!("ref-delta base object {base_id} not found in store"))?;
                let reconstructed = delta::apply(&base_payload, &delta_bytes)
                    .with_context(|| format!("applying ref-delta against base {base_id}"))?;
                store.put(base_kind, &reconstructed)?;
                report.deltas_resolved += 1;
            }
            other => return Err(PackError::UnknownObjectType(other).into()),
        }
    }

    require(&buf, 20)?;
    let trailer = buf.copy_to_bytes(20);
    let body_len = full.len() - 20;
    let computed = Sha1::digest(&full[..body_len]);
    if computed.as_slice() != trailer.as_ref() {
        return Err(PackError::ChecksumMismatch.into());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn object_header_byte(type_id: u8, size: usize) -> Vec<u8> {
        // single-byte header path: size must fit in 4 bits for this helper
        assert!(size < 16);
        vec![(type_id << 4) | size as u8]
    }

    fn build_pack(objects: &[(u8, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(PACK_SIGNATURE);
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&(objects.len() as u32).to_be_bytes());

        for (type_id, payload) in objects {
            body.extend(object_header_byte(*type_id, payload.len()));
            body.extend(deflate(payload));
        }

        let checksum = Sha1::digest(&body);
        body.extend_from_slice(&checksum);
        body
    }

    #[test]
    fn unpacks_single_blob_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));

        let pack = build_pack(&[(3, b"hello\n".to_vec())]);
        let report = unpack(&store, &pack).unwrap();

        assert_eq!(report.objects_written, 1);
        assert_eq!(report.deltas_resolved, 0);
        let id = crate::object::hash(Kind::Blob, b"hello\n");
        assert!(store.exists(&id));
    }

    #[test]
    fn unpacks_empty_blob_followed_by_another_object_without_losing_the_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));

        let pack = build_pack(&[(3, b"".to_vec()), (3, b"hello\n".to_vec())]);
        let report = unpack(&store, &pack).unwrap();

        assert_eq!(report.objects_written, 2);
        let empty_id = crate::object::hash(Kind::Blob, b"");
        let hello_id = crate::object::hash(Kind::Blob, b"hello\n");
        assert!(store.exists(&empty_id));
        assert!(store.exists(&hello_id));
        assert_eq!(empty_id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn rejects_bad_signature() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));
        let mut pack = build_pack(&[(3, b"x".to_vec())]);
        pack[0] = b'X';
        assert!(unpack(&store, &pack).is_err());
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));
        let mut pack = build_pack(&[(3, b"hello\n".to_vec())]);
        let last = pack.len() - 1;
        pack[last] ^= 0xff;
        assert!(unpack(&store, &pack).is_err());
    }

    #[test]
    fn resolves_ref_delta_against_stored_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join(".git"));

        let base_payload = b"ABCDEFGH".to_vec();
        let base_id = store.put(Kind::Blob, &base_payload).unwrap();

        // delta: copy(offset=5,len=3) + insert("XYZ") -> "FGHXYZ"
        let mut delta_bytes = Vec::new();
        delta_bytes.push(8u8); // source size varint (single byte, <128)
        delta_bytes.push(6u8); // target size varint
        delta_bytes.push(0x80 | 0x01 | 0x10);
        delta_bytes.push(5);
        delta_bytes.push(3);
        delta_bytes.push(3);
        delta_bytes.extend_from_slice(b"XYZ");

        let mut body = Vec::new();
        body.extend_from_slice(PACK_SIGNATURE);
        body.extend_from_slice(&2u32.to_be_bytes());
        body.extend_from_slice(&1u32.to_be_bytes());
        // ref-delta header: type 7, size = len(delta_bytes)
        body.extend(object_header_byte(7, delta_bytes.len()));
        body.extend_from_slice(base_id.as_bytes());
        body.extend(deflate(&delta_bytes));
        let checksum = Sha1::digest(&body);
        body.extend_from_slice(&checksum);

        let report = unpack(&store, &body).unwrap();
        assert_eq!(report.deltas_resolved, 1);

        let target_id = crate::object::hash(Kind::Blob, b"FGHXYZ");
        assert!(store.exists(&target_id));
    }
}
