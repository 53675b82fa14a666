//! Smart-v2 client: `ls-refs` and `fetch` exchanges over HTTP.

use anyhow::Context;

use crate::error::ProtocolError;
use crate::object::Id;
use crate::protocol::pktline::{PktLine, PktLineReader, PktLineWriter};

const GIT_PROTOCOL_HEADER: &str = "version=2";

fn upload_pack_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/git-upload-pack")
}

/// Runs `ls-refs`, returning every advertised `(refname, id)` pair.
pub fn ls_refs(client: &reqwest::blocking::Client, base_url: &str) -> anyhow::Result<Vec<(String, Id)>> {
    let mut body = Vec::new();
    {
        let mut writer = PktLineWriter::new(&mut body);
        writer.write_line("command=ls-refs\n")?;
        writer.flush_pkt()?;
    }

    let resp = client
        .post(upload_pack_url(base_url))
        .header("Git-Protocol", GIT_PROTOCOL_HEADER)
        .header("Content-Type", "application/x-git-upload-pack-request")
        .body(body)
        .send()
        .context("sending ls-refs request")?;

    anyhow::ensure!(
        resp.status().is_success(),
        "ls-refs request failed with status {}",
        resp.status()
    );

    let bytes = resp.bytes().context("reading ls-refs response body")?;
    let mut reader = PktLineReader::new(bytes.as_ref());

    let mut refs = Vec::new();
    while let Some(pkt) = reader.read()? {
        match pkt {
            PktLine::Data(data) => {
                let line = std::str::from_utf8(&data)
                    .map_err(|_| ProtocolError::MalformedPktLine("ref line not utf8".into()))?
                    .trim_end_matches('\n');
                let (hex, name) = line
                    .split_once(' ')
                    .ok_or_else(|| ProtocolError::MalformedPktLine(format!("malformed ref line '{line}'")))?;
                refs.push((name.to_string(), hex.parse()?));
            }
            PktLine::Flush => break,
            _ => continue,
        }
    }

    Ok(refs)
}

/// Runs `fetch` for the given `wants`, returning the demultiplexed packfile bytes.
pub fn fetch(client: &reqwest::blocking::Client, base_url: &str, wants: &[Id]) -> anyhow::Result<Vec<u8>> {
    let mut body = Vec::new();
    {
        let mut writer = PktLineWriter::new(&mut body);
        writer.write_line("command=fetch\n")?;
        writer.delim_pkt()?;
        writer.write_line("no-progress\n")?;
        for want in wants {
            writer.write_line(&format!("want {want}\n"))?;
        }
        writer.write_line("done\n")?;
        writer.flush_pkt()?;
    }

    let resp = client
        .post(upload_pack_url(base_url))
        .header("Git-Protocol", GIT_PROTOCOL_HEADER)
        .header("Content-Type", "application/x-git-upload-pack-request")
        .body(body)
        .send()
        .context("sending fetch request")?;

    anyhow::ensure!(
        resp.status().is_success(),
        "fetch request failed with status {}",
        resp.status()
    );

    let bytes = resp.bytes().context("reading fetch response body")?;
    demux_packfile(&bytes)
}

/// Demultiplexes the sideband channels of a `fetch` response, returning channel-1 bytes.
fn demux_packfile(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut reader = PktLineReader::new(data);
    let mut pack = Vec::new();
    let mut seen_packfile_marker = false;

    while let Some(pkt) = reader.read()? {
        match pkt {
            PktLine::Data(payload) => {
                if !seen_packfile_marker {
                    if payload == b"packfile\n" {
                        seen_packfile_marker = true;
                    }
                    continue;
                }

                let (&channel, rest) = payload
                    .split_first()
                    .ok_or_else(|| ProtocolError::MalformedPktLine("empty sideband frame".into()))?;

                match channel {
                    1 => pack.extend_from_slice(rest),
                    2 => {
                        eprint!("{}", String::from_utf8_lossy(rest));
                    }
                    3 => {
                        return Err(ProtocolError::Remote(String::from_utf8_lossy(rest).into_owned()).into());
                    }
                    other => return Err(ProtocolError::UnexpectedChannel(other).into()),
                }
            }
            PktLine::Delimiter | PktLine::ResponseEnd => continue,
            PktLine::Flush => break,
        }
    }

    anyhow::ensure!(seen_packfile_marker, "fetch response never announced a packfile section");
    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::pktline::encode_data;

    #[test]
    fn demux_concatenates_channel_one_and_skips_progress() {
        let mut response = Vec::new();
        response.extend(encode_data(b"packfile\n"));
        let mut pack_frame = vec![1u8];
        pack_frame.extend_from_slice(b"PACK-BYTES");
        response.extend(encode_data(&pack_frame));
        let mut progress_frame = vec![2u8];
        progress_frame.extend_from_slice(b"progress text\n");
        response.extend(encode_data(&progress_frame));
        response.extend_from_slice(crate::protocol::pktline::FLUSH);

        let pack = demux_packfile(&response).unwrap();
        assert_eq!(pack, b"PACK-BYTES");
    }

    #[test]
    fn demux_surfaces_channel_three_as_remote_error() {
        let mut response = Vec::new();
        response.extend(encode_data(b"packfile\n"));
        let mut err_frame = vec![3u8];
        err_frame.extend_from_slice(b"remote went away");
        response.extend(encode_data(&err_frame));

        let err = demux_packfile(&response).unwrap_err();
        assert!(err.to_string().contains("remote went away"));
    }
}
