//! Minimal DSF container reader.
//!
//! Layout:
//!
//! ```text
//! "XPLNEDSF" | i32 version (=1) | atoms... | 16-byte MD5 footer
//! atom = i32 id (little endian, bytes reversed: "DAEH" -> "HEAD") | i32 size | data
//! ```
//!
//! Only the `HEAD` atom is read; every other atom is skipped by seeking.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::error::DsfError;

const DSF_MAGIC: &[u8; 8] = b"XPLNEDSF";
const SEVEN_ZIP_MAGIC: &[u8; 2] = b"7z";
const SUPPORTED_VERSION: i32 = 1;
const HEADER_LEN: u64 = 12;
const ATOM_HEADER_LEN: u64 = 8;
const FOOTER_LEN: u64 = 16;

/// Atom id of the header atom, as it reads after byte reversal.
pub const HEAD_ATOM: [u8; 4] = *b"HEAD";

/// Property pair marking a tile as an overlay.
pub const OVERLAY_PROPERTY: &[u8] = b"sim/overlay\x001";

/// Read the raw contents of the `HEAD` atom of a DSF file.
pub fn read_head_atom(path: &Path) -> Result<Vec<u8>, DsfError> {
    let io_err = |source: io::Error| DsfError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let mut reader = BufReader::new(file);

    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    reader
        .by_ref()
        .take(HEADER_LEN)
        .read_to_end(&mut header)
        .map_err(io_err)?;

    if header.starts_with(SEVEN_ZIP_MAGIC) {
        return Err(DsfError::Compressed(path.to_path_buf()));
    }
    if header.len() < HEADER_LEN as usize || !header.starts_with(DSF_MAGIC) {
        return Err(DsfError::BadMagic(path.to_path_buf()));
    }

    let version = i32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if version != SUPPORTED_VERSION {
        return Err(DsfError::UnsupportedVersion {
            path: path.to_path_buf(),
            version,
        });
    }

    let atoms_end = len.saturating_sub(FOOTER_LEN);
    let mut pos = HEADER_LEN;

    while pos + ATOM_HEADER_LEN <= atoms_end {
        let mut atom_header = [0u8; ATOM_HEADER_LEN as usize];
        reader.read_exact(&mut atom_header).map_err(io_err)?;

        let mut id = [atom_header[0], atom_header[1], atom_header[2], atom_header[3]];
        id.reverse();
        let size = i32::from_le_bytes([
            atom_header[4],
            atom_header[5],
            atom_header[6],
            atom_header[7],
        ]);

        let size = u64::try_from(size).unwrap_or(0);
        if size < ATOM_HEADER_LEN || pos + size > atoms_end {
            return Err(DsfError::Truncated(path.to_path_buf()));
        }
        let data_len = size - ATOM_HEADER_LEN;

        if id == HEAD_ATOM {
            let mut data = vec![0u8; data_len as usize];
            reader.read_exact(&mut data).map_err(io_err)?;
            return Ok(data);
        }

        reader
            .seek(SeekFrom::Current(data_len as i64))
            .map_err(io_err)?;
        pos += size;
    }

    Err(DsfError::MissingHead(path.to_path_buf()))
}

/// Whether the DSF file declares `sim/overlay 1`.
pub fn has_overlay_property(path: &Path) -> Result<bool, DsfError> {
    let head = read_head_atom(path)?;
    Ok(head
        .windows(OVERLAY_PROPERTY.len())
        .any(|window| window == OVERLAY_PROPERTY))
}

/// Build a DSF file image in memory. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn build_dsf(head: &[u8], extra_atoms: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(DSF_MAGIC);
    out.extend_from_slice(&SUPPORTED_VERSION.to_le_bytes());

    let mut push_atom = |id: [u8; 4], data: &[u8]| {
        let mut stored = id;
        stored.reverse();
        out.extend_from_slice(&stored);
        out.extend_from_slice(&((data.len() as i32) + 8).to_le_bytes());
        out.extend_from_slice(data);
    };

    for (id, data) in extra_atoms {
        push_atom(*id, data);
    }
    push_atom(HEAD_ATOM, head);

    out.extend_from_slice(&[0u8; FOOTER_LEN as usize]);
    out
}
