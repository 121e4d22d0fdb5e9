//! Parser for X-Plane's `apt.dat` airport definition file.
//!
//! The format is line based. Each record starts with a numeric row code;
//! the ones we care about declare an airport:
//!
//! | Code | Meaning       |
//! |------|---------------|
//! | `1`  | Land airport  |
//! | `16` | Seaplane base |
//! | `17` | Heliport      |
//!
//! `<code> <elevation_ft> <deprecated> <deprecated> <ICAO> <name...>`
//!
//! Every other row code is inert. Third-party tools write the file in a mix
//! of encodings, so decoding walks a fallback list until one succeeds.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, trace};

use super::error::ExtractionParseError;
use crate::pack::AirportId;

/// Row codes that declare an airport identifier.
const AIRPORT_ROW_CODES: [&str; 3] = ["1", "16", "17"];

/// Whitespace-separated field index of the identifier on an airport row.
const IDENTIFIER_FIELD: usize = 4;

/// End-of-file row code.
const END_ROW_CODE: &str = "99";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Binary formats that turn up under the airport file name.
const FOREIGN_MAGIC: [(&[u8], &str); 3] = [
    (b"XPLNEDSF", "DSF"),
    (&[b'7', b'z', 0xbc, 0xaf], "7-Zip"),
    (&[b'P', b'K', 0x03, 0x04], "Zip"),
];

/// Windows-1252 code points for bytes `0x80..=0x9F`; `None` marks undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Text encodings tried in order when decoding an airport file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
    Latin1,
}

impl TextEncoding {
    /// Fallback order.
    pub const FALLBACK: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Windows1252,
        TextEncoding::Latin1,
    ];

    /// Decode bytes, or `None` if they are not valid in this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            TextEncoding::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9f => CP1252_HIGH[(b - 0x80) as usize],
                    _ => Some(b as char),
                })
                .collect::<Option<String>>()
                .map(Cow::Owned),
            TextEncoding::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        }
    }
}

/// Decode with the first encoding in the fallback list that accepts the bytes.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    for encoding in TextEncoding::FALLBACK {
        if let Some(text) = encoding.decode(bytes) {
            return (text, encoding);
        }
    }
    // Latin-1 maps every byte, so the loop always returns
    (
        Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
        TextEncoding::Latin1,
    )
}

/// Parser for `apt.dat` and `apt.dat.gz`.
pub struct AptDatParser;

impl AptDatParser {
    /// Read an airport file from disk and collect its identifiers.
    pub fn parse_file(path: &Path) -> Result<BTreeSet<AirportId>, ExtractionParseError> {
        let io_err = |source| ExtractionParseError::Io {
            path: path.to_path_buf(),
            source,
        };

        let raw = fs::read(path).map_err(io_err)?;

        let is_gz_name = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        let bytes = if is_gz_name || raw.starts_with(&GZIP_MAGIC) {
            let mut out = Vec::with_capacity(raw.len() * 4);
            GzDecoder::new(raw.as_slice())
                .read_to_end(&mut out)
                .map_err(io_err)?;
            out
        } else {
            raw
        };

        Self::parse_bytes(&bytes, path)
    }

    /// Collect identifiers from an uncompressed airport file.
    ///
    /// `path` is only used for error reporting.
    pub fn parse_bytes(
        bytes: &[u8],
        path: &Path,
    ) -> Result<BTreeSet<AirportId>, ExtractionParseError> {
        for (magic, format) in FOREIGN_MAGIC {
            if bytes.starts_with(magic) {
                return Err(ExtractionParseError::ForeignFormat {
                    path: path.to_path_buf(),
                    format,
                });
            }
        }

        let (text, encoding) = decode_text(bytes);
        if encoding != TextEncoding::Utf8 {
            debug!(path = %path.display(), ?encoding, "Decoded airport file with fallback encoding");
        }

        Self::parse_str(&text, path)
    }

    /// Collect identifiers from decoded airport file text.
    pub fn parse_str(text: &str, path: &Path) -> Result<BTreeSet<AirportId>, ExtractionParseError> {
        let mut lines = text.trim_start_matches('\u{feff}').lines();

        let origin = lines.by_ref().map(str::trim).find(|l| !l.is_empty());
        if !matches!(origin, Some("I") | Some("A") | Some("i") | Some("a")) {
            return Err(ExtractionParseError::MissingOrigin {
                path: path.to_path_buf(),
            });
        }

        let mut ids = BTreeSet::new();
        let mut airport_rows = 0usize;

        for line in lines {
            let mut fields = line.split_whitespace();
            let Some(code) = fields.next() else {
                continue;
            };

            if code == END_ROW_CODE {
                break;
            }
            if !AIRPORT_ROW_CODES.contains(&code) {
                continue;
            }

            airport_rows += 1;
            match fields.nth(IDENTIFIER_FIELD - 1) {
                Some(id) => {
                    ids.insert(AirportId::new(id));
                }
                None => trace!(path = %path.display(), line, "Truncated airport row"),
            }
        }

        if airport_rows > 0 && ids.is_empty() {
            return Err(ExtractionParseError::TruncatedRows {
                path: path.to_path_buf(),
                rows: airport_rows,
            });
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SAMPLE: &str = "I
1100 Generated by WorldEditor

1    433 0 0 KSEA Seattle Tacoma Intl
100 45.72 1 0 0.25 0 2 1 16L 47.46 -122.31
16   0 0 0 W55 Lake Union Seaplane Base
17   0 0 0 WA09 Harborview Heliport
1302 datum_lat 47.449
99
";

    fn ids(set: &BTreeSet<AirportId>) -> Vec<&str> {
        set.iter().map(AirportId::as_str).collect()
    }

    #[test]
    fn test_collects_all_airport_row_kinds() {
        let set = AptDatParser::parse_str(SAMPLE, Path::new("apt.dat")).unwrap();
        assert_eq!(ids(&set), vec!["KSEA", "W55", "WA09"]);
    }

    #[test]
    fn test_ignores_rows_after_end_marker() {
        let text = "I\n1000 Version\n1 0 0 0 KAAA A\n99\n1 0 0 0 KBBB B\n";
        let set = AptDatParser::parse_str(text, Path::new("apt.dat")).unwrap();
        assert_eq!(ids(&set), vec!["KAAA"]);
    }

    #[test]
    fn test_unknown_row_codes_are_inert() {
        let text = "A\n1000 Version\n9999 whatever\n1000 x\n";
        let set = AptDatParser::parse_str(text, Path::new("apt.dat")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_missing_origin_rejected() {
        let err = AptDatParser::parse_str("1 0 0 0 KSEA x\n", Path::new("apt.dat")).unwrap_err();
        assert!(matches!(err, ExtractionParseError::MissingOrigin { .. }));
    }

    #[test]
    fn test_all_truncated_rows_rejected() {
        let text = "I\n1000 Version\n1 0 0\n16\n";
        let err = AptDatParser::parse_str(text, Path::new("apt.dat")).unwrap_err();
        assert!(matches!(
            err,
            ExtractionParseError::TruncatedRows { rows: 2, .. }
        ));
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let err = AptDatParser::parse_bytes(b"XPLNEDSF\x01\x00\x00\x00", Path::new("apt.dat"))
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionParseError::ForeignFormat { format: "DSF", .. }
        ));
    }

    #[test]
    fn test_windows_1252_fallback() {
        // 0x80 is the euro sign in Windows-1252 and invalid UTF-8
        let mut bytes = b"I\n1000 Version\n1 0 0 0 LFPG Paris ".to_vec();
        bytes.push(0x80);
        bytes.push(b'\n');

        let (text, encoding) = decode_text(&bytes);
        assert_eq!(encoding, TextEncoding::Windows1252);
        assert!(text.contains('\u{20AC}'));

        let set = AptDatParser::parse_bytes(&bytes, Path::new("apt.dat")).unwrap();
        assert_eq!(ids(&set), vec!["LFPG"]);
    }

    #[test]
    fn test_latin1_fallback_for_undefined_cp1252_bytes() {
        let bytes = [b'I', b'\n', 0x81, b'\n'];
        let (_, encoding) = decode_text(&bytes);
        assert_eq!(encoding, TextEncoding::Latin1);
    }

    #[test]
    fn test_parse_gzip_file() {
        let temp = TempDir::new().unwrap();
        let path: PathBuf = temp.path().join("apt.dat.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let set = AptDatParser::parse_file(&path).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = AptDatParser::parse_file(&temp.path().join("apt.dat")).unwrap_err();
        assert!(matches!(err, ExtractionParseError::Io { .. }));
    }
}
