use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single FASTA record.
///
/// `header` holds the raw bytes after the `>` exactly as they appeared in the input,
/// so written output reproduces them even when they are not valid UTF-8; `id` is the
/// first whitespace token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub header: Vec<u8>,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: Vec<u8>) -> Self {
        let id = id.into();
        Self {
            header: id.clone().into_bytes(),
            id,
            sequence,
        }
    }

    /// Build a record from a raw header line (without the leading `>`)
    pub fn from_header(header: impl Into<Vec<u8>>, sequence: Vec<u8>) -> Self {
        let header = header.into();
        let id = header
            .split(|b| b.is_ascii_whitespace())
            .find(|token| !token.is_empty())
            .map(|token| String::from_utf8_lossy(token).into_owned())
            .unwrap_or_default();
        Self {
            id,
            header,
            sequence,
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Header for display; invalid UTF-8 is replaced
    pub fn header_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header_splits_id() {
        let rec = SequenceRecord::from_header(
            "sp|P12345|PROT_HUMAN Some protein OS=Homo sapiens",
            b"MKV".to_vec(),
        );
        assert_eq!(rec.id, "sp|P12345|PROT_HUMAN");
        assert_eq!(rec.header_str(), "sp|P12345|PROT_HUMAN Some protein OS=Homo sapiens");
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn test_new_uses_id_as_header() {
        let rec = SequenceRecord::new("seq1", b"MSLL".to_vec());
        assert_eq!(rec.header, b"seq1".to_vec());
        assert!(!rec.is_empty());
    }

    #[test]
    fn test_latin1_header_keeps_bytes() {
        let rec = SequenceRecord::from_header(&b"seq1 prot\xe9ine"[..], b"MK".to_vec());
        assert_eq!(rec.id, "seq1");
        assert_eq!(rec.header, b"seq1 prot\xe9ine".to_vec());
        assert_eq!(rec.header_str(), "seq1 prot\u{fffd}ine");
    }
}
