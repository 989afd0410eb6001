use crate::bio::sequence::SequenceRecord;
use crate::error::{Result, SeqpickError};
use flate2::read::GzDecoder;
use memmap2::Mmap;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{line_ending, not_line_ending},
    combinator::opt,
    IResult,
};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Residues per line in written FASTA
pub const DEFAULT_LINE_WIDTH: usize = 60;

/// Parse a FASTA header line, keeping the bytes after `>` verbatim
fn parse_header(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, _) = tag(b">")(input)?;
    let (input, header) = not_line_ending(input)?;
    let (input, _) = opt(line_ending)(input)?;
    Ok((input, header))
}

/// Parse sequence lines until next header or EOF
fn parse_sequence(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    let mut sequence = Vec::new();
    let mut remaining = input;

    while !remaining.is_empty() && remaining[0] != b'>' {
        let (rest, line) =
            take_till::<_, _, nom::error::Error<_>>(|c: u8| c == b'\n' || c == b'\r')(remaining)?;
        let (rest, _) = opt(line_ending)(rest)?;

        sequence.extend(line.iter().copied().filter(|c| !c.is_ascii_whitespace()));

        // A lone '\r' is not a line_ending for nom
        remaining = match rest.first() {
            Some(b'\r') => &rest[1..],
            _ => rest,
        };
    }

    Ok((remaining, sequence))
}

/// Parse a single FASTA record
fn parse_record(input: &[u8]) -> IResult<&[u8], SequenceRecord> {
    let (input, header) = parse_header(input)?;
    let (input, sequence) = parse_sequence(input)?;
    Ok((input, SequenceRecord::from_header(header, sequence)))
}

/// Parse FASTA from bytes
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<SequenceRecord>> {
    let mut input = data;
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    while !input.is_empty() {
        while !input.is_empty() && input[0].is_ascii_whitespace() {
            input = &input[1..];
        }

        if input.is_empty() {
            break;
        }

        if input[0] != b'>' {
            let line = input.split(|&c| c == b'\n').next().unwrap_or_default();
            return Err(SeqpickError::Parse(format!(
                "Expected FASTA header, found '{}'",
                String::from_utf8_lossy(line).trim()
            )));
        }

        let (remaining, record) = parse_record(input)
            .map_err(|e| SeqpickError::Parse(format!("Failed to parse FASTA: {:?}", e)))?;
        input = remaining;

        if record.id.is_empty() {
            return Err(SeqpickError::Parse("FASTA record with empty id".to_string()));
        }
        if !seen.insert(record.id.clone()) {
            return Err(SeqpickError::Parse(format!(
                "Duplicate sequence id '{}'",
                record.id
            )));
        }
        if record.is_empty() {
            tracing::warn!("Skipping record '{}' with empty sequence", record.id);
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Parse a FASTA file into records (supports .gz compression)
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SeqpickError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }

    if is_gzip(path) {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut buffer = Vec::new();
        decoder.read_to_end(&mut buffer)?;
        parse_fasta_from_bytes(&buffer)
    } else {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }
        let mmap = unsafe { Mmap::map(&file)? };
        parse_fasta_from_bytes(&mmap[..])
    }
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

/// Write records to a FASTA file (supports .gz compression)
pub fn write_fasta<P: AsRef<Path>>(path: P, records: &[SequenceRecord]) -> Result<()> {
    write_fasta_with_width(path, records, DEFAULT_LINE_WIDTH)
}

pub fn write_fasta_with_width<P: AsRef<Path>>(
    path: P,
    records: &[SequenceRecord],
    line_width: usize,
) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;

    if is_gzip(path) {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = BufWriter::new(encoder);
        write_fasta_to_writer(&mut writer, records, line_width)?;
        writer.into_inner().map_err(|e| e.into_error())?.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_fasta_to_writer(&mut writer, records, line_width)?;
        writer.flush()?;
    }

    Ok(())
}

/// Write records to any writer. A `line_width` of 0 writes each sequence on one line.
pub fn write_fasta_to_writer<W: Write>(
    writer: &mut W,
    records: &[SequenceRecord],
    line_width: usize,
) -> Result<()> {
    for record in records {
        writer.write_all(b">")?;
        writer.write_all(&record.header)?;
        writeln!(writer)?;
        if line_width == 0 {
            writer.write_all(&record.sequence)?;
            writeln!(writer)?;
            continue;
        }
        for chunk in record.sequence.chunks(line_width) {
            writer.write_all(chunk)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Pick records by id, in the order the ids are given
pub fn select_by_ids(records: &[SequenceRecord], ids: &[String]) -> Result<Vec<SequenceRecord>> {
    let by_id: HashMap<&str, &SequenceRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();

    ids.iter()
        .map(|id| {
            by_id
                .get(id.as_str())
                .map(|r| (*r).clone())
                .ok_or_else(|| SeqpickError::Parse(format!("Sequence id '{}' not found", id)))
        })
        .collect()
}

/// Write the records of `input_fasta` whose ids appear in `ids` to `output_fasta`,
/// in the order of `ids`. Returns the number of records written.
pub fn filter_fasta_by_ids<P: AsRef<Path>, Q: AsRef<Path>>(
    input_fasta: P,
    ids: &[String],
    output_fasta: Q,
) -> Result<usize> {
    let records = parse_fasta(input_fasta)?;
    let selected = select_by_ids(&records, ids)?;
    write_fasta(output_fasta, &selected)?;
    Ok(selected.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header_keeps_full_line() {
        let input = b">sp|P12345|PROTEIN_HUMAN Description  here\nACGT";
        let (remaining, header) = parse_header(input).unwrap();
        assert_eq!(header, b"sp|P12345|PROTEIN_HUMAN Description  here");
        assert_eq!(remaining, b"ACGT");
    }

    #[test]
    fn test_parse_multiline_records() {
        let data = b">seq1 first\nMSLL\nPTPT\n\n>seq2\r\nMKSI\r\nNRT\r\n";
        let records = parse_fasta_from_bytes(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].header_str(), "seq1 first");
        assert_eq!(records[0].sequence, b"MSLLPTPT".to_vec());
        assert_eq!(records[1].id, "seq2");
        assert_eq!(records[1].sequence, b"MKSINRT".to_vec());
    }

    #[test]
    fn test_parse_header_without_trailing_newline() {
        let records = parse_fasta_from_bytes(b">a\nMK\n>b\nMV").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, b"MV".to_vec());
    }

    #[test]
    fn test_residue_case_is_preserved() {
        let records = parse_fasta_from_bytes(b">a\nmkVl\n").unwrap();
        assert_eq!(records[0].sequence, b"mkVl".to_vec());
    }

    #[test]
    fn test_non_utf8_header_is_kept_byte_for_byte() {
        let data = b">seq1 prot\xe9ine kinase\nMKVL\n>seq2\nMKVI\n";
        let records = parse_fasta_from_bytes(data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "seq1");
        assert_eq!(records[0].header, b"seq1 prot\xe9ine kinase".to_vec());

        let mut out = Vec::new();
        write_fasta_to_writer(&mut out, &records, 60).unwrap();
        assert_eq!(out, data.to_vec());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = parse_fasta_from_bytes(b">a\nMK\n>a desc\nMV\n").unwrap_err();
        assert!(matches!(err, SeqpickError::Parse(msg) if msg.contains("Duplicate")));
    }

    #[test]
    fn test_garbage_before_header_rejected() {
        let err = parse_fasta_from_bytes(b"MKV\n>a\nMK\n").unwrap_err();
        assert!(matches!(err, SeqpickError::Parse(_)));
    }

    #[test]
    fn test_write_wraps_lines() {
        let rec = SequenceRecord::from_header("x desc", b"ABCDEFG".to_vec());
        let mut out = Vec::new();
        write_fasta_to_writer(&mut out, &[rec], 3).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">x desc\nABC\nDEF\nG\n");
    }

    #[test]
    fn test_select_by_ids_follows_requested_order() {
        let records = vec![
            SequenceRecord::new("a", b"M".to_vec()),
            SequenceRecord::new("b", b"K".to_vec()),
            SequenceRecord::new("c", b"V".to_vec()),
        ];
        let picked = select_by_ids(&records, &["c".to_string(), "a".to_string()]).unwrap();
        let ids: Vec<_> = picked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        assert!(select_by_ids(&records, &["zz".to_string()]).is_err());
    }

    #[test]
    fn test_gzip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fasta.gz");
        let records = vec![SequenceRecord::from_header("g1 gz record", b"MKVLA".to_vec())];
        write_fasta(&path, &records).unwrap();
        let back = parse_fasta(&path).unwrap();
        assert_eq!(back, records);
    }
}
