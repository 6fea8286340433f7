//! Decoder for the `<BinaryFile>`-referenced connection stream: a contiguous
//! little-endian record stream, grounded on `shnn-storage`'s manual
//! byte-slice `from_le_bytes` decoding convention (see `vcsr.rs`).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use spinesplit_model::ConnectionInstance;

use crate::error::{ParseError, Result};

/// Read exactly `num_connections` records from `path`, each `src: u32, dst:
/// u32`, plus `delay: u32` iff `explicit_delay_flag` is set.
///
/// Each record is little-endian; the delay, when present, is an integer
/// sample stored verbatim as a `u32` and widened to `f64` for the in-memory
/// model (the binary format carries no distribution information — only a
/// realized delay value per connection).
pub fn read_binary_connections(
    path: &Path,
    num_connections: u32,
    explicit_delay_flag: bool,
) -> Result<Vec<ConnectionInstance>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let record_len = if explicit_delay_flag { 12 } else { 8 };
    let mut record = vec![0u8; record_len];
    let mut out = Vec::with_capacity(num_connections as usize);

    for index in 0..num_connections {
        match reader.read_exact(&mut record) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ParseError::TruncatedBinaryFile {
                    path: path.display().to_string(),
                    read: index,
                    expected: num_connections,
                })
            }
            Err(e) => return Err(ParseError::Io(e)),
        }

        let src = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
        let dst = u32::from_le_bytes([record[4], record[5], record[6], record[7]]);
        let delay = if explicit_delay_flag {
            Some(u32::from_le_bytes([record[8], record[9], record[10], record[11]]) as f64)
        } else {
            None
        };

        out.push(ConnectionInstance {
            index,
            src_neuron: src,
            dst_neuron: dst,
            delay,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn decodes_single_record_with_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conns.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(&0u32.to_le_bytes()).unwrap();
        file.write_all(&0u32.to_le_bytes()).unwrap();
        file.write_all(&5u32.to_le_bytes()).unwrap();
        drop(file);

        let instances = read_binary_connections(&path, 1, true).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].src_neuron, 0);
        assert_eq!(instances[0].dst_neuron, 0);
        assert_eq!(instances[0].delay, Some(5.0));
    }

    #[test]
    fn truncated_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conns.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(&0u32.to_le_bytes()).unwrap();
        drop(file);

        let err = read_binary_connections(&path, 2, false).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedBinaryFile { .. }));
    }

    #[test]
    fn decodes_without_delay_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conns.bin");
        let mut file = File::create(&path).unwrap();
        file.write_all(&1u32.to_le_bytes()).unwrap();
        file.write_all(&2u32.to_le_bytes()).unwrap();
        drop(file);

        let instances = read_binary_connections(&path, 1, false).unwrap();
        assert_eq!(instances[0].delay, None);
    }
}
