//! Binary checkpoint codec
//!
//! Layout, all integers u64 little-endian, doubles raw f64 little-endian:
//!
//! ```text
//! iteration
//! [rng_len, rng_bytes]            sampling solver only
//! node_count
//! node_count × {
//!     key_len, key_bytes
//!     regret_len, regret f64 × regret_len
//!     strategy_len, strategy f64 × strategy_len
//! }
//! ```
//!
//! There is no header or version: the reader must know whether the producing
//! solver stored an RNG state.

use crate::error::CheckpointError;
use crate::node::{InfoSetNode, NodeTable};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAX_KEY_LEN: u64 = 1 << 20;
const MAX_VECTOR_LEN: u64 = 1 << 16;
const MAX_RNG_LEN: u64 = 1 << 16;

/// Decoded checkpoint contents
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub iteration: u64,
    pub rng_state: Option<String>,
    pub table: NodeTable,
}

/// Encode a checkpoint into `writer`
pub fn write_checkpoint<W: Write>(
    writer: &mut W,
    iteration: u64,
    rng_state: Option<&str>,
    table: &NodeTable,
) -> Result<(), CheckpointError> {
    writer.write_u64::<LE>(iteration)?;
    if let Some(state) = rng_state {
        writer.write_u64::<LE>(state.len() as u64)?;
        writer.write_all(state.as_bytes())?;
    }
    writer.write_u64::<LE>(table.len() as u64)?;
    for (key, node) in table.iter() {
        writer.write_u64::<LE>(key.len() as u64)?;
        writer.write_all(key.as_bytes())?;
        write_vector(writer, node.regret_sum())?;
        write_vector(writer, node.strategy_sum())?;
    }
    writer.flush()?;
    Ok(())
}

/// Decode a checkpoint from `reader`.
///
/// Restored nodes carry no actions until a traversal visits them again.
pub fn read_checkpoint<R: Read>(reader: &mut R, with_rng: bool) -> Result<Checkpoint, CheckpointError> {
    let iteration = reader.read_u64::<LE>()?;
    let rng_state = if with_rng {
        let len = bounded_len(reader, MAX_RNG_LEN, "rng state")?;
        Some(read_string(reader, len)?)
    } else {
        None
    };

    let count = reader.read_u64::<LE>()?;
    let mut table = NodeTable::new();
    for _ in 0..count {
        let key_len = bounded_len(reader, MAX_KEY_LEN, "key")?;
        let key = read_string(reader, key_len)?;
        let regret_sum = read_vector(reader)?;
        let strategy_sum = read_vector(reader)?;
        table.insert(key, InfoSetNode::restored(regret_sum, strategy_sum));
    }

    Ok(Checkpoint {
        iteration,
        rng_state,
        table,
    })
}

/// Write a checkpoint file at `path`.
///
/// The data goes to a sibling `.tmp` file first and is renamed over `path`
/// once flushed, so an existing checkpoint survives a failed write.
pub fn save(
    path: &Path,
    iteration: u64,
    rng_state: Option<&str>,
    table: &NodeTable,
) -> Result<(), CheckpointError> {
    let staging = path.with_extension("tmp");
    let written = File::create(&staging)
        .map_err(CheckpointError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_checkpoint(&mut writer, iteration, rng_state, table)?;
            writer.flush()?;
            Ok(())
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    fs::rename(&staging, path)?;
    Ok(())
}

/// Read a checkpoint file from `path`
pub fn load(path: &Path, with_rng: bool) -> Result<Checkpoint, CheckpointError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_checkpoint(&mut reader, with_rng)
}

fn write_vector<W: Write>(writer: &mut W, values: &[f64]) -> Result<(), CheckpointError> {
    writer.write_u64::<LE>(values.len() as u64)?;
    for &value in values {
        writer.write_f64::<LE>(value)?;
    }
    Ok(())
}

fn read_vector<R: Read>(reader: &mut R) -> Result<Vec<f64>, CheckpointError> {
    let len = bounded_len(reader, MAX_VECTOR_LEN, "vector")?;
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(reader.read_f64::<LE>()?);
    }
    Ok(values)
}

fn bounded_len<R: Read>(reader: &mut R, max: u64, what: &str) -> Result<usize, CheckpointError> {
    let len = reader.read_u64::<LE>()?;
    if len > max {
        return Err(CheckpointError::Corrupt(format!("{what} length {len} exceeds {max}")));
    }
    Ok(len as usize)
}

fn read_string<R: Read>(reader: &mut R, len: usize) -> Result<String, CheckpointError> {
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| CheckpointError::Corrupt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Action;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn sample_table() -> NodeTable {
        let mut table = NodeTable::new();
        let a = table.get_or_insert_with("p0_s3_pot10".into(), || {
            InfoSetNode::new(vec![Action::Fold, Action::Call(5.0)])
        });
        table.node_mut(a).update_regret(&[-0.1, 1.0 / 3.0]);
        table.node_mut(a).update_strategy_sum(&[0.25, f64::MIN_POSITIVE]);
        let b = table.get_or_insert_with("p1_s3_pot20".into(), || {
            InfoSetNode::new(vec![Action::Fold, Action::Call(5.0), Action::Raise(20.0)])
        });
        table.node_mut(b).update_regret(&[1e300, -7.5, 0.0]);
        table
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        let table = sample_table();
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, 42, None, &table).unwrap();

        let restored = read_checkpoint(&mut Cursor::new(bytes), false).unwrap();
        assert_eq!(restored.iteration, 42);
        assert!(restored.rng_state.is_none());
        assert_eq!(restored.table.len(), table.len());
        for (key, node) in table.iter() {
            let loaded = restored.table.get(key).unwrap();
            assert!(loaded.actions().is_empty());
            for (a, b) in node.regret_sum().iter().zip(loaded.regret_sum()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
            for (a, b) in node.strategy_sum().iter().zip(loaded.strategy_sum()) {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let table = sample_table();
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, 1, None, &table).unwrap();
        let restored = read_checkpoint(&mut Cursor::new(bytes), false).unwrap();
        let before: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        let after: Vec<&str> = restored.table.iter().map(|(k, _)| k).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rng_state_section() {
        let table = sample_table();
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, 7, Some("{\"seed\":[1,2,3]}"), &table).unwrap();
        let restored = read_checkpoint(&mut Cursor::new(bytes), true).unwrap();
        assert_eq!(restored.rng_state.as_deref(), Some("{\"seed\":[1,2,3]}"));
        assert_eq!(restored.table.len(), 2);
    }

    #[test]
    fn test_layout_of_empty_table() {
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, 3, None, &NodeTable::new()).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &3u64.to_le_bytes());
        assert_eq!(&bytes[8..], &0u64.to_le_bytes());
    }

    #[test]
    fn test_truncated_stream_fails() {
        let mut bytes = Vec::new();
        write_checkpoint(&mut bytes, 9, None, &sample_table()).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            read_checkpoint(&mut Cursor::new(bytes), false),
            Err(CheckpointError::Io(_))
        ));
    }

    #[test]
    fn test_absurd_length_is_corrupt() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            read_checkpoint(&mut Cursor::new(bytes), false),
            Err(CheckpointError::Corrupt(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.bin");
        assert!(matches!(load(&path, false), Err(CheckpointError::Io(_))));
    }

    #[test]
    fn test_save_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.bin");
        save(&path, 3, None, &NodeTable::new()).unwrap();
        save(&path, 9, None, &sample_table()).unwrap();

        let loaded = load(&path, false).unwrap();
        assert_eq!(loaded.iteration, 9);
        assert_eq!(loaded.table.len(), 2);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint.bin");
        save(&path, 3, None, &sample_table()).unwrap();

        // A directory in the staging slot makes the write fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(save(&path, 9, None, &NodeTable::new()).is_err());

        let loaded = load(&path, false).unwrap();
        assert_eq!(loaded.iteration, 3);
        assert_eq!(loaded.table.len(), 2);
    }
}
