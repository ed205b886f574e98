//! Transactions and their canonical wire format.

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::error::TxError;
use crate::types::Hash;

/// Width of a length prefix in the canonical encoding.
const LEN_PREFIX: usize = 2;

/// A record of key-value writes and reads, with the values the author
/// claims were in place before and after.
///
/// Fields are plain data; [`check`](Self::check) gates them before any use
/// in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub write_keys: Vec<Vec<u8>>,
    pub new_data: Vec<Vec<u8>>,
    pub old_data: Vec<Vec<u8>>,
    pub read_keys: Vec<Vec<u8>>,
    pub read_data: Vec<Vec<u8>>,
    /// Free-form blob; must stay empty in this configuration.
    pub arbitrary: Vec<u8>,
}

impl Transaction {
    /// Create a checked transaction.
    pub fn new(
        write_keys: Vec<Vec<u8>>,
        new_data: Vec<Vec<u8>>,
        old_data: Vec<Vec<u8>>,
        read_keys: Vec<Vec<u8>>,
        read_data: Vec<Vec<u8>>,
        arbitrary: Vec<u8>,
    ) -> Result<Self, TxError> {
        let tx = Self {
            write_keys,
            new_data,
            old_data,
            read_keys,
            read_data,
            arbitrary,
        };
        tx.check()?;
        Ok(tx)
    }

    /// Verify the shape invariants: equal field counts, empty `arbitrary`,
    /// and every length within the wire format's u16 prefixes.
    pub fn check(&self) -> Result<(), TxError> {
        let n = self.write_keys.len();
        if self.new_data.len() != n
            || self.old_data.len() != n
            || self.read_keys.len() != n
            || self.read_data.len() != n
        {
            return Err(TxError::FieldCountMismatch {
                write_keys: n,
                new_data: self.new_data.len(),
                old_data: self.old_data.len(),
                read_keys: self.read_keys.len(),
                read_data: self.read_data.len(),
            });
        }
        if !self.arbitrary.is_empty() {
            return Err(TxError::ArbitraryNotEmpty);
        }
        for column in [
            &self.write_keys,
            &self.new_data,
            &self.old_data,
            &self.read_keys,
            &self.read_data,
        ] {
            for field in column {
                if field.len() > u16::MAX as usize {
                    return Err(TxError::FieldTooLong { len: field.len() });
                }
            }
        }
        let len = self.encoded_len();
        if len > u16::MAX as usize {
            return Err(TxError::EncodingTooLong { len });
        }
        Ok(())
    }

    /// Number of bytes [`serialize`](Self::serialize) produces.
    pub fn encoded_len(&self) -> usize {
        let mut len = LEN_PREFIX;
        for i in 0..self.write_keys.len() {
            len += 5 * LEN_PREFIX
                + self.write_keys[i].len()
                + self.new_data[i].len()
                + self.old_data[i].len()
                + self.read_keys[i].len()
                + self.read_data[i].len();
        }
        len
    }

    /// Canonical little-endian encoding: a u16 key count, then per index
    /// five `(u16 length, bytes)` pairs in order write key, new value, old
    /// value, read key, read value.
    ///
    /// Canonical only for transactions that pass [`check`](Self::check).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&(self.write_keys.len() as u16).to_le_bytes());
        for i in 0..self.write_keys.len() {
            for field in [
                &self.write_keys[i],
                &self.new_data[i],
                &self.old_data[i],
                &self.read_keys[i],
                &self.read_data[i],
            ] {
                out.extend_from_slice(&(field.len() as u16).to_le_bytes());
                out.extend_from_slice(field);
            }
        }
        out
    }

    /// Exact inverse of [`serialize`](Self::serialize).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TxError> {
        let (tx, used) = Self::parse_prefix(bytes)?;
        if used != bytes.len() {
            return Err(TxError::TrailingBytes {
                len: bytes.len() - used,
            });
        }
        Ok(tx)
    }

    /// Parse one transaction off the front of `bytes`, returning it and the
    /// number of bytes consumed.
    pub fn parse_prefix(bytes: &[u8]) -> Result<(Self, usize), TxError> {
        let mut pos = 0usize;
        let num_keys = read_u16(bytes, &mut pos)? as usize;
        let mut tx = Transaction::default();
        for _ in 0..num_keys {
            tx.write_keys.push(read_field(bytes, &mut pos)?);
            tx.new_data.push(read_field(bytes, &mut pos)?);
            tx.old_data.push(read_field(bytes, &mut pos)?);
            tx.read_keys.push(read_field(bytes, &mut pos)?);
            tx.read_data.push(read_field(bytes, &mut pos)?);
        }
        Ok((tx, pos))
    }

    /// Keccak256 of the canonical encoding; the key under which payload
    /// offsets are tracked.
    pub fn fingerprint(&self) -> Hash {
        let mut hasher = Keccak::v256();
        hasher.update(&self.serialize());
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }
}

fn read_u16(bytes: &[u8], pos: &mut usize) -> Result<u16, TxError> {
    let end = *pos + LEN_PREFIX;
    let Some(slice) = bytes.get(*pos..end) else {
        return Err(TxError::Truncated {
            needed: end - bytes.len(),
        });
    };
    *pos = end;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

fn read_field(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, TxError> {
    let len = read_u16(bytes, pos)? as usize;
    let end = *pos + len;
    let Some(slice) = bytes.get(*pos..end) else {
        return Err(TxError::Truncated {
            needed: end - bytes.len(),
        });
    };
    *pos = end;
    Ok(slice.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction::new(
            vec![vec![1u8; 32], vec![2u8; 32]],
            vec![vec![3u8; 10], vec![4u8; 10]],
            vec![vec![5u8; 10], vec![6u8; 10]],
            vec![vec![7u8; 32], vec![8u8; 32]],
            vec![vec![9u8; 10], vec![10u8; 10]],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let tx = sample();
        let bytes = tx.serialize();
        assert_eq!(bytes.len(), tx.encoded_len());

        let decoded = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.serialize(), bytes);
    }

    #[test]
    fn round_trip_empty() {
        let tx = Transaction::default();
        let bytes = tx.serialize();
        assert_eq!(bytes, vec![0u8, 0u8]);
        assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut tx = sample();
        tx.write_keys.remove(0);
        assert!(matches!(
            tx.check(),
            Err(TxError::FieldCountMismatch { write_keys: 1, .. })
        ));

        let mut tx = sample();
        tx.read_data.push(vec![0u8; 4]);
        assert!(matches!(tx.check(), Err(TxError::FieldCountMismatch { .. })));
    }

    #[test]
    fn arbitrary_must_be_empty() {
        let mut tx = sample();
        tx.arbitrary = vec![0xFF];
        assert_eq!(tx.check(), Err(TxError::ArbitraryNotEmpty));
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let bytes = sample().serialize();
        for cut in [1, 2, 3, bytes.len() - 1] {
            assert!(matches!(
                Transaction::deserialize(&bytes[..cut]),
                Err(TxError::Truncated { .. })
            ));
        }
    }

    #[test]
    fn declared_length_beyond_buffer_is_rejected() {
        // one key, write-key field claims 100 bytes but carries 2
        let mut bytes = vec![1u8, 0u8];
        bytes.extend_from_slice(&100u16.to_le_bytes());
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        assert!(matches!(
            Transaction::deserialize(&bytes),
            Err(TxError::Truncated { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = sample().serialize();
        bytes.push(0x00);
        assert_eq!(
            Transaction::deserialize(&bytes),
            Err(TxError::TrailingBytes { len: 1 })
        );
    }

    #[test]
    fn parse_prefix_reports_consumption() {
        let tx = sample();
        let mut bytes = tx.serialize();
        let tail = sample().serialize();
        bytes.extend_from_slice(&tail);

        let (first, used) = Transaction::parse_prefix(&bytes).unwrap();
        assert_eq!(first, tx);
        assert_eq!(used, tx.encoded_len());
    }

    #[test]
    fn fingerprints_differ() {
        let a = sample();
        let mut b = sample();
        b.new_data[0][0] ^= 1;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
