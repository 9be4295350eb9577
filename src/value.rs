//! Value codec
//!
//! A day's slices (label → activity) are stored as bincode bytes. The engine
//! itself only sees opaque bytes.

use std::collections::BTreeMap;

use crate::error::Result;

/// Slice label (`HHhMM`) → activity, empty string when untagged
pub type Slices = BTreeMap<String, String>;

/// Serialize a day's slices for storage
pub fn encode_slices(slices: &Slices) -> Result<Vec<u8>> {
    Ok(bincode::serialize(slices)?)
}

/// Deserialize bytes written by [`encode_slices`]
pub fn decode_slices(bytes: &[u8]) -> Result<Slices> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimeslicerError;

    #[test]
    fn test_slices_survive_encoding() {
        let mut slices = Slices::new();
        slices.insert("08h00".to_string(), "work".to_string());
        slices.insert("08h30".to_string(), String::new());

        let bytes = encode_slices(&slices).unwrap();
        assert_eq!(decode_slices(&bytes).unwrap(), slices);
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        let err = decode_slices(&[0xFF; 3]).unwrap_err();
        assert!(matches!(err, TimeslicerError::Serialization(_)));
    }
}
