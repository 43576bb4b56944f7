//! Secret data encoding.
//!
//! Stateless conversions between plaintext config data and the byte-oriented
//! secret data field.

use std::collections::BTreeMap;

use k8s_openapi::ByteString;

/// Convert plaintext entries to secret byte data.
pub fn encode(data: &BTreeMap<String, String>) -> BTreeMap<String, ByteString> {
    data.iter()
        .map(|(key, value)| (key.clone(), ByteString(value.clone().into_bytes())))
        .collect()
}

/// Convert secret byte data back to comparable plaintext entries.
pub fn decode(data: &BTreeMap<String, ByteString>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(key, value)| (key.clone(), String::from_utf8_lossy(&value.0).into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let data = plain(&[("address", "smtp.example.com"), ("port", "25")]);
        assert_eq!(decode(&encode(&data)), data);
    }

    #[test]
    fn test_encode_empty() {
        assert!(encode(&BTreeMap::new()).is_empty());
        assert!(decode(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_encode_bytes() {
        let encoded = encode(&plain(&[("port", "25")]));
        assert_eq!(encoded.get("port").unwrap().0, b"25");
    }

    #[test]
    fn test_decode_is_lossy_on_invalid_utf8() {
        let mut data = BTreeMap::new();
        data.insert("blob".to_string(), ByteString(vec![0xff, 0xfe]));
        let decoded = decode(&data);
        assert_eq!(decoded.get("blob").unwrap(), "\u{fffd}\u{fffd}");
    }
}
