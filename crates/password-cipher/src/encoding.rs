//! Base64 engines for keys and encoded ciphertexts.
//!
//! Output is always standard padded base64. Input may omit the `=` padding,
//! as `java.util.Base64` and browser `atob` both accept.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD},
        DecodePaddingMode,
    },
    DecodeError, Engine as _,
};

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub(crate) fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn decode(encoded: &str) -> Result<Vec<u8>, DecodeError> {
    LENIENT.decode(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_padding() {
        assert_eq!(encode(b"ab"), "YWI=");
    }

    #[test]
    fn decodes_with_or_without_padding() {
        assert_eq!(decode("YWI=").unwrap(), b"ab");
        assert_eq!(decode("YWI").unwrap(), b"ab");
    }

    #[test]
    fn rejects_other_alphabets_and_garbage() {
        assert!(decode("-_-_").is_err());
        assert!(decode("!!!").is_err());
    }
}
