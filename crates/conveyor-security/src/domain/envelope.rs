//! The signed envelope wire format.
//!
//! This framing is the on-the-wire contract other implementations must match
//! byte for byte:
//!
//! ```text
//! u32-be body_len      ‖ body bytes
//! u32-be algorithm_len ‖ digest algorithm name (UTF-8)
//! u32-be signature_len ‖ signature bytes
//! u32-be cert_len      ‖ signer certificate bytes
//! ```
//!
//! Fields in this fixed order, no padding, no trailing bytes. Encoding is
//! deterministic and self-delimiting; decoding is strict and bounds-checked.

use super::errors::SecurityError;

/// Upper bound on any single framed field. Keeps a hostile length prefix
/// from forcing a multi-gigabyte allocation before verification has even
/// started.
pub const MAX_FIELD_LEN: u32 = 16 * 1024 * 1024;

/// A self-describing signed payload.
///
/// Constructed fresh per outbound message, consumed and discarded per
/// inbound message after verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// Raw payload bytes the signature covers.
    pub body: Vec<u8>,
    /// Wire name of the digest algorithm used before signing.
    pub algorithm: String,
    /// Signature over the digest of `body`.
    pub signature: Vec<u8>,
    /// Raw encoded certificate of the signer.
    pub certificate: Vec<u8>,
}

impl SignedEnvelope {
    /// Encode the envelope into its wire form.
    pub fn encode(&self) -> Result<Vec<u8>, SecurityError> {
        let mut out = Vec::with_capacity(
            16 + self.body.len()
                + self.algorithm.len()
                + self.signature.len()
                + self.certificate.len(),
        );
        put_field(&mut out, self.body.as_slice(), "body")?;
        put_field(&mut out, self.algorithm.as_bytes(), "algorithm")?;
        put_field(&mut out, self.signature.as_slice(), "signature")?;
        put_field(&mut out, self.certificate.as_slice(), "certificate")?;
        Ok(out)
    }

    /// Decode wire bytes produced by [`encode`](Self::encode).
    ///
    /// Rejects truncated frames, oversized length prefixes, non-UTF-8
    /// algorithm names, and trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SecurityError> {
        let mut offset = 0usize;
        let body = take_field(bytes, &mut offset, "body")?;
        let algorithm = take_field(bytes, &mut offset, "algorithm")?;
        let signature = take_field(bytes, &mut offset, "signature")?;
        let certificate = take_field(bytes, &mut offset, "certificate")?;

        if offset != bytes.len() {
            return Err(SecurityError::MalformedEnvelope(format!(
                "{} trailing bytes after certificate field",
                bytes.len() - offset
            )));
        }

        let algorithm = std::str::from_utf8(algorithm)
            .map_err(|_| {
                SecurityError::MalformedEnvelope("algorithm name is not UTF-8".to_owned())
            })?
            .to_owned();

        Ok(Self {
            body: body.to_vec(),
            algorithm,
            signature: signature.to_vec(),
            certificate: certificate.to_vec(),
        })
    }
}

fn put_field(out: &mut Vec<u8>, field: &[u8], what: &'static str) -> Result<(), SecurityError> {
    let len = u32::try_from(field.len())
        .ok()
        .filter(|len| *len <= MAX_FIELD_LEN)
        .ok_or_else(|| {
            SecurityError::MalformedEnvelope(format!("{what} field exceeds the frame limit"))
        })?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(field);
    Ok(())
}

fn take_field<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    what: &'static str,
) -> Result<&'a [u8], SecurityError> {
    let prefix_end = offset.checked_add(4).filter(|end| *end <= bytes.len());
    let prefix_end = prefix_end.ok_or_else(|| {
        SecurityError::MalformedEnvelope(format!("truncated {what} length prefix"))
    })?;

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&bytes[*offset..prefix_end]);
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FIELD_LEN {
        return Err(SecurityError::MalformedEnvelope(format!(
            "{what} field length {len} exceeds the frame limit"
        )));
    }

    let end = prefix_end
        .checked_add(len as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| SecurityError::MalformedEnvelope(format!("truncated {what} field")))?;

    let field = &bytes[prefix_end..end];
    *offset = end;
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignedEnvelope {
        SignedEnvelope {
            body: b"{\"task\":\"emails.send\"}".to_vec(),
            algorithm: "sha1".to_owned(),
            signature: vec![0xA5; 64],
            certificate: vec![0x0C; 120],
        }
    }

    /// Test: encode/decode round-trip
    #[test]
    fn test_roundtrip() {
        let envelope = sample();
        let wire = envelope.encode().unwrap();
        assert_eq!(SignedEnvelope::decode(&wire).unwrap(), envelope);
    }

    /// Test: the wire layout is exactly the documented field order
    #[test]
    fn test_wire_layout() {
        let envelope = SignedEnvelope {
            body: b"AB".to_vec(),
            algorithm: "sha1".to_owned(),
            signature: b"SS".to_vec(),
            certificate: b"C".to_vec(),
        };
        let wire = envelope.encode().unwrap();

        let expected: Vec<u8> = [
            &[0, 0, 0, 2][..],
            b"AB",
            &[0, 0, 0, 4][..],
            b"sha1",
            &[0, 0, 0, 2][..],
            b"SS",
            &[0, 0, 0, 1][..],
            b"C",
        ]
        .concat();
        assert_eq!(wire, expected);
    }

    /// Test: empty body frames cleanly
    #[test]
    fn test_empty_body() {
        let envelope = SignedEnvelope {
            body: Vec::new(),
            ..sample()
        };
        let wire = envelope.encode().unwrap();
        assert_eq!(SignedEnvelope::decode(&wire).unwrap().body, Vec::<u8>::new());
    }

    /// Test: truncation anywhere is rejected
    #[test]
    fn test_truncation_rejected() {
        let wire = sample().encode().unwrap();
        for end in 0..wire.len() {
            assert!(
                SignedEnvelope::decode(&wire[..end]).is_err(),
                "truncation at {end} went unnoticed"
            );
        }
    }

    /// Test: trailing bytes are rejected
    #[test]
    fn test_trailing_bytes_rejected() {
        let mut wire = sample().encode().unwrap();
        wire.push(0x00);
        let err = SignedEnvelope::decode(&wire).unwrap_err();
        assert!(matches!(err, SecurityError::MalformedEnvelope(_)));
    }

    /// Test: an oversized length prefix is rejected before allocation
    #[test]
    fn test_oversized_length_prefix_rejected() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&u32::MAX.to_be_bytes());
        let err = SignedEnvelope::decode(&wire).unwrap_err();
        assert!(matches!(err, SecurityError::MalformedEnvelope(_)));
    }

    /// Test: a non-UTF-8 algorithm name is rejected
    #[test]
    fn test_non_utf8_algorithm_rejected() {
        let envelope = sample();
        let mut wire = Vec::new();
        for field in [
            envelope.body.as_slice(),
            &[0xFF, 0xFE],
            envelope.signature.as_slice(),
            envelope.certificate.as_slice(),
        ] {
            wire.extend_from_slice(&(field.len() as u32).to_be_bytes());
            wire.extend_from_slice(field);
        }
        let err = SignedEnvelope::decode(&wire).unwrap_err();
        assert!(matches!(err, SecurityError::MalformedEnvelope(_)));
    }
}
