use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::{AppError, AppResult};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Check a payment callback body against its hex encoded HMAC-SHA256 signature.
pub fn verify_signature(secret: &SecretString, body: &[u8], signature: Option<&str>) -> AppResult<()> {
    let signature = signature
        .map(|s| s.trim().trim_start_matches("sha256="))
        .filter(|s| !s.is_empty())
        .ok_or(AppError::InvalidSignature)?;
    let expected = hex::decode(signature).map_err(|_| AppError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    mac.update(body);

    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| AppError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &SecretString, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn secret() -> SecretString {
        SecretString::from("whsec_test".to_string())
    }

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"payment_id":42,"status":"paid"}"#;
        let signature = sign(&secret(), body);
        assert!(verify_signature(&secret(), body, Some(&signature)).is_ok());
        let prefixed = format!("sha256={signature}");
        assert!(verify_signature(&secret(), body, Some(&prefixed)).is_ok());
    }

    #[test]
    fn rejects_tampered_body_and_missing_header() {
        let signature = sign(&secret(), br#"{"payment_id":42,"status":"paid"}"#);
        let tampered = br#"{"payment_id":43,"status":"paid"}"#;
        assert!(matches!(
            verify_signature(&secret(), tampered, Some(&signature)),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(&secret(), tampered, None),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(&secret(), tampered, Some("not-hex")),
            Err(AppError::InvalidSignature)
        ));
    }
}
