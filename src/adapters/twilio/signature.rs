//! Twilio webhook signature verification.
//!
//! Twilio signs each webhook with `X-Twilio-Signature`: the base64 HMAC-SHA1,
//! keyed by the account auth token, of the full request URL followed by every
//! POST parameter name and value, sorted by name.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Verifies inbound webhook signatures.
#[derive(Clone)]
pub struct TwilioSignatureVerifier {
    auth_token: SecretString,
}

impl TwilioSignatureVerifier {
    pub fn new(auth_token: SecretString) -> Self {
        Self { auth_token }
    }

    /// Computes the expected signature for a request.
    pub fn sign(&self, url: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut payload = String::from(url);
        for (key, value) in sorted {
            payload.push_str(key);
            payload.push_str(value);
        }

        // HMAC accepts keys of any length.
        let mut mac = match HmacSha1::new_from_slice(self.auth_token.expose_secret().as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Checks a provided signature in constant time.
    pub fn verify(&self, url: &str, params: &[(String, String)], provided: &str) -> bool {
        let expected = self.sign(url, params);
        if expected.is_empty() {
            return false;
        }
        let valid: bool = expected.as_bytes().ct_eq(provided.trim().as_bytes()).into();
        if !valid {
            tracing::warn!(url, "invalid webhook signature");
        }
        valid
    }
}

impl std::fmt::Debug for TwilioSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSignatureVerifier")
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://desk.example.com/sms";

    fn verifier(token: &str) -> TwilioSignatureVerifier {
        TwilioSignatureVerifier::new(SecretString::new(token.to_string()))
    }

    fn params() -> Vec<(String, String)> {
        vec![
            ("To".to_string(), "+5511333330000".to_string()),
            ("From".to_string(), "+5511999990000".to_string()),
            ("Body".to_string(), "oi".to_string()),
        ]
    }

    fn reference_signature(token: &str, payload: &str) -> String {
        let mut mac = HmacSha1::new_from_slice(token.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn signs_url_and_sorted_params() {
        let expected = reference_signature(
            "secret",
            "https://desk.example.com/smsBodyoiFrom+5511999990000To+5511333330000",
        );

        assert_eq!(verifier("secret").sign(URL, &params()), expected);
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let mut reversed = params();
        reversed.reverse();

        let v = verifier("secret");
        assert_eq!(v.sign(URL, &params()), v.sign(URL, &reversed));
    }

    #[test]
    fn valid_signature_verifies() {
        let v = verifier("secret");
        let signature = v.sign(URL, &params());

        assert!(v.verify(URL, &params(), &signature));
    }

    #[test]
    fn tampered_body_fails() {
        let v = verifier("secret");
        let signature = v.sign(URL, &params());
        let mut tampered = params();
        tampered[2].1 = "1".to_string();

        assert!(!v.verify(URL, &tampered, &signature));
    }

    #[test]
    fn other_token_or_url_fails() {
        let signature = verifier("secret").sign(URL, &params());

        assert!(!verifier("other").verify(URL, &params(), &signature));
        assert!(!verifier("secret").verify("https://evil.example.com/sms", &params(), &signature));
        assert!(!verifier("secret").verify(URL, &params(), ""));
    }
}
