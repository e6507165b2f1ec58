//! AWS Signature Version 4 request signing.
//!
//! A [`Signer`] is bound to one credential set and one `region`/`service`
//! scope. It signs requests with a JSON body and the fixed header set
//! `content-type`, `host`, `x-amz-content-sha256`, `x-amz-date`, plus
//! `x-amz-security-token` for temporary credentials.

use super::types::{ProviderError, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use url::Url;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Long-lived or temporary AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Headers to attach to a signed request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub payload_hash: String,
    pub security_token: Option<String>,
}

/// Signs requests for a single service in a single region.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    credentials: &'a AwsCredentials,
    region: &'a str,
    service: &'a str,
}

impl<'a> Signer<'a> {
    pub fn new(credentials: &'a AwsCredentials, region: &'a str, service: &'a str) -> Self {
        Self {
            credentials,
            region,
            service,
        }
    }

    /// Signs a request with a JSON `payload` at time `now`.
    pub fn sign(&self, method: &str, url: &Url, payload: &[u8], now: DateTime<Utc>) -> Result<SignedHeaders> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let mut headers = BTreeMap::from([
            ("content-type", "application/json".to_string()),
            ("host", host_header(url)?),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", amz_date.clone()),
        ]);
        if let Some(token) = &self.credentials.session_token {
            headers.insert("x-amz-security-token", token.trim().to_string());
        }

        let signed_headers = headers.keys().copied().collect::<Vec<_>>().join(";");
        let header_lines: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let path = canonical_path(url);
        let query = canonical_query(url);
        let canonical_request = [
            method,
            path.as_str(),
            query.as_str(),
            header_lines.as_str(),
            signed_headers.as_str(),
            payload_hash.as_str(),
        ]
        .join("\n");

        let scope = self.scope(&date);
        let request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = [ALGORITHM, amz_date.as_str(), scope.as_str(), request_hash.as_str()].join("\n");

        let signature = hex::encode(mac(&self.signing_key(&date)?, string_to_sign.as_bytes())?);

        Ok(SignedHeaders {
            authorization: format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.access_key_id
            ),
            amz_date,
            payload_hash,
            security_token: self.credentials.session_token.clone(),
        })
    }

    fn scope(&self, date: &str) -> String {
        [date, self.region, self.service, SCOPE_TERMINATOR].join("/")
    }

    // kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")
    fn signing_key(&self, date: &str) -> Result<Vec<u8>> {
        let seed = format!("AWS4{}", self.credentials.secret_access_key).into_bytes();
        [date, self.region, self.service, SCOPE_TERMINATOR]
            .iter()
            .try_fold(seed, |key, part| mac(&key, part.as_bytes()))
    }
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| ProviderError::Other("Endpoint URL is missing a host".to_string()))?;
    Ok(url.port().map_or_else(|| host.to_string(), |port| format!("{host}:{port}")))
}

// `Url` already percent-encodes each segment; SigV4 encodes them again
// (every service except S3).
fn canonical_path(url: &Url) -> String {
    url.path().split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (uri_encode(&key), uri_encode(&value)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// RFC 3986 encoding with uppercase hex; only unreserved bytes pass through.
fn uri_encode(value: &str) -> String {
    value.bytes().fold(String::with_capacity(value.len()), |mut out, byte| {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte))
            }
            _ => {
                out.push('%');
                out.push_str(&hex::encode_upper([byte]));
            }
        }
        out
    })
}

fn mac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| ProviderError::Other(format!("Failed to initialize HMAC: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
