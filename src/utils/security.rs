use base64::Engine;
use base64::engine::general_purpose;
use hmac::Hmac;
use hmac::Mac;
use pbkdf2::pbkdf2_hmac;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const TOKEN_PREFIX: &str = "MS ";
const TOKEN_TTL_SECS: u64 = 24 * 3600;

pub fn b64_encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn b64_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

pub fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    OsRng.try_fill_bytes(&mut salt).unwrap();
    salt
}

pub fn hash_password(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut hash = vec![0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, 10_000, &mut hash);
    hash
}

/// Hash a password with a fresh random salt, returns "hex(salt)$hex(hash)".
pub fn store_password(password: &str) -> String {
    let salt = generate_salt();
    let hashed = hash_password(password, &salt);
    format!("{}${}", hex::encode(salt), hex::encode(hashed))
}

pub fn check_password(stored: &str, password: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 2 {
        return false;
    }
    let (Ok(salt), Ok(stored_hash)) = (hex::decode(parts[0]), hex::decode(parts[1])) else {
        return false;
    };
    let new_hash = hash_password(password, &salt);
    new_hash == stored_hash
}

// PBKDF2 is CPU-heavy, keep it off the async workers.

pub async fn store_password_async(password: String) -> String {
    tokio::task::spawn_blocking(move || store_password(&password))
        .await
        .expect("blocking task panicked")
}

pub async fn check_password_async(stored: String, password: String) -> bool {
    tokio::task::spawn_blocking(move || check_password(&stored, &password))
        .await
        .expect("blocking task panicked")
}

#[derive(Debug)]
pub struct DecodedToken {
    pub user_id: i64,
    pub is_expired: bool,
    pub expiration_timestamp: u64,
}

fn hmac_sha256_b64(message: &str, signature_key: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signature_key.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    let result = mac.finalize().into_bytes();
    general_purpose::STANDARD.encode(result)
}

fn verify_hmac_b64(message: &str, sig_b64: &str, signature_key: &str) -> bool {
    let expected = hmac_sha256_b64(message, signature_key);
    expected.eq(sig_b64)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issue a signed bearer token for `user_id`, valid for 24 hours.
pub fn generate_token(user_id: i64, signature_key: &str) -> String {
    let expiration = now_secs() + TOKEN_TTL_SECS;

    let combined = format!("{}\0{}", user_id, expiration);
    let payload = b64_encode(combined.as_bytes());
    let signature = hmac_sha256_b64(&payload, signature_key);

    format!("{}{}.{}", TOKEN_PREFIX, payload, signature)
}

pub fn decode_token(token: &str, signature_key: &str) -> Result<DecodedToken, &'static str> {
    let Some(t) = token.strip_prefix(TOKEN_PREFIX) else {
        return Err("INVALID_TOKEN");
    };

    // split last '.' for signature
    let parts_rev: Vec<&str> = t.rsplitn(2, '.').collect();
    if parts_rev.len() != 2 {
        return Err("INVALID_TOKEN_FORMAT");
    }
    // rsplitn produced [signature, payload]
    let signature = parts_rev[0];
    let payload = parts_rev[1];

    if !verify_hmac_b64(payload, signature, signature_key) {
        return Err("INVALID_SIGNATURE");
    }

    let decoded = b64_decode(payload)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
        .ok_or("DECODE_ERROR")?;

    let parts: Vec<&str> = decoded.split('\0').collect();
    if parts.len() != 2 {
        return Err("DECODE_ERROR");
    }

    let user_id: i64 = parts[0].parse().map_err(|_| "DECODE_ERROR")?;
    let expiration_ts: u64 = parts[1].parse().map_err(|_| "DECODE_ERROR")?;

    Ok(DecodedToken {
        user_id,
        is_expired: now_secs() > expiration_ts,
        expiration_timestamp: expiration_ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-signature-key";

    #[test]
    fn token_round_trip() {
        let token = generate_token(42, KEY);
        let decoded = decode_token(&token, KEY).unwrap();
        assert_eq!(decoded.user_id, 42);
        assert!(!decoded.is_expired);
        assert!(decoded.expiration_timestamp > now_secs());
    }

    #[test]
    fn token_rejects_tampered_signature() {
        let token = generate_token(42, KEY);
        let mut forged = token[..token.len() - 2].to_string();
        forged.push_str("xx");
        assert!(decode_token(&forged, KEY).is_err());
    }

    #[test]
    fn token_rejects_wrong_key() {
        let token = generate_token(42, KEY);
        assert!(decode_token(&token, "other-key").is_err());
    }

    #[test]
    fn expired_token_is_flagged() {
        // Well-signed token whose expiry is already in the past.
        let expiration = now_secs() - 60;
        let payload = b64_encode(format!("{}\0{}", 42, expiration).as_bytes());
        let signature = hmac_sha256_b64(&payload, KEY);
        let token = format!("{}{}.{}", TOKEN_PREFIX, payload, signature);

        let decoded = decode_token(&token, KEY).unwrap();
        assert_eq!(decoded.user_id, 42);
        assert!(decoded.is_expired);
        assert_eq!(decoded.expiration_timestamp, expiration);
    }

    #[test]
    fn token_rejects_missing_prefix() {
        let token = generate_token(42, KEY);
        assert!(decode_token(&token[3..], KEY).is_err());
    }

    #[test]
    fn password_round_trip() {
        let stored = store_password("hunter22");
        assert!(check_password(&stored, "hunter22"));
        assert!(!check_password(&stored, "hunter23"));
    }

    #[test]
    fn password_hashes_are_salted() {
        assert_ne!(store_password("same"), store_password("same"));
    }

    #[test]
    fn malformed_stored_hash_never_matches() {
        assert!(!check_password("not-a-hash", "anything"));
        assert!(!check_password("zz$zz", "anything"));
    }
}
