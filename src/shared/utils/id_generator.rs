//! 세션 식별자 생성기
//! Session identifier generator
//!
//! 역할:
//! - Refresh ID 생성 (토큰마다 고유)
//! - Family ID 생성 (로그인마다 고유, 회전 시 유지)
//! - 계정 활성화 토큰 생성
//!
//! 모든 식별자는 OS 난수 기반 256비트, URL-safe base64 (패딩 없음) 43자

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// 난수 바이트 수 (256 bits)
const ID_BYTES: usize = 32;

/// 랜덤 식별자 생성
/// Generate an opaque random identifier
pub fn random_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Refresh ID 생성
/// Generate a refresh id (one per ledger entry)
pub fn new_refresh_id() -> String {
    random_id()
}

/// Family ID 생성
/// Generate a family id (one per login event)
pub fn new_family_id() -> String {
    random_id()
}

/// 활성화 토큰 생성
/// Generate an account activation token
pub fn new_activation_token() -> String {
    random_id()
}

/// 저장용 SHA-256 해시 (hex)
/// Hash an identifier for database storage
///
/// DB 유출 시에도 원본 refresh id가 노출되지 않도록 해시만 저장
pub fn hash_identifier(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
