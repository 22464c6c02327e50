/// 공유 유틸리티 모듈
/// Shared Utilities Module
///
/// 역할:
/// - 세션 식별자 생성 (refresh id, family id, activation token)
/// - 저장용 해시 함수
pub mod id_generator;

pub use id_generator::*;
