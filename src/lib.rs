// Library crate: 바이너리와 통합 테스트가 공유
pub mod config;
pub mod domains;
pub mod routes;
pub mod shared;
