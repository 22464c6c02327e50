// Shared module: 도메인 간 공유 인프라 (DB, 에러, 미들웨어, 상태)
pub mod middleware;
pub mod database;
pub mod errors;
pub mod services;
pub mod utils;
