// Domains module: 도메인별 모듈 (handlers, models, services, routes)
pub mod auth;
