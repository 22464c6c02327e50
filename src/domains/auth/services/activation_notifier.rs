use chrono::{DateTime, Utc};
use tracing::info;

/// 활성화 안내 발송기
/// Delivers account activation links
pub trait ActivationNotifier: Send + Sync {
    fn send_activation(&self, email: &str, token: &str, valid_until: DateTime<Utc>);
}

/// 로그로 활성화 링크 출력 (메일 발송 없음)
/// Logs the activation link instead of mailing it
pub struct LogActivationNotifier {
    base_url: String,
}

impl LogActivationNotifier {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn activation_link(&self, email: &str, token: &str) -> String {
        let base = format!("{}/api/auth/activate", self.base_url.trim_end_matches('/'));
        match reqwest::Url::parse_with_params(&base, &[("email", email), ("token", token)]) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}?email={}&token={}", base, email, token),
        }
    }
}

impl ActivationNotifier for LogActivationNotifier {
    fn send_activation(&self, email: &str, token: &str, valid_until: DateTime<Utc>) {
        info!(
            email,
            link = %self.activation_link(email, token),
            valid_until = %valid_until.to_rfc3339(),
            "activation link issued"
        );
    }
}
