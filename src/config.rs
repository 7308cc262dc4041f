use chrono::Duration;
use thiserror::Error;

/// 予約ポリシー
///
/// 上限や期間はグローバル定数ではなく、サービスの依存関係として明示的に渡す。
/// テストごとにポリシーを変えられる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPolicy {
    /// 読者1人あたりの有効な予約（Issued, Extended）の上限
    pub max_active_reservations: usize,
    /// 貸出期間（日数）
    pub issue_period_days: u32,
    /// 延長期間（日数）
    pub extension_period_days: u32,
}

impl ReservationPolicy {
    pub fn issue_period(&self) -> Duration {
        Duration::days(i64::from(self.issue_period_days))
    }

    pub fn extension_period(&self) -> Duration {
        Duration::days(i64::from(self.extension_period_days))
    }
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            max_active_reservations: 5,
            issue_period_days: 14,
            extension_period_days: 7,
        }
    }
}

/// 設定読み込みのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub policy: ReservationPolicy,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// 未設定の項目はデフォルト値を使う。数値として解釈できない値はエラー。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReservationPolicy::default();

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "postgres://localhost/library".to_string());
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;

        let policy = ReservationPolicy {
            max_active_reservations: parse_or(
                &lookup,
                "RESERVATION_MAX_ACTIVE",
                defaults.max_active_reservations,
            )?,
            issue_period_days: parse_or(
                &lookup,
                "RESERVATION_ISSUE_DAYS",
                defaults.issue_period_days,
            )?,
            extension_period_days: parse_or(
                &lookup,
                "RESERVATION_EXTENSION_DAYS",
                defaults.extension_period_days,
            )?,
        };

        Ok(Self {
            database_url,
            max_connections,
            policy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
