pub mod domain;
pub mod indicators;
pub mod ingest;
pub mod notify;
pub mod report;
pub mod screen;
pub mod time;

pub mod config {
    use crate::indicators::REQUIRED_BARS;
    use crate::screen::classifier::ClassifierConfig;
    use crate::screen::ScreenConfig;
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
    const DEFAULT_SMTP_PORT: u16 = 465;
    const DEFAULT_DATA_PROVIDER_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_LOG_FILE: &str = "niftybees_trades.log";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub email_sender: Option<String>,
        pub email_password: Option<String>,
        pub email_receivers: Vec<String>,
        pub smtp_host: String,
        pub smtp_port: u16,
        pub tickers: Option<Vec<String>>,
        pub support_threshold_pct: f64,
        pub rsi_lower: f64,
        pub rsi_upper: f64,
        pub min_history_bars: usize,
        pub accept_macd_continuation: bool,
        pub data_provider_base_url: String,
        pub data_provider_timeout_secs: u64,
        pub data_provider_retries: u32,
        pub data_provider_req_delay_ms: u64,
        /// `None` disables the file log.
        pub log_file: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Log file path alone, so a run can still log why the rest of the
        /// configuration was rejected.
        pub fn log_file_from_env() -> Option<String> {
            Self::log_file_from_lookup(|key| std::env::var(key).ok())
        }

        /// `LOG_FILE` set but empty disables the file log.
        pub fn log_file_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
            match lookup("LOG_FILE") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_string()),
                None => Some(DEFAULT_LOG_FILE.to_string()),
            }
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

            let settings = Self {
                email_sender: var("EMAIL_SENDER"),
                email_password: lookup("EMAIL_PASSWORD").filter(|v| !v.is_empty()),
                email_receivers: split_list(var("EMAIL_RECEIVERS").as_deref()),
                smtp_host: var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or(&var, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                tickers: var("TICKERS").map(|v| split_list(Some(&v))),
                support_threshold_pct: parse_or(&var, "SUPPORT_THRESHOLD_PCT", 3.0)?,
                rsi_lower: parse_or(&var, "RSI_LOWER", 30.0)?,
                rsi_upper: parse_or(&var, "RSI_UPPER", 50.0)?,
                min_history_bars: parse_or(&var, "MIN_HISTORY_BARS", REQUIRED_BARS)?,
                accept_macd_continuation: parse_or(&var, "ACCEPT_MACD_CONTINUATION", true)?,
                data_provider_base_url: var("DATA_PROVIDER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATA_PROVIDER_BASE_URL.to_string()),
                data_provider_timeout_secs: parse_or(&var, "DATA_PROVIDER_TIMEOUT_SECS", 30)?,
                data_provider_retries: parse_or(&var, "DATA_PROVIDER_RETRIES", 3)?,
                data_provider_req_delay_ms: parse_or(&var, "DATA_PROVIDER_REQ_DELAY_MS", 250)?,
                log_file: Self::log_file_from_lookup(&lookup),
                sentry_dsn: var("SENTRY_DSN"),
            };

            settings.classifier_config().validate()?;
            Ok(settings)
        }

        pub fn require_email_sender(&self) -> anyhow::Result<&str> {
            self.email_sender
                .as_deref()
                .context("EMAIL_SENDER is required")
        }

        pub fn require_email_password(&self) -> anyhow::Result<&str> {
            self.email_password
                .as_deref()
                .context("EMAIL_PASSWORD is required")
        }

        pub fn classifier_config(&self) -> ClassifierConfig {
            ClassifierConfig {
                support_threshold_pct: self.support_threshold_pct,
                rsi_lower: self.rsi_lower,
                rsi_upper: self.rsi_upper,
                accept_macd_continuation: self.accept_macd_continuation,
            }
        }

        pub fn screen_config(&self) -> ScreenConfig {
            ScreenConfig {
                min_history_bars: self.min_history_bars.max(REQUIRED_BARS),
                classifier: self.classifier_config(),
                request_delay: Duration::from_millis(self.data_provider_req_delay_ms),
            }
        }
    }

    fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match var(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key} has invalid value {raw:?}: {e}")),
            None => Ok(default),
        }
    }

    fn split_list(raw: Option<&str>) -> Vec<String> {
        raw.unwrap_or_default()
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn from(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let map: HashMap<String, String> = vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|k| map.get(k).cloned())
        }

        #[test]
        fn defaults_when_unset() {
            let s = from(&[]).unwrap();
            assert_eq!(s.smtp_host, "smtp.gmail.com");
            assert_eq!(s.smtp_port, 465);
            assert_eq!(s.support_threshold_pct, 3.0);
            assert_eq!((s.rsi_lower, s.rsi_upper), (30.0, 50.0));
            assert_eq!(s.min_history_bars, 200);
            assert!(s.accept_macd_continuation);
            assert!(s.tickers.is_none());
            assert!(s.email_receivers.is_empty());
            assert_eq!(s.log_file.as_deref(), Some("niftybees_trades.log"));
            assert!(s.require_email_sender().is_err());
        }

        #[test]
        fn parses_lists_and_thresholds() {
            let s = from(&[
                ("EMAIL_RECEIVERS", " a@example.com, ,b@example.com "),
                ("TICKERS", "TCS.NS,INFY.NS"),
                ("SUPPORT_THRESHOLD_PCT", "2.5"),
                ("RSI_LOWER", "35"),
                ("ACCEPT_MACD_CONTINUATION", "false"),
                ("LOG_FILE", ""),
            ])
            .unwrap();
            assert_eq!(s.email_receivers, vec!["a@example.com", "b@example.com"]);
            assert_eq!(s.tickers, Some(vec!["TCS.NS".to_string(), "INFY.NS".to_string()]));
            assert_eq!(s.support_threshold_pct, 2.5);
            assert_eq!(s.rsi_lower, 35.0);
            assert!(!s.accept_macd_continuation);
            assert!(s.log_file.is_none());
        }

        #[test]
        fn rejects_bad_numbers_with_variable_name() {
            let err = from(&[("RSI_UPPER", "fifty")]).unwrap_err();
            assert!(err.to_string().contains("RSI_UPPER"));
            assert!(from(&[("RSI_LOWER", "60")]).is_err());
            assert!(from(&[("SUPPORT_THRESHOLD_PCT", "-1")]).is_err());
        }

        #[test]
        fn log_file_resolves_when_other_settings_are_invalid() {
            let vars = HashMap::from([
                ("RSI_UPPER".to_string(), "fifty".to_string()),
                ("LOG_FILE".to_string(), " run.log ".to_string()),
            ]);
            let lookup = |k: &str| vars.get(k).cloned();

            assert!(Settings::from_lookup(lookup).is_err());
            assert_eq!(Settings::log_file_from_lookup(lookup).as_deref(), Some("run.log"));
            assert_eq!(
                Settings::log_file_from_lookup(|_| None).as_deref(),
                Some("niftybees_trades.log")
            );
        }

        #[test]
        fn screen_config_never_drops_below_required_bars() {
            let s = from(&[("MIN_HISTORY_BARS", "100"), ("DATA_PROVIDER_REQ_DELAY_MS", "0")]).unwrap();
            let cfg = s.screen_config();
            assert_eq!(cfg.min_history_bars, 200);
            assert!(cfg.request_delay.is_zero());
        }
    }
}
