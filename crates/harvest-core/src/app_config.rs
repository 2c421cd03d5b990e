use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub profile_output: PathBuf,
    pub post_output: PathBuf,
    pub cookie_file: PathBuf,
    /// Rotate through every stored credential set while scraping instead of
    /// pinning the first valid one for the whole run.
    pub iterate_accounts: bool,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub base_url: String,
    pub posts_per_target: u32,
    /// Extra attempts on a transient profile fetch error before the run halts.
    pub profile_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Inter-request delay bounds as `Duration`s.
    ///
    /// Both values were checked to fit a `Duration` at load time.
    #[must_use]
    pub fn delay_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_secs_f64(self.min_delay_secs),
            Duration::from_secs_f64(self.max_delay_secs),
        )
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
