/// Process configuration for the points engine daemon
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/points-engine | Working directory (stores, logs) |
/// | CATALOG_DB | {WORK_DIR}/catalog.db | SQLite catalog database |
/// | LEDGER_DB | {WORK_DIR}/ledger.redb | redb ledger store |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | STATION_TZ | Asia/Kolkata | Station timezone for the daily sweep |
/// | SWEEP_CUTOFF | 03:30 | Daily sweep time (HH:MM, station local) |
/// | ENABLE_EXPIRY_SWEEP | false | Run the expiry sweeper |
/// | CONFIG_CACHE_TTL_SECS | 15 | Business-config cache TTL |
/// | LOG_DIR | (unset) | Optional file logging directory |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for stores and logs
    pub work_dir: String,
    /// SQLite catalog database path
    pub catalog_db: String,
    /// redb ledger store path
    pub ledger_db: String,
    /// Running environment: development | staging | production
    pub environment: String,
    /// Station timezone (sweep scheduling)
    pub timezone: chrono_tz::Tz,
    /// Daily sweep cutoff, HH:MM in station local time
    pub sweep_cutoff: String,
    /// Whether the expiry sweeper runs (off by default in production)
    pub enable_expiry_sweep: bool,
    /// Business-config cache TTL in seconds
    pub config_cache_ttl_secs: u64,
    /// Optional file logging directory
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let work_dir =
            std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/points-engine".into());
        let catalog_db =
            std::env::var("CATALOG_DB").unwrap_or_else(|_| format!("{work_dir}/catalog.db"));
        let ledger_db =
            std::env::var("LEDGER_DB").unwrap_or_else(|_| format!("{work_dir}/ledger.redb"));

        Self {
            catalog_db,
            ledger_db,
            work_dir,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("STATION_TZ")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Asia::Kolkata),
            sweep_cutoff: std::env::var("SWEEP_CUTOFF").unwrap_or_else(|_| "03:30".into()),
            enable_expiry_sweep: std::env::var("ENABLE_EXPIRY_SWEEP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            config_cache_ttl_secs: std::env::var("CONFIG_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
