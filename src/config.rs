use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOCATION: &str = "东涌镇,中国,广东省,广州市 南沙区";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub default_location: String,

    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub calendar_events_url: Option<String>,
    pub calendar_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a number: {e}"))?;

        Ok(Self {
            base_dir: env::var("DIARY_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./diary")),
            default_location: env::var("DIARY_DEFAULT_LOCATION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOCATION.into()),

            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            calendar_events_url: env::var("CALENDAR_EVENTS_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            calendar_timeout_secs: env::var("CALENDAR_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
        })
    }

    /// Config rooted at `base_dir` with every other value at its default.
    #[cfg(test)]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            default_location: DEFAULT_LOCATION.into(),
            host: "127.0.0.1".into(),
            port: 8080,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            calendar_events_url: None,
            calendar_timeout_secs: 10,
        }
    }

    pub fn heatmap_dir(&self) -> PathBuf {
        self.base_dir.join("heatmaps")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
