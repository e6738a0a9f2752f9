pub mod domain;
pub mod service;
pub mod storage;

pub mod config {
    use crate::service::UpdateMode;
    use anyhow::Context;
    use std::path::PathBuf;

    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    // Vite dev server.
    pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub host: String,
        pub port: u16,
        pub cors_allowed_origins: Vec<String>,
        pub seed_file: Option<PathBuf>,
        pub update_mode: UpdateMode,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                cors_allowed_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
                seed_file: None,
                update_mode: UpdateMode::default(),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Same as `from_env` but reads variables through `lookup`.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let mut out = Self::default();
            let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            if let Some(host) = var("HOST") {
                out.host = host.trim().to_string();
            }

            if let Some(port) = var("PORT") {
                out.port = port
                    .trim()
                    .parse()
                    .with_context(|| format!("PORT must be a port number (got {port:?})"))?;
            }

            if let Some(origins) = var("CORS_ALLOWED_ORIGINS") {
                out.cors_allowed_origins = parse_origins(&origins)?;
            }

            out.seed_file = var("CLIENTBENCH_SEED_FILE").map(PathBuf::from);

            if let Some(mode) = var("CLIENTBENCH_UPDATE_MODE") {
                out.update_mode = mode.parse()?;
            }

            out.sentry_dsn = var("SENTRY_DSN");

            Ok(out)
        }

        pub fn bind_addr(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn parse_origins(s: &str) -> anyhow::Result<Vec<String>> {
        let origins: Vec<String> = s
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        anyhow::ensure!(
            !origins.is_empty(),
            "CORS_ALLOWED_ORIGINS must list at least one origin"
        );
        Ok(origins)
    }

}
