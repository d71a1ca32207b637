use anyhow::Context;

/// Who may fetch a single note through `GET /notes/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteReadPolicy {
    /// Only the owner; everyone else gets 403.
    Owner,
    /// Any authenticated user.
    Authenticated,
}

impl std::str::FromStr for NoteReadPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "authenticated" => Ok(Self::Authenticated),
            other => anyhow::bail!("unknown note read policy: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// `None` keeps tokens alive until revoked.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NotesConfig {
    pub per_page: i64,
    pub max_per_page: i64,
    pub read_policy: NoteReadPolicy,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            per_page: 15,
            max_per_page: 100,
            read_policy: NoteReadPolicy::Owner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres when set, in-memory storage otherwise.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub tokens: TokenConfig,
    pub notes: NotesConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let port = match var("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT")?,
            None => 8080,
        };

        let ttl_minutes = match var("TOKEN_TTL_MINUTES") {
            Some(v) => {
                let minutes = v.parse::<i64>().context("TOKEN_TTL_MINUTES")?;
                anyhow::ensure!(minutes > 0, "TOKEN_TTL_MINUTES must be positive");
                Some(minutes)
            }
            None => None,
        };

        let defaults = NotesConfig::default();
        let per_page = match var("NOTES_PER_PAGE") {
            Some(v) => v.parse::<i64>().context("NOTES_PER_PAGE")?,
            None => defaults.per_page,
        };
        let max_per_page = match var("NOTES_MAX_PER_PAGE") {
            Some(v) => v.parse::<i64>().context("NOTES_MAX_PER_PAGE")?,
            None => defaults.max_per_page,
        };
        anyhow::ensure!(
            per_page > 0 && per_page <= max_per_page,
            "NOTES_PER_PAGE must be between 1 and NOTES_MAX_PER_PAGE"
        );
        let read_policy = match var("NOTES_READ_POLICY") {
            Some(v) => v.parse::<NoteReadPolicy>()?,
            None => defaults.read_policy,
        };

        Ok(Self {
            database_url,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            tokens: TokenConfig { ttl_minutes },
            notes: NotesConfig {
                per_page,
                max_per_page,
                read_policy,
            },
        })
    }
}
