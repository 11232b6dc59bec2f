use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::{env, str::FromStr};

/// Storage backend serving the camera records for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataBackend {
    /// In-process map; contents are lost on restart.
    Memory,
    /// SQLite database reached through `database_url`.
    Sqlite,
}

impl FromStr for DataBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(anyhow!("unknown data backend `{}`", other)),
        }
    }
}

/// Which optional capabilities the cameras router is composed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RouterVariant {
    /// Identity from the authenticating proxy, image upload and `/mine`.
    WithAuthAndUpload,
    /// Anonymous requests only, image parts are ignored.
    Basic,
}

impl RouterVariant {
    pub fn has_auth(self) -> bool {
        matches!(self, Self::WithAuthAndUpload)
    }

    pub fn has_upload(self) -> bool {
        matches!(self, Self::WithAuthAndUpload)
    }
}

impl FromStr for RouterVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "with-auth-and-upload" | "full" => Ok(Self::WithAuthAndUpload),
            "basic" => Ok(Self::Basic),
            other => Err(anyhow!("unknown router variant `{}`", other)),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_backend: DataBackend,
    pub database_url: String,
    pub router: RouterVariant,
    pub image_dir: String,
    pub image_base_url: String,
    pub auth_id_header: String,
    pub auth_name_header: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cameras CRUD web application")]
pub struct Args {
    /// Host to bind to (overrides CAMERAS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CAMERAS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Storage backend (overrides CAMERAS_DATA_BACKEND)
    #[arg(long, value_enum)]
    pub data_backend: Option<DataBackend>,

    /// Database URL for the sqlite backend (overrides CAMERAS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Router capabilities (overrides CAMERAS_ROUTER)
    #[arg(long, value_enum)]
    pub router: Option<RouterVariant>,

    /// Directory where uploaded images are stored (overrides CAMERAS_IMAGE_DIR)
    #[arg(long)]
    pub image_dir: Option<String>,

    /// URL prefix under which uploaded images are served (overrides CAMERAS_IMAGE_BASE_URL)
    #[arg(long)]
    pub image_base_url: Option<String>,

    /// Header carrying the authenticated user id (overrides CAMERAS_AUTH_ID_HEADER)
    #[arg(long)]
    pub auth_id_header: Option<String>,

    /// Header carrying the authenticated display name (overrides CAMERAS_AUTH_NAME_HEADER)
    #[arg(long)]
    pub auth_name_header: Option<String>,

    /// Apply the database schema and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// Merge parsed CLI args over environment variables and defaults.
    pub fn merge(args: Args) -> Result<Self> {
        let env_port = match env::var("CAMERAS_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing CAMERAS_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading CAMERAS_PORT"),
        };
        let env_backend = match env::var("CAMERAS_DATA_BACKEND") {
            Ok(value) => value.parse().context("parsing CAMERAS_DATA_BACKEND")?,
            Err(_) => DataBackend::Sqlite,
        };
        let env_router = match env::var("CAMERAS_ROUTER") {
            Ok(value) => value.parse().context("parsing CAMERAS_ROUTER")?,
            Err(_) => RouterVariant::WithAuthAndUpload,
        };

        Ok(Self {
            host: args
                .host
                .unwrap_or_else(|| env_or("CAMERAS_HOST", "0.0.0.0")),
            port: args.port.unwrap_or(env_port),
            data_backend: args.data_backend.unwrap_or(env_backend),
            database_url: args
                .database_url
                .unwrap_or_else(|| env_or("CAMERAS_DATABASE_URL", "sqlite://./data/cameras.db")),
            router: args.router.unwrap_or(env_router),
            image_dir: args
                .image_dir
                .unwrap_or_else(|| env_or("CAMERAS_IMAGE_DIR", "./data/images")),
            image_base_url: args
                .image_base_url
                .unwrap_or_else(|| env_or("CAMERAS_IMAGE_BASE_URL", "/images")),
            auth_id_header: args.auth_id_header.unwrap_or_else(|| {
                env_or("CAMERAS_AUTH_ID_HEADER", "x-goog-authenticated-user-id")
            }),
            auth_name_header: args.auth_name_header.unwrap_or_else(|| {
                env_or(
                    "CAMERAS_AUTH_NAME_HEADER",
                    "x-goog-authenticated-user-email",
                )
            }),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}
