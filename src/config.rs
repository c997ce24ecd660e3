use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::api::ApiConfig;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "counseling",
    about = "Counselor and session note API client",
    version = crate::version::VERSION,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage counselor records.
    #[command(subcommand)]
    Counselors(CounselorCommand),

    /// Manage session notes.
    #[command(subcommand)]
    Notes(NoteCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CounselorCommand {
    /// Fetch every counselor.
    List,

    /// Fetch one counselor by id.
    Get(IdArgs),

    /// Create a counselor from a JSON object.
    Create(DataArgs),

    /// Replace a counselor's fields with a JSON object.
    Update(UpdateArgs),

    /// Delete a counselor by id.
    Delete(IdArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum NoteCommand {
    /// Fetch every session note.
    List,

    /// Create a session note.
    Create(NoteCreateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IdArgs {
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    #[arg(long, value_name = "JSON")]
    pub data: String,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long, value_name = "JSON")]
    pub data: String,
}

#[derive(Args, Debug, Clone)]
pub struct NoteCreateArgs {
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,

    /// Attach a file; requires --multipart.
    #[arg(long = "file", value_name = "FIELD=PATH", value_parser = parse_key_path)]
    pub files: Vec<(String, PathBuf)>,

    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Send the note as multipart/form-data instead of JSON.
    #[arg(long)]
    pub multipart: bool,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(long = "api-url", global = true, env = "COUNSELING_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Base URL for session notes; defaults to --api-url.
    #[arg(
        long = "notes-api-url",
        global = true,
        env = "COUNSELING_NOTES_API_URL",
        value_name = "URL"
    )]
    pub notes_api_url: Option<String>,

    #[arg(
        long = "timeout-secs",
        global = true,
        env = "COUNSELING_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=300)
    )]
    pub timeout_secs: u64,
}

impl Config {
    pub fn counselor_api(&self) -> Option<ApiConfig> {
        self.api_config(self.api_url.as_deref())
    }

    pub fn notes_api(&self) -> Option<ApiConfig> {
        self.api_config(self.notes_api_url.as_deref().or(self.api_url.as_deref()))
    }

    fn api_config(&self, base_url: Option<&str>) -> Option<ApiConfig> {
        let base_url = base_url.map(str::trim).filter(|url| !url.is_empty())?;
        Some(ApiConfig::new(base_url).with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_key_path(raw: &str) -> Result<(String, PathBuf), String> {
    let (key, path) = parse_key_value(raw)?;
    if path.is_empty() {
        return Err(format!("empty path in `{raw}`"));
    }
    Ok((key, PathBuf::from(path)))
}
