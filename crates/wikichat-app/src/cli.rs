//! CLI argument definitions for the wikichat binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wikichat_core::config::WikiChatConfig;

/// Wikichat - chat with Wikipedia summaries, with images and narration.
#[derive(Parser, Debug)]
#[command(name = "wikichat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server and chat page (default).
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
        /// Address to bind.
        #[arg(long = "host")]
        host: Option<String>,
    },
    /// Resolve a single query and print the answer.
    Ask {
        /// Article title to look up.
        query: String,
        /// Language code or name (defaults to the configured language).
        #[arg(long = "language")]
        language: Option<String>,
        /// Write the narration MP3 to this file.
        #[arg(long = "audio-out")]
        audio_out: Option<PathBuf>,
        /// Skip narration synthesis.
        #[arg(long = "no-audio")]
        no_audio: bool,
    },
    /// List supported languages.
    Languages,
}

impl CliArgs {
    /// The subcommand to run; `serve` when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            port: None,
            host: None,
        })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > WIKICHAT_CONFIG env var > ~/.wikichat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("WIKICHAT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Apply server flags and environment overrides to the loaded config.
    pub fn apply_overrides(&self, config: &mut WikiChatConfig) {
        let (port, host) = match &self.command {
            Some(Command::Serve { port, host }) => (*port, host.clone()),
            _ => (None, None),
        };
        let env_port = std::env::var("WIKICHAT_PORT").ok();
        config.server.port = resolve_port(port, env_port.as_deref(), config.server.port);
        if let Some(host) = host {
            config.server.host = host;
        }
    }
}

/// Priority: --port flag > WIKICHAT_PORT env var > config file value.
///
/// An unparsable env value is ignored.
pub fn resolve_port(flag: Option<u16>, env: Option<&str>, config_port: u16) -> u16 {
    if let Some(p) = flag {
        return p;
    }
    if let Some(p) = env.and_then(|v| v.trim().parse::<u16>().ok()) {
        return p;
    }
    config_port
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".wikichat").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".wikichat").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let args = CliArgs::parse_from(["wikichat"]);
        assert_eq!(
            args.command(),
            Command::Serve {
                port: None,
                host: None
            }
        );
    }

    #[test]
    fn test_parse_serve_flags() {
        let args = CliArgs::parse_from([
            "wikichat", "-c", "/tmp/w.toml", "-l", "debug", "serve", "-p", "9000", "--host",
            "0.0.0.0",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/w.toml")));
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(
            args.command(),
            Command::Serve {
                port: Some(9000),
                host: Some("0.0.0.0".to_string())
            }
        );
    }

    #[test]
    fn test_parse_ask() {
        let args = CliArgs::parse_from([
            "wikichat",
            "ask",
            "Albert Einstein",
            "--language",
            "de",
            "--audio-out",
            "out.mp3",
        ]);
        match args.command() {
            Command::Ask {
                query,
                language,
                audio_out,
                no_audio,
            } => {
                assert_eq!(query, "Albert Einstein");
                assert_eq!(language.as_deref(), Some("de"));
                assert_eq!(audio_out, Some(PathBuf::from("out.mp3")));
                assert!(!no_audio);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["wikichat", "languages", "--log-level", "warn"]);
        assert_eq!(args.command(), Command::Languages);
        assert_eq!(args.resolve_log_level("info"), "warn");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::parse_from(["wikichat"]);
        assert_eq!(args.resolve_log_level("error"), "error");
    }

    #[test]
    fn test_resolve_port_priority() {
        assert_eq!(resolve_port(Some(1), Some("2"), 3), 1);
        assert_eq!(resolve_port(None, Some("2"), 3), 2);
        assert_eq!(resolve_port(None, Some("not-a-port"), 3), 3);
        assert_eq!(resolve_port(None, None, 3), 3);
    }

    #[test]
    fn test_apply_overrides_sets_host() {
        let args = CliArgs::parse_from(["wikichat", "serve", "-p", "9100", "--host", "0.0.0.0"]);
        let mut config = WikiChatConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
