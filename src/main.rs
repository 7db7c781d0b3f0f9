// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool integrations).

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use proteus::classify::{Classifier, HttpClassifier, UnconfiguredClassifier};
use proteus::config::{Config, Transport, DEFAULT_MCP_HTTP_PORT};
use proteus::mcp::ProteusMcp;
use proteus::session::Workspace;
use proteus::store::WriteDurability;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROTEUS_LOG";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<session-dir>] [--durable-writes] [--classifier-url <url>] [--classifier-timeout-ms <ms>] [--mcp-http-port <port>]\n  {program} [--session <dir>] [--durable-writes] [--classifier-url <url>] [--classifier-timeout-ms <ms>] --mcp\n\nBy default MCP is served over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n--mcp serves MCP over stdio instead.\n\nWithout session-dir/--session, sessions live in memory only.\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported).\n\n--classifier-url is the intent classification endpoint used by turn.ask; without it only\nturn.apply_response can feed responses in.\n\nLog filtering follows {LOG_ENV} (default `info`); logs go to stderr."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    session_dir: Option<String>,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
    classifier_url: Option<String>,
    classifier_timeout_ms: Option<u64>,
}

impl CliOptions {
    fn into_config(self) -> Config {
        let mut config = Config {
            session_dir: self.session_dir.map(PathBuf::from),
            classifier_url: self.classifier_url,
            ..Config::default()
        };
        if self.durable_writes {
            config.durability = WriteDurability::Durable;
        }
        if let Some(ms) = self.classifier_timeout_ms {
            config.classification_timeout = Duration::from_millis(ms);
        }
        config.transport = if self.mcp {
            Transport::Stdio
        } else {
            Transport::Http {
                port: self.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT),
            }
        };
        config
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--session" => {
                if options.session_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.session_dir = Some(dir);
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--classifier-url" => {
                if options.classifier_url.is_some() {
                    return Err(());
                }
                let url = args.next().ok_or(())?;
                if url.trim().is_empty() {
                    return Err(());
                }
                options.classifier_url = Some(url);
            }
            "--classifier-timeout-ms" => {
                if options.classifier_timeout_ms.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let ms: u64 = raw.parse().map_err(|_| ())?;
                if ms == 0 {
                    return Err(());
                }
                options.classifier_timeout_ms = Some(ms);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.session_dir.is_some() {
                    return Err(());
                }
                options.session_dir = Some(arg);
            }
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the stdio MCP transport, so logs must never go there.
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "proteus".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();
        let config = options.into_config();
        let transport = config.transport;

        let classifier: Arc<dyn Classifier> = match config.classifier_url.as_deref() {
            Some(url) => Arc::new(HttpClassifier::new(url)?),
            None => {
                tracing::warn!("no classifier configured; turn.ask is unavailable");
                Arc::new(UnconfiguredClassifier)
            }
        };
        let mcp = ProteusMcp::new(Arc::new(Workspace::new(config)), classifier);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        let port = match transport {
            Transport::Stdio => {
                tracing::info!("serving MCP over stdio");
                runtime.block_on(mcp.serve_stdio())?;
                return Ok(());
            }
            Transport::Http { port } => port,
        };

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
            tracing::info!(
                addr = %listener.local_addr()?,
                "serving MCP over streamable HTTP at /mcp"
            );

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let shutdown_token = config.cancellation_token.clone();

            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

            let router = Router::new().nest_service("/mcp", mcp_service);
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    if tokio::signal::ctrl_c().await.is_err() {
                        tracing::warn!("cannot listen for ctrl-c; running until killed");
                        std::future::pending::<()>().await;
                    }
                    tracing::info!("shutting down");
                    shutdown_token.cancel();
                })
                .await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("proteus: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use proteus::config::{Transport, DEFAULT_MCP_HTTP_PORT};
    use proteus::store::WriteDurability;

    use super::{parse_options, CliOptions};

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());

        let config = options.into_config();
        assert_eq!(config.transport, Transport::Http { port: DEFAULT_MCP_HTTP_PORT });
        assert!(config.session_dir.is_none());
        assert!(config.classifier_url.is_none());
    }

    #[test]
    fn parses_mcp_flag() {
        let options = parse_options(["--mcp".to_owned()].into_iter()).expect("parse options");
        assert!(options.mcp);
        assert!(options.session_dir.is_none());
        assert_eq!(options.into_config().transport, Transport::Stdio);
    }

    #[test]
    fn parses_session_dir() {
        let options = parse_options(["--session".to_owned(), "some/dir".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.session_dir.as_deref(), Some("some/dir"));
        assert_eq!(options.into_config().session_dir, Some(PathBuf::from("some/dir")));
    }

    #[test]
    fn parses_positional_session_dir_with_durable_writes() {
        let options =
            parse_options(["some/dir".to_owned(), "--durable-writes".to_owned()].into_iter())
                .expect("parse options");
        assert_eq!(options.session_dir.as_deref(), Some("some/dir"));
        assert_eq!(options.into_config().durability, WriteDurability::Durable);
    }

    #[test]
    fn parses_mcp_http_port() {
        let options = parse_options(["--mcp-http-port".to_owned(), "0".to_owned()].into_iter())
            .expect("parse options");
        assert_eq!(options.into_config().transport, Transport::Http { port: 0 });
    }

    #[test]
    fn parses_classifier_settings() {
        let options = parse_options(
            [
                "--classifier-url".to_owned(),
                "http://127.0.0.1:9000/classify".to_owned(),
                "--classifier-timeout-ms".to_owned(),
                "1500".to_owned(),
            ]
            .into_iter(),
        )
        .expect("parse options");
        let config = options.into_config();
        assert_eq!(config.classifier_url.as_deref(), Some("http://127.0.0.1:9000/classify"));
        assert_eq!(config.classification_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_zero_or_invalid_timeout() {
        parse_options(["--classifier-timeout-ms".to_owned(), "0".to_owned()].into_iter())
            .unwrap_err();
        parse_options(["--classifier-timeout-ms".to_owned(), "soon".to_owned()].into_iter())
            .unwrap_err();
    }

    #[test]
    fn rejects_mcp_http_port_with_stdio_mcp_mode() {
        parse_options(
            ["--mcp".to_owned(), "--mcp-http-port".to_owned(), "0".to_owned()].into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_unknown_args() {
        parse_options(["--demo".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse_options(["--mcp".to_owned(), "--mcp".to_owned()].into_iter()).unwrap_err();
        parse_options(
            ["--session".to_owned(), ".".to_owned(), "--session".to_owned(), "other".to_owned()]
                .into_iter(),
        )
        .unwrap_err();
        parse_options(
            [
                "--classifier-url".to_owned(),
                "http://a".to_owned(),
                "--classifier-url".to_owned(),
                "http://b".to_owned(),
            ]
            .into_iter(),
        )
        .unwrap_err();
    }

    #[test]
    fn rejects_multiple_positional_session_dirs() {
        parse_options(["one".to_owned(), "two".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_missing_values() {
        parse_options(["--session".to_owned()].into_iter()).unwrap_err();
        parse_options(["--classifier-url".to_owned()].into_iter()).unwrap_err();
    }
}
