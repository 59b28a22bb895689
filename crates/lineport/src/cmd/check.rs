//! Check command - validate configuration
//!
//! Loads the config the same way `serve` would and prints the settings the
//! listener will actually run with, after defaults and normalisation.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use lineport_config::Config;
use lineport_sources::InfluxListenerConfig;

use super::load_config;

/// Run the check command
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, loaded_from) = load_config(config_path)?;
    print!("{}", render(&config, loaded_from.as_deref()));
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn render(config: &Config, path: Option<&Path>) -> String {
    let listener = InfluxListenerConfig::from_listener(&config.listener);
    let mut out = String::new();

    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults)".into());
    let _ = writeln!(out, "config ok: {}", source);
    let _ = writeln!(out);
    let _ = writeln!(out, "listener");
    let _ = writeln!(out, "  address          {}", listener.address);
    let _ = writeln!(out, "  read_timeout     {:?}", listener.read_timeout);
    let _ = writeln!(out, "  write_timeout    {:?}", listener.write_timeout);
    let _ = writeln!(out, "  max_body_size    {}", listener.max_body_size);
    let _ = writeln!(out, "  max_line_size    {}", listener.max_line_size);
    let _ = writeln!(out, "  buffer_pool_size {}", listener.buffer_pool_size);
    let _ = writeln!(
        out,
        "  database_tag     {}",
        listener.database_tag.as_deref().unwrap_or("off")
    );
    let _ = writeln!(out, "  basic_auth       {}", on_off(listener.credentials.is_some()));
    match &listener.tls {
        Some(tls) => {
            let _ = writeln!(out, "  tls              on ({})", tls.cert);
            let _ = writeln!(
                out,
                "  client_auth      {}",
                on_off(!tls.allowed_cacerts.is_empty())
            );
        }
        None => {
            let _ = writeln!(out, "  tls              off");
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "sink");
    let _ = writeln!(out, "  type             {}", config.sink.sink_type.as_str());
    let _ = writeln!(out, "  queue_size       {}", config.sink.queue_size);
    let _ = writeln!(out);
    let _ = writeln!(out, "metrics");
    let _ = writeln!(out, "  enabled          {}", on_off(config.metrics.enabled));
    let _ = writeln!(out, "  interval         {:?}", config.metrics.interval);

    out
}
