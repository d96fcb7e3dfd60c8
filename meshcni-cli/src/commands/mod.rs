//! Command handlers -- one module per subcommand

pub mod config;
pub mod redirect;
pub mod render;
pub mod resolve;

use std::collections::HashMap;

use tracing::warn;

use meshcni_core::config::MeshcniConfig;
use meshcni_redirect::{FieldRegistry, RedirectConfig, RedirectConfigBuilder, RedirectDefaults};

use crate::cli::WorkloadArgs;
use crate::error::CliError;

/// Build the field registry from the `[redirect]` defaults of the loaded configuration.
pub fn registry_from_config(config: &MeshcniConfig) -> Result<FieldRegistry, CliError> {
    let defaults = RedirectDefaults::from_settings(&config.redirect)?;
    Ok(FieldRegistry::new(defaults))
}

/// Collect the workload annotations: file entries first, then `-a` flags.
pub async fn load_annotations(args: &WorkloadArgs) -> Result<HashMap<String, String>, CliError> {
    let mut annotations = match &args.annotations {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            serde_json::from_str::<HashMap<String, String>>(&text).map_err(|e| {
                CliError::Command(format!(
                    "invalid annotations file {}: {e}",
                    path.display()
                ))
            })?
        }
        None => HashMap::new(),
    };

    for (key, value) in &args.annotation {
        annotations.insert(key.clone(), value.clone());
    }

    Ok(annotations)
}

/// Result of building a workload's configuration.
#[derive(Debug)]
pub struct BuiltConfig {
    /// The configuration to use
    pub config: RedirectConfig,
    /// Set when the include-ports fallback was accepted
    pub fallback_reason: Option<String>,
}

/// Resolve the workload's redirect configuration.
///
/// With `--allow-port-fallback`, an invalid include-ports annotation is
/// replaced by the declared container ports instead of failing.
pub fn build_config(
    args: &WorkloadArgs,
    annotations: HashMap<String, String>,
    registry: &FieldRegistry,
) -> Result<BuiltConfig, CliError> {
    let mut builder = RedirectConfigBuilder::with_registry(registry)
        .container_ports(args.ports.clone())
        .annotations(annotations);
    if let Some(uid) = args.proxy_uid {
        builder = builder.proxy_uid(uid);
    }

    match builder.build() {
        Ok(config) => Ok(BuiltConfig {
            config,
            fallback_reason: None,
        }),
        Err(e) if args.allow_port_fallback && e.fallback_config().is_some() => {
            let reason = e.to_string();
            warn!(reason = %reason, "accepting include-ports fallback configuration");
            let config = e.into_fallback_config()?;
            Ok(BuiltConfig {
                config,
                fallback_reason: Some(reason),
            })
        }
        Err(e) => Err(e.into()),
    }
}
