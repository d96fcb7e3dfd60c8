//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// meshcni -- annotation-driven traffic redirection for mesh workloads.
///
/// Use `meshcni <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "meshcni", version, about, long_about = None)]
pub struct Cli {
    /// Path to the meshcni.toml configuration file.
    #[arg(short, long, global = true, default_value = "meshcni.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the redirect configuration from workload annotations.
    Resolve(ResolveArgs),

    /// Print the redirect tool invocation without running it.
    Render(RenderArgs),

    /// Resolve, render and run the redirect tool in a network namespace.
    Redirect(RedirectArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- workload input ----

/// Workload description shared by resolve, render and redirect.
#[derive(Args, Debug, Default)]
pub struct WorkloadArgs {
    /// JSON file holding the workload annotations (object of string to string).
    #[arg(long, value_name = "FILE")]
    pub annotations: Option<PathBuf>,

    /// Single annotation as key=value; repeatable, overrides file entries.
    #[arg(short = 'a', long = "annotation", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub annotation: Vec<(String, String)>,

    /// Declared container port; repeatable, order is kept.
    #[arg(long = "port", value_name = "PORT")]
    pub ports: Vec<String>,

    /// UID of the proxy process to exclude from redirection.
    #[arg(long)]
    pub proxy_uid: Option<i64>,

    /// Accept the container-ports configuration when includeInboundPorts is invalid.
    #[arg(long)]
    pub allow_port_fallback: bool,
}

/// Parse a `key=value` pair. The value may itself contain `=`.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

// ---- resolve ----

/// Resolve and print the effective configuration.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,
}

// ---- render ----

/// Render the invocation (dry run).
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Network namespace handle passed to `nsenter --net=`.
    #[arg(long)]
    pub netns: String,
}

// ---- redirect ----

/// Apply the redirect in the workload's network namespace.
#[derive(Args, Debug)]
pub struct RedirectArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Network namespace handle passed to `nsenter --net=`.
    #[arg(long)]
    pub netns: String,
}

// ---- config ----

/// Manage meshcni configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, redirect).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_resolve_defaults() {
        let cli = Cli::try_parse_from(["meshcni", "resolve"]).expect("should parse 'resolve'");
        assert_eq!(cli.config, PathBuf::from("meshcni.toml"));
        assert!(matches!(cli.output, OutputFormat::Text));
        match cli.command {
            Commands::Resolve(args) => {
                assert!(args.workload.annotations.is_none());
                assert!(args.workload.annotation.is_empty());
                assert!(args.workload.ports.is_empty());
                assert!(args.workload.proxy_uid.is_none());
                assert!(!args.workload.allow_port_fallback);
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_parse_workload_flags() {
        let cli = Cli::try_parse_from([
            "meshcni",
            "resolve",
            "--annotations",
            "/tmp/pod.json",
            "-a",
            "sidecar.istio.io/interceptionMode=TPROXY",
            "--annotation",
            "traffic.sidecar.istio.io/kubevirtInterfaces=net1",
            "--port",
            "80",
            "--port",
            "443",
            "--proxy-uid",
            "1337",
            "--allow-port-fallback",
        ])
        .expect("should parse workload flags");
        match cli.command {
            Commands::Resolve(args) => {
                let w = args.workload;
                assert_eq!(w.annotations, Some(PathBuf::from("/tmp/pod.json")));
                assert_eq!(
                    w.annotation,
                    vec![
                        (
                            "sidecar.istio.io/interceptionMode".to_owned(),
                            "TPROXY".to_owned()
                        ),
                        (
                            "traffic.sidecar.istio.io/kubevirtInterfaces".to_owned(),
                            "net1".to_owned()
                        ),
                    ]
                );
                assert_eq!(w.ports, vec!["80", "443"]);
                assert_eq!(w.proxy_uid, Some(1337));
                assert!(w.allow_port_fallback);
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn test_cli_parse_render_requires_netns() {
        assert!(Cli::try_parse_from(["meshcni", "render"]).is_err());
        let cli = Cli::try_parse_from(["meshcni", "render", "--netns", "/var/run/netns/cni-1"])
            .expect("should parse render");
        match cli.command {
            Commands::Render(args) => assert_eq!(args.netns, "/var/run/netns/cni-1"),
            _ => panic!("expected Render command"),
        }
    }

    #[test]
    fn test_cli_parse_redirect() {
        let cli = Cli::try_parse_from([
            "meshcni",
            "--output",
            "json",
            "redirect",
            "--netns",
            "/proc/42/ns/net",
            "--port",
            "8080",
        ])
        .expect("should parse redirect");
        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Commands::Redirect(args) => {
                assert_eq!(args.netns, "/proc/42/ns/net");
                assert_eq!(args.workload.ports, vec!["8080"]);
            }
            _ => panic!("expected Redirect command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["meshcni", "config", "show", "--section", "redirect"])
            .expect("should parse config show");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => assert_eq!(section.as_deref(), Some("redirect")),
                ConfigAction::Validate => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "meshcni",
            "config",
            "validate",
            "--config",
            "/etc/meshcni/meshcni.toml",
            "--log-level",
            "debug",
        ])
        .expect("global flags should be accepted after subcommand");
        assert_eq!(cli.config, PathBuf::from("/etc/meshcni/meshcni.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_cli_rejects_invalid_output_format() {
        assert!(Cli::try_parse_from(["meshcni", "--output", "yaml", "resolve"]).is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("a=b=c"),
            Ok(("a".to_owned(), "b=c".to_owned()))
        );
        assert_eq!(parse_key_value("a="), Ok(("a".to_owned(), String::new())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_cli_rejects_malformed_annotation() {
        assert!(Cli::try_parse_from(["meshcni", "resolve", "-a", "missing-equals"]).is_err());
    }

    #[test]
    fn test_cli_command_factory_is_valid() {
        Cli::command().debug_assert();
    }
}
