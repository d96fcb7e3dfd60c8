//! `meshcni render` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use meshcni_core::config::MeshcniConfig;
use meshcni_redirect::{RedirectInvocation, ToolPaths, render};

use crate::cli::RenderArgs;
use crate::commands::{build_config, load_annotations, registry_from_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `render` command (dry run, nothing is executed).
pub async fn execute(
    args: RenderArgs,
    config: &MeshcniConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let registry = registry_from_config(config)?;
    let annotations = load_annotations(&args.workload).await?;
    let built = build_config(&args.workload, annotations, &registry)?;

    let tools = ToolPaths::from_settings(&config.redirect);
    let invocation = render(&built.config, &args.netns, &tools);
    info!(netns = %args.netns, program = %invocation.program, "rendered redirect invocation");

    let report = RenderReport {
        netns: args.netns,
        command_line: invocation.to_string(),
        invocation,
        fallback: built.fallback_reason,
    };
    writer.render(&report)
}

/// Rendered invocation report.
#[derive(Serialize)]
pub struct RenderReport {
    /// Target network namespace
    pub netns: String,
    /// Program and arguments
    pub invocation: RedirectInvocation,
    /// Single-line form of the invocation
    pub command_line: String,
    /// Reason the include-ports fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl Render for RenderReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref reason) = self.fallback {
            writeln!(w, "{} {}", "FALLBACK".yellow().bold(), reason)?;
        }
        writeln!(w, "{}", self.command_line)?;
        Ok(())
    }
}
