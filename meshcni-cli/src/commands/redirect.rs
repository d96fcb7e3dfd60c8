//! `meshcni redirect` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use meshcni_core::config::MeshcniConfig;
use meshcni_redirect::{
    CommandOutput, ProcessCommandRunner, RedirectExecutor, RedirectInvocation, ToolPaths,
};

use crate::cli::RedirectArgs;
use crate::commands::{build_config, load_annotations, registry_from_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `redirect` command.
///
/// Runs the redirect tool once. A failed invocation is always reported
/// as an error (exit code 4).
pub async fn execute(
    args: RedirectArgs,
    config: &MeshcniConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let registry = registry_from_config(config)?;
    let annotations = load_annotations(&args.workload).await?;
    let built = build_config(&args.workload, annotations, &registry)?;

    let executor = RedirectExecutor::new(
        Arc::new(ProcessCommandRunner::new()),
        ToolPaths::from_settings(&config.redirect),
    );
    let invocation = executor.plan(&built.config, &args.netns);
    let output = executor.execute(&built.config, &args.netns).await?;
    info!(netns = %args.netns, "redirect applied");

    let report = RedirectReport {
        netns: args.netns,
        invocation,
        result: output,
        fallback: built.fallback_reason,
    };
    writer.render(&report)
}

/// Redirect execution report.
#[derive(Serialize)]
pub struct RedirectReport {
    /// Target network namespace
    pub netns: String,
    /// Executed invocation
    pub invocation: RedirectInvocation,
    /// Tool exit status and output
    pub result: CommandOutput,
    /// Reason the include-ports fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl Render for RedirectReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Redirect: {}", self.netns.bold())?;
        if let Some(ref reason) = self.fallback {
            writeln!(w, "  {} {}", "FALLBACK".yellow().bold(), reason)?;
        }
        writeln!(w, "  Command: {}", self.invocation)?;
        writeln!(w, "  Result:  {}", "APPLIED".green().bold())?;
        let output = self.result.output.trim_end();
        if !output.is_empty() {
            writeln!(w, "  Output:")?;
            for line in output.lines() {
                writeln!(w, "    {}", line)?;
            }
        }
        Ok(())
    }
}
