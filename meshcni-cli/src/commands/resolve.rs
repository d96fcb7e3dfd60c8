//! `meshcni resolve` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use meshcni_core::config::MeshcniConfig;
use meshcni_redirect::{AnnotationResolver, RedirectConfig};

use crate::cli::ResolveArgs;
use crate::commands::{build_config, load_annotations, registry_from_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `resolve` command.
pub async fn execute(
    args: ResolveArgs,
    config: &MeshcniConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let registry = registry_from_config(config)?;
    let annotations = load_annotations(&args.workload).await?;
    info!(annotations = annotations.len(), "resolving redirect configuration");

    let resolver = AnnotationResolver::new(&registry);
    let fields = resolver
        .resolve_all(&annotations)
        .into_iter()
        .map(|(field, resolved)| FieldReport {
            field: field.name(),
            key: field.annotation_key(),
            value: resolved.value,
            found: resolved.found,
            error: resolved.error.map(|e| e.source.to_string()),
        })
        .collect();

    let built = build_config(&args.workload, annotations, &registry)?;

    let report = ResolveReport {
        config: built.config,
        fallback: built.fallback_reason,
        fields,
    };
    writer.render(&report)
}

/// Per-field resolution line.
#[derive(Serialize)]
pub struct FieldReport {
    /// Logical field name
    pub field: &'static str,
    /// Annotation key
    pub key: &'static str,
    /// Resolved value
    pub value: String,
    /// Whether the annotation was present
    pub found: bool,
    /// Validator error for a rejected value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resolution report.
#[derive(Serialize)]
pub struct ResolveReport {
    /// Effective configuration
    pub config: RedirectConfig,
    /// Reason the include-ports fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Individual field outcomes
    pub fields: Vec<FieldReport>,
}

impl Render for ResolveReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let c = &self.config;
        writeln!(w, "{}", "Redirect Configuration".bold())?;
        for (label, value) in [
            ("target port", c.target_port()),
            ("redirect mode", c.redirect_mode()),
            ("no-redirect uid", c.no_redirect_uid()),
            ("include cidrs", c.include_ip_cidrs()),
            ("include ports", c.include_ports()),
            ("exclude ports", c.exclude_ports()),
            ("exclude cidrs", c.exclude_ip_cidrs()),
            ("kubevirt ifaces", c.kubevirt_interfaces()),
        ] {
            writeln!(w, "  {:<16} {}", label, value)?;
        }

        if let Some(ref reason) = self.fallback {
            writeln!(w, "  {} {}", "FALLBACK".yellow().bold(), reason)?;
        }

        writeln!(w)?;
        writeln!(w, "{}", "Annotations".bold())?;
        for f in &self.fields {
            let state = match (&f.error, f.found) {
                (Some(_), _) => "INVALID".red().bold(),
                (None, true) => "SET".green(),
                (None, false) => "DEFAULT".dimmed(),
            };
            writeln!(w, "  {:<20} {:<8} {:?}", f.field, state, f.value)?;
            if let Some(ref err) = f.error {
                writeln!(w, "  {:<20} {}", "", err.red())?;
            }
        }

        Ok(())
    }
}
