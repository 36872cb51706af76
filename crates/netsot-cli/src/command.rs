//! Command line definition and command execution

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;

use netsot_common::{AppError, NetsotError};
use netsot_extras::{ComputedFieldService, ConfigContextService};
use netsot_persistence::{PersistenceService, TargetKind, TargetRef};

use crate::model::config::{LOGS_LEVEL_PROPERTY, SNAPSHOT_PATH_PROPERTY};

/// Render config contexts for network inventory
#[derive(Debug, Parser)]
#[command(name = "netsot", version)]
pub struct Cli {
    /// Configuration file (default: conf/application.yml)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Inventory snapshot to load (YAML or JSON)
    #[arg(short = 's', long = "snapshot", global = true)]
    pub snapshot: Option<String>,

    /// Console log level
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(
        short = 'o',
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Json,
        global = true
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Configuration overrides carried by the global flags
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(snapshot) = &self.snapshot {
            overrides.push((SNAPSHOT_PATH_PROPERTY, snapshot.clone()));
        }
        if let Some(level) = &self.log_level {
            overrides.push((LOGS_LEVEL_PROPERTY, level.clone()));
        }
        overrides
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Exactly one device or virtual machine, by name
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Device name
    #[arg(long)]
    pub device: Option<String>,

    /// Virtual machine name
    #[arg(long)]
    pub vm: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the rendered config context of one target
    Render(TargetArgs),
    /// Print the rendered config context of every target of a kind
    Annotate {
        #[arg(long, default_value = "device")]
        kind: TargetKind,
    },
    /// List the config contexts applying to one target, in merge order
    Contexts(TargetArgs),
    /// Render the computed fields of one target
    Computed(TargetArgs),
}

#[derive(Debug, Serialize)]
struct ContextSummary {
    name: String,
    weight: u32,
    description: String,
    data: Value,
}

fn resolve_target(
    persistence: &dyn PersistenceService,
    args: &TargetArgs,
) -> anyhow::Result<TargetRef> {
    match (&args.device, &args.vm) {
        (Some(name), _) => persistence
            .device_find_by_name(name)?
            .map(|d| TargetRef::device(d.id))
            .ok_or_else(|| NetsotError::ObjectNotExist("device", name.clone()).into()),
        (None, Some(name)) => persistence
            .virtual_machine_find_by_name(name)?
            .map(|vm| TargetRef::virtual_machine(vm.id))
            .ok_or_else(|| NetsotError::ObjectNotExist("virtual machine", name.clone()).into()),
        (None, None) => Err(NetsotError::IllegalArgument(
            "one of --device or --vm is required".to_string(),
        )
        .into()),
    }
}

pub fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

/// Render a failed command as `error[<code>] <message>: <cause chain>`
pub fn error_report(err: anyhow::Error) -> String {
    let err = AppError::from(err);
    let code = err.error_code();
    format!("error[{}] {}: {:#}", code.code, code.message, err.inner())
}

/// Run one command and return its formatted output
pub fn execute(
    command: &Command,
    persistence: Arc<dyn PersistenceService>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let contexts = ConfigContextService::new(persistence.clone());

    match command {
        Command::Render(args) => {
            let target = resolve_target(persistence.as_ref(), args)?;
            format_output(&contexts.get_config_context(target)?, format)
        }
        Command::Annotate { kind } => {
            let targets = persistence.target_find_all(*kind)?;
            let annotated = contexts.annotate(&targets)?;

            let mut by_name = BTreeMap::new();
            for (target, data) in annotated {
                let name = persistence
                    .target_axes(target)?
                    .map(|axes| axes.name)
                    .ok_or_else(|| NetsotError::TargetNotExist(target.to_string()))?;
                by_name.insert(name, data);
            }
            format_output(&by_name, format)
        }
        Command::Contexts(args) => {
            let target = resolve_target(persistence.as_ref(), args)?;
            let summaries: Vec<ContextSummary> = contexts
                .get_for_object(target)?
                .into_iter()
                .map(|c| ContextSummary {
                    name: c.name,
                    weight: c.weight,
                    description: c.description,
                    data: Value::Object(c.data),
                })
                .collect();
            format_output(&summaries, format)
        }
        Command::Computed(args) => {
            let target = resolve_target(persistence.as_ref(), args)?;
            let fields = ComputedFieldService::new(persistence.clone()).render_for(target)?;
            format_output(&fields, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_device() {
        let cli = Cli::try_parse_from(["netsot", "render", "--device", "leaf-01"]).unwrap();
        match cli.command {
            Command::Render(args) => assert_eq!(args.device.as_deref(), Some("leaf-01")),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_target_flags_conflict() {
        assert!(Cli::try_parse_from(["netsot", "render", "--device", "a", "--vm", "b"]).is_err());
        assert!(Cli::try_parse_from(["netsot", "render"]).is_err());
    }

    #[test]
    fn test_annotate_kind() {
        let cli = Cli::try_parse_from(["netsot", "annotate", "--kind", "vm"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Annotate {
                kind: TargetKind::VirtualMachine
            }
        ));

        let cli = Cli::try_parse_from(["netsot", "annotate"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Annotate {
                kind: TargetKind::Device
            }
        ));
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "netsot",
            "contexts",
            "--vm",
            "vm-01",
            "--snapshot",
            "inventory.yml",
            "--log-level",
            "debug",
            "--format",
            "yaml",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Yaml);
        assert_eq!(
            cli.overrides(),
            vec![
                (SNAPSHOT_PATH_PROPERTY, "inventory.yml".to_string()),
                (LOGS_LEVEL_PROPERTY, "debug".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_report_codes() {
        let report = error_report(NetsotError::ObjectNotExist("device", "leaf-09".into()).into());
        assert_eq!(report, "error[20004] resource not found: device 'leaf-09' not exist");

        let report = error_report(
            anyhow::Error::new(NetsotError::SnapshotError("bad yaml".into()))
                .context("loading inventory"),
        );
        assert!(report.starts_with("error[100004] Failed to parse data: loading inventory: "));

        let report = error_report(anyhow::anyhow!("disk full"));
        assert_eq!(report, "error[30000] server error: disk full");
    }

    #[test]
    fn test_format_output() {
        let value = serde_json::json!({"b": 1, "a": [true]});
        assert_eq!(
            format_output(&value, OutputFormat::Json).unwrap(),
            "{\n  \"a\": [\n    true\n  ],\n  \"b\": 1\n}"
        );
        assert_eq!(
            format_output(&value, OutputFormat::Yaml).unwrap(),
            "a:\n- true\nb: 1\n"
        );
    }
}
