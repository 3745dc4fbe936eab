//! Per-control project view: catalog data plus every attached component's
//! narrative, merged.
//!
//! Components are identified by their title; `--disabled TITLE` hides that
//! component's narrative for the control without dropping it from the output.

use anyhow::{Result, bail};
use blueprint::aggregate::{AttachedComponent, project_control_view};
use blueprint::catalog::{CatalogNavigator, CatalogVersion, load_catalog_from_path};
use blueprint::component::{
    ComponentDefinition, ComponentExtractor, ComponentId, ComponentStatus,
    load_component_from_path,
};
use blueprint::project::{ControlStatus, Project, ProjectControl};
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    blueprint::init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

struct LoadedComponent {
    id: ComponentId,
    title: String,
    status: ComponentStatus,
    definition: ComponentDefinition,
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let catalog = load_catalog_from_path(&args.catalog)?;
    let navigator = CatalogNavigator::new(&catalog)?;

    let mut loaded = Vec::new();
    if let Some(path) = &args.private {
        loaded.push(load(path, ComponentStatus::System)?);
    }
    for path in &args.inherited {
        loaded.push(load(path, ComponentStatus::Public)?);
    }
    let attached: Vec<AttachedComponent<'_>> = loaded
        .iter()
        .map(|component| AttachedComponent {
            id: &component.id,
            title: &component.title,
            status: component.status,
            definition: &component.definition,
        })
        .collect();

    let project = Project {
        title: args.project.clone(),
        acronym: String::new(),
        catalog_version: CatalogVersion::from(args.catalog_version.as_str()),
    };
    let mut row = ProjectControl::new(args.control.as_str());
    row.set_status(args.status);
    row.set_remarks(args.remarks.as_deref());
    for title in &args.disabled {
        row.disable_narrative(ComponentId::from(title.as_str()));
    }

    let view = project_control_view(&project, &navigator, &row, &attached)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn load(path: &Path, status: ComponentStatus) -> Result<LoadedComponent> {
    let definition = load_component_from_path(path)?;
    let title = ComponentExtractor::new(&definition)?.component().title.clone();
    Ok(LoadedComponent {
        id: ComponentId::from(title.as_str()),
        title,
        status,
        definition,
    })
}

struct CliArgs {
    catalog: PathBuf,
    control: String,
    catalog_version: String,
    project: String,
    private: Option<PathBuf>,
    inherited: Vec<PathBuf>,
    disabled: Vec<String>,
    status: ControlStatus,
    remarks: Option<String>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        Self::from_args(env::args_os().skip(1))
    }

    fn from_args(mut args: impl Iterator<Item = std::ffi::OsString>) -> Result<Self> {
        let mut catalog: Option<PathBuf> = None;
        let mut control: Option<String> = None;
        let mut catalog_version: Option<String> = None;
        let mut project = String::new();
        let mut private: Option<PathBuf> = None;
        let mut inherited = Vec::new();
        let mut disabled = Vec::new();
        let mut status = ControlStatus::default();
        let mut remarks: Option<String> = None;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--catalog" => catalog = Some(PathBuf::from(next_value(&mut args, "--catalog")?)),
                "--control" => control = Some(next_value(&mut args, "--control")?),
                "--catalog-version" => {
                    catalog_version = Some(next_value(&mut args, "--catalog-version")?)
                }
                "--project" => project = next_value(&mut args, "--project")?,
                "--private" => {
                    if private.is_some() {
                        bail!("--private may only be provided once");
                    }
                    private = Some(PathBuf::from(next_value(&mut args, "--private")?));
                }
                "--inherited" => inherited.push(PathBuf::from(next_value(&mut args, "--inherited")?)),
                "--disabled" => disabled.push(next_value(&mut args, "--disabled")?),
                "--status" => status = ControlStatus::parse(&next_value(&mut args, "--status")?)?,
                "--remarks" => remarks = Some(next_value(&mut args, "--remarks")?),
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        let (Some(catalog), Some(control), Some(catalog_version)) =
            (catalog, control, catalog_version)
        else {
            bail!("--catalog, --control and --catalog-version are required\n{}", usage());
        };

        Ok(CliArgs {
            catalog,
            control,
            catalog_version,
            project,
            private,
            inherited,
            disabled,
            status,
            remarks,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = std::ffi::OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow::anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: control-view --catalog PATH --control ID --catalog-version V [--project TITLE] [--private PATH] [--inherited PATH ...] [--disabled TITLE ...] [--status S] [--remarks TEXT]\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(raw: &[&str]) -> impl Iterator<Item = OsString> {
        raw.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn repeatable_flags_accumulate() {
        let parsed = CliArgs::from_args(args(&[
            "--catalog", "cat.json", "--control", "ac-1", "--catalog-version", "CMS_ARS_5_0",
            "--inherited", "a.json", "--inherited", "b.json", "--disabled", "AWS",
            "--status", "complete",
        ]))
        .unwrap();
        assert_eq!(parsed.inherited.len(), 2);
        assert_eq!(parsed.disabled, vec!["AWS"]);
        assert_eq!(parsed.status, ControlStatus::Complete);
    }

    #[test]
    fn required_flags_and_status_values_are_checked() {
        assert!(CliArgs::from_args(args(&["--catalog", "cat.json", "--control", "ac-1"])).is_err());
        assert!(
            CliArgs::from_args(args(&[
                "--catalog", "c", "--control", "ac-1", "--catalog-version", "v", "--status", "done",
            ]))
            .is_err()
        );
    }
}
