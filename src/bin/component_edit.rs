//! Add, update, or remove one control narrative in a component definition.
//!
//! The edited document goes to stdout, to `--output`, or back over the input
//! with `--in-place`. File writes go through a temp file in the destination
//! directory and are renamed into place, so readers never see a half-written
//! document.

use anyhow::{Context, Result, bail};
use blueprint::component::{
    ComponentDefinition, ComponentExtractor, RequirementDraft, Responsibility,
    load_component_from_path,
};
use blueprint::config::BlueprintConfig;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn main() {
    blueprint::init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let config = BlueprintConfig::load()?;
    let definition = load_component_from_path(&args.component)?;
    let updated = apply(&definition, &args, &config)?;
    let rendered = updated
        .to_document_string()
        .context("serializing component definition")?;

    match args.destination() {
        Some(path) => write_atomically(path, &rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn apply(
    definition: &ComponentDefinition,
    args: &CliArgs,
    config: &BlueprintConfig,
) -> Result<ComponentDefinition> {
    let extractor = ComponentExtractor::new(definition)?;
    let version = args.catalog_version.as_deref();
    let updated = match args.action {
        Action::Add => {
            let mut draft = RequirementDraft::new(
                args.control.as_str(),
                args.description.clone().unwrap_or_default(),
            );
            if let Some(responsibility) = &args.responsibility {
                draft = draft.responsibility(Responsibility::from_str(responsibility));
            }
            if let Some(provider) = &args.provider {
                draft = draft.provider(provider.as_str());
            }
            extractor.add_requirement(draft, version, config)?
        }
        Action::Update => {
            let Some(description) = &args.description else {
                bail!("--action update requires --description");
            };
            extractor.update_requirement(&args.control, description, version)?
        }
        Action::Remove => extractor.remove_requirement(&args.control, version)?,
    };
    Ok(updated)
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    writeln!(file, "{contents}").context("writing component definition")?;
    file.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    Update,
    Remove,
}

impl Action {
    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            other => bail!("unknown action '{other}' (expected add|update|remove)"),
        }
    }
}

struct CliArgs {
    component: PathBuf,
    control: String,
    action: Action,
    description: Option<String>,
    catalog_version: Option<String>,
    responsibility: Option<String>,
    provider: Option<String>,
    output: Option<PathBuf>,
    in_place: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        Self::from_args(env::args_os().skip(1))
    }

    fn from_args(mut args: impl Iterator<Item = std::ffi::OsString>) -> Result<Self> {
        let mut component: Option<PathBuf> = None;
        let mut control: Option<String> = None;
        let mut action: Option<Action> = None;
        let mut description: Option<String> = None;
        let mut catalog_version: Option<String> = None;
        let mut responsibility: Option<String> = None;
        let mut provider: Option<String> = None;
        let mut output: Option<PathBuf> = None;
        let mut in_place = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--component" => {
                    component = Some(PathBuf::from(next_value(&mut args, "--component")?))
                }
                "--control" => control = Some(next_value(&mut args, "--control")?),
                "--action" => action = Some(Action::from_str(&next_value(&mut args, "--action")?)?),
                "--description" => description = Some(next_value(&mut args, "--description")?),
                "--catalog-version" => {
                    catalog_version = Some(next_value(&mut args, "--catalog-version")?)
                }
                "--responsibility" => {
                    responsibility = Some(next_value(&mut args, "--responsibility")?)
                }
                "--provider" => provider = Some(next_value(&mut args, "--provider")?),
                "--output" => output = Some(PathBuf::from(next_value(&mut args, "--output")?)),
                "--in-place" => in_place = true,
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        let (Some(component), Some(control), Some(action)) = (component, control, action) else {
            bail!("--component, --control and --action are required\n{}", usage());
        };
        if output.is_some() && in_place {
            bail!("--output and --in-place are mutually exclusive");
        }

        Ok(CliArgs {
            component,
            control,
            action,
            description,
            catalog_version,
            responsibility,
            provider,
            output,
            in_place,
        })
    }

    fn destination(&self) -> Option<&Path> {
        if self.in_place {
            Some(&self.component)
        } else {
            self.output.as_deref()
        }
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
    "Usage: component-edit --component PATH --control ID --action add|update|remove [--description TEXT] [--catalog-version V] [--responsibility R] [--provider P] [--output PATH | --in-place]\n\
Responsibility and provider default to BLUEPRINT_DEFAULT_RESPONSIBILITY / BLUEPRINT_DEFAULT_PROVIDER (or the BLUEPRINT_CONFIG file).\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(raw: &[&str]) -> impl Iterator<Item = OsString> {
        raw.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_add_with_overrides() {
        let parsed = CliArgs::from_args(args(&[
            "--component",
            "c.json",
            "--control",
            "ac-1",
            "--action",
            "add",
            "--responsibility",
            "shared",
        ]))
        .unwrap();
        assert_eq!(parsed.action, Action::Add);
        assert_eq!(parsed.responsibility.as_deref(), Some("shared"));
        assert_eq!(parsed.destination(), None);
    }

    #[test]
    fn rejects_conflicting_destinations_and_bad_actions() {
        assert!(
            CliArgs::from_args(args(&[
                "--component", "c.json", "--control", "ac-1", "--action", "remove",
                "--output", "o.json", "--in-place",
            ]))
            .is_err()
        );
        assert!(Action::from_str("rename").is_err());
    }

    #[test]
    fn atomic_write_replaces_target() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("component.json");
        std::fs::write(&target, "old")?;
        write_atomically(&target, "{}")?;
        assert_eq!(std::fs::read_to_string(&target)?, "{}\n");
        Ok(())
    }
}
