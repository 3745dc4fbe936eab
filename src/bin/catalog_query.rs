//! Read-only queries against one OSCAL catalog.
//!
//! Loads a catalog (optionally checking it against an OSCAL JSON schema
//! first), runs exactly one query, and prints the answer as JSON on stdout.

use anyhow::{Context, Result, bail};
use blueprint::catalog::{CatalogNavigator, parse_catalog_value};
use blueprint::schema_loader::{DocumentSchema, SchemaLoadOptions};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    blueprint::init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let data = fs::read(&args.catalog)
        .with_context(|| format!("reading catalog {}", args.catalog.display()))?;
    let raw: Value = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {}", args.catalog.display()))?;

    if let Some(schema_path) = &args.schema {
        let schema = DocumentSchema::load(
            schema_path,
            SchemaLoadOptions {
                root_key: Some("catalog"),
            },
        )?;
        schema.validate(&raw)?;
    }

    let catalog = parse_catalog_value(raw)
        .with_context(|| format!("parsing {}", args.catalog.display()))?;
    let navigator = CatalogNavigator::new(&catalog)?;
    let output = answer(&navigator, &args.query)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn answer(navigator: &CatalogNavigator<'_>, query: &Query) -> Result<Value> {
    let value = match query {
        Query::Groups => Value::Array(
            navigator
                .list_groups()
                .iter()
                .map(|group| json!({"id": group.id, "title": group.title}))
                .collect(),
        ),
        Query::Ids { recursive } => json!(navigator.list_control_ids(*recursive)),
        Query::Control(control_id) => {
            let control = navigator.get_control(control_id)?;
            let mut view = serde_json::to_value(navigator.simplified_view(control_id)?)?;
            if let Value::Object(map) = &mut view {
                map.insert(
                    "parameters".to_string(),
                    serde_json::to_value(navigator.control_parameters(control))?,
                );
            }
            view
        }
        Query::Next(control_id) => json!({"next_id": navigator.next_control_id(control_id)}),
        Query::Rows => serde_json::to_value(navigator.control_rows()?)?,
    };
    Ok(value)
}

#[derive(Debug, PartialEq)]
enum Query {
    Groups,
    Ids { recursive: bool },
    Control(String),
    Next(String),
    Rows,
}

struct CliArgs {
    catalog: PathBuf,
    schema: Option<PathBuf>,
    query: Query,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        Self::from_args(env::args_os().skip(1))
    }

    fn from_args(mut args: impl Iterator<Item = std::ffi::OsString>) -> Result<Self> {
        let mut catalog: Option<PathBuf> = None;
        let mut schema: Option<PathBuf> = None;
        let mut query: Option<Query> = None;
        let mut recursive = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            let selected = match arg.as_str() {
                "--catalog" => {
                    catalog = Some(PathBuf::from(next_value(&mut args, "--catalog")?));
                    None
                }
                "--schema" => {
                    schema = Some(PathBuf::from(next_value(&mut args, "--schema")?));
                    None
                }
                "--recursive" => {
                    recursive = true;
                    None
                }
                "--groups" => Some(Query::Groups),
                "--ids" => Some(Query::Ids { recursive: false }),
                "--control" => Some(Query::Control(next_value(&mut args, "--control")?)),
                "--next" => Some(Query::Next(next_value(&mut args, "--next")?)),
                "--rows" => Some(Query::Rows),
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            };
            if let Some(selected) = selected {
                if query.is_some() {
                    bail!("only one of --groups/--ids/--control/--next/--rows may be given");
                }
                query = Some(selected);
            }
        }

        let Some(catalog) = catalog else {
            bail!("missing --catalog\n{}", usage());
        };
        let query = match query {
            Some(Query::Ids { .. }) => Query::Ids { recursive },
            Some(_) if recursive => bail!("--recursive only applies to --ids"),
            Some(query) => query,
            None => bail!("no query given\n{}", usage()),
        };

        Ok(CliArgs {
            catalog,
            schema,
            query,
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
    "Usage: catalog-query --catalog PATH (--groups | --ids [--recursive] | --control ID | --next ID | --rows) [--schema PATH]\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(raw: &[&str]) -> impl Iterator<Item = OsString> {
        raw.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn recursive_attaches_to_ids() {
        let parsed =
            CliArgs::from_args(args(&["--recursive", "--catalog", "c.json", "--ids"])).unwrap();
        assert_eq!(parsed.query, Query::Ids { recursive: true });
        assert!(CliArgs::from_args(args(&["--catalog", "c.json", "--rows", "--recursive"])).is_err());
    }

    #[test]
    fn exactly_one_query_is_required() {
        assert!(CliArgs::from_args(args(&["--catalog", "c.json"])).is_err());
        assert!(CliArgs::from_args(args(&["--catalog", "c.json", "--groups", "--rows"])).is_err());
        assert!(CliArgs::from_args(args(&["--groups"])).is_err());
    }
}
