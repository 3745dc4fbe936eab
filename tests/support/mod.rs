#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::NamedTempFile;

pub const ARS_5: &str = "CMS_ARS_5_0";
pub const ARS_3: &str = "CMS_ARS_3_1";

/// Path of a helper binary built alongside the integration tests.
pub fn helper_binary(name: &str) -> PathBuf {
    let path = match name {
        "catalog-query" => env!("CARGO_BIN_EXE_catalog-query"),
        "component-edit" => env!("CARGO_BIN_EXE_component-edit"),
        "control-view" => env!("CARGO_BIN_EXE_control-view"),
        other => panic!("unknown helper {other}"),
    };
    PathBuf::from(path)
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).context("helper stdout is not JSON")
}

pub fn write_json(value: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("allocating fixture file")?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.flush()?;
    Ok(file)
}

pub fn read_json(path: &Path) -> Result<Value> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_slice(&data)?)
}

/// Small OSCAL 1.x catalog: two families, one enhancement, one resource.
pub fn catalog_json() -> Value {
    json!({
        "catalog": {
            "uuid": "9c0e3ec1-63b5-4e73-a0bb-2a4c8b7c1d10",
            "metadata": {"title": "CMS ARS 5.0", "version": "5.0", "oscal-version": "1.0.4"},
            "groups": [
                {
                    "id": "ac",
                    "class": "family",
                    "title": "Access Control",
                    "controls": [
                        {
                            "id": "ac-1",
                            "title": "Policy and Procedures",
                            "props": [
                                {"name": "label", "value": "AC-1"},
                                {"name": "sort-id", "value": "ac-01"}
                            ],
                            "parts": [
                                {
                                    "id": "ac-1_smt",
                                    "name": "statement",
                                    "parts": [
                                        {"id": "ac-1_smt.a", "name": "item",
                                         "props": [{"name": "label", "value": "a."}],
                                         "prose": "Develop an access control policy."},
                                        {"id": "ac-1_smt.b", "name": "item",
                                         "props": [{"name": "label", "value": "b."}],
                                         "prose": "Review the policy annually."}
                                    ]
                                },
                                {"id": "ac-1_gdn", "name": "guidance", "prose": "Policies matter."}
                            ]
                        },
                        {
                            "id": "ac-2",
                            "title": "Account Management",
                            "props": [
                                {"name": "label", "value": "AC-2"},
                                {"name": "sort-id", "value": "ac-02"}
                            ],
                            "controls": [{
                                "id": "ac-2.1",
                                "title": "Automated System Account Management",
                                "props": [
                                    {"name": "label", "value": "AC-2(1)"},
                                    {"name": "sort-id", "value": "ac-02.01"}
                                ]
                            }]
                        }
                    ]
                },
                {
                    "id": "at",
                    "class": "family",
                    "title": "Awareness and Training",
                    "controls": [{
                        "id": "at-1",
                        "title": "Policy and Procedures",
                        "props": [
                            {"name": "label", "value": "AT-1"},
                            {"name": "sort-id", "value": "at-01"}
                        ]
                    }]
                }
            ],
            "back-matter": {"resources": [{"uuid": "res-1", "title": "NIST SP 800-12"}]}
        }
    })
}

/// The same shape in the older dialect: `properties` instead of `props`, no
/// sort ids.
pub fn legacy_catalog_json() -> Value {
    json!({
        "catalog": {
            "metadata": {"title": "CMS ARS 3.1"},
            "groups": [{
                "id": "ac",
                "title": "Access Control",
                "controls": [
                    {"id": "ac-2", "title": "Account Management",
                     "properties": [{"name": "label", "value": "AC-2"}]},
                    {"id": "ac-10", "title": "Concurrent Session Control",
                     "properties": [{"name": "label", "value": "AC-10"}]}
                ]
            }]
        }
    })
}

/// Component definition with one component and one control implementation.
///
/// `requirements` are `(control-id, narrative, responsibility)` triples.
pub fn component_json(title: &str, catalog_version: &str, requirements: &[(&str, &str, &str)]) -> Value {
    let implemented: Vec<Value> = requirements
        .iter()
        .map(|(control_id, narrative, responsibility)| {
            json!({
                "control-id": control_id,
                "description": narrative,
                "props": [{"name": "security_control_type", "value": responsibility}]
            })
        })
        .collect();
    json!({
        "component-definition": {
            "uuid": "0b6f4a3e-9d5c-4d1e-8f62-4f3c2a1b0e9d",
            "metadata": {"title": title, "version": "1.0"},
            "components": [{
                "uuid": "5a7e2c1d-3b4f-4e6a-9c8d-7f1e0a2b3c4d",
                "type": "Policy",
                "title": title,
                "description": format!("{title} shared controls."),
                "control-implementations": [{
                    "uuid": "c3d2e1f0-a9b8-4c7d-8e6f-5a4b3c2d1e0f",
                    "source": format!("https://example.org/{catalog_version}.json"),
                    "description": catalog_version,
                    "implemented-requirements": implemented
                }]
            }]
        }
    })
}
