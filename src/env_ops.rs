//! # Environment Variable Operations
//!
//! Reconciles the project's `.env` file with the template: each wireable
//! variable is backed by an `Env<Key>` parameter plus a `Param<Key>` SSM
//! resource, and Lambdas reference it through `Environment.Variables`.
//!
//! Reconciliation runs three independent passes — new, changed, removed —
//! each idempotent: a second run against an unchanged `.env` leaves the
//! template byte-identical. Removals strip the parameter, the SSM resource
//! and every Lambda reference, but only when the caller confirmed them.
//! The reserved `ENVIRONMENT` key is reconciled separately, into the
//! template's `Stage` default and `samconfig.toml`.

use anyhow::{Result, anyhow, bail};

use crate::config;
use crate::document::Document;
use crate::edits;
use crate::env_file::EnvFile;
use crate::locator;
use crate::project::Project;
use crate::template;

/// `Env<Key>`-shaped parameter names currently present in the template.
fn env_parameter_names(lines: &[String]) -> Vec<String> {
    locator::entry_names(lines, "Parameters")
        .into_iter()
        .filter(|name| {
            name.strip_prefix("Env")
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

/// Appends the parameter + SSM resource pair backing one variable.
pub fn add_env_backing(doc: &mut Document, key: &str, value: &str) -> Result<()> {
    let parameter = template::env_parameter_name(key);
    edits::append_parameter(doc, template::env_parameter(&parameter, value))?;
    edits::append_resource(doc, template::ssm_parameter(key, &parameter));
    Ok(())
}

/// Removes one variable's wiring everywhere: every Lambda reference, the
/// parameter entry, and the SSM resource.
fn remove_env_backing(doc: &mut Document, parameter: &str) -> Result<Vec<String>> {
    let function_ids: Vec<String> =
        locator::resources_of_type(doc.lines(), "AWS::Serverless::Function");
    let mut unwired = Vec::new();
    for function_id in function_ids {
        if remove_env_reference(doc, &function_id, parameter)? {
            unwired.push(function_id);
        }
    }

    if let Some(span) = locator::section_entry(doc.lines(), "Parameters", parameter) {
        doc.remove(span);
    }
    let ssm = format!("Param{}", parameter.trim_start_matches("Env"));
    if locator::locate_resource(doc.lines(), &ssm).is_some() {
        edits::remove_resource(doc, &ssm)?;
    }
    Ok(unwired)
}

/// Strips one `<KEY>: !Ref <parameter>` line from a Lambda's environment;
/// the `Environment:`/`Variables:` wrappers collapse with the last entry.
/// Returns whether a reference was present.
pub fn remove_env_reference(
    doc: &mut Document,
    function_id: &str,
    parameter: &str,
) -> Result<bool> {
    let lines = doc.lines();
    let span = edits::require_resource(lines, function_id)?;
    let Some(props) = locator::properties_block(lines, span) else {
        return Ok(false);
    };
    let Some(environment) = locator::locate_sub_block(lines, props, "Environment") else {
        return Ok(false);
    };
    let Some(variables) = locator::locate_sub_block(lines, environment, "Variables") else {
        return Ok(false);
    };

    let needle = format!("!Ref {parameter}");
    let mut target = None;
    let mut wired = 0usize;
    for i in variables.start + 1..variables.end {
        let Some((_, value)) = lines[i].trim().split_once(": ") else {
            continue;
        };
        wired += 1;
        if value == needle {
            target = Some(i);
        }
    }

    match target {
        Some(_) if wired == 1 => doc.remove(environment),
        Some(i) => doc.remove_line(i),
        None => return Ok(false),
    }
    Ok(true)
}

/// The three-pass reconciliation. `assume_yes` confirms removals; without
/// it, variables missing from `.env` are reported but left in place.
pub fn sync_env(project: &Project, assume_yes: bool) -> Result<String> {
    let env = EnvFile::load(&project.env_path())?;
    let mut doc = project.read_template()?;

    let desired: Vec<(String, String, String)> = env
        .entries
        .iter()
        .map(|(key, value)| (key.clone(), template::env_parameter_name(key), value.clone()))
        .collect();
    let existing = env_parameter_names(doc.lines());

    let mut report = Vec::new();

    // The stage feeds the template's `Stage` default; samconfig.toml
    // follows after the template write below.
    if let Some(stage) = &env.stage
        && let Some(span) = locator::section_entry(doc.lines(), "Parameters", "Stage")
    {
        let (index, current) = locator::property_line(doc.lines(), span, "Default")
            .ok_or_else(|| anyhow!("parameter 'Stage' has no Default line"))?;
        if unquote(&current) != stage {
            doc.replace_line(index, format!("    Default: '{stage}'"));
            report.push(format!("updated stage default to '{stage}'"));
        }
    }

    // Pass 1: variables new in .env.
    for (key, parameter, value) in &desired {
        if !existing.contains(parameter) {
            add_env_backing(&mut doc, key, value)?;
            report.push(format!("added '{key}' ({parameter})"));
        }
    }

    // Pass 2: variables whose default value changed.
    for (key, parameter, value) in &desired {
        if !existing.contains(parameter) {
            continue;
        }
        let span = locator::section_entry(doc.lines(), "Parameters", parameter)
            .ok_or_else(|| anyhow!("parameter '{parameter}' disappeared during sync"))?;
        let (index, current) = locator::property_line(doc.lines(), span, "Default")
            .ok_or_else(|| anyhow!("parameter '{parameter}' has no Default line"))?;
        if unquote(&current) != value {
            doc.replace_line(index, format!("    Default: '{value}'"));
            report.push(format!("updated '{key}' default"));
        }
    }

    // Pass 3: variables gone from .env.
    let desired_parameters: Vec<&String> = desired.iter().map(|(_, p, _)| p).collect();
    for parameter in &existing {
        if desired_parameters.iter().any(|p| *p == parameter) {
            continue;
        }
        if !assume_yes {
            report.push(format!(
                "would remove '{parameter}' (missing from .env) — re-run with --yes to confirm"
            ));
            continue;
        }
        let unwired = remove_env_backing(&mut doc, parameter)?;
        if unwired.is_empty() {
            report.push(format!("removed '{parameter}'"));
        } else {
            report.push(format!(
                "removed '{parameter}' (unwired from {})",
                unwired.join(", ")
            ));
        }
    }

    doc.save()?;

    if let Some(stage) = &env.stage {
        let mut sam_config = config::load_or_create(project)?;
        if &sam_config.stage != stage {
            sam_config.stage = stage.clone();
            config::write(project, &sam_config)?;
            report.push(format!("updated samconfig stage to '{stage}'"));
        }
    }

    if report.is_empty() {
        return Ok("Environment already in sync.".to_string());
    }
    Ok(report.join("\n"))
}

/// Wires one already-synced variable into a Lambda's environment.
pub fn add_env_var(project: &Project, lambda: &str, key: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    let span =
        edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;
    let parameter = template::env_parameter_name(key);
    if locator::section_entry(doc.lines(), "Parameters", &parameter).is_none() {
        bail!(
            "environment variable '{key}' has no '{parameter}' parameter in the template — \
             add it to .env and run 'env sync' first"
        );
    }

    let lines = doc.lines();
    let props = locator::properties_block(lines, span)
        .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
    let needle = format!("!Ref {parameter}");
    match locator::locate_sub_block(lines, props, "Environment") {
        Some(environment) => {
            let variables = locator::locate_sub_block(lines, environment, "Variables")
                .ok_or_else(|| anyhow!("'{function_id}' has an Environment block without Variables"))?;
            let already = lines[variables.start + 1..variables.end]
                .iter()
                .any(|line| {
                    line.trim()
                        .split_once(": ")
                        .is_some_and(|(_, value)| value == needle)
                });
            if already {
                bail!("'{key}' is already wired into '{lambda}'");
            }
            doc.insert(variables.end, vec![template::env_var_line(key, &parameter)]);
        }
        None => {
            let at = locator::wrapper_insert_at(lines, span)
                .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
            doc.insert(
                at,
                template::environment_block(&[(key.to_string(), parameter.clone())]),
            );
        }
    }

    doc.save()?;
    Ok(format!("Wired '{key}' into '{lambda}'"))
}

/// Removes one variable reference from a Lambda's environment.
pub fn remove_env_var(project: &Project, lambda: &str, key: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;
    let parameter = template::env_parameter_name(key);

    if !remove_env_reference(&mut doc, &function_id, &parameter)? {
        bail!("'{key}' is not wired into '{lambda}'");
    }
    doc.save()?;
    Ok(format!("Unwired '{key}' from '{lambda}'"))
}
