//! # Lambda Operations
//!
//! Adding and removing Lambda functions. Every Lambda owns a paired log
//! group resource and a `src/<name>/` handler folder; all three are created
//! and deleted together. A project must always retain at least one Lambda —
//! enforced here, not in the document layer.

use anyhow::{Result, bail};

use crate::edits;
use crate::locator;
use crate::project::Project;
use crate::source_tree;
use crate::template;

/// Functions that belong to the user's project, excluding the shared
/// basic-auth authorizer.
pub fn user_function_ids(lines: &[String]) -> Vec<String> {
    locator::resources_of_type(lines, "AWS::Serverless::Function")
        .into_iter()
        .filter(|name| name != template::BASIC_AUTHORIZER_FUNCTION)
        .collect()
}

pub fn add_lambda(
    project: &Project,
    name: &str,
    timeout: u32,
    env_vars: &[String],
) -> Result<String> {
    locator::validate_name(name)?;
    let mut doc = project.read_template()?;
    let function_id = template::function_id(name);

    if locator::locate_resource(doc.lines(), &function_id).is_some() {
        bail!("a Lambda named '{name}' already exists in the template");
    }
    if project.lambda_dir(name).exists() {
        bail!(
            "source folder '{}' already exists — pick another name",
            project.lambda_dir(name).display()
        );
    }

    let mut wiring = Vec::with_capacity(env_vars.len());
    for key in env_vars {
        let parameter = template::env_parameter_name(key);
        if locator::section_entry(doc.lines(), "Parameters", &parameter).is_none() {
            bail!(
                "environment variable '{key}' has no '{parameter}' parameter in the template — \
                 add it to .env and run 'env sync' first"
            );
        }
        wiring.push((key.clone(), parameter));
    }

    let mut block = template::function_resource(&function_id, name, timeout, &wiring);
    block.extend(template::log_group(&function_id));
    edits::append_resource(&mut doc, block);
    doc.save()?;

    source_tree::create_lambda_sources(project, name)?;
    Ok(format!(
        "Added Lambda '{name}' ({function_id}) with timeout {timeout}s"
    ))
}

pub fn delete_lambda(project: &Project, name: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(name);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;

    if user_function_ids(doc.lines()).len() <= 1 {
        bail!("'{name}' is the only Lambda in the project — a project must keep at least one");
    }

    edits::remove_resource(&mut doc, &function_id)?;
    let log_group = format!("{function_id}LogGroup");
    if locator::locate_resource(doc.lines(), &log_group).is_some() {
        edits::remove_resource(&mut doc, &log_group)?;
    }
    doc.save()?;

    source_tree::remove_lambda_sources(project, name)?;
    Ok(format!("Removed Lambda '{name}' and its sources"))
}
