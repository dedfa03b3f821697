//! # Table Operations
//!
//! DynamoDB tables with their scoped IAM managed policies and generated
//! `src/utils/<table>Handler.ts` helpers. Attaching a table to a Lambda
//! adds the policy reference to `Policies:` and splices the helper import
//! into the Lambda's handler source.

use anyhow::{Result, bail};

use crate::edits;
use crate::locator;
use crate::project::Project;
use crate::source_tree;
use crate::template::{self, TableKey};

pub fn create_table(project: &Project, name: &str, key_spec: &str) -> Result<String> {
    locator::validate_name(name)?;
    let key = TableKey::parse(key_spec)?;
    let mut doc = project.read_template()?;
    let policy = template::table_policy_name(name);

    if locator::locate_resource(doc.lines(), name).is_some() {
        bail!("a resource named '{name}' already exists in the template");
    }
    if locator::locate_resource(doc.lines(), &policy).is_some() {
        bail!("a resource named '{policy}' already exists in the template");
    }

    let mut block = template::table_resource(name, &key);
    block.extend(template::table_policy(name));
    edits::append_resource(&mut doc, block);
    doc.save()?;

    source_tree::create_table_handler(project, name, &key)?;
    Ok(format!("Created table '{name}' with key '{key_spec}'"))
}

pub fn delete_table(project: &Project, name: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), name, "AWS::DynamoDB::Table")?;
    let policy = template::table_policy_name(name);

    let referencing = edits::functions_referencing(doc.lines(), "Policies", &policy);
    if !referencing.is_empty() {
        bail!(
            "table '{name}' is still attached to: {} — detach it first",
            referencing.join(", ")
        );
    }

    edits::remove_resource(&mut doc, name)?;
    if locator::locate_resource(doc.lines(), &policy).is_some() {
        edits::remove_resource(&mut doc, &policy)?;
    }
    doc.save()?;

    source_tree::remove_table_handler(project, name)?;
    Ok(format!("Removed table '{name}' and its helper sources"))
}

pub fn attach_table(project: &Project, lambda: &str, table: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;
    edits::require_typed_resource(doc.lines(), table, "AWS::DynamoDB::Table")?;
    let policy = template::table_policy_name(table);
    edits::require_resource(doc.lines(), &policy)?;

    edits::add_list_entry(
        &mut doc,
        &function_id,
        "Policies",
        template::policies_wrapper(),
        template::policy_entry(&policy),
        &policy,
    )?;
    doc.save()?;

    source_tree::inject_table_import(project, lambda, table)?;
    Ok(format!("Attached table '{table}' to '{lambda}'"))
}

pub fn detach_table(project: &Project, lambda: &str, table: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;
    let policy = template::table_policy_name(table);

    edits::remove_list_entry(&mut doc, &function_id, "Policies", &policy)?;
    doc.save()?;

    source_tree::remove_table_import(project, lambda, table)?;
    Ok(format!("Detached table '{table}' from '{lambda}'"))
}
