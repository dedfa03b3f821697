//! # Layer Operations
//!
//! LayerVersion resources with their `src/layers/<name>/` sources, and the
//! `Layers:` attachment list on Lambda functions. A layer cannot be deleted
//! while any Function still references it; the error names every
//! referencing Function and nothing is written.

use anyhow::{Result, bail};

use crate::edits;
use crate::locator;
use crate::project::Project;
use crate::source_tree;
use crate::template;

pub fn create_layer(project: &Project, name: &str) -> Result<String> {
    locator::validate_name(name)?;
    let mut doc = project.read_template()?;
    if locator::locate_resource(doc.lines(), name).is_some() {
        bail!("a resource named '{name}' already exists in the template");
    }
    if project.layer_dir(name).exists() {
        bail!(
            "layer folder '{}' already exists — pick another name",
            project.layer_dir(name).display()
        );
    }

    edits::append_resource(&mut doc, template::layer_resource(name));
    doc.save()?;

    source_tree::create_layer_sources(project, name)?;
    Ok(format!("Created layer '{name}'"))
}

pub fn delete_layer(project: &Project, name: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), name, "AWS::Serverless::LayerVersion")?;

    let referencing = edits::functions_referencing(doc.lines(), "Layers", name);
    if !referencing.is_empty() {
        bail!(
            "layer '{name}' is still attached to: {} — detach it first",
            referencing.join(", ")
        );
    }

    edits::remove_resource(&mut doc, name)?;
    doc.save()?;

    source_tree::remove_layer_sources(project, name)?;
    Ok(format!("Removed layer '{name}' and its sources"))
}

pub fn attach_layer(project: &Project, lambda: &str, layer: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;
    edits::require_typed_resource(doc.lines(), layer, "AWS::Serverless::LayerVersion")?;

    edits::add_list_entry(
        &mut doc,
        &function_id,
        "Layers",
        template::layers_wrapper(),
        template::layer_entry(layer),
        layer,
    )?;
    doc.save()?;
    Ok(format!("Attached layer '{layer}' to '{lambda}'"))
}

pub fn detach_layer(project: &Project, lambda: &str, layer: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;

    edits::remove_list_entry(&mut doc, &function_id, "Layers", layer)?;
    doc.save()?;
    Ok(format!("Detached layer '{layer}' from '{lambda}'"))
}
