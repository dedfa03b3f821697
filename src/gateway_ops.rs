//! # Gateway Operations
//!
//! Creating an API Gateway with its paired `Url` output, and the cascade
//! delete: every event binding referencing the gateway goes first, then the
//! resource, then any output referencing it, then the `Outputs:` header if
//! the section emptied. Each pass re-scans the document.

use anyhow::{Result, bail};

use crate::edits;
use crate::endpoint_index::build_endpoint_index;
use crate::locator;
use crate::project::Project;
use crate::template;

pub fn create_gateway(project: &Project, name: &str) -> Result<String> {
    locator::validate_name(name)?;
    let mut doc = project.read_template()?;
    if locator::locate_resource(doc.lines(), name).is_some() {
        bail!("a resource named '{name}' already exists in the template");
    }

    edits::append_resource(&mut doc, template::api_resource(name));
    edits::append_output(&mut doc, template::api_url_output(name));
    doc.save()?;
    Ok(format!("Created API gateway '{name}'"))
}

pub fn delete_gateway(project: &Project, name: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), name, "AWS::Serverless::Api")?;

    // Pass 1: strip every binding wired to this gateway.
    let index = build_endpoint_index(doc.lines());
    let mut removed_bindings = 0usize;
    if let Some(lambdas) = index.get(name) {
        for (function_id, bindings) in lambdas {
            for binding in bindings {
                edits::remove_event_binding(&mut doc, function_id, &binding.event)?;
                removed_bindings += 1;
            }
        }
    }

    // Pass 2: the gateway resource itself.
    edits::remove_resource(&mut doc, name)?;

    // Pass 3: outputs that reference it, then the section if emptied.
    let removed_outputs = edits::remove_outputs_referencing(&mut doc, name);
    edits::collapse_outputs_if_empty(&mut doc);

    doc.save()?;
    Ok(format!(
        "Removed gateway '{name}' ({removed_bindings} endpoint(s), {} output(s))",
        removed_outputs.len()
    ))
}
