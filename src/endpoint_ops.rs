//! # Endpoint Operations
//!
//! Adding, updating and deleting API Gateway event bindings on Lambda
//! functions. Duplicates are rejected before any splice: the create flow
//! enforces (method, path, lambda) uniqueness across all gateways, the
//! update flow (method, path) uniqueness on the target gateway.

use anyhow::{Result, anyhow, bail};

use crate::document::Document;
use crate::edits;
use crate::endpoint_index::{self, build_endpoint_index};
use crate::locator;
use crate::project::Project;
use crate::template;

const METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "options", "any",
];

fn normalize_method(method: &str) -> Result<String> {
    let lowered = method.to_lowercase();
    if !METHODS.contains(&lowered.as_str()) {
        bail!(
            "unsupported HTTP method '{method}' (expected one of: {})",
            METHODS.join(", ")
        );
    }
    Ok(lowered)
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path.contains(char::is_whitespace) {
        bail!("invalid endpoint path '{path}': must start with '/' and contain no whitespace");
    }
    Ok(())
}

/// The gateway a binding references, for verifying the caller named the
/// right one.
fn binding_api(lines: &[String], function_id: &str, event: &str) -> Result<String> {
    let span = edits::require_resource(lines, function_id)?;
    let props = locator::properties_block(lines, span)
        .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
    let events = locator::locate_sub_block(lines, props, "Events")
        .ok_or_else(|| anyhow!("'{function_id}' has no Events block"))?;
    let event_span = locator::child_entries(lines, events)
        .into_iter()
        .find(|(name, _)| name == event)
        .map(|(_, span)| span)
        .ok_or_else(|| anyhow!("event '{event}' not found on '{function_id}'"))?;
    let (_, value) = locator::property_line(lines, event_span, "RestApiId")
        .ok_or_else(|| anyhow!("event '{event}' on '{function_id}' has no RestApiId"))?;
    value
        .strip_prefix("!Ref ")
        .map(|api| api.trim().to_string())
        .ok_or_else(|| anyhow!("event '{event}' on '{function_id}' does not use a !Ref gateway"))
}

pub fn add_endpoint(
    project: &Project,
    api: &str,
    lambda: &str,
    method: &str,
    path: &str,
) -> Result<String> {
    let method = normalize_method(method)?;
    validate_path(path)?;

    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), api, "AWS::Serverless::Api")?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;

    let index = build_endpoint_index(doc.lines());
    if let Some(existing) = endpoint_index::duplicate_for_create(&index, &function_id, &method, path)
    {
        bail!(
            "'{lambda}' already handles {} {path} on gateway '{existing}'",
            method.to_uppercase()
        );
    }

    let event = edits::next_event_name(doc.lines(), &function_id)?;
    edits::insert_event_binding(&mut doc, &function_id, &event, api, path, &method)?;
    doc.save()?;

    Ok(format!(
        "Added endpoint {} {path} on '{api}' -> '{lambda}' ({event})",
        method.to_uppercase()
    ))
}

pub fn update_endpoint(
    project: &Project,
    api: &str,
    lambda: &str,
    event: &str,
    new_lambda: Option<&str>,
    method: &str,
    path: &str,
) -> Result<String> {
    let method = normalize_method(method)?;
    validate_path(path)?;

    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), api, "AWS::Serverless::Api")?;
    let function_id = template::function_id(lambda);
    edits::require_typed_resource(doc.lines(), &function_id, "AWS::Serverless::Function")?;

    let bound_api = binding_api(doc.lines(), &function_id, event)?;
    if bound_api != api {
        bail!("event '{event}' on '{lambda}' is bound to gateway '{bound_api}', not '{api}'");
    }

    let index = build_endpoint_index(doc.lines());
    if let Some(owner) = endpoint_index::duplicate_on_gateway(
        &index,
        api,
        &method,
        path,
        Some((&function_id, event)),
    ) {
        bail!(
            "gateway '{api}' already routes {} {path} to '{owner}'",
            method.to_uppercase()
        );
    }

    match new_lambda {
        Some(target) if target != lambda => {
            let target_id = template::function_id(target);
            edits::require_typed_resource(doc.lines(), &target_id, "AWS::Serverless::Function")?;
            // Cross-resource move: delete from the old Lambda, add to the new.
            edits::remove_event_binding(&mut doc, &function_id, event)?;
            let new_event = edits::next_event_name(doc.lines(), &target_id)?;
            edits::insert_event_binding(&mut doc, &target_id, &new_event, api, path, &method)?;
            doc.save()?;
            Ok(format!(
                "Moved endpoint to '{target}' as {} {path} ({new_event})",
                method.to_uppercase()
            ))
        }
        _ => {
            rewrite_binding(&mut doc, &function_id, event, &method, path)?;
            doc.save()?;
            Ok(format!(
                "Updated endpoint '{event}' on '{lambda}' to {} {path}",
                method.to_uppercase()
            ))
        }
    }
}

/// In-place rewrite of a binding's `Path`/`Method` lines. Line-for-line
/// replacement, so both indices from one scan stay valid.
fn rewrite_binding(
    doc: &mut Document,
    function_id: &str,
    event: &str,
    method: &str,
    path: &str,
) -> Result<()> {
    let lines = doc.lines();
    let span = edits::require_resource(lines, function_id)?;
    let props = locator::properties_block(lines, span)
        .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
    let events = locator::locate_sub_block(lines, props, "Events")
        .ok_or_else(|| anyhow!("'{function_id}' has no Events block"))?;
    let event_span = locator::child_entries(lines, events)
        .into_iter()
        .find(|(name, _)| name == event)
        .map(|(_, span)| span)
        .ok_or_else(|| anyhow!("event '{event}' not found on '{function_id}'"))?;
    let (path_idx, _) = locator::property_line(lines, event_span, "Path")
        .ok_or_else(|| anyhow!("event '{event}' has no Path line"))?;
    let (method_idx, _) = locator::property_line(lines, event_span, "Method")
        .ok_or_else(|| anyhow!("event '{event}' has no Method line"))?;

    doc.replace_line(path_idx, format!("            Path: {path}"));
    doc.replace_line(method_idx, format!("            Method: {method}"));
    Ok(())
}

pub fn delete_endpoint(project: &Project, api: &str, lambda: &str, event: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    edits::require_typed_resource(doc.lines(), api, "AWS::Serverless::Api")?;
    let function_id = template::function_id(lambda);

    let bound_api = binding_api(doc.lines(), &function_id, event)?;
    if bound_api != api {
        bail!("event '{event}' on '{lambda}' is bound to gateway '{bound_api}', not '{api}'");
    }

    edits::remove_event_binding(&mut doc, &function_id, event)?;
    doc.save()?;
    Ok(format!("Removed endpoint '{event}' from '{lambda}'"))
}

/// Lists all indexed routes, optionally restricted to one gateway.
pub fn list_endpoints(project: &Project, api: Option<&str>) -> Result<String> {
    let doc = project.read_template()?;
    let mut index = build_endpoint_index(doc.lines());
    if let Some(api) = api {
        index.retain(|name, _| name == api);
    }
    let routes = endpoint_index::describe(&index);
    if routes.is_empty() {
        return Ok("No endpoints found.".to_string());
    }
    Ok(routes.join("\n"))
}
