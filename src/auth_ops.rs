//! # Auth Operations
//!
//! Gateway authorization. Basic auth shares one `BasicAuthorizerFunction`
//! (plus log group and `src/authorizer/` sources) across every gateway that
//! opts in; the shared pieces are created on first use and removed when the
//! last referencing gateway drops its `Auth:` block. Cognito auth creates a
//! fresh user pool and client per call — pools are never shared.

use anyhow::{Result, anyhow, bail};

use crate::document::Document;
use crate::edits;
use crate::locator::{self, Span};
use crate::project::Project;
use crate::source_tree;
use crate::template::{self, BASIC_AUTHORIZER_FUNCTION};

/// The `Auth:` block of a gateway's properties, when present.
fn auth_block(lines: &[String], api_span: Span) -> Option<Span> {
    let props = locator::properties_block(lines, api_span)?;
    locator::locate_sub_block(lines, props, "Auth")
}

fn require_api_without_auth(doc: &Document, api: &str) -> Result<Span> {
    let span = edits::require_typed_resource(doc.lines(), api, "AWS::Serverless::Api")?;
    if auth_block(doc.lines(), span).is_some() {
        bail!("gateway '{api}' already has an Auth block — remove it first");
    }
    Ok(span)
}

/// Does any gateway still carry an `Auth:` block referencing the shared
/// basic authorizer?
fn basic_auth_still_referenced(lines: &[String]) -> bool {
    locator::resources_of_type(lines, "AWS::Serverless::Api")
        .into_iter()
        .filter_map(|api| locator::locate_resource(lines, &api))
        .filter_map(|span| auth_block(lines, span))
        .any(|auth| {
            lines[auth.start..auth.end]
                .iter()
                .any(|line| line.contains(BASIC_AUTHORIZER_FUNCTION))
        })
}

pub fn add_basic_auth(project: &Project, api: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    require_api_without_auth(&doc, api)?;

    let created_shared =
        locator::locate_resource(doc.lines(), BASIC_AUTHORIZER_FUNCTION).is_none();
    if created_shared {
        edits::append_resource(&mut doc, template::basic_authorizer_resources());
    }

    // Re-derive the gateway position after the append.
    let span = edits::require_resource(doc.lines(), api)?;
    let at = locator::properties_insert_at(doc.lines(), span)
        .ok_or_else(|| anyhow!("gateway '{api}' has no Properties block"))?;
    doc.insert(at, template::basic_auth_block());
    doc.save()?;

    source_tree::write_authorizer_sources(project)?;
    Ok(if created_shared {
        format!("Added basic auth to '{api}' (created shared authorizer)")
    } else {
        format!("Added basic auth to '{api}' (reusing shared authorizer)")
    })
}

pub fn add_cognito_auth(project: &Project, api: &str, pool: &str) -> Result<String> {
    locator::validate_name(pool)?;
    let mut doc = project.read_template()?;
    require_api_without_auth(&doc, api)?;
    let pool_resource = format!("{pool}UserPool");
    if locator::locate_resource(doc.lines(), &pool_resource).is_some() {
        bail!("a resource named '{pool_resource}' already exists in the template");
    }

    let span = edits::require_resource(doc.lines(), api)?;
    let at = locator::properties_insert_at(doc.lines(), span)
        .ok_or_else(|| anyhow!("gateway '{api}' has no Properties block"))?;
    doc.insert(at, template::cognito_auth_block(pool));

    edits::append_resource(&mut doc, template::user_pool(pool));
    edits::append_resource(&mut doc, template::user_pool_client(pool));
    edits::append_output(&mut doc, template::user_pool_outputs(pool));
    doc.save()?;

    Ok(format!(
        "Added Cognito auth to '{api}' with user pool '{pool}'"
    ))
}

pub fn remove_auth(project: &Project, api: &str) -> Result<String> {
    let mut doc = project.read_template()?;
    let span = edits::require_typed_resource(doc.lines(), api, "AWS::Serverless::Api")?;
    let auth = auth_block(doc.lines(), span)
        .ok_or_else(|| anyhow!("gateway '{api}' has no Auth block"))?;

    let auth_lines = &doc.lines()[auth.start..auth.end];
    let is_basic = auth_lines
        .iter()
        .any(|line| line.contains(&format!("FunctionArn: !GetAtt {BASIC_AUTHORIZER_FUNCTION}.Arn")));
    let cognito_pool = auth_lines.iter().find_map(|line| {
        line.trim()
            .strip_prefix("UserPoolArn: !GetAtt ")?
            .strip_suffix("UserPool.Arn")
            .map(str::to_string)
    });

    doc.remove(auth);

    let mut removed_shared = false;
    if is_basic && !basic_auth_still_referenced(doc.lines()) {
        // Last basic-auth gateway is gone; retire the shared authorizer.
        edits::remove_resource(&mut doc, BASIC_AUTHORIZER_FUNCTION)?;
        let log_group = format!("{BASIC_AUTHORIZER_FUNCTION}LogGroup");
        if locator::locate_resource(doc.lines(), &log_group).is_some() {
            edits::remove_resource(&mut doc, &log_group)?;
        }
        removed_shared = true;
    }

    if let Some(pool) = &cognito_pool {
        for resource in [format!("{pool}UserPool"), format!("{pool}UserPoolClient")] {
            if locator::locate_resource(doc.lines(), &resource).is_some() {
                edits::remove_resource(&mut doc, &resource)?;
            }
        }
        edits::remove_output_entry(&mut doc, &format!("{pool}UserPoolId"));
        edits::remove_output_entry(&mut doc, &format!("{pool}UserPoolClientId"));
        edits::collapse_outputs_if_empty(&mut doc);
    }

    doc.save()?;

    if removed_shared {
        source_tree::remove_authorizer_sources(project)?;
        return Ok(format!(
            "Removed auth from '{api}' and retired the shared authorizer"
        ));
    }
    Ok(format!("Removed auth from '{api}'"))
}
