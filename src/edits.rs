//! # Shared Document Edits
//!
//! The compound splices every mutation operation is assembled from:
//! appending resources/parameters/outputs at their section anchors,
//! event-binding insertion/removal, and `- !Ref` list entries with their
//! wrapper lifecycle (create the wrapper on first entry, drop it with the
//! last one). Each helper re-derives line positions from the current
//! document — nothing here caches an index across a splice.

use anyhow::{Result, anyhow, bail};

use crate::document::Document;
use crate::locator::{self, Span};
use crate::template;

/// Inserts a resource block before `Outputs:` (or at EOF).
pub fn append_resource(doc: &mut Document, block: Vec<String>) {
    let at = locator::resource_insert_at(doc.lines());
    doc.insert(at, block);
}

/// Appends an entry to the `Parameters:` section.
pub fn append_parameter(doc: &mut Document, block: Vec<String>) -> Result<()> {
    let at = locator::parameter_insert_at(doc.lines())
        .ok_or_else(|| anyhow!("template has no Parameters section"))?;
    doc.insert(at, block);
    Ok(())
}

/// Appends an entry to `Outputs:`, creating the section at EOF when absent.
pub fn append_output(doc: &mut Document, block: Vec<String>) {
    match locator::section(doc.lines(), "Outputs") {
        Some(span) => doc.insert(span.end, block),
        None => {
            let mut section = vec!["Outputs:".to_string()];
            section.extend(block);
            let at = doc.len();
            doc.insert(at, section);
        }
    }
}

/// Removes a resource block by name.
pub fn remove_resource(doc: &mut Document, name: &str) -> Result<()> {
    let span = locator::locate_resource(doc.lines(), name)
        .ok_or_else(|| anyhow!("resource '{name}' not found in template"))?;
    doc.remove(span);
    Ok(())
}

/// Removes one `Outputs:` entry by name. Returns whether it existed.
pub fn remove_output_entry(doc: &mut Document, name: &str) -> bool {
    match locator::section_entry(doc.lines(), "Outputs", name) {
        Some(span) => {
            doc.remove(span);
            true
        }
        None => false,
    }
}

/// Removes every `Outputs:` entry with a line referencing `name` via
/// `!Ref`, `!GetAtt` or `!Sub` substitution. Returns the removed names.
pub fn remove_outputs_referencing(doc: &mut Document, name: &str) -> Vec<String> {
    let mut removed = Vec::new();
    loop {
        let target = locator::entry_spans(doc.lines(), "Outputs")
            .into_iter()
            .find(|(_, span)| {
                doc.lines()[span.start..span.end]
                    .iter()
                    .any(|line| template::references_name(line, name))
            });
        match target {
            Some((output_name, span)) => {
                doc.remove(span);
                removed.push(output_name);
            }
            None => break,
        }
    }
    removed
}

/// Drops the `Outputs:` header once the section holds no entries.
pub fn collapse_outputs_if_empty(doc: &mut Document) {
    if let Some(span) = locator::section(doc.lines(), "Outputs")
        && locator::entry_spans(doc.lines(), "Outputs").is_empty()
    {
        doc.remove(span);
    }
}

/// Next free event name for a Lambda: one past the highest `event<N>`
/// suffix ever seen, so numbers freed by deletions are not reused.
pub fn next_event_name(lines: &[String], function_id: &str) -> Result<String> {
    let span = require_resource(lines, function_id)?;
    let max_seen = locator::properties_block(lines, span)
        .and_then(|props| locator::locate_sub_block(lines, props, "Events"))
        .map(|events| {
            locator::child_entries(lines, events)
                .iter()
                .filter_map(|(name, _)| name.strip_prefix("event")?.parse::<u32>().ok())
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    Ok(format!("event{}", max_seen + 1))
}

/// Inserts an event binding, creating the `Events:` wrapper when absent.
pub fn insert_event_binding(
    doc: &mut Document,
    function_id: &str,
    event: &str,
    api: &str,
    path: &str,
    method: &str,
) -> Result<()> {
    let lines = doc.lines();
    let span = require_resource(lines, function_id)?;
    let props = locator::properties_block(lines, span)
        .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
    let binding = template::event_binding(event, api, path, method);
    match locator::locate_sub_block(lines, props, "Events") {
        Some(events) => doc.insert(events.end, binding),
        None => {
            let mut block = vec![template::events_wrapper()];
            block.extend(binding);
            doc.insert(props.end, block);
        }
    }
    Ok(())
}

/// Removes an event binding; the `Events:` wrapper goes with its last event.
pub fn remove_event_binding(doc: &mut Document, function_id: &str, event: &str) -> Result<()> {
    let lines = doc.lines();
    let span = require_resource(lines, function_id)?;
    let props = locator::properties_block(lines, span)
        .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
    let events = locator::locate_sub_block(lines, props, "Events")
        .ok_or_else(|| anyhow!("'{function_id}' has no Events block"))?;
    let children = locator::child_entries(lines, events);
    let target = children
        .iter()
        .find(|(name, _)| name == event)
        .map(|(_, span)| *span)
        .ok_or_else(|| anyhow!("event '{event}' not found on '{function_id}'"))?;
    if children.len() == 1 {
        doc.remove(events);
    } else {
        doc.remove(target);
    }
    Ok(())
}

/// Adds a `- !Ref <target>` entry to a Function's list block (`Layers:` or
/// `Policies:`), creating the wrapper at the shared anchor on first use.
/// Rejects an entry that is already present.
pub fn add_list_entry(
    doc: &mut Document,
    function_id: &str,
    key: &str,
    wrapper: String,
    entry_line: String,
    target: &str,
) -> Result<()> {
    let lines = doc.lines();
    let span = require_resource(lines, function_id)?;
    let value = format!("!Ref {target}");
    match function_list_block(lines, span, key) {
        Some(block) => {
            if locator::list_entries(lines, block)
                .iter()
                .any(|(_, v)| v == &value)
            {
                bail!("'{target}' is already attached to '{function_id}'");
            }
            doc.insert(block.end, vec![entry_line]);
        }
        None => {
            let at = locator::wrapper_insert_at(lines, span)
                .ok_or_else(|| anyhow!("resource '{function_id}' has no Properties block"))?;
            doc.insert(at, vec![wrapper, entry_line]);
        }
    }
    Ok(())
}

/// Removes a `- !Ref <target>` entry; the wrapper goes with the last entry.
pub fn remove_list_entry(
    doc: &mut Document,
    function_id: &str,
    key: &str,
    target: &str,
) -> Result<()> {
    let lines = doc.lines();
    let span = require_resource(lines, function_id)?;
    let block = function_list_block(lines, span, key)
        .ok_or_else(|| anyhow!("'{function_id}' has no {key} block"))?;
    let entries = locator::list_entries(lines, block);
    let value = format!("!Ref {target}");
    let entry_index = entries
        .iter()
        .find(|(_, v)| v == &value)
        .map(|(i, _)| *i)
        .ok_or_else(|| anyhow!("'{target}' is not attached to '{function_id}'"))?;
    if entries.len() == 1 {
        doc.remove(block);
    } else {
        doc.remove_line(entry_index);
    }
    Ok(())
}

/// Functions whose `<key>:` list holds a `- !Ref <target>` entry.
pub fn functions_referencing(lines: &[String], key: &str, target: &str) -> Vec<String> {
    let value = format!("!Ref {target}");
    locator::entry_spans(lines, "Resources")
        .into_iter()
        .filter(|(_, span)| {
            locator::resource_type(lines, *span).as_deref() == Some("AWS::Serverless::Function")
        })
        .filter(|(_, span)| {
            function_list_block(lines, *span, key)
                .map(|block| {
                    locator::list_entries(lines, block)
                        .iter()
                        .any(|(_, v)| v == &value)
                })
                .unwrap_or(false)
        })
        .map(|(name, _)| name)
        .collect()
}

/// A list block (`Layers:`/`Policies:`) scoped under the resource's
/// `Properties:` rather than found anywhere in the resource.
fn function_list_block(lines: &[String], resource: Span, key: &str) -> Option<Span> {
    let props = locator::properties_block(lines, resource)?;
    locator::locate_sub_block(lines, props, key)
}

pub fn require_resource(lines: &[String], name: &str) -> Result<Span> {
    locator::locate_resource(lines, name)
        .ok_or_else(|| anyhow!("resource '{name}' not found in template"))
}

/// Looks up a resource and checks its declared CloudFormation type.
pub fn require_typed_resource(lines: &[String], name: &str, ty: &str) -> Result<Span> {
    let span = require_resource(lines, name)?;
    let actual = locator::resource_type(lines, span)
        .ok_or_else(|| anyhow!("resource '{name}' has no Type line"))?;
    if actual != ty {
        bail!("resource '{name}' is a {actual}, expected {ty}");
    }
    Ok(span)
}
