//! # Resource Locator & Block Scanner
//!
//! Line-oriented structure discovery over the template document. The
//! template is the 2-space-indented CloudFormation/SAM subset produced by
//! this tool's own scaffolder, so structure can be recovered with two
//! primitives instead of a YAML parser:
//!
//! - section/entry location: top-level sections (`Resources:`, `Parameters:`,
//!   `Outputs:`) hold named entries at 2-space indent;
//! - the indentation fence: a nested block ends at the first following
//!   non-blank line whose indentation is at or below the block key's.
//!
//! The fence is implemented once here and reused by every block-oriented
//! operation. Absence is reported as `None`; callers decide whether a
//! missing entity is an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// A half-open line range `[start, end)` into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// `  <Name>:` — a named entry at one level of indent inside a top-level
/// section. Resource, parameter, and output names all share this shape.
static ENTRY_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^  ([A-Za-z0-9]+):$").unwrap());

pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Finds the first following line at or below `indent` — the fence that
/// closes a block opened at `start`. Blank lines never close a block.
fn fence(lines: &[String], start: usize, indent: usize, limit: usize) -> usize {
    for (offset, line) in lines[start..limit].iter().enumerate() {
        if !is_blank(line) && indent_of(line) <= indent {
            return start + offset;
        }
    }
    limit
}

/// Locates a top-level section (`Resources:`, `Parameters:`, `Outputs:`,
/// `Globals:`). The span includes the header line.
pub fn section(lines: &[String], name: &str) -> Option<Span> {
    let header = format!("{name}:");
    let start = lines.iter().position(|l| l == &header)?;
    let end = fence(lines, start + 1, 0, lines.len());
    Some(Span { start, end })
}

/// All named entries of a section, in document order, with their spans.
/// An entry ends at the next entry header or the end of the section.
pub fn entry_spans(lines: &[String], section_name: &str) -> Vec<(String, Span)> {
    let Some(sec) = section(lines, section_name) else {
        return Vec::new();
    };
    let mut starts = Vec::new();
    for i in sec.start + 1..sec.end {
        if let Some(caps) = ENTRY_HEADER.captures(&lines[i]) {
            starts.push((caps[1].to_string(), i));
        }
    }
    let mut entries = Vec::with_capacity(starts.len());
    for (idx, (name, start)) in starts.iter().enumerate() {
        let end = starts
            .get(idx + 1)
            .map(|(_, next)| *next)
            .unwrap_or(sec.end);
        entries.push((name.clone(), Span { start: *start, end }));
    }
    entries
}

pub fn entry_names(lines: &[String], section_name: &str) -> Vec<String> {
    entry_spans(lines, section_name)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

/// Locates one named entry inside a section.
pub fn section_entry(lines: &[String], section_name: &str, entry: &str) -> Option<Span> {
    entry_spans(lines, section_name)
        .into_iter()
        .find(|(name, _)| name == entry)
        .map(|(_, span)| span)
}

/// Locates a resource block inside `Resources:`. The block starts at the
/// `  <Name>:` line and ends at the next resource, the section end, or EOF.
pub fn locate_resource(lines: &[String], name: &str) -> Option<Span> {
    section_entry(lines, "Resources", name)
}

/// Reads the CloudFormation type declared on a resource's `Type:` line.
pub fn resource_type(lines: &[String], resource: Span) -> Option<String> {
    for line in &lines[resource.start + 1..resource.end] {
        if indent_of(line) == 4
            && let Some(ty) = line.trim().strip_prefix("Type: ")
        {
            return Some(ty.to_string());
        }
    }
    None
}

/// Names of all resources declaring the given CloudFormation type.
pub fn resources_of_type(lines: &[String], ty: &str) -> Vec<String> {
    entry_spans(lines, "Resources")
        .into_iter()
        .filter(|(_, span)| resource_type(lines, *span).as_deref() == Some(ty))
        .map(|(name, _)| name)
        .collect()
}

/// Locates the first sub-block `<indent><key>:` inside `range`, at any
/// nesting depth. The span covers the key line through the indentation
/// fence. Scanning is top-down, so the shallowest occurrence wins.
pub fn locate_sub_block(lines: &[String], range: Span, key: &str) -> Option<Span> {
    let header = format!("{key}:");
    for i in range.start + 1..range.end {
        let line = &lines[i];
        if !is_blank(line) && line.trim() == header {
            let indent = indent_of(line);
            let end = fence(lines, i + 1, indent, range.end);
            return Some(Span { start: i, end });
        }
    }
    None
}

/// Named children one level below a block's key — e.g. the events of an
/// `Events:` block. Children sit exactly two spaces deeper than the key.
pub fn child_entries(lines: &[String], block: Span) -> Vec<(String, Span)> {
    let child_indent = indent_of(&lines[block.start]) + 2;
    let mut starts = Vec::new();
    for i in block.start + 1..block.end {
        let line = &lines[i];
        if is_blank(line) || indent_of(line) != child_indent {
            continue;
        }
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_suffix(':')
            && !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric())
        {
            starts.push((name.to_string(), i));
        }
    }
    let mut children = Vec::with_capacity(starts.len());
    for (idx, (name, start)) in starts.iter().enumerate() {
        let end = starts
            .get(idx + 1)
            .map(|(_, next)| *next)
            .unwrap_or(block.end);
        children.push((name.clone(), Span { start: *start, end }));
    }
    children
}

/// `- <value>` list items inside a block, with their line indices.
pub fn list_entries(lines: &[String], block: Span) -> Vec<(usize, String)> {
    let mut entries = Vec::new();
    for i in block.start + 1..block.end {
        if let Some(value) = lines[i].trim().strip_prefix("- ") {
            entries.push((i, value.to_string()));
        }
    }
    entries
}

/// Reads the value of a `<key>: <value>` property line inside a block.
/// Returns the line index and the raw value text.
pub fn property_line(lines: &[String], block: Span, key: &str) -> Option<(usize, String)> {
    let prefix = format!("{key}: ");
    for i in block.start + 1..block.end {
        if let Some(value) = lines[i].trim().strip_prefix(&prefix) {
            return Some((i, value.to_string()));
        }
    }
    None
}

// --- Insertion anchors ---
//
// The global ordering conventions of the generated template, encoded once:
// new resources go before `Outputs:` (or EOF), new parameters at the end of
// `Parameters:`, and list wrappers (`Layers:`, `Policies:`, `Environment:`)
// after `Architectures:` when present, else before `Events:`, else at the
// end of `Properties:`.

/// Index at which a new resource block is inserted.
pub fn resource_insert_at(lines: &[String]) -> usize {
    section(lines, "Outputs")
        .map(|span| span.start)
        .unwrap_or(lines.len())
}

/// Index at which a new `Parameters:` entry is inserted.
pub fn parameter_insert_at(lines: &[String]) -> Option<usize> {
    section(lines, "Parameters").map(|span| span.end)
}

/// The `Properties:` block of a resource.
pub fn properties_block(lines: &[String], resource: Span) -> Option<Span> {
    locate_sub_block(lines, resource, "Properties")
}

/// Index at which a new property block is appended inside `Properties:`.
pub fn properties_insert_at(lines: &[String], resource: Span) -> Option<usize> {
    properties_block(lines, resource).map(|span| span.end)
}

/// Insertion index for a list wrapper inside a Function's properties.
pub fn wrapper_insert_at(lines: &[String], resource: Span) -> Option<usize> {
    let props = properties_block(lines, resource)?;
    if let Some(arch) = locate_sub_block(lines, props, "Architectures") {
        return Some(arch.end);
    }
    if let Some(events) = locate_sub_block(lines, props, "Events") {
        return Some(events.start);
    }
    Some(props.end)
}

/// Checks whether a project name is usable as a CloudFormation logical id
/// prefix: ASCII alphanumeric, starting with a letter.
pub fn validate_name(name: &str) -> anyhow::Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric()),
        None => false,
    };
    if !valid {
        anyhow::bail!(
            "'{name}' is not a valid name: use ASCII letters and digits, starting with a letter"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const TEMPLATE: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Transform: AWS::Serverless-2016-10-31
Parameters:
  Stage:
    Type: String
    Default: 'dev'
Resources:
  helloFunction:
    Type: AWS::Serverless::Function
    Properties:
      CodeUri: src/hello/
      Architectures:
        - x86_64
      Events:
        event1:
          Type: Api
          Properties:
            RestApiId: !Ref helloApi
            Path: /hello
            Method: get
  helloApi:
    Type: AWS::Serverless::Api
    Properties:
      StageName: !Ref Stage
Outputs:
  helloApiUrl:
    Description: Invoke URL for helloApi
    Value: !Sub 'https://${helloApi}.example.com/'
";

    #[test]
    fn test_section_spans_header_to_next_top_level() {
        let l = lines(TEMPLATE);
        let resources = section(&l, "Resources").unwrap();
        assert_eq!(l[resources.start], "Resources:");
        assert_eq!(l[resources.end], "Outputs:");
    }

    #[test]
    fn test_locate_resource_bounds() {
        let l = lines(TEMPLATE);
        let hello = locate_resource(&l, "helloFunction").unwrap();
        assert_eq!(l[hello.start], "  helloFunction:");
        assert_eq!(l[hello.end], "  helloApi:");
        let api = locate_resource(&l, "helloApi").unwrap();
        assert_eq!(l[api.end], "Outputs:");
    }

    #[test]
    fn test_locate_resource_absent_is_none() {
        let l = lines(TEMPLATE);
        assert_eq!(locate_resource(&l, "nopeFunction"), None);
    }

    #[test]
    fn test_resource_spans_are_disjoint_and_ordered() {
        let l = lines(TEMPLATE);
        let spans = entry_spans(&l, "Resources");
        assert_eq!(spans.len(), 2);
        for pair in spans.windows(2) {
            assert!(pair[0].1.end <= pair[1].1.start);
        }
    }

    #[test]
    fn test_resource_type() {
        let l = lines(TEMPLATE);
        let api = locate_resource(&l, "helloApi").unwrap();
        assert_eq!(
            resource_type(&l, api).as_deref(),
            Some("AWS::Serverless::Api")
        );
        assert_eq!(
            resources_of_type(&l, "AWS::Serverless::Function"),
            vec!["helloFunction"]
        );
    }

    #[test]
    fn test_sub_block_fence() {
        let l = lines(TEMPLATE);
        let hello = locate_resource(&l, "helloFunction").unwrap();
        let props = locate_sub_block(&l, hello, "Properties").unwrap();
        assert_eq!(indent_of(&l[props.start]), 4);
        let events = locate_sub_block(&l, props, "Events").unwrap();
        assert_eq!(l[events.start].trim(), "Events:");
        // The events block runs to the end of the resource.
        assert_eq!(events.end, hello.end);
    }

    #[test]
    fn test_child_entries_of_events() {
        let l = lines(TEMPLATE);
        let hello = locate_resource(&l, "helloFunction").unwrap();
        let events = locate_sub_block(&l, hello, "Events").unwrap();
        let children = child_entries(&l, events);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].0, "event1");
    }

    #[test]
    fn test_property_line_lookup() {
        let l = lines(TEMPLATE);
        let hello = locate_resource(&l, "helloFunction").unwrap();
        let events = locate_sub_block(&l, hello, "Events").unwrap();
        let (_, value) = property_line(&l, events, "Path").unwrap();
        assert_eq!(value, "/hello");
    }

    #[test]
    fn test_wrapper_insert_after_architectures() {
        let l = lines(TEMPLATE);
        let hello = locate_resource(&l, "helloFunction").unwrap();
        let at = wrapper_insert_at(&l, hello).unwrap();
        assert_eq!(l[at].trim(), "Events:");
    }

    #[test]
    fn test_resource_insert_before_outputs() {
        let l = lines(TEMPLATE);
        let at = resource_insert_at(&l);
        assert_eq!(l[at], "Outputs:");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("lambda2").is_ok());
        assert!(validate_name("2lambda").is_err());
        assert!(validate_name("my-lambda").is_err());
        assert!(validate_name("").is_err());
    }
}
