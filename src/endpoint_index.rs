//! # Endpoint Index
//!
//! A single pass over `Resources:` that maps every API gateway to the
//! Lambda event bindings wired to it. Used to show existing routes and to
//! reject duplicates before any mutation is applied.
//!
//! Two distinct uniqueness scopes are enforced by callers:
//! - create flow: the (method, path, lambda) triple must be unique across
//!   ALL gateways;
//! - update flow: the (method, path) pair must be unique on the SAME
//!   gateway.
//!
//! Only `RestApiId: !Ref <Api>` bindings are indexed; any other reference
//! form is out of scope and left alone.

use std::collections::BTreeMap;

use crate::locator::{self, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub event: String,
    pub method: String,
    pub path: String,
}

/// Api resource name → Function resource name → bindings, in document order.
pub type EndpointIndex = BTreeMap<String, BTreeMap<String, Vec<Binding>>>;

pub fn build_endpoint_index(lines: &[String]) -> EndpointIndex {
    let mut index = EndpointIndex::new();
    for (function, span) in locator::entry_spans(lines, "Resources") {
        if locator::resource_type(lines, span).as_deref() != Some("AWS::Serverless::Function") {
            continue;
        }
        for (api, binding) in function_bindings(lines, span) {
            index
                .entry(api)
                .or_default()
                .entry(function.clone())
                .or_default()
                .push(binding);
        }
    }
    index
}

/// The Api-typed event bindings of one Function resource, paired with the
/// Api each one references.
fn function_bindings(lines: &[String], function: Span) -> Vec<(String, Binding)> {
    let mut bindings = Vec::new();
    let Some(props) = locator::properties_block(lines, function) else {
        return bindings;
    };
    let Some(events) = locator::locate_sub_block(lines, props, "Events") else {
        return bindings;
    };
    for (event, event_span) in locator::child_entries(lines, events) {
        if locator::property_line(lines, event_span, "Type").map(|(_, v)| v)
            != Some("Api".to_string())
        {
            continue;
        }
        let Some((_, rest_api)) = locator::property_line(lines, event_span, "RestApiId") else {
            continue;
        };
        // `!GetAtt`/`!Sub` forms are not indexed.
        let Some(api) = rest_api.strip_prefix("!Ref ") else {
            continue;
        };
        let Some((_, path)) = locator::property_line(lines, event_span, "Path") else {
            continue;
        };
        let Some((_, method)) = locator::property_line(lines, event_span, "Method") else {
            continue;
        };
        bindings.push((
            api.trim().to_string(),
            Binding {
                event,
                method: method.to_lowercase(),
                path,
            },
        ));
    }
    bindings
}

/// Create-flow duplicate check: is (method, path) already wired to this
/// Lambda on any gateway? Returns the offending gateway name.
pub fn duplicate_for_create(
    index: &EndpointIndex,
    function: &str,
    method: &str,
    path: &str,
) -> Option<String> {
    for (api, lambdas) in index {
        if let Some(bindings) = lambdas.get(function)
            && bindings.iter().any(|b| b.method == method && b.path == path)
        {
            return Some(api.clone());
        }
    }
    None
}

/// Update-flow duplicate check: is (method, path) already present on this
/// gateway, ignoring the binding being edited? Returns the owning function.
pub fn duplicate_on_gateway(
    index: &EndpointIndex,
    api: &str,
    method: &str,
    path: &str,
    ignore: Option<(&str, &str)>,
) -> Option<String> {
    let lambdas = index.get(api)?;
    for (function, bindings) in lambdas {
        for binding in bindings {
            if ignore == Some((function.as_str(), binding.event.as_str())) {
                continue;
            }
            if binding.method == method && binding.path == path {
                return Some(function.clone());
            }
        }
    }
    None
}

/// Flat listing of every indexed route, for display.
pub fn describe(index: &EndpointIndex) -> Vec<String> {
    let mut routes = Vec::new();
    for (api, lambdas) in index {
        for (function, bindings) in lambdas {
            for binding in bindings {
                routes.push(format!(
                    "{api}  {}  {}  -> {function} ({})",
                    binding.method.to_uppercase(),
                    binding.path,
                    binding.event
                ));
            }
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const TEMPLATE: &str = "\
Resources:
  oneFunction:
    Type: AWS::Serverless::Function
    Properties:
      CodeUri: src/one/
      Events:
        event1:
          Type: Api
          Properties:
            RestApiId: !Ref mainApi
            Path: /hello
            Method: GET
        event2:
          Type: Api
          Properties:
            RestApiId: !Ref adminApi
            Path: /admin
            Method: post
        odd:
          Type: Api
          Properties:
            RestApiId: !GetAtt mainApi.RootResourceId
            Path: /odd
            Method: get
  twoFunction:
    Type: AWS::Serverless::Function
    Properties:
      CodeUri: src/two/
      Events:
        event1:
          Type: Api
          Properties:
            RestApiId: !Ref mainApi
            Path: /bye
            Method: delete
  mainApi:
    Type: AWS::Serverless::Api
    Properties:
      StageName: !Ref Stage
";

    #[test]
    fn test_index_groups_by_api_and_function() {
        let l = lines(TEMPLATE);
        let index = build_endpoint_index(&l);
        assert_eq!(index.len(), 2);
        assert_eq!(index["mainApi"]["oneFunction"].len(), 1);
        assert_eq!(index["mainApi"]["twoFunction"].len(), 1);
        assert_eq!(index["adminApi"]["oneFunction"].len(), 1);
    }

    #[test]
    fn test_methods_are_lowercased() {
        let l = lines(TEMPLATE);
        let index = build_endpoint_index(&l);
        assert_eq!(index["mainApi"]["oneFunction"][0].method, "get");
    }

    #[test]
    fn test_non_ref_bindings_are_skipped() {
        let l = lines(TEMPLATE);
        let index = build_endpoint_index(&l);
        let main: Vec<_> = index["mainApi"]
            .values()
            .flatten()
            .map(|b| b.path.clone())
            .collect();
        assert!(!main.contains(&"/odd".to_string()));
    }

    #[test]
    fn test_duplicate_for_create_spans_all_gateways() {
        let l = lines(TEMPLATE);
        let index = build_endpoint_index(&l);
        assert_eq!(
            duplicate_for_create(&index, "oneFunction", "post", "/admin"),
            Some("adminApi".to_string())
        );
        assert_eq!(
            duplicate_for_create(&index, "twoFunction", "post", "/admin"),
            None
        );
    }

    #[test]
    fn test_duplicate_on_gateway_ignores_edited_binding() {
        let l = lines(TEMPLATE);
        let index = build_endpoint_index(&l);
        assert_eq!(
            duplicate_on_gateway(&index, "mainApi", "get", "/hello", None),
            Some("oneFunction".to_string())
        );
        assert_eq!(
            duplicate_on_gateway(
                &index,
                "mainApi",
                "get",
                "/hello",
                Some(("oneFunction", "event1"))
            ),
            None
        );
    }
}
