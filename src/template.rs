//! # Template Registry
//!
//! Every YAML fragment the tool writes into `template.yaml` is built here,
//! with fixed 2-space indentation per nesting level. Mutation operations
//! splice these fragments; the locator only ever has to parse back shapes
//! that originate in this module.

/// Logical id of the shared basic-auth Lambda. Created once, referenced by
/// any number of gateways, removed when the last reference goes away.
pub const BASIC_AUTHORIZER_FUNCTION: &str = "BasicAuthorizerFunction";

/// Source folder backing the shared basic-auth Lambda.
pub const AUTHORIZER_DIR: &str = "authorizer";

/// `my_table-name` -> `MyTableName`; used to derive logical id fragments
/// from `.env` keys and other user-supplied identifiers.
pub fn pascal_case(input: &str) -> String {
    input
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `Parameters:` name backing an environment variable.
pub fn env_parameter_name(key: &str) -> String {
    format!("Env{}", pascal_case(key))
}

/// Logical id of the SSM parameter resource backing an environment variable.
pub fn ssm_parameter_name(key: &str) -> String {
    format!("Param{}", pascal_case(key))
}

/// Logical id of a Lambda resource from its source folder name.
pub fn function_id(lambda: &str) -> String {
    format!("{lambda}Function")
}

/// Primary key of a DynamoDB table, parsed from a `#`-separated key path:
/// `id` is a simple key, `id#sort` a composite one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKey {
    pub partition: String,
    pub sort: Option<String>,
}

impl TableKey {
    pub fn parse(spec: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = spec.split('#').collect();
        let valid_attr = |attr: &str| {
            !attr.is_empty()
                && attr
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        match parts.as_slice() {
            [partition] if valid_attr(partition) => Ok(Self {
                partition: partition.to_string(),
                sort: None,
            }),
            [partition, sort] if valid_attr(partition) && valid_attr(sort) => Ok(Self {
                partition: partition.to_string(),
                sort: Some(sort.to_string()),
            }),
            _ => anyhow::bail!(
                "invalid key path '{spec}': expected 'partition' or 'partition#sort' with \
                 alphanumeric attribute names"
            ),
        }
    }
}

/// The initial document: format header, transform, globals and the `Stage`
/// parameter. `Resources:` starts empty; `Outputs:` is created on demand
/// by the first operation that writes an output.
pub fn skeleton(project: &str, stage: &str) -> Vec<String> {
    let mut lines = vec![
        "AWSTemplateFormatVersion: '2010-09-09'".to_string(),
        "Transform: AWS::Serverless-2016-10-31".to_string(),
        "Description: >-".to_string(),
        format!("  {project} serverless application"),
        "Globals:".to_string(),
        "  Function:".to_string(),
        "    Runtime: nodejs18.x".to_string(),
        "    MemorySize: 256".to_string(),
        "Parameters:".to_string(),
    ];
    lines.extend(stage_parameter(stage));
    lines.push("Resources:".to_string());
    lines
}

pub fn stage_parameter(stage: &str) -> Vec<String> {
    vec![
        "  Stage:".to_string(),
        "    Type: String".to_string(),
        format!("    Default: '{stage}'"),
    ]
}

/// A Lambda resource. `logical_id` is the full resource name (usually
/// `<lambda>Function`), `source_dir` the folder under `src/` holding its
/// handler. Environment wiring is emitted only when `env_vars` is non-empty;
/// each entry pairs the raw variable name with its backing parameter.
pub fn function_resource(
    logical_id: &str,
    source_dir: &str,
    timeout: u32,
    env_vars: &[(String, String)],
) -> Vec<String> {
    let mut lines = vec![
        format!("  {logical_id}:"),
        "    Type: AWS::Serverless::Function".to_string(),
        "    Properties:".to_string(),
        format!("      FunctionName: !Sub '${{AWS::StackName}}-{source_dir}'"),
        format!("      CodeUri: src/{source_dir}/"),
        "      Handler: handler.handler".to_string(),
        format!("      Timeout: {timeout}"),
        "      Architectures:".to_string(),
        "        - x86_64".to_string(),
    ];
    if !env_vars.is_empty() {
        lines.extend(environment_block(env_vars));
    }
    lines.extend([
        "    Metadata:".to_string(),
        "      BuildMethod: esbuild".to_string(),
        "      BuildProperties:".to_string(),
        "        Minify: true".to_string(),
        "        Target: es2020".to_string(),
        "        EntryPoints:".to_string(),
        "          - handler.ts".to_string(),
    ]);
    lines
}

/// The log group paired with a Lambda resource.
pub fn log_group(function_logical_id: &str) -> Vec<String> {
    vec![
        format!("  {function_logical_id}LogGroup:"),
        "    Type: AWS::Logs::LogGroup".to_string(),
        "    Properties:".to_string(),
        format!("      LogGroupName: !Sub /aws/lambda/${{{function_logical_id}}}"),
        "      RetentionInDays: 14".to_string(),
    ]
}

pub fn environment_block(env_vars: &[(String, String)]) -> Vec<String> {
    let mut lines = vec![
        "      Environment:".to_string(),
        "        Variables:".to_string(),
    ];
    for (key, parameter) in env_vars {
        lines.push(env_var_line(key, parameter));
    }
    lines
}

pub fn env_var_line(key: &str, parameter: &str) -> String {
    format!("          {key}: !Ref {parameter}")
}

pub fn env_parameter(parameter: &str, value: &str) -> Vec<String> {
    vec![
        format!("  {parameter}:"),
        "    Type: String".to_string(),
        format!("    Default: '{value}'"),
    ]
}

pub fn ssm_parameter(key: &str, parameter: &str) -> Vec<String> {
    vec![
        format!("  {}:", ssm_parameter_name(key)),
        "    Type: AWS::SSM::Parameter".to_string(),
        "    Properties:".to_string(),
        format!("      Name: !Sub '/${{AWS::StackName}}/{key}'"),
        "      Type: String".to_string(),
        format!("      Value: !Ref {parameter}"),
    ]
}

pub fn api_resource(name: &str) -> Vec<String> {
    vec![
        format!("  {name}:"),
        "    Type: AWS::Serverless::Api".to_string(),
        "    Properties:".to_string(),
        format!("      Name: !Sub '${{AWS::StackName}}-{name}'"),
        "      StageName: !Ref Stage".to_string(),
    ]
}

pub fn api_url_output(name: &str) -> Vec<String> {
    vec![
        format!("  {name}Url:"),
        format!("    Description: Invoke URL for {name}"),
        format!(
            "    Value: !Sub 'https://${{{name}}}.execute-api.${{AWS::Region}}.amazonaws.com/${{Stage}}/'"
        ),
    ]
}

/// An `Events:` entry binding one route of a gateway to the enclosing
/// Lambda. Indented for the 8-space event level.
pub fn event_binding(event: &str, api: &str, path: &str, method: &str) -> Vec<String> {
    vec![
        format!("        {event}:"),
        "          Type: Api".to_string(),
        "          Properties:".to_string(),
        format!("            RestApiId: !Ref {api}"),
        format!("            Path: {path}"),
        format!("            Method: {method}"),
    ]
}

pub fn events_wrapper() -> String {
    "      Events:".to_string()
}

pub fn layer_resource(name: &str) -> Vec<String> {
    vec![
        format!("  {name}:"),
        "    Type: AWS::Serverless::LayerVersion".to_string(),
        "    Properties:".to_string(),
        format!("      LayerName: !Sub '${{AWS::StackName}}-{name}'"),
        format!("      ContentUri: src/layers/{name}/"),
        "      CompatibleRuntimes:".to_string(),
        "        - nodejs18.x".to_string(),
        "      RetentionPolicy: Delete".to_string(),
        "    Metadata:".to_string(),
        "      BuildMethod: nodejs18.x".to_string(),
    ]
}

pub fn layers_wrapper() -> String {
    "      Layers:".to_string()
}

pub fn layer_entry(layer: &str) -> String {
    format!("        - !Ref {layer}")
}

pub fn policies_wrapper() -> String {
    "      Policies:".to_string()
}

pub fn policy_entry(policy: &str) -> String {
    format!("        - !Ref {policy}")
}

pub fn table_resource(name: &str, key: &TableKey) -> Vec<String> {
    let mut lines = vec![
        format!("  {name}:"),
        "    Type: AWS::DynamoDB::Table".to_string(),
        "    Properties:".to_string(),
        format!("      TableName: !Sub '${{AWS::StackName}}-{name}'"),
        "      BillingMode: PAY_PER_REQUEST".to_string(),
        "      AttributeDefinitions:".to_string(),
        format!("        - AttributeName: {}", key.partition),
        "          AttributeType: S".to_string(),
    ];
    if let Some(sort) = &key.sort {
        lines.push(format!("        - AttributeName: {sort}"));
        lines.push("          AttributeType: S".to_string());
    }
    lines.extend([
        "      KeySchema:".to_string(),
        format!("        - AttributeName: {}", key.partition),
        "          KeyType: HASH".to_string(),
    ]);
    if let Some(sort) = &key.sort {
        lines.push(format!("        - AttributeName: {sort}"));
        lines.push("          KeyType: RANGE".to_string());
    }
    lines
}

pub fn table_policy_name(table: &str) -> String {
    format!("{table}Policy")
}

pub fn table_policy(table: &str) -> Vec<String> {
    vec![
        format!("  {}:", table_policy_name(table)),
        "    Type: AWS::IAM::ManagedPolicy".to_string(),
        "    Properties:".to_string(),
        format!("      Description: CRUD access to the {table} table"),
        "      PolicyDocument:".to_string(),
        "        Version: '2012-10-17'".to_string(),
        "        Statement:".to_string(),
        "          - Effect: Allow".to_string(),
        "            Action:".to_string(),
        "              - dynamodb:PutItem".to_string(),
        "              - dynamodb:GetItem".to_string(),
        "              - dynamodb:UpdateItem".to_string(),
        "              - dynamodb:DeleteItem".to_string(),
        "              - dynamodb:Query".to_string(),
        format!("            Resource: !GetAtt {table}.Arn"),
    ]
}

/// The `Auth:` block for basic auth, referencing the shared authorizer
/// Lambda. Indented for the 6-space Api property level.
pub fn basic_auth_block() -> Vec<String> {
    vec![
        "      Auth:".to_string(),
        "        DefaultAuthorizer: BasicAuthorizer".to_string(),
        "        Authorizers:".to_string(),
        "          BasicAuthorizer:".to_string(),
        "            FunctionPayloadType: REQUEST".to_string(),
        format!("            FunctionArn: !GetAtt {BASIC_AUTHORIZER_FUNCTION}.Arn"),
        "            Identity:".to_string(),
        "              Headers:".to_string(),
        "                - Authorization".to_string(),
    ]
}

/// The `Auth:` block for Cognito auth, referencing a per-call user pool.
pub fn cognito_auth_block(pool: &str) -> Vec<String> {
    vec![
        "      Auth:".to_string(),
        "        DefaultAuthorizer: CognitoAuthorizer".to_string(),
        "        Authorizers:".to_string(),
        "          CognitoAuthorizer:".to_string(),
        format!("            UserPoolArn: !GetAtt {pool}UserPool.Arn"),
    ]
}

pub fn basic_authorizer_resources() -> Vec<String> {
    let mut lines = function_resource(BASIC_AUTHORIZER_FUNCTION, AUTHORIZER_DIR, 10, &[]);
    lines.extend(log_group(BASIC_AUTHORIZER_FUNCTION));
    lines
}

pub fn user_pool(pool: &str) -> Vec<String> {
    vec![
        format!("  {pool}UserPool:"),
        "    Type: AWS::Cognito::UserPool".to_string(),
        "    Properties:".to_string(),
        format!("      UserPoolName: !Sub '${{AWS::StackName}}-{pool}'"),
        "      UsernameAttributes:".to_string(),
        "        - email".to_string(),
        "      AutoVerifiedAttributes:".to_string(),
        "        - email".to_string(),
    ]
}

pub fn user_pool_client(pool: &str) -> Vec<String> {
    vec![
        format!("  {pool}UserPoolClient:"),
        "    Type: AWS::Cognito::UserPoolClient".to_string(),
        "    Properties:".to_string(),
        format!("      UserPoolId: !Ref {pool}UserPool"),
        format!("      ClientName: !Sub '${{AWS::StackName}}-{pool}-client'"),
        "      GenerateSecret: false".to_string(),
    ]
}

pub fn user_pool_outputs(pool: &str) -> Vec<String> {
    vec![
        format!("  {pool}UserPoolId:"),
        format!("    Description: Cognito user pool id for {pool}"),
        format!("    Value: !Ref {pool}UserPool"),
        format!("  {pool}UserPoolClientId:"),
        format!("    Description: Cognito user pool client id for {pool}"),
        format!("    Value: !Ref {pool}UserPoolClient"),
    ]
}

/// Does a template line reference `name` via `!Ref`, `!GetAtt` or a `!Sub`
/// `${...}` substitution? Used by the gateway cascade to find outputs that
/// must go when the gateway goes.
pub fn references_name(line: &str, name: &str) -> bool {
    let value = line.trim();
    if let Some(rest) = value.split("!Ref ").nth(1)
        && rest.trim_end_matches('\'').trim() == name
    {
        return true;
    }
    if let Some(rest) = value.split("!GetAtt ").nth(1)
        && rest.starts_with(&format!("{name}."))
    {
        return true;
    }
    value.contains(&format!("${{{name}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("A2"), "A2");
        assert_eq!(pascal_case("my_var"), "MyVar");
        assert_eq!(pascal_case("already"), "Already");
        assert_eq!(pascal_case("MY_LONG_KEY"), "MYLONGKEY");
    }

    #[test]
    fn test_table_key_parse() {
        assert_eq!(
            TableKey::parse("id").unwrap(),
            TableKey {
                partition: "id".to_string(),
                sort: None
            }
        );
        assert_eq!(
            TableKey::parse("id#sort").unwrap(),
            TableKey {
                partition: "id".to_string(),
                sort: Some("sort".to_string())
            }
        );
        assert!(TableKey::parse("a#b#c").is_err());
        assert!(TableKey::parse("#b").is_err());
    }

    #[test]
    fn test_function_resource_indentation() {
        let lines = function_resource("helloFunction", "hello", 30, &[]);
        assert_eq!(lines[0], "  helloFunction:");
        assert_eq!(lines[1], "    Type: AWS::Serverless::Function");
        assert!(lines.iter().all(|l| !l.contains("Environment")));
        let with_env = function_resource(
            "helloFunction",
            "hello",
            30,
            &[("A2".to_string(), "EnvA2".to_string())],
        );
        assert!(with_env.contains(&"      Environment:".to_string()));
        assert!(with_env.contains(&"          A2: !Ref EnvA2".to_string()));
    }

    #[test]
    fn test_references_name() {
        assert!(references_name("    Value: !Ref api2", "api2"));
        assert!(!references_name("    Value: !Ref api22", "api2"));
        assert!(references_name(
            "    Value: !GetAtt api2.RootResourceId",
            "api2"
        ));
        assert!(references_name(
            "    Value: !Sub 'https://${api2}.execute-api.${AWS::Region}.amazonaws.com/'",
            "api2"
        ));
        assert!(!references_name("    Value: !Sub '${api22}'", "api2"));
    }
}
