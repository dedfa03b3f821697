use std::fs;

use samforge::auth_ops;
use samforge::gateway_ops;
use samforge::project::Project;
use samforge::scaffold::{self, InitOptions};
use tempfile::{Builder, TempDir};

fn setup() -> (TempDir, Project) {
    let tmp_dir = Builder::new().prefix("samforge-test-").tempdir().unwrap();
    fs::write(tmp_dir.path().join(".env"), "ENVIRONMENT=dev\n").unwrap();
    scaffold::init(tmp_dir.path(), "demo", &InitOptions::default()).unwrap();
    let project = Project::open(tmp_dir.path()).unwrap();
    (tmp_dir, project)
}

fn template_text(project: &Project) -> String {
    fs::read_to_string(project.template_path()).unwrap()
}

#[test]
fn test_basic_auth_add_then_remove_leaves_no_trace() {
    let (_tmp_dir, project) = setup();
    let before = template_text(&project);

    auth_ops::add_basic_auth(&project, "demoApi").unwrap();
    let text = template_text(&project);
    assert!(text.contains("      Auth:"));
    assert!(text.contains("        DefaultAuthorizer: BasicAuthorizer"));
    assert!(text.contains("  BasicAuthorizerFunction:"));
    assert!(text.contains("  BasicAuthorizerFunctionLogGroup:"));
    assert!(project.authorizer_dir().join("handler.ts").is_file());

    auth_ops::remove_auth(&project, "demoApi").unwrap();
    assert_eq!(template_text(&project), before);
    assert!(!project.authorizer_dir().exists());
}

#[test]
fn test_basic_auth_is_shared_across_gateways() {
    let (_tmp_dir, project) = setup();
    gateway_ops::create_gateway(&project, "adminApi").unwrap();

    let first = auth_ops::add_basic_auth(&project, "demoApi").unwrap();
    assert!(first.contains("created shared authorizer"));
    let second = auth_ops::add_basic_auth(&project, "adminApi").unwrap();
    assert!(second.contains("reusing shared authorizer"));

    let text = template_text(&project);
    assert_eq!(text.matches("  BasicAuthorizerFunction:").count(), 1);

    // Removing one gateway's auth keeps the shared pieces alive.
    auth_ops::remove_auth(&project, "demoApi").unwrap();
    let text = template_text(&project);
    assert!(text.contains("  BasicAuthorizerFunction:"));
    assert!(project.authorizer_dir().is_dir());

    // Removing the last reference retires them.
    auth_ops::remove_auth(&project, "adminApi").unwrap();
    let text = template_text(&project);
    assert!(!text.contains("BasicAuthorizerFunction"));
    assert!(!project.authorizer_dir().exists());
}

#[test]
fn test_auth_conflict_when_already_present() {
    let (_tmp_dir, project) = setup();
    auth_ops::add_basic_auth(&project, "demoApi").unwrap();
    let before = template_text(&project);

    assert!(auth_ops::add_basic_auth(&project, "demoApi").is_err());
    assert!(auth_ops::add_cognito_auth(&project, "demoApi", "users").is_err());
    assert_eq!(template_text(&project), before);
}

#[test]
fn test_cognito_auth_creates_pool_pair_and_outputs() {
    let (_tmp_dir, project) = setup();
    auth_ops::add_cognito_auth(&project, "demoApi", "members").unwrap();

    let text = template_text(&project);
    assert!(text.contains("        DefaultAuthorizer: CognitoAuthorizer"));
    assert!(text.contains("            UserPoolArn: !GetAtt membersUserPool.Arn"));
    assert!(text.contains("  membersUserPool:"));
    assert!(text.contains("    Type: AWS::Cognito::UserPool"));
    assert!(text.contains("  membersUserPoolClient:"));
    assert!(text.contains("  membersUserPoolId:"));
    assert!(text.contains("  membersUserPoolClientId:"));
}

#[test]
fn test_cognito_pools_are_not_shared() {
    let (_tmp_dir, project) = setup();
    gateway_ops::create_gateway(&project, "adminApi").unwrap();
    auth_ops::add_cognito_auth(&project, "demoApi", "members").unwrap();
    auth_ops::add_cognito_auth(&project, "adminApi", "admins").unwrap();

    let text = template_text(&project);
    assert!(text.contains("  membersUserPool:"));
    assert!(text.contains("  adminsUserPool:"));

    // A pool name collision is rejected up front.
    gateway_ops::create_gateway(&project, "thirdApi").unwrap();
    assert!(auth_ops::add_cognito_auth(&project, "thirdApi", "members").is_err());
}

#[test]
fn test_cognito_remove_round_trips() {
    let (_tmp_dir, project) = setup();
    let before = template_text(&project);

    auth_ops::add_cognito_auth(&project, "demoApi", "members").unwrap();
    auth_ops::remove_auth(&project, "demoApi").unwrap();
    assert_eq!(template_text(&project), before);
}

#[test]
fn test_remove_auth_requires_an_auth_block() {
    let (_tmp_dir, project) = setup();
    let result = auth_ops::remove_auth(&project, "demoApi");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("no Auth block"));
}
