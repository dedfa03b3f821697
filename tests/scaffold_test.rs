use std::fs;

use samforge::locator;
use samforge::project::Project;
use samforge::scaffold::{self, InitOptions};
use tempfile::{Builder, TempDir};

fn setup(name: &str, env: &str, options: &InitOptions) -> (TempDir, Project) {
    let tmp_dir = Builder::new().prefix("samforge-test-").tempdir().unwrap();
    fs::write(tmp_dir.path().join(".env"), env).unwrap();
    scaffold::init(tmp_dir.path(), name, options).unwrap();
    let project = Project::open(tmp_dir.path()).unwrap();
    (tmp_dir, project)
}

fn template_text(project: &Project) -> String {
    fs::read_to_string(project.template_path()).unwrap()
}

#[test]
fn test_init_generates_a_complete_project() {
    let (_tmp_dir, project) = setup(
        "demo",
        "ENVIRONMENT=staging\nA2=value\n",
        &InitOptions {
            env_vars: vec!["A2".to_string()],
            ..InitOptions::default()
        },
    );

    let text = template_text(&project);
    assert!(text.contains("Transform: AWS::Serverless-2016-10-31"));
    assert!(text.contains("  demoFunction:"));
    assert!(text.contains("  demoFunctionLogGroup:"));
    assert!(text.contains("  demoApi:"));
    assert!(text.contains("  demoApiUrl:"));
    assert!(text.contains("    Default: 'staging'"));
    assert!(text.contains("  EnvA2:"));
    assert!(text.contains("  ParamA2:"));
    assert!(text.contains("          A2: !Ref EnvA2"));
    assert!(text.contains("            Path: /hello"));
    assert!(text.contains("            Method: get"));

    assert!(project.handler_path("demo").is_file());
    assert!(project.lambda_dir("demo").join("handler.test.ts").is_file());
    assert!(project.samconfig_path().is_file());
    for file in ["package.json", "tsconfig.json", "jest.config.js", ".gitignore"] {
        assert!(project.root().join(file).is_file(), "missing {file}");
    }
}

#[test]
fn test_init_without_gateway_has_no_outputs() {
    let (_tmp_dir, project) = setup("demo", "ENVIRONMENT=dev\n", &InitOptions {
        gateway: false,
        ..InitOptions::default()
    });

    let text = template_text(&project);
    assert!(!text.contains("Outputs:"));
    assert!(!text.contains("Events:"));
    assert!(text.contains("  demoFunction:"));
}

#[test]
fn test_init_refuses_existing_template() {
    let (tmp_dir, _project) = setup("demo", "ENVIRONMENT=dev\n", &InitOptions::default());
    let result = scaffold::init(tmp_dir.path(), "other", &InitOptions::default());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("refusing"));
}

#[test]
fn test_init_rejects_unknown_env_var() {
    let tmp_dir = Builder::new().prefix("samforge-test-").tempdir().unwrap();
    fs::write(tmp_dir.path().join(".env"), "ENVIRONMENT=dev\n").unwrap();
    let result = scaffold::init(
        tmp_dir.path(),
        "demo",
        &InitOptions {
            env_vars: vec!["MISSING".to_string()],
            ..InitOptions::default()
        },
    );
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("MISSING"));
}

// The scenario from the original tooling: one project, three Lambdas.
#[test]
fn test_create_two_more_lambdas() {
    let (_tmp_dir, project) = setup(
        "testCreate2Lambdas",
        "ENVIRONMENT=dev\nA1=one\nA2=two\nA3=three\n",
        &InitOptions {
            env_vars: vec!["A2".to_string()],
            ..InitOptions::default()
        },
    );

    // A1/A3 need template backing before a Lambda can wire them in.
    samforge::env_ops::sync_env(&project, true).unwrap();

    samforge::lambda_ops::add_lambda(
        &project,
        "lambda2",
        30,
        &["A1".to_string(), "A3".to_string()],
    )
    .unwrap();
    samforge::lambda_ops::add_lambda(&project, "lambda3", 90, &[]).unwrap();

    let text = template_text(&project);
    assert!(text.contains("  lambda2Function:"));
    assert!(text.contains("  lambda3Function:"));
    assert!(text.contains("          A1: !Ref EnvA1"));
    assert!(text.contains("          A3: !Ref EnvA3"));
    assert!(text.contains("      Timeout: 90"));

    // lambda3 has no environment block at all.
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let lambda3 = locator::locate_resource(&lines, "lambda3Function").unwrap();
    assert!(
        !lines[lambda3.start..lambda3.end]
            .iter()
            .any(|l| l.trim() == "Environment:")
    );

    // src/ holds exactly the three Lambda folders, each with its pair.
    let mut folders: Vec<String> = fs::read_dir(project.src_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    folders.sort();
    assert_eq!(folders, vec!["lambda2", "lambda3", "testCreate2Lambdas"]);
    for lambda in ["testCreate2Lambdas", "lambda2", "lambda3"] {
        assert!(project.handler_path(lambda).is_file());
        assert!(
            project
                .lambda_dir(lambda)
                .join("handler.test.ts")
                .is_file()
        );
    }
}

#[test]
fn test_resource_spans_never_overlap() {
    let (_tmp_dir, project) = setup(
        "demo",
        "ENVIRONMENT=dev\nA2=value\n",
        &InitOptions {
            env_vars: vec!["A2".to_string()],
            ..InitOptions::default()
        },
    );
    samforge::lambda_ops::add_lambda(&project, "second", 30, &[]).unwrap();
    samforge::table_ops::create_table(&project, "users", "id#sort").unwrap();

    let text = template_text(&project);
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let spans = locator::entry_spans(&lines, "Resources");
    assert!(spans.len() >= 6);
    for pair in spans.windows(2) {
        let (_, a) = &pair[0];
        let (_, b) = &pair[1];
        assert!(a.start < a.end, "empty span");
        assert!(a.end <= b.start, "overlapping resource spans");
    }
}

#[test]
fn test_delete_lambda_removes_resources_and_sources() {
    let (_tmp_dir, project) = setup("demo", "ENVIRONMENT=dev\n", &InitOptions::default());
    let before = template_text(&project);
    samforge::lambda_ops::add_lambda(&project, "extra", 30, &[]).unwrap();
    assert!(project.lambda_dir("extra").is_dir());

    samforge::lambda_ops::delete_lambda(&project, "extra").unwrap();
    // Add then delete restores the exact pre-add template.
    assert_eq!(template_text(&project), before);
    assert!(!project.lambda_dir("extra").exists());
}

#[test]
fn test_cannot_delete_the_only_lambda() {
    let (_tmp_dir, project) = setup("demo", "ENVIRONMENT=dev\n", &InitOptions::default());
    let result = samforge::lambda_ops::delete_lambda(&project, "demo");
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("at least one")
    );
    assert!(template_text(&project).contains("  demoFunction:"));
}

#[test]
fn test_duplicate_lambda_name_is_rejected() {
    let (_tmp_dir, project) = setup("demo", "ENVIRONMENT=dev\n", &InitOptions::default());
    let before = template_text(&project);
    let result = samforge::lambda_ops::add_lambda(&project, "demo", 30, &[]);
    assert!(result.is_err());
    assert_eq!(template_text(&project), before);
}
