//! # Source-Tree Synchronizer
//!
//! Mirrors resource lifecycle into the filesystem: folder-per-Lambda,
//! folder-per-layer, one helper module per table, one shared authorizer
//! folder. Callers write the template first — these edits run after the
//! template save, so a failure here leaves a recoverable inconsistency
//! instead of a corrupted template.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::boilerplate;
use crate::project::Project;
use crate::template::TableKey;

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write '{}'", path.display()))
}

fn remove_dir(project: &Project, dir: &Path) -> Result<()> {
    project.guard_inside_src(dir)?;
    if dir.is_dir() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("failed to remove '{}'", dir.display()))?;
    }
    Ok(())
}

fn remove_file(project: &Project, path: &Path) -> Result<()> {
    project.guard_inside_src(path)?;
    if path.is_file() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove '{}'", path.display()))?;
    }
    Ok(())
}

pub fn create_lambda_sources(project: &Project, lambda: &str) -> Result<()> {
    let dir = project.lambda_dir(lambda);
    let subs = [("name", lambda)];
    write_file(
        &dir.join("handler.ts"),
        &boilerplate::render(boilerplate::LAMBDA_HANDLER, &subs),
    )?;
    write_file(
        &dir.join("handler.test.ts"),
        &boilerplate::render(boilerplate::LAMBDA_HANDLER_TEST, &subs),
    )
}

pub fn remove_lambda_sources(project: &Project, lambda: &str) -> Result<()> {
    remove_dir(project, &project.lambda_dir(lambda))
}

pub fn create_layer_sources(project: &Project, layer: &str) -> Result<()> {
    let dir = project.layer_dir(layer);
    let subs = [("name", layer)];
    write_file(
        &dir.join("index.ts"),
        &boilerplate::render(boilerplate::LAYER_INDEX, &subs),
    )?;
    write_file(
        &dir.join("index.test.ts"),
        &boilerplate::render(boilerplate::LAYER_INDEX_TEST, &subs),
    )
}

pub fn remove_layer_sources(project: &Project, layer: &str) -> Result<()> {
    remove_dir(project, &project.layer_dir(layer))
}

/// Writes the shared authorizer pair. A no-op when the folder already
/// exists, so repeated basic-auth additions reuse the same sources.
pub fn write_authorizer_sources(project: &Project) -> Result<()> {
    let dir = project.authorizer_dir();
    if dir.is_dir() {
        return Ok(());
    }
    write_file(&dir.join("handler.ts"), boilerplate::AUTHORIZER_HANDLER)?;
    write_file(
        &dir.join("handler.test.ts"),
        boilerplate::AUTHORIZER_HANDLER_TEST,
    )
}

pub fn remove_authorizer_sources(project: &Project) -> Result<()> {
    remove_dir(project, &project.authorizer_dir())
}

pub fn create_table_handler(project: &Project, table: &str, key: &TableKey) -> Result<()> {
    let pascal = crate::template::pascal_case(table);
    let env = table.to_uppercase().replace('-', "_");

    let mut fields = vec![format!("  {}: string;", key.partition)];
    let mut example = vec![format!("{}: 'a'", key.partition)];
    if let Some(sort) = &key.sort {
        fields.push(format!("  {sort}: string;"));
        example.push(format!("{sort}: 'b'"));
    }
    let fields = fields.join("\n");
    let example = example.join(", ");

    let subs = [
        ("name", table),
        ("Name", pascal.as_str()),
        ("ENV", env.as_str()),
        ("key_fields", fields.as_str()),
        ("key_example", example.as_str()),
    ];
    write_file(
        &project.table_handler_path(table),
        &boilerplate::render(boilerplate::TABLE_HANDLER, &subs),
    )?;
    write_file(
        &project.utils_dir().join(format!("{table}Handler.test.ts")),
        &boilerplate::render(boilerplate::TABLE_HANDLER_TEST, &subs),
    )
}

pub fn remove_table_handler(project: &Project, table: &str) -> Result<()> {
    remove_file(project, &project.table_handler_path(table))?;
    remove_file(
        project,
        &project.utils_dir().join(format!("{table}Handler.test.ts")),
    )
}

/// Splices the table helper import into a Lambda's handler, after the last
/// existing import. A no-op when the import path is already present.
pub fn inject_table_import(project: &Project, lambda: &str, table: &str) -> Result<()> {
    let path = project.handler_path(lambda);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    if content.contains(&boilerplate::table_import_path(table)) {
        return Ok(());
    }

    let import_line = boilerplate::table_import_line(table);
    let mut lines: Vec<&str> = content.lines().collect();
    let insert_at = lines
        .iter()
        .rposition(|l| l.trim_start().starts_with("import "))
        .map(|i| i + 1)
        .unwrap_or(0);
    lines.insert(insert_at, &import_line);

    let mut updated = lines.join("\n");
    updated.push('\n');
    fs::write(&path, updated).with_context(|| format!("failed to write '{}'", path.display()))
}

/// Removes the table helper import, keyed on its import path.
pub fn remove_table_import(project: &Project, lambda: &str, table: &str) -> Result<()> {
    let path = project.handler_path(lambda);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let marker = boilerplate::table_import_path(table);
    if !content.contains(&marker) {
        return Ok(());
    }

    let lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.contains(&marker))
        .collect();
    let mut updated = lines.join("\n");
    updated.push('\n');
    fs::write(&path, updated).with_context(|| format!("failed to write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    fn setup_project() -> (tempfile::TempDir, Project) {
        let tmp_dir = Builder::new().prefix("test-tree-").tempdir().unwrap();
        let project = Project::at(tmp_dir.path());
        (tmp_dir, project)
    }

    #[test]
    fn test_lambda_sources_lifecycle() {
        let (_tmp_dir, project) = setup_project();
        create_lambda_sources(&project, "orders").unwrap();

        let handler = fs::read_to_string(project.handler_path("orders")).unwrap();
        assert!(handler.contains("Hello from orders"));
        assert!(project.lambda_dir("orders").join("handler.test.ts").is_file());

        remove_lambda_sources(&project, "orders").unwrap();
        assert!(!project.lambda_dir("orders").exists());
    }

    #[test]
    fn test_authorizer_sources_are_written_once() {
        let (_tmp_dir, project) = setup_project();
        write_authorizer_sources(&project).unwrap();
        let path = project.authorizer_dir().join("handler.ts");
        fs::write(&path, "custom edit\n").unwrap();

        // Second call must not clobber the existing folder.
        write_authorizer_sources(&project).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "custom edit\n");
    }

    #[test]
    fn test_import_injection_round_trip() {
        let (_tmp_dir, project) = setup_project();
        create_lambda_sources(&project, "orders").unwrap();
        let original = fs::read_to_string(project.handler_path("orders")).unwrap();

        inject_table_import(&project, "orders", "users").unwrap();
        let injected = fs::read_to_string(project.handler_path("orders")).unwrap();
        assert!(injected.contains("from '../utils/usersHandler';"));

        // Injection is idempotent.
        inject_table_import(&project, "orders", "users").unwrap();
        assert_eq!(
            fs::read_to_string(project.handler_path("orders")).unwrap(),
            injected
        );

        remove_table_import(&project, "orders", "users").unwrap();
        assert_eq!(
            fs::read_to_string(project.handler_path("orders")).unwrap(),
            original
        );
    }

    #[test]
    fn test_table_handler_renders_key_schema() {
        let (_tmp_dir, project) = setup_project();
        let key = TableKey {
            partition: "id".to_string(),
            sort: Some("sort".to_string()),
        };
        create_table_handler(&project, "users", &key).unwrap();

        let helper = fs::read_to_string(project.table_handler_path("users")).unwrap();
        assert!(helper.contains("id: string;"));
        assert!(helper.contains("sort: string;"));
        assert!(helper.contains("putUsers"));
        assert!(helper.contains("USERS_TABLE_NAME"));

        remove_table_handler(&project, "users").unwrap();
        assert!(!project.table_handler_path("users").exists());
    }
}
