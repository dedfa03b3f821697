//! # Project Layout
//!
//! Path conventions of a scaffolded project and the filesystem checks the
//! operations share. The template file is the source of truth; everything
//! under `src/` mirrors it, folder-per-Lambda and folder-per-layer.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use crate::document::Document;

pub const TEMPLATE_FILE: &str = "template.yaml";
pub const ENV_FILE: &str = ".env";
pub const SAMCONFIG_FILE: &str = "samconfig.toml";

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Opens an existing project; the template must already be present.
    pub fn open(root: &Path) -> Result<Self> {
        let project = Self::at(root);
        if !project.template_path().is_file() {
            return Err(anyhow!(
                "no '{TEMPLATE_FILE}' found in '{}' — not a generated project (run init first)",
                root.display()
            ));
        }
        Ok(project)
    }

    /// Points at a directory without requiring a template (used by init).
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self) -> PathBuf {
        self.root.join(TEMPLATE_FILE)
    }

    pub fn env_path(&self) -> PathBuf {
        self.root.join(ENV_FILE)
    }

    pub fn samconfig_path(&self) -> PathBuf {
        self.root.join(SAMCONFIG_FILE)
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn lambda_dir(&self, lambda: &str) -> PathBuf {
        self.src_dir().join(lambda)
    }

    pub fn layers_dir(&self) -> PathBuf {
        self.src_dir().join("layers")
    }

    pub fn layer_dir(&self, layer: &str) -> PathBuf {
        self.layers_dir().join(layer)
    }

    pub fn utils_dir(&self) -> PathBuf {
        self.src_dir().join("utils")
    }

    pub fn authorizer_dir(&self) -> PathBuf {
        self.src_dir().join(crate::template::AUTHORIZER_DIR)
    }

    pub fn handler_path(&self, lambda: &str) -> PathBuf {
        self.lambda_dir(lambda).join("handler.ts")
    }

    pub fn table_handler_path(&self, table: &str) -> PathBuf {
        self.utils_dir().join(format!("{table}Handler.ts"))
    }

    pub fn read_template(&self) -> Result<Document> {
        Document::open(&self.template_path())
    }

    /// A deletion target must stay inside the project's `src/` tree.
    /// Guards the source-tree synchronizer against names that would
    /// escape the project (`..`, absolute paths smuggled into a name).
    pub fn guard_inside_src(&self, path: &Path) -> Result<()> {
        let src = self.src_dir();
        let mut normalized = PathBuf::new();
        for component in path.components() {
            use std::path::Component;
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(anyhow!(
                            "refusing to touch '{}': path escapes the project",
                            path.display()
                        ));
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }
        if !normalized.starts_with(&src) {
            return Err(anyhow!(
                "refusing to touch '{}': outside the project src directory",
                path.display()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::Builder;

    #[test]
    fn test_open_requires_template() {
        let tmp_dir = Builder::new().prefix("test-project-").tempdir().unwrap();
        assert!(Project::open(tmp_dir.path()).is_err());
        fs::write(tmp_dir.path().join(TEMPLATE_FILE), "Resources:\n").unwrap();
        assert!(Project::open(tmp_dir.path()).is_ok());
    }

    #[test]
    fn test_guard_rejects_escaping_paths() {
        let tmp_dir = Builder::new().prefix("test-project-").tempdir().unwrap();
        let project = Project::at(tmp_dir.path());
        assert!(project.guard_inside_src(&project.lambda_dir("ok")).is_ok());
        assert!(
            project
                .guard_inside_src(&project.src_dir().join("../elsewhere"))
                .is_err()
        );
        assert!(project.guard_inside_src(Path::new("/etc/passwd")).is_err());
    }
}
