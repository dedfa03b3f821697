//! # Project Scaffolder
//!
//! `init` generates a complete SAM project: the template skeleton with its
//! first Lambda (and optionally a gateway with a `/hello` route), the
//! `.env` and `samconfig.toml` files, the TypeScript project files, and the
//! first handler sources. The gateway and its endpoint are added through
//! the same mutation operations later edits use.

use anyhow::{Result, bail};
use std::fs;
use std::path::Path;

use crate::boilerplate;
use crate::config::{self, SamConfig};
use crate::document::Document;
use crate::edits;
use crate::endpoint_ops;
use crate::env_file::EnvFile;
use crate::env_ops;
use crate::gateway_ops;
use crate::locator;
use crate::project::Project;
use crate::source_tree;
use crate::template;

const DEFAULT_ENV: &str = "# Deployment stage consumed by samforge; not wireable into Lambdas.\nENVIRONMENT=dev\n";

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub timeout: u32,
    pub env_vars: Vec<String>,
    pub gateway: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            timeout: 30,
            env_vars: Vec::new(),
            gateway: true,
        }
    }
}

pub fn init(root: &Path, name: &str, options: &InitOptions) -> Result<String> {
    locator::validate_name(name)?;
    let project = Project::at(root);
    if project.template_path().exists() {
        bail!(
            "'{}' already contains a template — refusing to overwrite",
            root.display()
        );
    }
    fs::create_dir_all(root)?;

    let env = load_or_create_env(&project)?;
    let stage = env.stage.clone().unwrap_or_else(|| "dev".to_string());

    let mut wiring = Vec::with_capacity(options.env_vars.len());
    for key in &options.env_vars {
        let Some(value) = env.value_of(key) else {
            bail!("environment variable '{key}' is not present in .env");
        };
        wiring.push((key.clone(), value.to_string()));
    }

    // Template first: it is the source of truth for everything that follows.
    let mut doc = Document::from_lines(&project.template_path(), template::skeleton(name, &stage));
    for (key, value) in &wiring {
        env_ops::add_env_backing(&mut doc, key, value)?;
    }
    let function_id = template::function_id(name);
    let parameters: Vec<(String, String)> = wiring
        .iter()
        .map(|(key, _)| (key.clone(), template::env_parameter_name(key)))
        .collect();
    let mut block = template::function_resource(&function_id, name, options.timeout, &parameters);
    block.extend(template::log_group(&function_id));
    edits::append_resource(&mut doc, block);
    doc.save()?;

    config::write(&project, &SamConfig::new(name, &stage))?;
    write_project_files(&project, name)?;
    source_tree::create_lambda_sources(&project, name)?;

    if options.gateway {
        let api = format!("{name}Api");
        gateway_ops::create_gateway(&project, &api)?;
        endpoint_ops::add_endpoint(&project, &api, name, "get", "/hello")?;
    }

    Ok(format!(
        "Scaffolded project '{name}' at {} (stage '{stage}')",
        root.display()
    ))
}

fn load_or_create_env(project: &Project) -> Result<EnvFile> {
    let path = project.env_path();
    if path.is_file() {
        return EnvFile::load(&path);
    }
    fs::write(&path, DEFAULT_ENV)?;
    Ok(EnvFile::parse(DEFAULT_ENV))
}

fn write_project_files(project: &Project, name: &str) -> Result<()> {
    fs::write(
        project.root().join("package.json"),
        boilerplate::package_json(name),
    )?;
    fs::write(project.root().join("tsconfig.json"), boilerplate::TSCONFIG)?;
    fs::write(
        project.root().join("jest.config.js"),
        boilerplate::JEST_CONFIG,
    )?;
    fs::write(project.root().join(".gitignore"), boilerplate::GITIGNORE)?;
    Ok(())
}
