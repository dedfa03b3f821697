use anyhow::Result;
use clap::Parser;
use console::style;
use std::env;
use std::fs;

use samforge::cli::{
    AuthCommand, Cli, Command, EndpointCommand, EnvCommand, GatewayCommand, LambdaCommand,
    LayerCommand, TableCommand,
};
use samforge::project::Project;
use samforge::scaffold::{self, InitOptions};
use samforge::{
    auth_ops, diff, endpoint_ops, env_ops, gateway_ops, lambda_ops, layer_ops, table_ops,
};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("{} {error:#}", style("error:").red().bold());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = match &cli.project {
        Some(path) => path.clone(),
        None => env::current_dir()?,
    };

    if let Command::Init {
        name,
        timeout,
        env_vars,
        no_gateway,
    } = &cli.command
    {
        let options = InitOptions {
            timeout: *timeout,
            env_vars: env_vars.clone(),
            gateway: !no_gateway,
        };
        let message = scaffold::init(&root, name, &options)?;
        println!("{} {message}", style("ok:").green().bold());
        return Ok(());
    }

    let project = Project::open(&root)?;
    let before = cli.diff.then(|| read_template_text(&project));

    let message = dispatch(&cli.command, &project)?;
    println!("{} {message}", style("ok:").green().bold());

    if let Some(before) = before {
        let after = read_template_text(&project);
        println!("{}", diff::render(&before, &after));
    }
    Ok(())
}

fn read_template_text(project: &Project) -> String {
    fs::read_to_string(project.template_path()).unwrap_or_default()
}

fn dispatch(command: &Command, project: &Project) -> Result<String> {
    match command {
        Command::Init { .. } => unreachable!("init is handled before the project opens"),
        Command::Lambda { command } => match command {
            LambdaCommand::Add {
                name,
                timeout,
                env_vars,
            } => lambda_ops::add_lambda(project, name, *timeout, env_vars),
            LambdaCommand::Delete { name } => lambda_ops::delete_lambda(project, name),
        },
        Command::Endpoint { command } => match command {
            EndpointCommand::Add {
                api,
                lambda,
                method,
                path,
            } => endpoint_ops::add_endpoint(project, api, lambda, method, path),
            EndpointCommand::Update {
                api,
                lambda,
                event,
                to_lambda,
                method,
                path,
            } => endpoint_ops::update_endpoint(
                project,
                api,
                lambda,
                event,
                to_lambda.as_deref(),
                method,
                path,
            ),
            EndpointCommand::Delete { api, lambda, event } => {
                endpoint_ops::delete_endpoint(project, api, lambda, event)
            }
            EndpointCommand::List { api } => endpoint_ops::list_endpoints(project, api.as_deref()),
        },
        Command::Gateway { command } => match command {
            GatewayCommand::Add { name } => gateway_ops::create_gateway(project, name),
            GatewayCommand::Delete { name } => gateway_ops::delete_gateway(project, name),
        },
        Command::Layer { command } => match command {
            LayerCommand::Add { name } => layer_ops::create_layer(project, name),
            LayerCommand::Delete { name } => layer_ops::delete_layer(project, name),
            LayerCommand::Attach { lambda, layer } => {
                layer_ops::attach_layer(project, lambda, layer)
            }
            LayerCommand::Detach { lambda, layer } => {
                layer_ops::detach_layer(project, lambda, layer)
            }
        },
        Command::Table { command } => match command {
            TableCommand::Add { name, key } => table_ops::create_table(project, name, key),
            TableCommand::Delete { name } => table_ops::delete_table(project, name),
            TableCommand::Attach { lambda, table } => {
                table_ops::attach_table(project, lambda, table)
            }
            TableCommand::Detach { lambda, table } => {
                table_ops::detach_table(project, lambda, table)
            }
        },
        Command::Auth { command } => match command {
            AuthCommand::Basic { api } => auth_ops::add_basic_auth(project, api),
            AuthCommand::Cognito { api, pool } => auth_ops::add_cognito_auth(project, api, pool),
            AuthCommand::Remove { api } => auth_ops::remove_auth(project, api),
        },
        Command::Env { command } => match command {
            EnvCommand::Sync { yes } => env_ops::sync_env(project, *yes),
            EnvCommand::Add { lambda, key } => env_ops::add_env_var(project, lambda, key),
            EnvCommand::Remove { lambda, key } => env_ops::remove_env_var(project, lambda, key),
        },
    }
}
