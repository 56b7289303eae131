// Azure management plane through the Azure CLI (`az`). Every call is scoped to
// the subscription the client was connected with.

use super::{DeploymentProperties, DeploymentStatus, ProvisioningState, ResourceGroup, ResourceManagement};
use crate::error::{DeployError, Result};
use crate::shell_tools::{CommandLine, CommandRunner, LocalRunner, RunResult};
use crate::utils::credentials::Credentials;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;

const PARAMETERS_SCHEMA: &str = "https://schema.management.azure.com/schemas/2019-04-01/deploymentParameters.json#";

const CONFIG_DIR_VAR: &str = "AZURE_CONFIG_DIR";

pub struct AzureCli<R: CommandRunner = LocalRunner> {
    runner: R,
    binary: String,
    subscription_id: String,
    /// Private CLI profile holding this client's login; removed with the client
    config_dir: tempfile::TempDir,
}

#[derive(Deserialize, Debug)]
struct DeploymentShow {
    state: Option<String>,
    error: Option<Value>,
}

impl<R: CommandRunner> AzureCli<R> {
    /// Checks the CLI is installed and logs the service principal in
    pub fn connect(runner: R, binary: &str, credentials: &Credentials, subscription_id: &str) -> Result<Self> {
        if !runner.exists(binary) {
            return Err(DeployError::CommandNotFound {
                command: binary.to_string(),
                reason: "Azure CLI is not installed with this path, check azure_cli_binary in the settings and/or install Azure CLI".to_string(),
            });
        }

        let config_dir = tempfile::Builder::new()
            .prefix("az-profile-")
            .tempdir()
            .map_err(|e| DeployError::io(std::env::temp_dir(), e))?;

        let cli = AzureCli {
            runner,
            binary: binary.to_string(),
            subscription_id: subscription_id.to_string(),
            config_dir,
        };

        // az reads `@file` arguments from the file, which keeps the secret out of the process list
        let secret = secret_file(cli.config_dir.path(), &credentials.client_secret)?;
        let login = cli
            .az(&["login", "--service-principal"])
            .opt("username", &credentials.client_id)
            .opt("password", format!("@{}", secret.path().to_string_lossy()))
            .opt("tenant", &credentials.tenant_id)
            .opt("output", "none");
        cli.run(&login)?;
        Ok(cli)
    }

    /// Every az call goes through here so it only ever sees the private profile
    fn az(&self, args: &[&str]) -> CommandLine {
        args.iter()
            .fold(CommandLine::new(&self.binary), |cmd, a| cmd.arg(a))
            .env(CONFIG_DIR_VAR, self.config_dir.path().to_string_lossy())
    }

    fn run(&self, command: &CommandLine) -> Result<RunResult> {
        self.runner.run(command)?.check()
    }

    fn run_json<T: serde::de::DeserializeOwned>(&self, command: &CommandLine) -> Result<T> {
        let res = self.run(command)?;
        serde_json::from_str(&res.stdout).map_err(|e| DeployError::UnexpectedOutput {
            command: res.command.clone(),
            details: e.to_string(),
        })
    }
}

/// Owner-only file, deleted when dropped
fn secret_file(dir: &std::path::Path, secret: &str) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("sp-")
        .tempfile_in(dir)
        .map_err(|e| DeployError::io(dir, e))?;
    file.write_all(secret.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| DeployError::io(file.path(), e))?;
    Ok(file)
}

fn scratch_json(prefix: &str, value: &Value) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".json")
        .tempfile()
        .map_err(|e| DeployError::io(std::env::temp_dir(), e))?;
    let text = serde_json::to_string(value).map_err(|e| DeployError::UnexpectedOutput {
        command: "serialize".to_string(),
        details: e.to_string(),
    })?;
    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| DeployError::io(file.path(), e))?;
    Ok(file)
}

/// Turns the provider's error document into one readable line per detail
fn flatten_error(error: &Value) -> String {
    let mut out = Vec::new();
    fn walk(e: &Value, out: &mut Vec<String>) {
        if let (Some(code), Some(message)) = (e["code"].as_str(), e["message"].as_str()) {
            out.push(format!("{}: {}", code, message));
        }
        if let Some(details) = e["details"].as_array() {
            details.iter().for_each(|d| walk(d, out));
        }
    }
    walk(error, &mut out);
    match out.is_empty() {
        true => error.to_string(),
        false => out.join("\n"),
    }
}

impl<R: CommandRunner> ResourceManagement for AzureCli<R> {
    fn create_or_update_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        let cmd = self
            .az(&["group", "create"])
            .opt("name", name)
            .opt("location", location)
            .opt("subscription", &self.subscription_id)
            .opt("output", "json");
        self.run_json(&cmd)
    }

    fn begin_deployment(&self, resource_group: &str, deployment_name: &str, properties: &DeploymentProperties) -> Result<()> {
        let template = scratch_json(&format!("{}-template-", deployment_name), &properties.template)?;
        let parameters = scratch_json(
            &format!("{}-parameters-", deployment_name),
            &json!({
                "$schema": PARAMETERS_SCHEMA,
                "contentVersion": "1.0.0.0",
                "parameters": properties.parameters,
            }),
        )?;

        let cmd = self
            .az(&["deployment", "group", "create"])
            .opt("resource-group", resource_group)
            .opt("name", deployment_name)
            .opt("mode", properties.mode.to_string())
            .opt("template-file", template.path().to_string_lossy())
            .opt("parameters", format!("@{}", parameters.path().to_string_lossy()))
            .opt("subscription", &self.subscription_id)
            .arg("--no-wait");
        self.run(&cmd)?;
        Ok(())
    }

    fn deployment_status(&self, resource_group: &str, deployment_name: &str) -> Result<DeploymentStatus> {
        let cmd = self
            .az(&["deployment", "group", "show"])
            .opt("resource-group", resource_group)
            .opt("name", deployment_name)
            .opt("subscription", &self.subscription_id)
            .opt("query", "{state: properties.provisioningState, error: properties.error}")
            .opt("output", "json");
        let show: DeploymentShow = self.run_json(&cmd)?;

        let state = show.state.ok_or_else(|| DeployError::UnexpectedOutput {
            command: cmd.to_string(),
            details: "no provisioningState in the deployment".to_string(),
        })?;
        Ok(DeploymentStatus {
            state: ProvisioningState::parse(&state),
            error: show.error.filter(|e| !e.is_null()).map(|e| flatten_error(&e)),
        })
    }

    fn delete_resource_group(&self, name: &str) -> Result<()> {
        let cmd = self
            .az(&["group", "delete"])
            .opt("name", name)
            .opt("subscription", &self.subscription_id)
            .arg("--yes")
            .arg("--no-wait");
        self.run(&cmd)?;
        Ok(())
    }
}
