// The slice of the Azure management plane the deployer talks to. `azure` drives
// it through the Azure CLI; tests use the in-memory `fake`.

pub mod azure;
#[cfg(test)]
pub mod fake;

use crate::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Leaves resources that are not in the template alone
    Incremental,
    /// Deletes resources of the group that are not in the template
    #[allow(dead_code)]
    Complete,
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeploymentMode::Incremental => write!(f, "Incremental"),
            DeploymentMode::Complete => write!(f, "Complete"),
        }
    }
}

/// The `{"value": ...}` envelope every template parameter is wrapped in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub value: Value,
}

impl ParameterValue {
    pub fn new<T: Into<Value>>(value: T) -> Self {
        ParameterValue { value: value.into() }
    }
}

pub type Parameters = BTreeMap<String, ParameterValue>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeploymentProperties {
    pub mode: DeploymentMode,
    pub template: Value,
    pub parameters: Parameters,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningState {
    Accepted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// Transient states the deployer does not need to tell apart (Creating, Updating, ...)
    Other(String),
}

impl ProvisioningState {
    pub fn parse(state: &str) -> Self {
        match state.trim() {
            "Accepted" => ProvisioningState::Accepted,
            "Running" => ProvisioningState::Running,
            "Succeeded" => ProvisioningState::Succeeded,
            "Failed" => ProvisioningState::Failed,
            "Canceled" | "Cancelled" => ProvisioningState::Canceled,
            other => ProvisioningState::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::Canceled => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProvisioningState::Accepted => write!(f, "Accepted"),
            ProvisioningState::Running => write!(f, "Running"),
            ProvisioningState::Succeeded => write!(f, "Succeeded"),
            ProvisioningState::Failed => write!(f, "Failed"),
            ProvisioningState::Canceled => write!(f, "Canceled"),
            ProvisioningState::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentStatus {
    pub state: ProvisioningState,
    /// The provider's error document, flattened, when the deployment failed
    pub error: Option<String>,
}

pub trait ResourceManagement {
    /// Creates the group, or leaves it as is when it already exists at that location
    fn create_or_update_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup>;

    /// Submits the deployment and returns as soon as the provider accepted it
    fn begin_deployment(&self, resource_group: &str, deployment_name: &str, properties: &DeploymentProperties) -> Result<()>;

    fn deployment_status(&self, resource_group: &str, deployment_name: &str) -> Result<DeploymentStatus>;

    /// Deletes the group and everything in it. Does not wait for the deletion to finish.
    fn delete_resource_group(&self, name: &str) -> Result<()>;
}

/// Blocks until the deployment reaches a terminal state, checking every `interval`.
/// There is no timeout: a deployment that never finishes keeps this waiting.
pub fn wait_for_deployment<M: ResourceManagement + ?Sized>(client: &M, resource_group: &str, deployment_name: &str, interval: Duration) -> Result<ProvisioningState> {
    let mut last_state: Option<ProvisioningState> = None;

    loop {
        let status = client.deployment_status(resource_group, deployment_name)?;

        if last_state.as_ref() != Some(&status.state) {
            println_with_time!("Deployment {} is {}", deployment_name, status.state);
        }

        if status.state.is_terminal() {
            return match status.state {
                ProvisioningState::Succeeded => Ok(status.state),
                _ => Err(DeployError::DeploymentFailed {
                    name: deployment_name.to_string(),
                    state: status.state.to_string(),
                    details: status.error.unwrap_or_else(|| "no error details reported".to_string()),
                }),
            };
        }
        last_state = Some(status.state);
        std::thread::sleep(interval);
    }
}
