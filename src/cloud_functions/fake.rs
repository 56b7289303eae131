// In-memory stand-in for the management plane. Models just enough of ARM to
// check what the deployer asks for: groups, per-group resources with
// incremental/complete semantics, and scripted provisioning states.

use super::{DeploymentMode, DeploymentProperties, DeploymentStatus, ProvisioningState, ResourceGroup, ResourceGroupProperties, ResourceManagement};
use crate::error::{DeployError, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateGroup { name: String, location: String },
    BeginDeployment { resource_group: String, name: String, properties: DeploymentProperties },
    Status { resource_group: String, name: String },
    DeleteGroup { name: String },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    groups: BTreeMap<String, String>,
    resources: BTreeMap<String, BTreeMap<String, Value>>,
    deployments: BTreeMap<(String, String), VecDeque<ProvisioningState>>,
    scripted: Option<Vec<ProvisioningState>>,
    failure: Option<String>,
    modifications: Vec<usize>,
    status_polls: usize,
}

#[derive(Default)]
pub struct FakeManagement {
    state: RefCell<FakeState>,
}

impl FakeManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// States reported by the next submitted deployment, one per poll; the last one sticks
    pub fn script_states(&self, states: &[&str]) {
        self.state.borrow_mut().scripted = Some(states.iter().map(|s| ProvisioningState::parse(s)).collect());
    }

    /// Error details attached to a Failed/Canceled state
    pub fn fail_with(&self, message: &str) {
        self.state.borrow_mut().failure = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn status_polls(&self) -> usize {
        self.state.borrow().status_polls
    }

    /// Resources created or changed by each deployment, in submission order
    pub fn modifications(&self) -> Vec<usize> {
        self.state.borrow().modifications.clone()
    }

    pub fn resource_count(&self, resource_group: &str) -> usize {
        self.state.borrow().resources.get(resource_group).map(|r| r.len()).unwrap_or(0)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state.borrow().groups.contains_key(name)
    }

    pub fn deployments_submitted(&self) -> Vec<DeploymentProperties> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::BeginDeployment { properties, .. } => Some(properties),
                _ => None,
            })
            .collect()
    }
}

fn remote_error(message: &str) -> DeployError {
    DeployError::CommandFailed {
        command: "fake".to_string(),
        code: 3,
        stderr: message.to_string(),
    }
}

impl ResourceManagement for FakeManagement {
    fn create_or_update_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::CreateGroup { name: name.to_string(), location: location.to_string() });

        if let Some(existing) = state.groups.get(name) {
            if existing != location {
                return Err(remote_error(&format!("InvalidResourceGroupLocation: {} already exists in {}", name, existing)));
            }
        }
        state.groups.insert(name.to_string(), location.to_string());
        Ok(ResourceGroup {
            name: name.to_string(),
            location: location.to_string(),
            properties: Some(ResourceGroupProperties { provisioning_state: Some("Succeeded".to_string()) }),
        })
    }

    fn begin_deployment(&self, resource_group: &str, deployment_name: &str, properties: &DeploymentProperties) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::BeginDeployment {
            resource_group: resource_group.to_string(),
            name: deployment_name.to_string(),
            properties: properties.clone(),
        });
        if !state.groups.contains_key(resource_group) {
            return Err(remote_error(&format!("ResourceGroupNotFound: {}", resource_group)));
        }

        let parameters = serde_json::to_value(&properties.parameters).unwrap_or(Value::Null);
        let wanted: BTreeMap<String, Value> = properties.template["resources"]
            .as_array()
            .map(|r| r.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|r| (format!("{}/{}", r["type"].as_str().unwrap_or("?"), r["name"].as_str().unwrap_or("?")), json!({"resource": r, "parameters": parameters})))
            .collect();

        let existing = state.resources.entry(resource_group.to_string()).or_default();
        let mut modified = 0;
        for (key, value) in &wanted {
            if existing.get(key) != Some(value) {
                existing.insert(key.clone(), value.clone());
                modified += 1;
            }
        }
        if properties.mode == DeploymentMode::Complete {
            let before = existing.len();
            existing.retain(|k, _| wanted.contains_key(k));
            modified += before - existing.len();
        }
        state.modifications.push(modified);

        let states = state
            .scripted
            .take()
            .unwrap_or_else(|| vec![ProvisioningState::Running, ProvisioningState::Succeeded]);
        state.deployments.insert((resource_group.to_string(), deployment_name.to_string()), states.into());
        Ok(())
    }

    fn deployment_status(&self, resource_group: &str, deployment_name: &str) -> Result<DeploymentStatus> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Status { resource_group: resource_group.to_string(), name: deployment_name.to_string() });
        state.status_polls += 1;

        let failure = state.failure.clone();
        let queue = state
            .deployments
            .get_mut(&(resource_group.to_string(), deployment_name.to_string()))
            .ok_or_else(|| remote_error(&format!("DeploymentNotFound: {}", deployment_name)))?;

        let current = match queue.len() {
            0 | 1 => queue.front().cloned().unwrap_or(ProvisioningState::Succeeded),
            _ => queue.pop_front().unwrap_or(ProvisioningState::Succeeded),
        };
        let error = match current {
            ProvisioningState::Failed | ProvisioningState::Canceled => failure,
            _ => None,
        };
        Ok(DeploymentStatus { state: current, error })
    }

    fn delete_resource_group(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::DeleteGroup { name: name.to_string() });
        state.groups.remove(name);
        state.resources.remove(name);
        state.deployments.retain(|(rg, _), _| rg != name);
        Ok(())
    }
}
