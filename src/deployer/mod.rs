// deployer/mod.rs
//
// One deployment lifecycle: read the public key, authenticate, make sure the
// resource group exists, push the template, wait for it, and optionally tear
// the whole resource group down again.

use crate::cloud_functions::{self, DeploymentMode, DeploymentProperties, ParameterValue, Parameters, ResourceManagement};
use crate::error::{DeployError, Result};
use crate::paths;
use crate::utils::credentials::{CredentialSource, Credentials};
use crate::utils::files;
use crate::utils::names::{self, NameGenerator};
use crate::utils::settings::Settings;
use rand::Rng;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub public_key_path: PathBuf,
    pub dns_label_prefix: String,
}

pub struct Deployer<M: ResourceManagement> {
    config: DeploymentConfig,
    settings: Settings,
    pub_ssh_key: String,
    client: M,
}

impl<M: ResourceManagement> Deployer<M> {
    /// Reads the key file and resolves the credentials before `connect` is
    /// called, so a bad key path or a missing variable never reaches the network.
    pub fn new<F>(subscription_id: &str, settings: Settings, source: &CredentialSource, connect: F) -> Result<Self>
    where
        F: FnOnce(&Credentials, &str) -> Result<M>,
    {
        Self::with_names(subscription_id, settings, source, &mut NameGenerator::new(), connect)
    }

    pub fn with_names<R, F>(subscription_id: &str, settings: Settings, source: &CredentialSource, names: &mut NameGenerator<R>, connect: F) -> Result<Self>
    where
        R: Rng,
        F: FnOnce(&Credentials, &str) -> Result<M>,
    {
        let public_key_path = files::expand_path(&settings.public_key_path)?;
        let pub_ssh_key = files::read_text(&public_key_path)?;

        let dns_label_prefix = match &settings.dns_label_prefix {
            Some(prefix) => prefix.clone(),
            None => names.haikunate(),
        };
        names::validate_dns_label(&dns_label_prefix)?;

        let credentials = source.resolve()?;
        let client = connect(&credentials, subscription_id)?;

        Ok(Deployer {
            config: DeploymentConfig {
                subscription_id: subscription_id.to_string(),
                resource_group: settings.resource_group.clone(),
                public_key_path,
                dns_label_prefix,
            },
            settings,
            pub_ssh_key,
            client,
        })
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub fn dns_label_prefix(&self) -> &str {
        &self.config.dns_label_prefix
    }

    /// The template's parameters, each in its `{"value": ...}` envelope
    pub fn parameters(&self) -> Parameters {
        let mut parameters = Parameters::new();
        parameters.insert("sshKeyData".to_string(), ParameterValue::new(self.pub_ssh_key.as_str()));
        parameters.insert("vmName".to_string(), ParameterValue::new(self.settings.vm_name.as_str()));
        parameters.insert("dnsLabelPrefix".to_string(), ParameterValue::new(self.config.dns_label_prefix.as_str()));
        parameters
    }

    /// Deploys the template into the resource group and blocks until the
    /// provider reports a terminal state. Remote errors are passed through as-is.
    pub fn deploy(&self) -> Result<()> {
        let rg = &self.config.resource_group;

        // a broken template must not leave an empty resource group behind
        let template = self.template()?;

        println_with_time!("Creating or updating resource group {} in {}", rg, self.settings.location);
        let group = self.client.create_or_update_resource_group(rg, &self.settings.location)?;
        let group_state = group.properties.and_then(|p| p.provisioning_state).unwrap_or_else(|| "unknown".to_string());
        println_with_time!("Resource group {} in {} is {}", group.name, group.location, group_state);

        let properties = DeploymentProperties {
            mode: DeploymentMode::Incremental,
            template,
            parameters: self.parameters(),
        };

        println_with_time!("Submitting deployment {} ({} mode)", self.settings.deployment_name, properties.mode);
        self.client.begin_deployment(rg, &self.settings.deployment_name, &properties)?;

        cloud_functions::wait_for_deployment(&self.client, rg, &self.settings.deployment_name, self.settings.poll_interval())?;
        Ok(())
    }

    /// Deletes the resource group and everything in it. No confirmation, no undo.
    pub fn destroy(&self) -> Result<()> {
        println_with_time!("Deleting resource group {}", self.config.resource_group);
        self.client.delete_resource_group(&self.config.resource_group)
    }

    /// The configured template file, or the one built into the program
    pub fn template(&self) -> Result<Value> {
        match &self.settings.template_path {
            Some(path) => load_template(path),
            None => parse_template(paths::BUNDLED_TEMPLATE, Path::new("<built-in template>")),
        }
    }

    pub fn ssh_hint(&self) -> String {
        format!(
            "ssh {}@{}.{}.cloudapp.azure.com",
            self.settings.admin_username, self.config.dns_label_prefix, self.settings.location
        )
    }
}

/// The template is handed to the provider untouched, it only has to be JSON
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let text = files::read_text(path)?;
    parse_template(&text, path)
}

fn parse_template(text: &str, origin: &Path) -> Result<Value> {
    serde_json::from_str(text).map_err(|source| DeployError::Template {
        path: origin.to_path_buf(),
        source,
    })
}

#[cfg(test)]
impl<M: ResourceManagement> Deployer<M> {
    pub fn pub_ssh_key(&self) -> &str {
        &self.pub_ssh_key
    }

    pub fn client(&self) -> &M {
        &self.client
    }
}
