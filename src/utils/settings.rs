// settings.rs
//
// Everything that used to be a hard-coded constant lives here, with that
// constant as its default. The file is optional: without it the program
// deploys with the defaults.

use crate::error::{DeployError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub resource_group: String,
    pub location: String,
    pub vm_name: String,
    pub deployment_name: String,
    /// Must match the `adminUserName` default of the template, only used for the ssh hint
    pub admin_username: String,
    pub public_key_path: String,
    /// Deploy this template file instead of the one built into the program
    pub template_path: Option<String>,
    pub azure_cli_binary: String,
    pub poll_interval_secs: u64,
    /// Skip the random name and use this DNS label instead
    pub dns_label_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            resource_group: "azure-python-deployment-sample".to_string(),
            location: "westus".to_string(),
            vm_name: "azure-deployment-sample-vm".to_string(),
            deployment_name: "azure-sample".to_string(),
            admin_username: "azureSample".to_string(),
            public_key_path: paths::DEFAULT_PUBLIC_KEY.to_string(),
            template_path: None,
            azure_cli_binary: "az".to_string(),
            poll_interval_secs: 10,
            dns_label_prefix: None,
        }
    }
}

impl Settings {
    /// Loads the settings file, falling back to the defaults when it does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let text = crate::utils::files::read_text(path)?;
        let settings = Self::parse(&text).map_err(|source| DeployError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        // 0 would poll the deployment back to back
        if self.poll_interval_secs == 0 {
            return Err(DeployError::InvalidSetting {
                field: "poll_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn parse(text: &str) -> std::result::Result<Settings, serde_yaml::Error> {
        // an empty (or comments-only) file is a valid "use all defaults"
        if text.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}
