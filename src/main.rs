//main.rs
//
// Deploys templates/template.json (an Ubuntu VM with its storage account,
// network, public IP and security group) into a resource group, through a
// service principal.
//
// Expects the following environment variables:
//   AZURE_TENANT_ID      Azure Active Directory tenant id or domain
//   AZURE_CLIENT_ID      Azure Active Directory application client id
//   AZURE_CLIENT_SECRET  Azure Active Directory application secret
//   AZURE_SUBSCRIPTION_ID (optional)

// ========== General Data ===========
#[macro_use]
mod logger;
mod error;
mod paths;
mod shell_tools;
mod utils;

// ========= Cloud Specific ==========
mod cloud_functions;
mod deployer;

use cloud_functions::azure::AzureCli;
use deployer::Deployer;
use error::Result;
use shell_tools::LocalRunner;
use std::env;
use utils::credentials::{self, CredentialSource};
use utils::settings::Settings;

fn main() {
    let args: Vec<String> = env::args().collect();

    let result = match args.get(1).map(|a| a.to_lowercase()) {
        None => deploy(),
        Some(arg) => match arg.as_str() {
            "deploy" => deploy(),
            "destroy" | "delete" | "remove" | "clean" | "rm" | "del" => destroy(),
            _ => {
                println!("Usage: {} [deploy | destroy]", args[0]);
                std::process::exit(2);
            }
        },
    };

    if let Err(e) = result {
        eprintln_with_time!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_deployer() -> Result<Deployer<AzureCli>> {
    let settings = Settings::load(paths::locate(paths::SETTINGS))?;
    let subscription_id = credentials::subscription_id_from_env();
    let cli_binary = settings.azure_cli_binary.clone();

    let deployer = Deployer::new(&subscription_id, settings, &CredentialSource::from_env(), |creds, sub| {
        AzureCli::connect(LocalRunner, &cli_binary, creds, sub)
    })?;

    let config = deployer.config();
    println!(
        "\nInitialized the deployer with subscription id: {}, resource group: {}\nand public key located at: {}...\n",
        config.subscription_id,
        config.resource_group,
        config.public_key_path.display()
    );
    Ok(deployer)
}

fn deploy() -> Result<()> {
    let deployer = build_deployer()?;

    println_with_time!("Beginning the deployment of {}...", deployer.dns_label_prefix());
    deployer.deploy()?;

    println!("\nDone deploying!!\n\nYou can connect via: `{}`", deployer.ssh_hint());
    Ok(())
}

fn destroy() -> Result<()> {
    let deployer = build_deployer()?;
    deployer.destroy()?;
    println_with_time!("Deletion of resource group {} requested, it may take a while to finish", deployer.config().resource_group);
    Ok(())
}
