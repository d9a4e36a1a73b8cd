mod io;

use anyhow::Context;
use clap::{Parser, Subcommand};
use contracting_core::access::{contract_acl, local_roles, permits, root_acl};
use contracting_core::config::{accreditation_from_env_value, timezone_from_env_value};
use contracting_core::constants::{CREATE_ACCREDITATION_ENV, TZ_ENV};
use contracting_core::{
    Contract, ContractService, ContractingError, CoreConfig, Permission, Requester, Role,
};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "contracting")]
#[command(about = "Procurement contract records CLI")]
struct Cli {
    /// User id of the requester
    #[arg(long, global = true)]
    user: Option<String>,
    /// Access token presented by the requester
    #[arg(long, global = true)]
    token: Option<String>,
    /// Group of the requester (repeatable)
    #[arg(long = "group", global = true)]
    groups: Vec<String>,
    /// Broker accreditation level (repeatable)
    #[arg(long = "accreditation", global = true)]
    accreditations: Vec<u8>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a contract from a client document
    Create {
        /// Contract document (JSON or YAML)
        input: PathBuf,
        /// Where to store the created contract
        #[arg(long)]
        out: PathBuf,
    },
    /// Validate a stored contract
    Validate {
        /// Stored contract (JSON or YAML)
        contract: PathBuf,
    },
    /// Print a contract through a role
    View {
        contract: PathBuf,
        /// Role name, e.g. view, plain, edit_active, Administrator
        #[arg(long, default_value = "view")]
        role: String,
    },
    /// Show local roles, ACL entries and the requester's permissions
    Acl { contract: PathBuf },
    /// Apply a partial update to a contract
    Patch {
        contract: PathBuf,
        /// Patch document (JSON or YAML)
        data: PathBuf,
    },
    /// Add a pending change
    AddChange { contract: PathBuf, data: PathBuf },
    /// Apply a partial update to a pending change
    PatchChange {
        contract: PathBuf,
        change_id: String,
        data: PathBuf,
    },
    /// Attach a document
    AddDocument { contract: PathBuf, data: PathBuf },
    /// Apply a partial update to a document
    PatchDocument {
        contract: PathBuf,
        document_id: String,
        data: PathBuf,
    },
    /// Rotate the owner token
    Credentials { contract: PathBuf },
}

impl Cli {
    fn requester(&self) -> Requester {
        let mut requester = match &self.user {
            Some(user) => Requester::user(user.clone()),
            None => Requester::anonymous(),
        };
        if let Some(token) = &self.token {
            requester = requester.with_token(token.clone());
        }
        for group in &self.groups {
            requester = requester.with_group(group.clone());
        }
        requester.with_accreditations(self.accreditations.iter().copied())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contracting=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.command.is_none() {
        println!("Use 'contracting --help' for commands");
        return Ok(());
    }

    let cfg = resolve_config(
        std::env::var(TZ_ENV).ok(),
        std::env::var(CREATE_ACCREDITATION_ENV).ok(),
    )?;
    let service = ContractService::new(Arc::new(cfg));

    let output = execute(&cli, &service)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn resolve_config(
    timezone: Option<String>,
    create_accreditation: Option<String>,
) -> anyhow::Result<CoreConfig> {
    let cfg = CoreConfig::new(
        timezone_from_env_value(timezone).context(format!("invalid {TZ_ENV}"))?,
        accreditation_from_env_value(create_accreditation)
            .context(format!("invalid {CREATE_ACCREDITATION_ENV}"))?,
    )?;
    tracing::debug!(
        timezone = %cfg.timezone(),
        create_accreditation = cfg.create_accreditation(),
        "configuration resolved"
    );
    Ok(cfg)
}

/// Runs one command and returns the document to print.
fn execute(cli: &Cli, service: &ContractService) -> anyhow::Result<JsonValue> {
    let requester = cli.requester();
    let Some(command) = &cli.command else {
        return Ok(JsonValue::Null);
    };

    match command {
        Commands::Create { input, out } => {
            let contract = service
                .create_contract(io::read_document(input)?, &requester)
                .map_err(report)?;
            io::write_document(out, &contract.to_document().map_err(report)?)?;
            Ok(json!({
                "data": service.view_contract(&contract).map_err(report)?,
                "access": {"token": contract.owner_token},
            }))
        }
        Commands::Validate { contract } => {
            let contract = load(contract)?;
            contract
                .validate_at(service.config().now())
                .map_err(|errors| report(errors.into()))?;
            Ok(json!({"status": "valid", "id": contract.id.to_string()}))
        }
        Commands::View { contract, role } => {
            let role: Role = role.parse().with_context(|| format!("unknown role '{role}'"))?;
            Ok(load(contract)?.project(role).map_err(report)?)
        }
        Commands::Acl { contract } => {
            let contract = load(contract)?;
            let permissions: Vec<&str> = Permission::ALL
                .into_iter()
                .filter(|permission| permits(Some(&contract), &requester, *permission))
                .map(|permission| permission.as_str())
                .collect();
            let local: serde_json::Map<String, JsonValue> = local_roles(&contract)
                .into_iter()
                .map(|(principal, role)| (principal, json!(role.as_str())))
                .collect();
            Ok(json!({
                "local_roles": local,
                "contract_acl": contract_acl(&contract),
                "root_acl": root_acl(),
                "principals": requester.effective_principals(),
                "permissions": permissions,
            }))
        }
        Commands::Patch { contract: path, data } => {
            let mut contract = load(path)?;
            let changed = service
                .patch_contract(&mut contract, &requester, &io::read_document(data)?)
                .map_err(report)?;
            if changed {
                store(path, &contract)?;
            }
            Ok(json!({"data": service.view_contract(&contract).map_err(report)?}))
        }
        Commands::AddChange { contract: path, data } => {
            let mut contract = load(path)?;
            let change = service
                .add_change(&mut contract, &requester, io::read_document(data)?)
                .map_err(report)?;
            store(path, &contract)?;
            Ok(json!({"data": change}))
        }
        Commands::PatchChange {
            contract: path,
            change_id,
            data,
        } => {
            let mut contract = load(path)?;
            let change = service
                .patch_change(&mut contract, &requester, change_id, &io::read_document(data)?)
                .map_err(report)?;
            store(path, &contract)?;
            Ok(json!({"data": change}))
        }
        Commands::AddDocument { contract: path, data } => {
            let mut contract = load(path)?;
            let document = service
                .add_document(&mut contract, &requester, io::read_document(data)?)
                .map_err(report)?;
            store(path, &contract)?;
            Ok(json!({"data": document}))
        }
        Commands::PatchDocument {
            contract: path,
            document_id,
            data,
        } => {
            let mut contract = load(path)?;
            let document = service
                .patch_document(&mut contract, &requester, document_id, &io::read_document(data)?)
                .map_err(report)?;
            store(path, &contract)?;
            Ok(json!({"data": document}))
        }
        Commands::Credentials { contract: path } => {
            let mut contract = load(path)?;
            let credentials = service
                .generate_credentials(&mut contract, &requester)
                .map_err(report)?;
            store(path, &contract)?;
            Ok(serde_json::to_value(credentials)?)
        }
    }
}

fn load(path: &Path) -> anyhow::Result<Contract> {
    Contract::from_document(io::read_document(path)?)
        .map_err(|errors| report(errors.into()))
        .with_context(|| format!("invalid contract in {}", path.display()))
}

fn store(path: &Path, contract: &Contract) -> anyhow::Result<()> {
    io::write_document(path, &contract.to_document().map_err(report)?)
}

/// Prints the API error list to stderr and wraps the error for the exit status.
fn report(err: ContractingError) -> anyhow::Error {
    let body = json!({"status": "error", "errors": err.to_error_list()});
    if let Ok(rendered) = serde_json::to_string_pretty(&body) {
        eprintln!("{rendered}");
    }
    anyhow::Error::new(err)
}
