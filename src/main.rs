use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use envault::{Envault, KdfParams, MasterKey, Storage, default_storage};

#[derive(Debug, Parser)]
#[command(name = "envault")]
#[command(
    version,
    about = "Offline environment-secrets vault with dual-cipher at-rest encryption."
)]
struct Cli {
    /// Path to the envault store file
    #[arg(long, global = true, value_name = "PATH", env = "ENVAULT_PATH")]
    store: Option<PathBuf>,

    /// PBKDF2 iteration count; must match the value used when secrets were stored
    #[arg(
        long,
        global = true,
        value_name = "N",
        env = "ENVAULT_KDF_ITERATIONS"
    )]
    kdf_iterations: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Initializes the secret store
    Init,

    /// Encrypts and stores a secret by name
    #[command(arg_required_else_help = true)]
    Set { name: String, value: String },

    /// Decrypts and prints a secret by name
    #[command(arg_required_else_help = true)]
    Get { name: String },

    /// Re-encrypts an existing secret with a new value
    #[command(arg_required_else_help = true)]
    Update { name: String, new_value: String },

    /// Lists all stored secrets
    List {
        #[arg(required = false, short, long, default_value_t = false)]
        /// Print names, decrypted values and timestamps
        all: bool,
    },

    /// Removes a secret by name
    #[command(arg_required_else_help = true)]
    Remove { name: String },

    /// Shows information about the store
    Info,

    /// Prints a freshly generated master key in its 64-hex configured form
    GenerateKey,
}

fn resolve_storage(path: Option<PathBuf>) -> Result<Storage> {
    match path {
        Some(p) => Ok(Storage::new(p)),
        None => default_storage(),
    }
}

fn resolve_kdf(iterations: Option<u32>) -> Result<KdfParams> {
    match iterations {
        Some(n) => Ok(KdfParams::new(n)?),
        None => Ok(KdfParams::default()),
    }
}

fn open_vault(args: &Cli) -> Result<Envault> {
    let master_key = MasterKey::from_env()?;
    let storage = resolve_storage(args.store.clone())?;
    let kdf = resolve_kdf(args.kdf_iterations)?;

    Envault::open_with_storage_and_kdf(master_key, storage, kdf)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();

    match &args.command {
        Commands::GenerateKey => {
            println!("{}", MasterKey::generate()?);
        }
        Commands::Init => {
            let master_key = MasterKey::from_env()?;
            let storage = resolve_storage(args.store.clone())?;
            let kdf = resolve_kdf(args.kdf_iterations)?;
            Envault::init_with_storage_and_kdf(master_key, storage, kdf)?;
            println!("secret store initialized");
        }
        Commands::Set { name, value } => {
            let mut vault = open_vault(&args)?;
            vault.set(name, value)?;
            vault.save()?;
            println!("stored secret '{name}'");
        }
        Commands::Update { name, new_value } => {
            let mut vault = open_vault(&args)?;
            vault.update(name, new_value)?;
            vault.save()?;
            println!("secret '{name}' updated.");
        }
        Commands::Get { name } => {
            let vault = open_vault(&args)?;
            match vault.get(name)? {
                Some(value) => println!("{value}"),
                None => println!("secret not found"),
            }
        }
        Commands::List { all } => {
            let vault = open_vault(&args)?;
            if *all {
                let revealed = vault.reveal_all();

                if revealed.is_empty() {
                    println!("No secrets stored.");
                    return Ok(());
                }

                let name_width = revealed
                    .iter()
                    .map(|(e, _)| e.name().len())
                    .chain(std::iter::once("Name".len()))
                    .max()
                    .unwrap();

                let updated_width = revealed
                    .iter()
                    .map(|(e, _)| e.updated().len())
                    .chain(std::iter::once("Updated".len()))
                    .max()
                    .unwrap();

                println!("{:<name_width$}  {:<updated_width$}  Value", "Name", "Updated");
                println!("{:-<name_width$}  {:-<updated_width$}  -----", "", "");

                for (entry, value) in revealed {
                    let shown = match &value {
                        Ok(v) => v.as_str(),
                        Err(_) => "[unreadable]",
                    };
                    println!(
                        "{:<name_width$}  {:<updated_width$}  {shown}",
                        entry.name(),
                        entry.updated()
                    );
                }
            } else {
                for name in vault.list() {
                    println!("{name}");
                }
            }
        }
        Commands::Remove { name } => {
            let mut vault = open_vault(&args)?;
            vault.remove(name)?;
            vault.save()?;
            println!("secret '{name}' removed successfully");
        }
        Commands::Info => {
            let vault = open_vault(&args)?;
            println!("{}", vault.info());
        }
    }

    Ok(())
}
