use clap::Parser;
use tracing_subscriber::EnvFilter;

use lab_cli::backend;
use lab_cli::cli::{Cli, Command};
use lab_cli::config;
use lab_cli::description::TagCodec;
use lab_cli::inventory;
use lab_cli::lifecycle;
use lab_cli::paths;
use lab_cli::provision::{self, CreateRequest, VirtInstall};
use lab_cli::ssh;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("lab_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lab_cli=warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config_path = cli.config.unwrap_or_else(paths::config_file);
    let settings = config::load_config(&config_path)?;
    let codec = TagCodec::default();

    // Opened per command, after argument validation, closed on drop.
    let connect = || backend::create_backend(&settings.libvirt_uri);

    match cli.command {
        Command::Create(args) => {
            let request = CreateRequest::from(args).validated()?;
            let name = request.name.clone();
            let hv = connect()?;
            let installer = VirtInstall::new(&settings.virt_install_path);
            let outcome = provision::create(&hv, &installer, &codec, &settings, request)?;

            println!("{}", outcome.installer_output);
            println!(
                "\n'{name}' is being installed with address {}. After the installation \
                 is finished the VM will shut down and you have to start it manually.",
                outcome.address
            );
        }
        Command::Remove { name } => {
            lifecycle::remove(&connect()?, &name)?;
            println!("'{name}' has been removed");
        }
        Command::List => {
            let vms = inventory::list_managed(&connect()?, &codec)?;
            print!("{}", inventory::render_table(&vms));
        }
        Command::Start { name } => {
            lifecycle::start(&connect()?, &name)?;
            println!("'{name}' started");
        }
        Command::Stop { name } => {
            lifecycle::stop(&connect()?, &name)?;
            println!("'{name}' stopped");
        }
        Command::Ssh { name } => {
            // Resolve the address first so libvirt is not held open for the session.
            let address = ssh::target_address(&connect()?, &codec, &name)?;
            let code = ssh::session(&settings, address)?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        // `--list` is the default document, so only `--host` selects.
        Command::Inventory { list: _, host } => {
            let vms = inventory::list_managed(&connect()?, &codec)?;
            let json = match host {
                Some(host) => inventory::ansible_host(&vms, &host)?,
                None => inventory::ansible_inventory(&vms)?,
            };
            println!("{json}");
        }
    }

    Ok(())
}
