use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::provision::{CreateRequest, Distro};

#[derive(Parser, Debug)]
#[command(
    name = "lab-cli",
    about = "Provision and manage lab VMs on a libvirt host, grouped for Ansible"
)]
pub struct Cli {
    /// Path to config file [default: $XDG_CONFIG_HOME/lab-cli/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install a new VM with an unattended installer
    Create(CreateArgs),

    /// Force-stop a VM, undefine it and delete its disk
    Remove { name: String },

    /// List managed VMs
    List,

    /// Start a stopped VM
    Start { name: String },

    /// Force-stop a running VM
    Stop { name: String },

    /// Open an SSH session to a running VM
    Ssh { name: String },

    /// Print an Ansible dynamic inventory
    Inventory {
        /// Print all groups and hosts (default). Accepted because Ansible
        /// always passes it; omitting it gives the same output.
        #[arg(long, conflicts_with = "host")]
        list: bool,

        /// Print the variables of a single host
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// VM name, also used as its hostname
    pub name: String,

    /// Distribution to install
    #[arg(long, value_enum, default_value_t = Distro::Debian)]
    pub distro: Distro,

    /// Memory in MB
    #[arg(long, default_value_t = 2048)]
    pub ram: u32,

    /// Number of virtual CPUs
    #[arg(long, default_value_t = 2)]
    pub vcpus: u32,

    /// Disk size in GB
    #[arg(long, default_value_t = 10)]
    pub disk: u32,

    /// Ansible groups, comma separated; may be repeated [default: ungrouped]
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<String>,
}

impl From<CreateArgs> for CreateRequest {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            distro: args.distro,
            ram_mb: args.ram,
            vcpus: args.vcpus,
            disk_gb: args.disk,
            groups: args.groups,
        }
    }
}
