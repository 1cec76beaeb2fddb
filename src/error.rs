use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LabError {
    #[error("failed to load config from {path}")]
    #[diagnostic(help("create the file; every key is optional and overlays the built-in defaults"))]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("'{name}' does not exist")]
    DomainNotFound { name: String },

    #[error("'{name}' already exists")]
    AlreadyExists { name: String },

    #[error("'{name}' is already {state}")]
    AlreadyInState { name: String, state: &'static str },

    #[error("'{name}' is not running")]
    #[diagnostic(help("start it with `lab-cli start {name}`"))]
    NotRunning { name: String },

    #[error("failed to parse domain description '{description}': {message}")]
    DescriptionParse { description: String, message: String },

    #[error("could not find an available IP address between {start} and {end}")]
    #[diagnostic(help("widen network.range_start / network.range_end in the config"))]
    AllocationExhausted { start: String, end: String },

    #[error("installer exited with {status}:\n{output}")]
    InstallerFailed { status: String, output: String },

    #[error("failed to parse domain XML: {message}")]
    DomainXml { message: String },

    #[error("template {path}: {message}")]
    Template { path: String, message: String },

    #[error("libvirt: {message}")]
    #[diagnostic(help("{hint}"))]
    Libvirt { message: String, hint: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
}
