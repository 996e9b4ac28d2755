use clap::{Parser, Subcommand, ValueEnum};

/// Clara - orchestration tooling for CLARA DPEs, containers and services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Also write logs to $CLARA_HOME/log
    #[arg(long, global = true)]
    pub log_to_file: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Break a canonical name down into its parts and topics
    Name {
        /// DPE, container or service canonical name (e.g. "10.1.1.1_java:master:engine1")
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: Output,
    },

    /// Decode a control payload (e.g. "startContainer?10.1.1.1:7771_java:master?2?")
    Decode {
        payload: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: Output,
    },

    /// Print the log file path of a DPE, or of this orchestrator
    LogFile {
        /// DPE canonical name; omit for the orchestrator log
        dpe: Option<String>,
    },

    /// Show the exact messages a request would publish, without sending them
    Plan {
        #[command(subcommand)]
        request: PlanCommand,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table", global = true)]
        output: Output,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Start a DPE through the front end
    DeployDpe {
        dpe: String,

        /// DPE whose proxy acts as registrar (defaults to the front end)
        #[arg(long)]
        registrar: Option<String>,

        #[arg(long, default_value = "2")]
        pool_size: usize,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Point a DPE at another front end
    SetFrontEnd { dpe: String, front_end: String },

    /// Deploy a container on its DPE
    DeployContainer {
        container: String,

        #[arg(long, default_value = "2")]
        pool_size: usize,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Deploy a service from an engine class
    DeployService {
        service: String,

        /// Engine class path (e.g. "org.jlab.clas.std.services.convertors.EvioToEvioReader")
        class_path: String,

        #[arg(long, default_value = "2")]
        pool_size: usize,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Stop a DPE or remove a container or service
    Exit { name: String },

    /// Make a service report every N executions
    Report {
        service: String,

        #[arg(value_enum)]
        kind: ReportArg,

        every_n: i64,
    },

    /// Stop a service's reports
    StopReport {
        service: String,

        #[arg(value_enum)]
        kind: ReportArg,
    },

    /// Configure a service with JSON values
    Configure {
        service: String,

        /// JSON configuration values; none sends an empty configuration
        values: Vec<String>,
    },

    /// Execute a service or composition with string inputs
    Execute {
        /// Service canonical name, or a composition like "a+b+c;"
        target: String,

        /// String inputs, one message each
        #[arg(required = true)]
        inputs: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportArg {
    Done,
    Data,
}
