//! Encoding and decoding of control payloads
//!
//! A control payload is a `?`-separated string whose first field is the
//! command token (see [`crate::names::commands`]). Arguments are positional and
//! their count is fixed per command. When the last field is a free-text
//! description it may itself contain `?`; every other field must not.

use std::fmt;

use clara_models::{ClaraLang, ContainerName, DpeName, NameError, ProxyAddress, ReportType, ServiceName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::names::{commands, DATA_SEP};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("empty control payload")]
    Empty,

    #[error("unknown control command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected} fields, found {found}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid {field} '{value}' in '{command}'")]
    InvalidField {
        command: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{field} '{value}' contains the field separator")]
    ReservedSeparator { field: &'static str, value: String },

    #[error(transparent)]
    Name(#[from] NameError),
}

/// A lifecycle or report-setting command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    StartDpe {
        dpe: DpeName,
        pool_size: usize,
        registrar: ProxyAddress,
        description: String,
    },
    StopDpe,
    PingDpe,
    SetFrontEndRemote {
        dpe: DpeName,
        front_end: DpeName,
    },
    DeployContainer {
        container: ContainerName,
        pool_size: usize,
        description: String,
    },
    RemoveContainer {
        container: ContainerName,
    },
    DeployService {
        service: ServiceName,
        class_path: String,
        pool_size: usize,
        description: String,
    },
    RemoveService {
        service: ServiceName,
    },
    /// An interval of 0 stops reporting
    Report {
        report: ReportType,
        every_n: u32,
    },
}

impl ControlCommand {
    pub fn token(&self) -> &'static str {
        match self {
            ControlCommand::StartDpe { .. } => commands::START_DPE,
            ControlCommand::StopDpe => commands::STOP_DPE,
            ControlCommand::PingDpe => commands::PING_DPE,
            ControlCommand::SetFrontEndRemote { .. } => commands::SET_FRONT_END_REMOTE,
            ControlCommand::DeployContainer { .. } => commands::DEPLOY_CONTAINER,
            ControlCommand::RemoveContainer { .. } => commands::REMOVE_CONTAINER,
            ControlCommand::DeployService { .. } => commands::DEPLOY_SERVICE,
            ControlCommand::RemoveService { .. } => commands::REMOVE_SERVICE,
            ControlCommand::Report { report: ReportType::Done, .. } => commands::REPORT_DONE,
            ControlCommand::Report { report: ReportType::Data, .. } => commands::REPORT_DATA,
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match encode(self) {
            Ok(payload) => f.write_str(&payload),
            Err(_) => f.write_str(self.token()),
        }
    }
}

/// Positional fields of a payload, checked for stray separators as they are added
struct Fields {
    parts: Vec<String>,
}

impl Fields {
    fn new(token: &'static str) -> Self {
        Self {
            parts: vec![token.to_string()],
        }
    }

    fn push(mut self, field: &'static str, value: impl ToString) -> Result<Self, CodecError> {
        let value = value.to_string();
        if value.contains(DATA_SEP) {
            return Err(CodecError::ReservedSeparator { field, value });
        }
        self.parts.push(value);
        Ok(self)
    }

    /// Free text, only valid as the last field
    fn push_text(mut self, value: &str) -> Self {
        self.parts.push(value.to_string());
        self
    }

    fn finish(self) -> String {
        self.parts.join(&DATA_SEP.to_string())
    }
}

pub fn encode(command: &ControlCommand) -> Result<String, CodecError> {
    let fields = Fields::new(command.token());
    let fields = match command {
        ControlCommand::StartDpe {
            dpe,
            pool_size,
            registrar,
            description,
        } => fields
            .push("host", dpe.host())?
            .push("port", dpe.port())?
            .push("lang", dpe.lang())?
            .push("pool size", pool_size)?
            .push("registrar host", &registrar.host)?
            .push("registrar port", registrar.port)?
            .push_text(description),
        ControlCommand::StopDpe | ControlCommand::PingDpe => fields,
        ControlCommand::SetFrontEndRemote { dpe, front_end } => fields
            .push("host", dpe.host())?
            .push("port", dpe.port())?
            .push("lang", dpe.lang())?
            .push("front-end host", front_end.host())?
            .push("front-end port", front_end.port())?
            .push("front-end lang", front_end.lang())?,
        ControlCommand::DeployContainer {
            container,
            pool_size,
            description,
        } => fields
            .push("container", container)?
            .push("pool size", pool_size)?
            .push_text(description),
        ControlCommand::RemoveContainer { container } => fields.push("container", container)?,
        ControlCommand::DeployService {
            service,
            class_path,
            pool_size,
            description,
        } => fields
            .push("service", service)?
            .push("class path", class_path)?
            .push("pool size", pool_size)?
            .push_text(description),
        ControlCommand::RemoveService { service } => fields.push("service", service)?,
        ControlCommand::Report { every_n, .. } => fields.push("interval", every_n)?,
    };
    Ok(fields.finish())
}

/// Splits `payload` into exactly `expected` fields
///
/// With `free_text_last` the final field absorbs any further separators.
fn split_fields<'a>(
    command: &'static str,
    payload: &'a str,
    expected: usize,
    free_text_last: bool,
) -> Result<Vec<&'a str>, CodecError> {
    let fields: Vec<&str> = if free_text_last {
        payload.splitn(expected, DATA_SEP).collect()
    } else {
        payload.split(DATA_SEP).collect()
    };
    if fields.len() != expected {
        return Err(CodecError::ArgumentCount {
            command,
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_field<T: std::str::FromStr>(
    command: &'static str,
    field: &'static str,
    value: &str,
) -> Result<T, CodecError> {
    value.parse().map_err(|_| CodecError::InvalidField {
        command,
        field,
        value: value.to_string(),
    })
}

fn parse_dpe(
    command: &'static str,
    host: &str,
    port: &str,
    lang: &str,
) -> Result<DpeName, CodecError> {
    let port: u16 = parse_field(command, "port", port)?;
    let lang: ClaraLang = lang.parse()?;
    Ok(DpeName::with_port(host, port, lang)?)
}

pub fn decode(payload: &str) -> Result<ControlCommand, CodecError> {
    if payload.is_empty() {
        return Err(CodecError::Empty);
    }
    let token = payload.split(DATA_SEP).next().unwrap_or_default();
    match token {
        commands::START_DPE => {
            let f = split_fields(commands::START_DPE, payload, 8, true)?;
            Ok(ControlCommand::StartDpe {
                dpe: parse_dpe(commands::START_DPE, f[1], f[2], f[3])?,
                pool_size: parse_field(commands::START_DPE, "pool size", f[4])?,
                registrar: ProxyAddress::new(
                    f[5],
                    parse_field(commands::START_DPE, "registrar port", f[6])?,
                ),
                description: f[7].to_string(),
            })
        }
        commands::STOP_DPE => {
            split_fields(commands::STOP_DPE, payload, 1, false)?;
            Ok(ControlCommand::StopDpe)
        }
        commands::PING_DPE => {
            split_fields(commands::PING_DPE, payload, 1, false)?;
            Ok(ControlCommand::PingDpe)
        }
        commands::SET_FRONT_END_REMOTE => {
            let f = split_fields(commands::SET_FRONT_END_REMOTE, payload, 7, false)?;
            Ok(ControlCommand::SetFrontEndRemote {
                dpe: parse_dpe(commands::SET_FRONT_END_REMOTE, f[1], f[2], f[3])?,
                front_end: parse_dpe(commands::SET_FRONT_END_REMOTE, f[4], f[5], f[6])?,
            })
        }
        commands::DEPLOY_CONTAINER => {
            let f = split_fields(commands::DEPLOY_CONTAINER, payload, 4, true)?;
            Ok(ControlCommand::DeployContainer {
                container: f[1].parse()?,
                pool_size: parse_field(commands::DEPLOY_CONTAINER, "pool size", f[2])?,
                description: f[3].to_string(),
            })
        }
        commands::REMOVE_CONTAINER => {
            let f = split_fields(commands::REMOVE_CONTAINER, payload, 2, false)?;
            Ok(ControlCommand::RemoveContainer {
                container: f[1].parse()?,
            })
        }
        commands::DEPLOY_SERVICE => {
            let f = split_fields(commands::DEPLOY_SERVICE, payload, 5, true)?;
            if f[2].is_empty() {
                return Err(CodecError::InvalidField {
                    command: commands::DEPLOY_SERVICE,
                    field: "class path",
                    value: String::new(),
                });
            }
            Ok(ControlCommand::DeployService {
                service: f[1].parse()?,
                class_path: f[2].to_string(),
                pool_size: parse_field(commands::DEPLOY_SERVICE, "pool size", f[3])?,
                description: f[4].to_string(),
            })
        }
        commands::REMOVE_SERVICE => {
            let f = split_fields(commands::REMOVE_SERVICE, payload, 2, false)?;
            Ok(ControlCommand::RemoveService {
                service: f[1].parse()?,
            })
        }
        commands::REPORT_DONE => {
            let f = split_fields(commands::REPORT_DONE, payload, 2, false)?;
            Ok(ControlCommand::Report {
                report: ReportType::Done,
                every_n: parse_field(commands::REPORT_DONE, "interval", f[1])?,
            })
        }
        commands::REPORT_DATA => {
            let f = split_fields(commands::REPORT_DATA, payload, 2, false)?;
            Ok(ControlCommand::Report {
                report: ReportType::Data,
                every_n: parse_field(commands::REPORT_DATA, "interval", f[1])?,
            })
        }
        other => Err(CodecError::UnknownCommand(other.to_string())),
    }
}
