use anyhow::{Context, Result};
use clara_models::{CanonicalName, DpeName, EngineStatus, ReportKind};
use clara_orchestrations::codec::decode;
use clara_orchestrations::topics::{control_topic, report_topic};
use serde_json::json;

use crate::cli::Output;
use crate::config::Config;
use crate::logs::dpe_log_file;

pub fn run_name(name: String, output: Output) -> Result<()> {
    let parsed: CanonicalName = name
        .parse()
        .with_context(|| format!("'{}' is not a canonical name", name))?;
    let dpe = parsed.dpe();

    let (level, container, engine) = match &parsed {
        CanonicalName::Dpe(_) => ("dpe", None, None),
        CanonicalName::Container(c) => ("container", Some(c.name().to_string()), None),
        CanonicalName::Service(s) => (
            "service",
            Some(s.container().name().to_string()),
            Some(s.name().to_string()),
        ),
    };

    let mut topics = vec![("control".to_string(), control_topic(&parsed).to_string())];
    if let CanonicalName::Service(service) = &parsed {
        for kind in [
            ReportKind::Done,
            ReportKind::Data,
            ReportKind::Status(EngineStatus::Warning),
            ReportKind::Status(EngineStatus::Error),
        ] {
            topics.push((kind.to_string(), report_topic(kind, service).to_string()));
        }
    }

    if output == Output::Json {
        let topics: serde_json::Map<String, serde_json::Value> =
            topics.into_iter().map(|(k, v)| (k, json!(v))).collect();
        let value = json!({
            "canonical_name": parsed.canonical_name(),
            "level": level,
            "dpe": dpe.canonical_name(),
            "host": dpe.host(),
            "port": dpe.port(),
            "lang": dpe.lang().as_str(),
            "container": container,
            "engine": engine,
            "topics": topics,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Name: {}", parsed.canonical_name());
    println!("{}", "=".repeat(60));
    println!();
    println!("  Level:      {}", level);
    println!("  DPE:        {}", dpe.canonical_name());
    println!("  Host:       {}", dpe.host());
    println!("  Port:       {}", dpe.port());
    println!("  Language:   {}", dpe.lang());
    if let Some(container) = &container {
        println!("  Container:  {}", container);
    }
    if let Some(engine) = &engine {
        println!("  Engine:     {}", engine);
    }
    println!();
    println!("Topics:");
    for (label, topic) in &topics {
        println!("  {:<16} {}", label, topic);
    }

    Ok(())
}

pub fn run_decode(payload: String, output: Output) -> Result<()> {
    let command = decode(&payload).with_context(|| format!("Failed to decode '{}'", payload))?;
    let value = serde_json::to_value(&command)?;

    if output == Output::Json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Command: {}", command.token());
    println!("{}", "-".repeat(60));
    if let Some(fields) = value.as_object() {
        for (field, value) in fields.iter().filter(|(field, _)| field.as_str() != "command") {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {:<16} {}", field, value);
        }
    }

    Ok(())
}

pub fn run_log_file(config: &Config, dpe: Option<String>) -> Result<()> {
    let path = match dpe {
        Some(dpe) => {
            let dpe: DpeName = dpe
                .parse()
                .with_context(|| format!("'{}' is not a DPE name", dpe))?;
            dpe_log_file(&config.clara_home, &dpe, &config.user)
        }
        None => config.orchestrator_log_file(),
    };
    println!("{}", path.display());
    Ok(())
}
