use std::sync::Arc;

use anyhow::{Context, Result};
use clara_models::DpeName;
use clara_orchestrations::transport::local::Published;
use clara_orchestrations::transport::LocalTransport;
use clara_orchestrations::{EngineData, Orchestrator};
use serde_json::json;

use crate::cli::{Output, PlanCommand, ReportArg};
use crate::config::Config;

/// Runs `request` against the in-process transport and prints what it published
pub async fn run(config: &Config, request: PlanCommand, output: Output) -> Result<()> {
    let transport = Arc::new(LocalTransport::new(config.pool_size));
    let orchestrator = Orchestrator::new(transport.clone(), config.orchestrator_config())
        .context("Invalid orchestrator configuration")?;

    tracing::debug!(request = ?request, "Planning request");
    build(&orchestrator, request).await?;

    print_published(&transport.published(), output)
}

async fn build(orchestrator: &Orchestrator, request: PlanCommand) -> Result<()> {
    match request {
        PlanCommand::DeployDpe { dpe, registrar, pool_size, description } => {
            let registrar = match registrar {
                Some(registrar) => registrar
                    .parse::<DpeName>()
                    .with_context(|| format!("'{}' is not a DPE name", registrar))?
                    .address(),
                None => orchestrator.front_end().address(),
            };
            orchestrator.deploy_dpe(&dpe, registrar, pool_size, &description).await?;
        }
        PlanCommand::SetFrontEnd { dpe, front_end } => {
            orchestrator.set_front_end(&dpe, &front_end).await?;
        }
        PlanCommand::DeployContainer { container, pool_size, description } => {
            orchestrator
                .deploy_container(&container)?
                .with_pool_size(pool_size)?
                .with_description(description)?
                .send()
                .await?;
        }
        PlanCommand::DeployService { service, class_path, pool_size, description } => {
            orchestrator
                .deploy_service(&service, &class_path)?
                .with_pool_size(pool_size)?
                .with_description(description)?
                .send()
                .await?;
        }
        PlanCommand::Exit { name } => {
            orchestrator.exit(&name)?.send().await?;
        }
        PlanCommand::Report { service, kind, every_n } => match kind {
            ReportArg::Done => orchestrator.start_reporting_done(&service, every_n).await?,
            ReportArg::Data => orchestrator.start_reporting_data(&service, every_n).await?,
        },
        PlanCommand::StopReport { service, kind } => match kind {
            ReportArg::Done => orchestrator.stop_reporting_done(&service).await?,
            ReportArg::Data => orchestrator.stop_reporting_data(&service).await?,
        },
        PlanCommand::Configure { service, values } => {
            let mut request = orchestrator.configure(&service)?;
            for value in values {
                let value: serde_json::Value = serde_json::from_str(&value)
                    .with_context(|| format!("'{}' is not valid JSON", value))?;
                request.with_data(EngineData::json(value))?;
            }
            request.send().await?;
        }
        PlanCommand::Execute { target, inputs } => {
            let mut request = if target.contains(['+', ';']) {
                orchestrator.execute_composition(&target)?
            } else {
                orchestrator.execute(&target)?
            };
            for input in inputs {
                request.with_data(EngineData::string(input))?;
            }
            request.send().await?;
        }
    }
    Ok(())
}

fn payload(published: &Published) -> String {
    match std::str::from_utf8(&published.message.data) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<{} bytes>", published.message.data.len()),
    }
}

fn print_published(published: &[Published], output: Output) -> Result<()> {
    if output == Output::Json {
        let messages: Vec<serde_json::Value> = published
            .iter()
            .map(|p| {
                json!({
                    "target": p.target,
                    "topic": p.message.topic.to_string(),
                    "meta": p.message.meta,
                    "payload": payload(p),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    println!("{:<36} {:<48} {}", "TARGET", "TOPIC", "PAYLOAD");
    println!("{}", "-".repeat(110));
    for p in published {
        println!(
            "{:<36} {:<48} {}",
            p.target.canonical_name(),
            p.message.topic.to_string(),
            payload(p)
        );
    }
    println!();
    println!("{} message(s) would be published", published.len());

    Ok(())
}
