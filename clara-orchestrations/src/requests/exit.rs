//! Exit requests
//!
//! A DPE is asked to stop itself; containers and services are removed by their
//! owning DPE.

use std::sync::Arc;

use clara_models::{CanonicalName, ComponentDescriptor};

use super::{control_message, RequestBase, RequestState};
use crate::codec::ControlCommand;
use crate::error::Result;
use crate::topics::dpe_topic;
use crate::transport::Transport;

pub struct ExitRequest {
    base: RequestBase,
    name: CanonicalName,
}

impl ExitRequest {
    pub(crate) fn new(transport: Arc<dyn Transport>, sender: &str, name: CanonicalName) -> Self {
        Self {
            base: RequestBase::new(transport, sender),
            name,
        }
    }

    pub fn state(&self) -> RequestState {
        self.base.state()
    }

    pub fn name(&self) -> &CanonicalName {
        &self.name
    }

    /// Always the owning DPE, whatever the level of the name
    pub fn target(&self) -> ComponentDescriptor {
        ComponentDescriptor::dpe(self.name.dpe())
    }

    pub fn command(&self) -> ControlCommand {
        match &self.name {
            CanonicalName::Dpe(_) => ControlCommand::StopDpe,
            CanonicalName::Container(container) => ControlCommand::RemoveContainer {
                container: container.clone(),
            },
            CanonicalName::Service(service) => ControlCommand::RemoveService {
                service: service.clone(),
            },
        }
    }

    pub async fn send(&mut self) -> Result<()> {
        let message = control_message(dpe_topic(self.name.dpe()), &self.command())?;
        self.base.dispatch("send")?;
        self.base.publish(&self.target(), message).await
    }
}
