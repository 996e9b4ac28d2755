//! Name constants for topic domains and control commands
//!
//! Command tokens are case-sensitive and travel as the first `?`-separated
//! field of a control payload.

/// Topic domains
pub mod topics {
    /// Control messages handled by a DPE
    ///
    /// **Subject:** DPE canonical name
    pub const DPE: &str = "dpe";

    /// Control messages handled by a container
    ///
    /// **Subject:** DPE canonical name
    /// **Type:** container id
    pub const CONTAINER: &str = "container";

    /// Configure/execute requests and report settings for a service
    ///
    /// **Subject:** DPE canonical name
    /// **Type:** `<container-id>:<engine-id>`
    pub const SERVICE: &str = "service";

    /// "done" reports (execution stats, no output data)
    pub const DONE: &str = "done";

    /// "data" reports (full output data)
    pub const DATA: &str = "data";

    /// Informational status reports
    pub const INFO: &str = "info";

    /// Status reports for executions that ended with a warning
    pub const WARNING: &str = "warning";

    /// Status reports for executions that ended with an error
    pub const ERROR: &str = "error";

    /// Periodic liveness broadcast of every running DPE
    ///
    /// **Scope:** host of the proxy being listened to, no subject
    pub const DPE_ALIVE: &str = "dpe-alive";
}

/// Control command tokens
pub mod commands {
    /// Start a new DPE
    ///
    /// **Sent to:** front-end DPE
    /// **Fields:** host, port, lang, pool size, registrar host, registrar port, description
    pub const START_DPE: &str = "startDpe";

    /// Stop the receiving DPE
    ///
    /// **Sent to:** the DPE itself
    /// **Fields:** none
    pub const STOP_DPE: &str = "stopDpe";

    /// Liveness round trip
    ///
    /// **Sent to:** the DPE itself (synchronous)
    /// **Fields:** none
    pub const PING_DPE: &str = "dpePing";

    /// Point a DPE at a new front end
    ///
    /// **Sent to:** front-end DPE
    /// **Fields:** host, port, lang of the DPE; host, port, lang of the front end
    pub const SET_FRONT_END_REMOTE: &str = "setFrontEndRemote";

    /// Create a container
    ///
    /// **Sent to:** owning DPE
    /// **Fields:** container canonical name, pool size, description
    pub const DEPLOY_CONTAINER: &str = "startContainer";

    /// Tear down a container and its services
    ///
    /// **Sent to:** owning DPE
    /// **Fields:** container canonical name
    pub const REMOVE_CONTAINER: &str = "removeContainer";

    /// Create a service from an engine class
    ///
    /// **Sent to:** owning DPE
    /// **Fields:** service canonical name, class path, pool size, description
    pub const DEPLOY_SERVICE: &str = "deployService";

    /// Tear down a service
    ///
    /// **Sent to:** owning DPE
    /// **Fields:** service canonical name
    pub const REMOVE_SERVICE: &str = "removeService";

    /// Report "done" every N executions (0 stops reporting)
    ///
    /// **Sent to:** the service
    /// **Fields:** interval
    pub const REPORT_DONE: &str = "serviceReportDone";

    /// Report output data every N executions (0 stops reporting)
    ///
    /// **Sent to:** the service
    /// **Fields:** interval
    pub const REPORT_DATA: &str = "serviceReportData";
}

/// Payload field separator
pub const DATA_SEP: char = '?';

/// Separator between host and topic in a subscription key
pub const MAPKEY_SEP: char = '#';
