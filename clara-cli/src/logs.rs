//! Log file locations under `$CLARA_HOME/log`

use std::path::{Path, PathBuf};

use clara_models::{ClaraLang, DpeName};

/// Log type of the orchestrator itself
pub const ORCHESTRATOR_LOG_TYPE: &str = "orch";

/// `fe-dpe` for Java DPEs (the front end runs on Java), `<lang>-dpe` otherwise
pub fn dpe_log_type(lang: ClaraLang) -> String {
    match lang {
        ClaraLang::Java => "fe-dpe".to_string(),
        other => format!("{}-dpe", other),
    }
}

pub fn log_file(clara_home: &Path, host: &str, user: &str, log_type: &str) -> PathBuf {
    clara_home
        .join("log")
        .join(format!("{}-{}-clara-{}.log", host, user, log_type))
}

pub fn dpe_log_file(clara_home: &Path, dpe: &DpeName, user: &str) -> PathBuf {
    log_file(clara_home, dpe.host(), user, &dpe_log_type(dpe.lang()))
}
