//! Analytics and data source normalizers shipped with the crate.
//!
//! Each analytic is stored as a rule file under `rules/`, each normalizer under
//! `normalizers/`. Both are embedded at build time and compiled on first use.

use crate::analytic::Analytic;
use crate::event::{Event, ProcessEvent};
use crate::normalization::Normalizer;
use log::{debug, error};
use std::sync::OnceLock;

const SERVICE_CONTROL_START_YAML: &str = include_str!("../rules/service_control_start.yml");
const SYSMON_YAML: &str = include_str!("../normalizers/sysmon.yml");

static SERVICE_CONTROL_START: OnceLock<Option<Analytic>> = OnceLock::new();
static SYSMON: OnceLock<Option<Normalizer>> = OnceLock::new();

fn compile(name: &str, yaml: &str) -> Option<Analytic> {
    match crate::analytic_from_yaml(yaml) {
        Ok(analytic) => {
            debug!(
                "Loaded built-in analytic '{}' ({})",
                analytic.metadata.name, analytic.metadata.id
            );
            Some(analytic)
        }
        Err(err) => {
            error!("Built-in analytic '{}' failed to compile: {}", name, err);
            None
        }
    }
}

/// Service started through `sc.exe`, `net.exe`, `Start-Service` or WMIC
pub fn service_control_start() -> Option<&'static Analytic> {
    SERVICE_CONTROL_START
        .get_or_init(|| compile("service_control_start", SERVICE_CONTROL_START_YAML))
        .as_ref()
}

/// Every built-in analytic that compiled
pub fn analytics() -> impl Iterator<Item = &'static Analytic> {
    service_control_start().into_iter()
}

/// Normalizer for Microsoft Sysmon events as exported to JSON
pub fn sysmon() -> Option<&'static Normalizer> {
    SYSMON
        .get_or_init(|| match crate::normalizer_from_yaml(SYSMON_YAML) {
            Ok(normalizer) => Some(normalizer),
            Err(err) => {
                error!("Built-in normalizer 'sysmon' failed to compile: {}", err);
                None
            }
        })
        .as_ref()
}

/// Check a process event against [`service_control_start`].
///
/// Missing or malformed fields never match.
///
/// # Example
/// ```rust
/// use eql_analytic::library::matches;
/// use eql_analytic::{ProcessEvent, Subtype};
/// let event = ProcessEvent::new(Subtype::Create, "sc.exe", "sc.exe start MyService");
/// assert!(matches(&event));
/// ```
pub fn matches(event: &ProcessEvent) -> bool {
    service_control_start().is_some_and(|analytic| analytic.is_match(&Event::from(event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Subtype;

    #[test]
    fn test_embedded_analytic_compiles() {
        let analytic = service_control_start().unwrap();
        assert_eq!(
            analytic.metadata.id.to_string(),
            "7f8e6b32-4c1d-4a5e-9b0f-2d3c6a1e8f47"
        );
        assert!(analytic.applies_to("windows"));
        assert_eq!(analytic.query.event_type(), Some("process"));
        assert_eq!(
            analytic.query.fields(),
            vec!["subtype", "process_name", "command_line"]
        );
    }

    #[test]
    fn test_embedded_normalizer_compiles() {
        let normalizer = sysmon().unwrap();
        assert_eq!(normalizer.name, "Microsoft Sysmon");
        assert!(normalizer.strict);
        assert_eq!(
            normalizer.event_types().collect::<Vec<&str>>(),
            vec!["process", "network", "image_load", "file", "registry"]
        );
    }

    #[test]
    fn test_analytics() {
        assert_eq!(analytics().count(), 1);
    }

    #[test]
    fn test_compile_failure_is_none() {
        assert!(compile("broken", "metadata: {}").is_none());
    }

    #[test]
    fn test_matches() {
        assert!(matches(&ProcessEvent::new(
            Subtype::Create,
            "net.exe",
            "net start \"Print Spooler\""
        )));
        assert!(!matches(&ProcessEvent::new(
            Subtype::Terminate,
            "net.exe",
            "net start \"Print Spooler\""
        )));
    }
}
