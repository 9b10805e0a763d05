#[cfg(feature = "serde_json")]
#[test]
fn test_match_normalized_sysmon_events() {
    use eql_analytic::{check_analytic, events_from_json, library};
    let events_json = r#"
        [
            {
                "EventId": 1,
                "UtcTime": "2019-01-01 12:00:00.123",
                "Image": "C:\\Windows\\System32\\sc.exe",
                "CommandLine": "sc.exe start MyService",
                "ProcessId": 4312,
                "ParentImage": "C:\\Windows\\System32\\cmd.exe"
            },
            {
                "EventId": 5,
                "UtcTime": "2019-01-01 12:00:01.000",
                "Image": "C:\\Windows\\System32\\sc.exe",
                "CommandLine": "sc.exe start MyService"
            },
            {
                "EventId": 1,
                "UtcTime": "2019-01-01 12:00:02.000",
                "Image": "C:\\Windows\\System32\\net.exe",
                "CommandLine": "net start spooler"
            },
            {
                "EventId": 3,
                "UtcTime": "2019-01-01 12:00:03.000",
                "Image": "C:\\Windows\\System32\\sc.exe",
                "CommandLine": "sc.exe start MyService",
                "DestinationIp": "10.0.0.1"
            },
            {
                "EventId": 1,
                "UtcTime": "2019-01-01 12:00:04.000",
                "Image": "C:\\Windows\\System32\\sc.exe",
                "CommandLine": "sc.exe query MyService"
            }
        ]"#;

    let normalizer = library::sysmon().unwrap();
    let analytic = library::service_control_start().unwrap();
    let results: Vec<bool> = events_from_json(events_json)
        .unwrap()
        .iter()
        .map(|raw| check_analytic(analytic, &normalizer.normalize(raw).unwrap()))
        .collect();

    assert_eq!(results, vec![true, false, true, false, false]);
}

#[cfg(feature = "serde_json")]
#[test]
fn test_normalized_sysmon_fields() {
    use eql_analytic::{event_from_json, library, EventValue, TIMESTAMP_KEY};
    let raw = event_from_json(
        r#"{
            "EventId": 3,
            "UtcTime": "1970-01-01 00:00:00.000",
            "Image": "C:\\Program Files\\App\\app.exe",
            "DestinationIp": "10.0.0.1",
            "DestinationPort": 443,
            "Protocol": "tcp"
        }"#,
    )
    .unwrap();

    let event = library::sysmon().unwrap().normalize(&raw).unwrap();
    assert_eq!(event.event_type(), Some("network"));
    assert_eq!(event.get("process_name"), Some(&EventValue::from("app.exe")));
    assert_eq!(event.get("destination_address"), Some(&EventValue::from("10.0.0.1")));
    assert_eq!(event.get("destination_port"), Some(&EventValue::from(443)));
    assert_eq!(event.get("protocol"), Some(&EventValue::from("tcp")));
    assert_eq!(
        event.get(TIMESTAMP_KEY),
        Some(&EventValue::from(116444736000000000i64))
    );
    assert!(event.get("DestinationIp").is_none());
}

#[test]
fn test_attack_coverage_of_built_in_analytics() {
    use eql_analytic::{library, AttackCoverage};

    let coverage = AttackCoverage::build(library::analytics());
    let analytic = library::service_control_start().unwrap();

    for technique in ["T1035", "T1569.002"] {
        let analytics = coverage.technique(technique);
        assert_eq!(analytics.len(), 1, "{}", technique);
        assert_eq!(analytics[0].metadata.id, analytic.metadata.id);
    }
    assert_eq!(coverage.tactic("Persistence").len(), 1);
    assert_eq!(coverage.summary().len(), 2);
}
