use eql_analytic::library::{matches, service_control_start};
use eql_analytic::{ProcessEvent, Subtype};

fn main() {
    let Some(analytic) = service_control_start() else {
        eprintln!("The built-in analytic failed to compile");
        return;
    };
    println!("Loaded '{}' ({})", analytic.metadata.name, analytic.metadata.id);
    println!("{}", analytic.query);

    let events = [
        ProcessEvent::new(Subtype::Create, "sc.exe", "sc.exe start MyService"),
        ProcessEvent::new(Subtype::Create, "net.exe", "net stop Foo"),
        ProcessEvent::new(Subtype::Create, "wmic.exe", "wmic service call startservice"),
        ProcessEvent::new(Subtype::Terminate, "sc.exe", "sc.exe start MyService"),
    ];

    for (i, event) in events.iter().enumerate() {
        println!(
            "Event #{} ({:?} {:?}) matches: {}",
            i + 1,
            event.process_name,
            event.command_line,
            matches(event)
        );
    }

    #[cfg(feature = "serde_json")]
    {
        use eql_analytic::events_from_json;
        let event_json = r#"
        [
            {
                "event_type": "process",
                "subtype": "create",
                "process_name": "powershell.exe",
                "command_line": "Start-Service -Name W32Time"
            },
            {
                "event_type": "process",
                "subtype": "create",
                "process_name": "cmd.exe",
                "command_line": "start notepad.exe"
            }
        ]"#;
        match events_from_json(event_json) {
            Ok(events) => {
                for (i, event) in events.iter().enumerate() {
                    println!(
                        "JSON event #{} matches '{}': {}",
                        i + 1,
                        analytic.metadata.name,
                        analytic.is_match(event)
                    );
                }
            }
            Err(err) => eprintln!("Invalid events: {}", err),
        }

        use eql_analytic::event_from_json;
        let Some(sysmon) = eql_analytic::library::sysmon() else {
            eprintln!("The built-in Sysmon normalizer failed to compile");
            return;
        };
        let raw_json = r#"
        {
            "EventId": 1,
            "UtcTime": "2019-01-01 12:00:00.123",
            "Image": "C:\\Windows\\System32\\wbem\\WMIC.exe",
            "CommandLine": "wmic service where name='Spooler' call StartService"
        }"#;
        match event_from_json(raw_json).map(|raw| sysmon.normalize(&raw)) {
            Ok(Ok(event)) => println!(
                "Sysmon event ({:?}) matches '{}': {}",
                event.get("process_name"),
                analytic.metadata.name,
                analytic.is_match(&event)
            ),
            Ok(Err(err)) => eprintln!("Could not normalize event: {}", err),
            Err(err) => eprintln!("Invalid event: {}", err),
        }
    }
}
