// End-to-end decoding behaviour of RecordParser
use telemetry_decoder::{
    ConfigError, DecoderError, Definition, FieldValue, NamedDefinition, OutputRecord,
    ParseOutcome, ParsedRecord, ParserConfig, RecordParser, RecordSplitter, SkipReason,
};
use telemetry_decoder::template::TemplateOptions;

fn definitions() -> Vec<NamedDefinition> {
    vec![
        NamedDefinition::new(
            "analog1",
            "test",
            Definition::device("generic_gauge", [("value", "voltage")]),
        ),
        NamedDefinition::new(
            "generic_gauge",
            "test",
            Definition::device_type(["{value:f} V"]),
        ),
        NamedDefinition::new(
            "gyro1",
            "test",
            Definition::device(
                "gyro",
                [("heading", "Heading"), ("rate", "TurnRate"), ("status", "Status")],
            ),
        ),
        NamedDefinition::new(
            "gyro",
            "test",
            Definition::device_type([
                "$HEHDT,{heading:f},T*{checksum:x}",
                "$HEROT,{rate:f},{status:l}*{checksum:x}",
            ]),
        ),
        NamedDefinition::new(
            "ctd1",
            "test",
            Definition::device(
                "ctd",
                [
                    ("temp", "Temperature"),
                    ("count", "SampleCount"),
                    ("station", "Station"),
                    ("sampled", "SampleTime"),
                ],
            ),
        ),
        NamedDefinition::new(
            "ctd",
            "test",
            Definition::device_type([
                "{temp:f},{count:d},{station:w},{sampled:ti}",
                "{temp:f},{count:d}",
            ]),
        ),
    ]
}

fn parser() -> RecordParser {
    let _ = env_logger::builder().is_test(true).try_init();
    RecordParser::new(ParserConfig::new(), definitions()).unwrap()
}

fn record(outcome: ParseOutcome) -> OutputRecord {
    match outcome {
        ParseOutcome::Parsed(ParsedRecord::Record(record)) => record,
        other => panic!("expected parsed record, got {:?}", other),
    }
}

#[test]
fn device_with_unknown_device_type_fails_construction() {
    let definitions = vec![NamedDefinition::new(
        "analog1",
        "test",
        Definition::device("no_such_type", [("value", "voltage")]),
    )];

    let result = RecordParser::new(ParserConfig::new(), definitions);
    assert!(matches!(
        result,
        Err(DecoderError::Config(ConfigError::UnknownDeviceType { .. }))
    ));
}

#[test]
fn device_type_without_templates_fails_construction() {
    let definitions = vec![NamedDefinition::new(
        "empty",
        "test",
        Definition::device_type(Vec::<String>::new()),
    )];

    let result = RecordParser::new(ParserConfig::new(), definitions);
    assert!(matches!(
        result,
        Err(DecoderError::Config(ConfigError::NoTemplates(_)))
    ));
}

#[test]
fn first_template_round_trip() {
    // Values substituted into the first template decode back to the same values
    let temp = 12.5;
    let count = -42i64;
    let station = "AB_12";
    let sampled = "2024-03-05T06:07:08Z";
    let message = format!("{},{},{},{}", temp, count, station, sampled);
    let line = format!("ctd1 2024-03-05T06:07:09Z {}", message);

    let record = record(parser().parse_record(&line));
    assert_eq!(record.fields.len(), 4);
    assert_eq!(record.fields["Temperature"], FieldValue::Float(temp));
    assert_eq!(record.fields["SampleCount"], FieldValue::Integer(count));
    assert_eq!(record.fields["Station"], FieldValue::Text(station.to_string()));
    assert_eq!(record.fields["SampleTime"], FieldValue::Timestamp(1709618828.0));
    assert_eq!(record.timestamp, 1709618829.0);
}

#[test]
fn fallback_template_matches_like_it_would_alone() {
    let line = "gyro1 2024-01-01T00:00:00Z $HEROT,-0.25,A*2B";

    let with_fallback = record(parser().parse_record(line));

    let alone = RecordParser::new(
        ParserConfig::new(),
        vec![
            NamedDefinition::new(
                "gyro1",
                "test",
                Definition::device(
                    "gyro",
                    [("heading", "Heading"), ("rate", "TurnRate"), ("status", "Status")],
                ),
            ),
            NamedDefinition::new(
                "gyro",
                "test",
                Definition::device_type(["$HEROT,{rate:f},{status:l}*{checksum:x}"]),
            ),
        ],
    )
    .unwrap();
    let alone = record(alone.parse_record(line));

    assert_eq!(with_fallback, alone);
    assert_eq!(with_fallback.fields["TurnRate"], FieldValue::Float(-0.25));
    assert_eq!(with_fallback.fields["Status"], FieldValue::Text("A".to_string()));
}

#[test]
fn decoding_is_idempotent() {
    let parser = parser();
    let line = "gyro1 2024-01-01T00:00:00Z $HEHDT,235.18,T*1B";
    assert_eq!(parser.parse_record(line), parser.parse_record(line));
}

#[test]
fn unknown_identifier_is_skipped() {
    let outcome = parser().parse_record("sonar7 2024-01-01T00:00:00Z PING 12");
    assert_eq!(
        outcome,
        ParseOutcome::Skipped(SkipReason::UnknownDevice("sonar7".to_string()))
    );
}

#[test]
fn unmapped_captures_never_reach_output() {
    let record = record(parser().parse_record("gyro1 2024-01-01T00:00:00Z $HEHDT,235.18,T*1B"));
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields["Heading"], FieldValue::Float(235.18));
    assert!(!record.fields.contains_key("checksum"));
    assert!(!record.fields.contains_key("heading"));
}

#[test]
fn generic_gauge_scenario() {
    let parser = parser();

    let voltage = parser.parse("generic_gauge", "3.30 V").unwrap();
    assert_eq!(voltage["value"], FieldValue::Float(3.30));

    let record = record(parser.parse_record("analog1 2024-01-01T00:00:00Z 3.30 V"));
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields["voltage"], FieldValue::Float(3.30));

    match parser.parse_record("analog1 2024-01-01T00:00:00Z abc V") {
        ParseOutcome::Unmatched(ParsedRecord::Record(record)) => assert!(record.fields.is_empty()),
        other => panic!("expected unmatched record, got {:?}", other),
    }
}

#[test]
fn default_record_format_envelope() {
    let splitter = RecordSplitter::new(
        telemetry_decoder::DEFAULT_RECORD_FORMAT,
        &TemplateOptions::default(),
    )
    .unwrap();

    let envelope = splitter.split("analog1 2024-01-01T00:00:00Z 3.30 V").unwrap();
    assert_eq!(envelope.data_id, "analog1");
    assert_eq!(envelope.timestamp, Some(1704067200.0));
    assert_eq!(envelope.message, "3.30 V");
}

#[test]
fn malformed_lines_do_not_stop_the_stream() {
    let parser = parser();
    let lines = vec![
        "analog1 2024-01-01T00:00:00Z 3.30 V".to_string(),
        "\u{0}\u{1}binary noise".to_string(),
        "analog1 2024-01-01T00:00:01Z".to_string(),
        "sonar7 2024-01-01T00:00:02Z PING".to_string(),
        "analog1 2024-01-01T00:00:03Z abc V".to_string(),
        String::new(),
        "analog1 2024-01-01T00:00:04Z 3.40 V".to_string(),
    ];

    let outcomes: Vec<ParseOutcome> = parser.parse_records(&lines).collect();
    assert_eq!(outcomes.len(), lines.len());

    let kinds: Vec<&str> = outcomes
        .iter()
        .map(|outcome| match outcome {
            ParseOutcome::Parsed(_) => "parsed",
            ParseOutcome::Unmatched(_) => "unmatched",
            ParseOutcome::Skipped(reason) => reason.kind(),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "parsed",
            "malformed_line",
            "malformed_line",
            "unknown_device",
            "unmatched",
            "empty_line",
            "parsed"
        ]
    );
}

#[test]
fn parser_can_be_shared_between_threads() {
    let parser = std::sync::Arc::new(parser());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let parser = std::sync::Arc::clone(&parser);
            std::thread::spawn(move || {
                let line = format!("analog1 2024-01-01T00:00:0{}Z {}.5 V", i, i);
                record(parser.parse_record(&line))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let record = handle.join().unwrap();
        assert_eq!(record.fields["voltage"], FieldValue::Float(i as f64 + 0.5));
        assert_eq!(record.timestamp, 1704067200.0 + i as f64);
    }
}

fn reading_parser(record_format: &str) -> RecordParser {
    let _ = env_logger::builder().is_test(true).try_init();
    RecordParser::new(
        ParserConfig::new().with_record_format(record_format),
        vec![
            NamedDefinition::new("dev1", "test", Definition::device("reading", [("value", "v")])),
            NamedDefinition::new(
                "reading",
                "test",
                Definition::device_type(["{value:d} V", "{value} V"]),
            ),
        ],
    )
    .unwrap()
}

#[test]
fn non_ascii_digits_decode_with_later_template() {
    let parser = reading_parser(telemetry_decoder::DEFAULT_RECORD_FORMAT);

    let record = record(parser.parse_record("dev1 2024-01-01T00:00:00Z ١٢ V"));
    assert_eq!(record.fields["v"], FieldValue::Text("١٢".to_string()));

    let record = self::record(parser.parse_record("dev1 2024-01-01T00:00:00Z 12 V"));
    assert_eq!(record.fields["v"], FieldValue::Integer(12));
}

#[test]
fn unparsable_record_timestamp_is_not_replaced_by_now() {
    let parser = reading_parser("{data_id:w}|{timestamp}|{message}");

    assert_eq!(
        parser.parse_record("dev1|not-a-time|12 V"),
        ParseOutcome::Skipped(SkipReason::MalformedLine)
    );

    let record = record(parser.parse_record("dev1|2024-01-01 00:00:00|12 V"));
    assert_eq!(record.timestamp, 1704067200.0);
}

#[test]
fn hour_only_offset_in_record_timestamp() {
    let parser = reading_parser(telemetry_decoder::DEFAULT_RECORD_FORMAT);
    let record = record(parser.parse_record("dev1 2024-01-01T01:00:00+01 12 V"));
    assert_eq!(record.timestamp, 1704067200.0);
    assert_eq!(record.fields["v"], FieldValue::Integer(12));
}
