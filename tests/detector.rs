use one_twos::detector::{DetectorParams, PairMeasures, detect, player_one_twos};
use one_twos::errors::AnalysisError;
use one_twos::pass_event::{PassEvent, PitchPoint};
use one_twos::roles::{OneTwoRole, split_roles};
use one_twos::synthetic::{SyntheticConfig, synthetic_season};
use one_twos::TableScope;

const MATCH_ID: u64 = 3835319;

fn pass(secs: f64, from: &str, to: &str, start: (f64, f64), end: (f64, f64)) -> PassEvent {
    PassEvent::new(
        MATCH_ID,
        0,
        0,
        "Arsenal WFC",
        from,
        to,
        PitchPoint::new(start.0, start.1),
        PitchPoint::new(end.0, end.1),
    )
    .with_timestamp(secs)
}

fn small_season() -> one_twos::SeasonPasses {
    synthetic_season(SyntheticConfig {
        matches: 4,
        passes_per_match: 600,
        one_two_rate: 0.1,
        seed: 11,
    })
}

#[test]
fn give_and_go_through_midfield_is_detected() {
    let events = vec![
        pass(10.0, "Little", "Miedema", (60.0, 40.0), (70.0, 40.0)),
        pass(12.0, "Miedema", "Little", (70.0, 40.0), (90.0, 40.0)),
    ];
    let table = detect(MATCH_ID, &events, &DetectorParams::default()).expect("detect");
    assert_eq!(table.match_id, MATCH_ID);
    assert_eq!(table.len(), 2);

    let (opening, closing) = table.pairs().next().expect("one pair");
    assert_eq!(opening.player(), "Little");
    assert_eq!(closing.player(), "Miedema");
    assert_eq!((opening.x_start, opening.y_start), (60.0, 40.0));
    assert_eq!((closing.x_end, closing.y_end), (90.0, 40.0));

    let m = PairMeasures::between(opening, closing);
    assert_eq!(m.line_before, 60.0);
    assert_eq!(m.line_after, 30.0);
    assert_eq!(m.carry_distance, 0.0);
}

#[test]
fn time_window_is_inclusive() {
    let params = DetectorParams::default();
    let on_edge = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(15.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
    ];
    assert_eq!(detect(MATCH_ID, &on_edge, &params).unwrap().pair_count(), 1);

    let too_late = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(15.01, "B", "A", (70.0, 40.0), (90.0, 40.0)),
    ];
    assert!(detect(MATCH_ID, &too_late, &params).unwrap().is_empty());
}

#[test]
fn every_threshold_must_hold() {
    let params = DetectorParams::default();
    let opening = pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0));

    // 45 is not below 0.75 * 60.
    let short_return = vec![
        opening.clone(),
        pass(12.0, "B", "A", (70.0, 40.0), (75.0, 40.0)),
    ];
    assert!(detect(MATCH_ID, &short_return, &params).unwrap().is_empty());

    let long_carry = vec![
        opening.clone(),
        pass(12.0, "B", "A", (76.0, 40.0), (95.0, 40.0)),
    ];
    assert!(detect(MATCH_ID, &long_carry, &params).unwrap().is_empty());

    let third_player = vec![
        opening.clone(),
        pass(12.0, "B", "C", (70.0, 40.0), (95.0, 40.0)),
    ];
    assert!(detect(MATCH_ID, &third_player, &params).unwrap().is_empty());

    // Names are compared exactly.
    let other_case = vec![opening, pass(12.0, "b", "A", (70.0, 40.0), (95.0, 40.0))];
    assert!(detect(MATCH_ID, &other_case, &params).unwrap().is_empty());
}

#[test]
fn opening_pass_pairs_with_every_qualifying_return() {
    let events = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(12.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
        pass(14.0, "B", "A", (71.0, 40.0), (95.0, 40.0)),
    ];
    let table = detect(MATCH_ID, &events, &DetectorParams::default()).unwrap();
    assert_eq!(table.pair_count(), 2);
    let rows = table.rows();
    assert_eq!(rows[0], rows[2]);
    assert_eq!(rows[1].event.timestamp_seconds, 12.0);
    assert_eq!(rows[3].event.timestamp_seconds, 14.0);
}

#[test]
fn no_pairs_is_an_empty_table_not_an_error() {
    let events = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(40.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
    ];
    let table = detect(MATCH_ID, &events, &DetectorParams::default()).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.pairs().count(), 0);

    assert!(detect(MATCH_ID, &[], &DetectorParams::default()).unwrap().is_empty());
}

#[test]
fn missing_location_is_reported_with_its_row() {
    let mut events = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(12.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
    ];
    events[1].start_location = None;
    let err = detect(MATCH_ID, &events, &DetectorParams::default()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MalformedEvent {
            match_id: MATCH_ID,
            index: 1,
            field: "start location",
        }
    );
}

#[test]
fn unsorted_input_is_rejected() {
    let events = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(12.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
        pass(5.0, "C", "D", (50.0, 40.0), (55.0, 40.0)),
    ];
    let err = detect(MATCH_ID, &events, &DetectorParams::default()).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::OrderingViolation { match_id: MATCH_ID, index: 2, .. }
    ));
}

#[test]
fn bad_params_fail_before_scanning() {
    let params = DetectorParams {
        time_window: -1.0,
        ..Default::default()
    };
    let err = detect(MATCH_ID, &[], &params).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter { name: "time window", .. }));

    let params = DetectorParams {
        carry_distance: 0.0,
        ..Default::default()
    };
    assert!(detect(MATCH_ID, &[], &params).is_err());
}

#[test]
fn synthetic_pairs_are_reciprocal_and_within_thresholds() {
    let params = DetectorParams::default();
    let mut pairs = 0;
    for (match_id, passes) in &small_season() {
        let table = detect(*match_id, passes, &params).expect("synthetic match detects");
        assert_eq!(table.len() % 2, 0);
        for (opening, closing) in table.pairs() {
            assert_eq!(closing.player(), opening.recipient());
            assert_eq!(closing.recipient(), opening.player());
            let gap = closing.event.timestamp_seconds - opening.event.timestamp_seconds;
            assert!((0.0..=params.time_window).contains(&gap));
            assert!(PairMeasures::between(opening, closing).accepts(&params));
            pairs += 1;
        }
    }
    assert!(pairs > 0, "synthetic season should contain one-twos");
}

#[test]
fn detection_is_deterministic() {
    let season = small_season();
    let (match_id, passes) = season.iter().next().unwrap();
    let params = DetectorParams::default();
    let first = serde_json::to_string(&detect(*match_id, passes, &params).unwrap()).unwrap();
    let second = serde_json::to_string(&detect(*match_id, passes, &params).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn roles_follow_row_parity() {
    let events = vec![
        pass(10.0, "A", "B", (60.0, 40.0), (70.0, 40.0)),
        pass(12.0, "B", "A", (70.0, 40.0), (90.0, 40.0)),
        pass(30.0, "C", "A", (40.0, 20.0), (50.0, 25.0)),
        pass(32.0, "A", "C", (50.0, 25.0), (80.0, 30.0)),
    ];
    let table = detect(MATCH_ID, &events, &DetectorParams::default()).unwrap();
    let split = split_roles(table.rows(), TableScope::Match(MATCH_ID)).unwrap();
    let openers: Vec<&str> = split.opening.iter().map(|r| r.player()).collect();
    let closers: Vec<&str> = split.closing.iter().map(|r| r.player()).collect();
    assert_eq!(openers, vec!["A", "C"]);
    assert_eq!(closers, vec!["B", "A"]);
    assert_eq!(OneTwoRole::at(3), OneTwoRole::Closing);

    let with_a = player_one_twos("A", table.rows());
    assert_eq!(with_a.len(), 4);
    let with_b = player_one_twos("B", table.rows());
    assert_eq!(with_b.len(), 2);
}
