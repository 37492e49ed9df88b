// Rhythm pass: exact durations, ties, meters and pickups

use humdrum_core::{rational, HumdrumError, HumdrumFile, Rational, RhythmError, RhythmOptions};

/// Helper to parse newline-joined lines
fn parse_lines(lines: &[&str]) -> HumdrumFile {
    HumdrumFile::parse(&lines.join("\n"))
}

#[test]
fn test_tie_chain_total_at_start() {
    let file = parse_lines(&["**kern", "4c[", "4c_", "4c]", "*-"]);
    assert_eq!(file.tied_duration(1, 0).unwrap(), rational(3));
    assert!(matches!(
        file.tied_duration(2, 0),
        Err(HumdrumError::MidTieChain { line: 2, column: 0 })
    ));
    assert!(matches!(
        file.tied_duration(3, 0),
        Err(HumdrumError::MidTieChain { line: 3, column: 0 })
    ));
}

#[test]
fn test_untied_note_is_its_own_duration() {
    let file = parse_lines(&["**kern", "8.c", "16d", "*-"]);
    assert_eq!(file.tied_duration(1, 0).unwrap(), Rational::new(3, 4));
    assert_eq!(file.tied_duration(2, 0).unwrap(), Rational::new(1, 4));
}

#[test]
fn test_chord_ties_follow_pitch() {
    let file = parse_lines(&["**kern", "4c[ 4e", "2c] 4e", "*-"]);
    assert_eq!(file.tied_duration_at(1, 0, 0).unwrap(), rational(3));
    assert_eq!(file.tied_duration_at(1, 0, 1).unwrap(), rational(1));
    assert_eq!(file.subtokens(2, 0), Some(vec!["2c]", "4e"]));
}

#[test]
fn test_triplets_sum_exactly() {
    let file = parse_lines(&["**kern", "12c", "12d", "12e", "=1", "4f", "*-"]);
    assert_eq!(file.token_duration(1, 0).unwrap(), Some(Rational::new(1, 3)));
    assert_eq!(file.abs_beat(4).unwrap(), rational(1));
    assert_eq!(file.total_duration().unwrap(), rational(2));
    assert_eq!(file.minimum_time_base().unwrap(), 3);
}

#[test]
fn test_pickup_in_four_four() {
    let file = parse_lines(&["**kern", "*M4/4", "4c", "=1", "1d", "=2", "*-"]);
    assert_eq!(file.pickup_duration().unwrap(), rational(3));
    assert_eq!(file.measure_number(2).unwrap(), Some(0));
    assert_eq!(file.measure_number(4).unwrap(), Some(1));
    // the pickup note sits on the last beat
    assert_eq!(file.beat(2).unwrap(), rational(4));
    assert_eq!(file.beat(4).unwrap(), rational(1));
}

#[test]
fn test_full_first_measure_has_no_pickup() {
    let file = parse_lines(&["**kern", "*M3/4", "2.c", "=1", "2.d", "*-"]);
    assert_eq!(file.pickup_duration().unwrap(), rational(0));

    let file = parse_lines(&["**kern", "*M3/4", "=1", "2.d", "*-"]);
    assert_eq!(file.pickup_duration().unwrap(), rational(0));
}

#[test]
fn test_compound_meter_beats() {
    let file = parse_lines(&["**kern", "*M6/8", "4.c", "4.d", "=1", "*-"]);
    assert_eq!(file.beat_duration(2).unwrap(), Rational::new(3, 2));
    assert_eq!(file.beat(2).unwrap(), rational(1));
    assert_eq!(file.beat(3).unwrap(), rational(2));
}

#[test]
fn test_explicit_beat_overrides_meter() {
    let file = parse_lines(&["**kern", "*M6/8", "*beat:8", "8c", "8d", "*-"]);
    assert_eq!(file.beat_duration(3).unwrap(), Rational::new(1, 2));
    assert_eq!(file.beat(4).unwrap(), rational(2));
}

#[test]
fn test_durations_through_split() {
    let file = parse_lines(&[
        "**kern",
        "*^",
        "2c\t4e",
        ".\t4f",
        "*v\t*v",
        "4g",
        "*-",
    ]);
    assert_eq!(file.duration(2).unwrap(), rational(1));
    assert_eq!(file.abs_beat(3).unwrap(), rational(1));
    assert_eq!(file.abs_beat(5).unwrap(), rational(2));
    assert_eq!(file.token_duration(3, 0).unwrap(), None);
    assert_eq!(file.total_duration().unwrap(), rational(3));
}

#[test]
fn test_grace_note_takes_no_time() {
    let file = parse_lines(&["**kern", "4c", "8qd", "4e", "*-"]);
    assert_eq!(file.duration(2).unwrap(), rational(0));
    assert_eq!(file.abs_beat(3).unwrap(), rational(1));
}

#[test]
fn test_running_status_repeats_duration() {
    let file = parse_lines(&["**kern", "8c", "d", "e", "*-"]);
    assert_eq!(file.token_duration(2, 0).unwrap(), Some(Rational::new(1, 2)));
    assert_eq!(file.total_duration().unwrap(), Rational::new(3, 2));
}

#[test]
fn test_non_rhythmic_spines_are_ignored() {
    let file = parse_lines(&["**kern\t**text", "2c\tla", "*-\t*-"]);
    assert_eq!(file.token_duration(1, 1).unwrap(), None);
    assert_eq!(file.duration(1).unwrap(), rational(2));
}

#[test]
fn test_barline_off_the_tick_grid_fails_rhythm_only() {
    let options = RhythmOptions {
        time_base: Some(2),
        ..RhythmOptions::default()
    };
    let text = ["**kern", "12c", "=1", "12d", "*-"].join("\n");
    let file = HumdrumFile::parse_with(&text, options);

    match file.rhythm() {
        Err(RhythmError::NonIntegralBarline { line, position, time_base }) => {
            assert_eq!(*line, 2);
            assert_eq!(*position, Rational::new(1, 3));
            assert_eq!(*time_base, 2);
        }
        other => panic!("unexpected rhythm result: {:?}", other),
    }
    assert!(matches!(file.abs_beat(1), Err(HumdrumError::Rhythm(_))));
    // structure queries still work
    assert_eq!(file.token(3, 0), Some("12d"));

    // the computed grid accepts it
    let file = HumdrumFile::parse(&text);
    assert!(file.rhythm().is_ok());
}

#[test]
fn test_tie_chain_bound() {
    let options = RhythmOptions {
        max_tie_links: 2,
        ..RhythmOptions::default()
    };
    let text = ["**kern", "4c[", "4c_", "4c]", "*-"].join("\n");
    let file = HumdrumFile::parse_with(&text, options);
    assert_eq!(
        file.rhythm().unwrap_err(),
        &RhythmError::TieChainOverflow {
            line: 1,
            column: 0,
            limit: 2
        }
    );
}

#[test]
fn test_float_approximation_on_request() {
    let file = parse_lines(&["**kern", "12c", "12d", "*-"]);
    let beat = file.abs_beat(2).unwrap();
    assert!((humdrum_core::to_f64(beat) - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_tied_duration_rejects_nulls_and_text() {
    let file = parse_lines(&["**kern\t**kern\t**text", "2c\t4e\tla", ".\t4f\t.", "*-\t*-\t*-"]);
    assert!(matches!(
        file.tied_duration(2, 0),
        Err(HumdrumError::NotData { line: 2, column: 0 })
    ));
    assert!(matches!(
        file.tied_duration(1, 2),
        Err(HumdrumError::NotData { line: 1, column: 2 })
    ));
    assert_eq!(file.tied_duration(2, 1).unwrap(), rational(1));
}

#[test]
fn test_time_base_overflow_is_an_error() {
    let file = parse_lines(&[
        "**kern\t**kern\t**kern\t**kern",
        "1000003c\t1000033d\t1000037e\t1000039f",
        "*-\t*-\t*-\t*-",
    ]);
    assert!(matches!(
        file.rhythm(),
        Err(RhythmError::TimeBaseOverflow { line: 1, column: 3, .. })
    ));
    assert!(matches!(file.total_duration(), Err(HumdrumError::Rhythm(_))));
}
