use unit_config_cleaner::gate::{DuplicateDecision, FixedGate, ValidityDecision};
use unit_config_cleaner::pipeline::Progress;
use unit_config_cleaner::summary::{DecisionStage, FileStatus, FileSummary};
use unit_config_cleaner::{Cleaner, Session, ToolError};

fn output_text(session: &Session, key: &unit_config_cleaner::session::FileKey) -> String {
    let bytes = session.output(key).expect("output produced");
    String::from_utf8(bytes.to_vec()).expect("utf-8 output")
}

fn exported(summary: &FileSummary) -> (usize, usize, usize) {
    match &summary.status {
        FileStatus::Exported {
            rows_deleted,
            duplicates_removed,
            row_count,
            ..
        } => (*rows_deleted, *duplicates_removed, *row_count),
        other => panic!("expected export, got {other:?}"),
    }
}

#[test]
fn clean_file_is_exported_without_pausing() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register(
        "units.csv",
        b"Tower,Unit,Corporate,Notes\nA,101,Acme,N/A\nN/A,5,na,ok\n".to_vec(),
    );

    let progress = cleaner.advance(&mut session, &key).expect("known file");
    let Progress::Finished(summary) = progress else {
        panic!("expected the file to finish, got {progress:?}");
    };
    assert_eq!(exported(&summary), (0, 0, 2));
    assert_eq!(
        summary.status,
        FileStatus::Exported {
            output_name: "units_cleaned.csv".to_string(),
            rows_loaded: 2,
            rows_deleted: 0,
            duplicates_removed: 0,
            row_count: 2,
        }
    );
    assert_eq!(
        output_text(&session, &key),
        "Tower,Unit,Corporate,Notes\nA,A - 101,Acme,\n,5,,ok\n"
    );
}

#[test]
fn problematic_rows_pause_until_a_decision_is_recorded() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,10/10/2020\nB,202\n".to_vec());

    let progress = cleaner.advance(&mut session, &key).expect("known file");
    let Progress::NeedsValidityDecision(review) = progress else {
        panic!("expected a validity review, got {progress:?}");
    };
    assert_eq!(review.file_name, "units.csv");
    assert_eq!(review.rows.len(), 1);
    assert_eq!(review.rows[0].index, 0);
    assert!(session.output(&key).is_none());

    // Asking again without a decision pauses at the same place.
    assert!(matches!(
        cleaner.advance(&mut session, &key).expect("known file"),
        Progress::NeedsValidityDecision(_)
    ));

    session
        .decide_validity(&key, ValidityDecision::Delete)
        .expect("decision recorded");
    let Progress::Finished(summary) = cleaner.advance(&mut session, &key).expect("known file")
    else {
        panic!("expected the file to finish");
    };
    assert_eq!(exported(&summary), (1, 0, 1));
    assert_eq!(output_text(&session, &key), "Tower,Unit\nB,B - 202\n");
}

#[test]
fn keeping_problem_rows_leaves_the_row_count_unchanged() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,10/10/2020\nB,202\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::KeepAll);

    let summary = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(exported(&summary), (0, 0, 2));
    assert_eq!(gate.validity_requests, 1);
    assert_eq!(gate.duplicate_requests, 0);
    assert_eq!(
        output_text(&session, &key),
        "Tower,Unit\nA,A - 10/10/2020\nB,B - 202\n"
    );
}

#[test]
fn cancelling_the_validity_review_produces_no_output() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,#1\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Cancel, DuplicateDecision::KeepAll);

    let summary = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(
        summary.status,
        FileStatus::Cancelled {
            stage: DecisionStage::Validity
        }
    );
    assert!(session.output(&key).is_none());
    assert_eq!(summary.to_string(), "Canceled processing for units.csv.");
}

#[test]
fn duplicates_collapse_to_the_first_row() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,101\nA,101\nB,202\n".to_vec());

    let progress = cleaner.advance(&mut session, &key).expect("known file");
    let Progress::NeedsDuplicateDecision(review) = progress else {
        panic!("expected a duplicate review, got {progress:?}");
    };
    assert_eq!(review.groups.len(), 1);
    assert_eq!(review.row_count(), 2);

    session
        .decide_duplicates(&key, DuplicateDecision::CollapseToOne)
        .expect("decision recorded");
    let Progress::Finished(summary) = cleaner.advance(&mut session, &key).expect("known file")
    else {
        panic!("expected the file to finish");
    };
    assert_eq!(exported(&summary), (0, 1, 2));
    assert_eq!(
        output_text(&session, &key),
        "Tower,Unit\nA,A - 101\nB,B - 202\n"
    );
}

#[test]
fn keep_all_and_cancel_duplicate_decisions() {
    let cleaner = Cleaner::default();
    let source = b"Tower,Unit\nA,101\nA,101\nB,202\n".to_vec();

    let mut session = Session::new();
    let key = session.register("units.csv", source.clone());
    let mut keep_all = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::KeepAll);
    let summary = cleaner.run(&mut session, &key, &mut keep_all).expect("ran");
    assert_eq!(exported(&summary), (0, 0, 3));
    assert_eq!(keep_all.validity_requests, 0);
    assert_eq!(keep_all.duplicate_requests, 1);

    let mut session = Session::new();
    let key = session.register("units.csv", source);
    let mut cancel = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::Cancel);
    let summary = cleaner.run(&mut session, &key, &mut cancel).expect("ran");
    assert_eq!(
        summary.status,
        FileStatus::Cancelled {
            stage: DecisionStage::Duplicates
        }
    );
    assert!(session.output(&key).is_none());
}

#[test]
fn missing_unit_column_is_terminal() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Floor\nA,1\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::KeepAll);

    let summary = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(summary.status, FileStatus::MissingUnitColumn);
    assert!(session.output(&key).is_none());
    assert_eq!(gate.validity_requests + gate.duplicate_requests, 0);
}

#[test]
fn finished_files_return_the_cached_summary() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,#1\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Delete, DuplicateDecision::KeepAll);

    let first = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    let second = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(first, second);
    assert_eq!(gate.validity_requests, 1);
    assert_eq!(session.summary(&key), Some(&first));
}

#[test]
fn reset_allows_a_new_decision() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,#1\nB,2\n".to_vec());

    let mut cancel = FixedGate::new(ValidityDecision::Cancel, DuplicateDecision::KeepAll);
    let summary = cleaner.run(&mut session, &key, &mut cancel).expect("ran");
    assert!(!summary.is_exported());

    session.reset(&key).expect("known file");
    assert!(session.summary(&key).is_none());

    let mut delete = FixedGate::new(ValidityDecision::Delete, DuplicateDecision::KeepAll);
    let summary = cleaner.run(&mut session, &key, &mut delete).expect("ran");
    assert_eq!(exported(&summary), (1, 0, 1));
}

#[test]
fn batch_isolates_failing_files() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    session.register("good.csv", b"Tower,Unit\nA,1\n".to_vec());
    session.register("notes.txt", b"Tower,Unit\nA,1\n".to_vec());
    session.register("nounit.csv", b"Tower\nA\n".to_vec());
    session.register("broken.xlsx", b"not a workbook".to_vec());
    session.register("also_good.csv", b"Unit\n7\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::KeepAll);

    let summaries = cleaner.run_batch(&mut session, &mut gate);
    let names: Vec<&str> = summaries
        .iter()
        .map(|summary| summary.file_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["good.csv", "notes.txt", "nounit.csv", "broken.xlsx", "also_good.csv"]
    );

    assert!(summaries[0].is_exported());
    match &summaries[1].status {
        FileStatus::LoadError { message } => {
            assert!(message.contains("unsupported file format"))
        }
        other => panic!("expected a load error, got {other:?}"),
    }
    assert_eq!(summaries[2].status, FileStatus::MissingUnitColumn);
    assert!(matches!(summaries[3].status, FileStatus::LoadError { .. }));
    assert!(summaries[4].is_exported());
    assert!(
        summaries[3]
            .to_string()
            .starts_with("Error processing broken.xlsx: ")
    );
}

#[test]
fn registering_the_same_upload_twice_reuses_the_entry() {
    let mut session = Session::new();
    let first = session.register("units.csv", b"Unit\n1\n".to_vec());
    let second = session.register("units.csv", b"Unit\n1\n".to_vec());
    let other = session.register("units.csv", b"Unit\n2\n".to_vec());

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(session.len(), 2);

    session.clear();
    assert!(session.is_empty());
}

#[test]
fn unknown_keys_are_rejected() {
    let cleaner = Cleaner::default();
    let mut registered = Session::new();
    let key = registered.register("units.csv", b"Unit\n1\n".to_vec());

    let mut empty = Session::new();
    let error = cleaner.advance(&mut empty, &key).expect_err("key not registered");
    assert!(matches!(error, ToolError::UnknownFile(unknown) if unknown == key));
}

#[test]
fn paused_session_survives_serialization() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Tower,Unit\nA,1/2\nA,3\nA,3\n".to_vec());

    assert!(matches!(
        cleaner.advance(&mut session, &key).expect("known file"),
        Progress::NeedsValidityDecision(_)
    ));
    session
        .decide_validity(&key, ValidityDecision::Delete)
        .expect("decision recorded");
    assert!(matches!(
        cleaner.advance(&mut session, &key).expect("known file"),
        Progress::NeedsDuplicateDecision(_)
    ));

    let stored = serde_json::to_string(&session).expect("session serialized");
    let mut restored: Session = serde_json::from_str(&stored).expect("session restored");
    assert_eq!(restored, session);

    restored
        .decide_duplicates(&key, DuplicateDecision::CollapseToOne)
        .expect("decision recorded");
    let Progress::Finished(summary) = cleaner.advance(&mut restored, &key).expect("known file")
    else {
        panic!("expected the file to finish");
    };
    assert_eq!(exported(&summary), (1, 1, 1));
    assert_eq!(output_text(&restored, &key), "Tower,Unit\nA,A - 3\n");
}

#[test]
fn summary_message_reports_deleted_rows() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register("units.csv", b"Unit\n#1\n2\n".to_vec());
    let mut gate = FixedGate::new(ValidityDecision::Delete, DuplicateDecision::KeepAll);

    let summary = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(
        summary.to_string(),
        "Processed: units.csv -> units_cleaned.csv\n\
         Deleted 1 row(s) due to special characters in Unit.\n\
         Total rows output: 1"
    );

    let json = serde_json::to_value(&summary).expect("summary serialized");
    assert_eq!(json["status"]["status"], "exported");
    assert_eq!(json["status"]["rows_deleted"], 1);
}

#[test]
fn rows_separated_by_corporate_are_not_collapsed_into_other_rows() {
    let cleaner = Cleaner::default();
    let mut session = Session::new();
    let key = session.register(
        "units.csv",
        b"Tower,Unit,Corporate\nA,101,Acme\nA,101,Globex\nA,101 - Acme,\n".to_vec(),
    );
    let mut gate = FixedGate::new(ValidityDecision::Keep, DuplicateDecision::CollapseToOne);

    let summary = cleaner.run(&mut session, &key, &mut gate).expect("ran");
    assert_eq!(gate.duplicate_requests, 0);
    assert_eq!(exported(&summary), (0, 0, 3));
    assert_eq!(
        output_text(&session, &key),
        "Tower,Unit,Corporate\n\
         A,A - 101 - Acme,Acme\n\
         A,A - 101 - Globex,Globex\n\
         A,A - 101 - Acme (2),\n"
    );
}
