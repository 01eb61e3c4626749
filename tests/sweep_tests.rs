//! Integration tests: fixture folders through parsing, classification,
//! metrics and relocation.

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use chrono::{Local, TimeZone};
use predicates::prelude::*;

use spambegone::classify::{ClassificationRun, Classifier};
use spambegone::config::RulesConfig;
use spambegone::mailbox::{move_to_trash, MailStore, MboxFolders};
use spambegone::model::envelope::{MessageEnvelope, MessageUid};
use spambegone::model::verdict::TrashCode;
use spambegone::parser::eml::parse_eml;
use spambegone::parser::header::decode_encoded_words;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn rules() -> RulesConfig {
    RulesConfig {
        blacklist: fixture("Blacklist.txt"),
        whitelist: fixture("Whitelist.txt"),
        metrics: PathBuf::from("TrashMetrics.txt"),
    }
}

/// Copy the fixture folders into a scratch directory with an empty Trash.
fn scratch_mail() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.copy_from(fixture("mail"), &["*"]).unwrap();
    temp.child("Trash").touch().unwrap();
    temp
}

fn fetch_all(store: &mut MboxFolders) -> Vec<MessageEnvelope> {
    let mut out = Vec::new();
    store
        .fetch_envelopes(
            &mut |env| {
                out.push(env);
                true
            },
            None,
        )
        .unwrap();
    out
}

fn classify_inbox<'c>(
    store: &mut MboxFolders,
    classifier: &'c Classifier,
) -> ClassificationRun<'c> {
    store.select("INBOX").unwrap();
    let started = Local.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
    let mut run = ClassificationRun::started_at(classifier, started);
    store
        .fetch_envelopes(
            &mut |env| {
                run.observe(&env);
                true
            },
            None,
        )
        .unwrap();
    run
}

// ─── Envelopes ──────────────────────────────────────────────────────

#[test]
fn test_fixture_envelopes() {
    let temp = scratch_mail();
    let mut store = MboxFolders::open(temp.path()).unwrap();
    assert_eq!(store.select("INBOX").unwrap().messages, 8);

    let envs = fetch_all(&mut store);
    assert_eq!(envs.len(), 8);
    assert_eq!(envs[0].from_display(), "Ann Lee <ann@friends.org>");
    assert_eq!(envs[0].received_display(), "2024-01-01 09:00:00");
    assert_eq!(envs[3].from.as_ref().unwrap().personal_name, "𝐅𝐑𝐄𝐄 𝐂𝐀𝐒𝐈𝐍𝐎");
    assert!(envs[4].from.is_none());
    assert_eq!(envs[4].from_display(), "Unknown");
    assert_eq!(envs[5].subject, "W\u{0456}n a prize");
}

#[test]
fn test_decode_encoded_words_public() {
    assert_eq!(decode_encoded_words("=?UTF-8?Q?Gro=C3=9Fe_Chance?="), "Große Chance");
}

// ─── Classification ─────────────────────────────────────────────────

#[test]
fn test_rule_files_load() {
    let classifier = Classifier::load(&rules()).unwrap();
    assert_eq!(
        classifier.blacklist().phrases(),
        ["casino", "make money", "makemoney", ""]
    );
    assert_eq!(classifier.whitelist().len(), 2);
}

#[test]
fn test_missing_rule_file_is_an_error() {
    let mut bad = rules();
    bad.blacklist = PathBuf::from("/nonexistent/Blacklist.txt");
    assert!(Classifier::load(&bad).is_err());
}

#[test]
fn test_inbox_verdicts() {
    let temp = scratch_mail();
    let classifier = Classifier::load(&rules()).unwrap();
    let mut store = MboxFolders::open(temp.path()).unwrap();
    let run = classify_inbox(&mut store, &classifier);

    assert_eq!(run.scanned(), 8);
    let sorted: Vec<(u64, u8, String)> = run
        .sorted_verdicts()
        .iter()
        .map(|v| (v.uid.0, v.code.as_u8(), v.category.to_string()))
        .collect();
    assert_eq!(
        sorted,
        [
            (3, 1, "NotWhiteList".to_string()),
            (6, 2, "Unacceptable".to_string()),
            (4, 3, "casino".to_string()),
            (7, 4, "make money".to_string()),
            (8, 5, "makemoney".to_string()),
            (5, 6, "*".to_string()),
        ]
    );
}

#[test]
fn test_metrics_appended() {
    let temp = scratch_mail();
    let classifier = Classifier::load(&rules()).unwrap();
    let mut store = MboxFolders::open(temp.path()).unwrap();
    let run = classify_inbox(&mut store, &classifier);

    assert_eq!(
        run.metrics().count("Unacceptable", TrashCode::Subject),
        Some(1)
    );

    let log = temp.child("TrashMetrics.txt");
    log.write_str("2023-12-31 09:00:00, casino, 3, 4\n").unwrap();
    let lines = run
        .metrics()
        .append_to(log.path(), &run.started_display())
        .unwrap();
    assert_eq!(lines, 6);

    log.assert(predicate::str::starts_with("2023-12-31 09:00:00, casino, 3, 4\n"));
    log.assert(predicate::str::contains("2024-01-07 12:00:00, NotWhiteList, 1, 1\n"));
    log.assert(predicate::str::contains("2024-01-07 12:00:00, make money, 4, 1\n"));
    log.assert(predicate::str::contains("2024-01-07 12:00:00, makemoney, 5, 1\n"));
    log.assert(predicate::str::contains("2024-01-07 12:00:00, *, 6, 1\n"));
}

// ─── Relocation ─────────────────────────────────────────────────────

#[test]
fn test_move_matches_to_trash() {
    let temp = scratch_mail();
    let classifier = Classifier::load(&rules()).unwrap();
    let mut store = MboxFolders::open(temp.path()).unwrap();
    let uids = classify_inbox(&mut store, &classifier).relocation_uids();

    let report = move_to_trash(&mut store, "INBOX", &uids, "Trash").unwrap();
    assert!(report.is_complete());
    assert_eq!(report.trash_messages, 6);
    assert_eq!(report.remaining, 2);

    store.select("INBOX").unwrap();
    let kept: Vec<String> = fetch_all(&mut store).into_iter().map(|e| e.subject).collect();
    assert_eq!(kept, ["Casino night on Friday?", "Your statement is ready"]);

    store.select("Trash").unwrap();
    let trashed = fetch_all(&mut store);
    assert_eq!(trashed.len(), 6);
    assert_eq!(trashed[0].subject, "Limited offer");
    assert_eq!(trashed[0].received_display(), "2024-01-02 08:00:00");

    temp.child("INBOX")
        .assert(predicate::str::contains(">From the desk of Ann"));
    temp.child("INBOX.tmp").assert(predicate::path::missing());
}

#[test]
fn test_second_sweep_is_clean() {
    let temp = scratch_mail();
    let classifier = Classifier::load(&rules()).unwrap();
    let mut store = MboxFolders::open(temp.path()).unwrap();
    let uids = classify_inbox(&mut store, &classifier).relocation_uids();
    move_to_trash(&mut store, "INBOX", &uids, "Trash").unwrap();

    let again = classify_inbox(&mut store, &classifier);
    assert_eq!(again.scanned(), 2);
    assert!(again.verdicts().is_empty());
}

// ─── Single messages ────────────────────────────────────────────────

#[test]
fn test_check_eml() {
    let classifier = Classifier::load(&rules()).unwrap();
    let env = parse_eml(fixture("offer.eml"), MessageUid(1)).unwrap();
    assert_eq!(env.received_display(), "2024-01-08 12:00:00");

    let hit = classifier.classify_message(&env).unwrap();
    assert_eq!(hit.code, TrashCode::SubjectPhrase);
    assert_eq!(hit.category.label(), "casino");
}
