//! File-backed LocalStore tests
//!
//! Exercise the on-disk layout and persistence across store instances.

use moodcheck_core::{ProfileDraft, ResponseSubmission, Score};
use moodcheck_store::{LocalStore, RESPONSES_KEY, USERS_KEY};

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let profile = {
        let store = LocalStore::open(dir.path()).unwrap();
        let profile = store
            .create_profile(ProfileDraft::new("Noor", "🦄", "5", "girl"))
            .unwrap();
        store
            .record_response(ResponseSubmission {
                user_id: profile.id,
                question_id: 1,
                score: Score::new(2).unwrap(),
            })
            .unwrap();
        profile
    };

    let store = LocalStore::open(dir.path()).unwrap();
    assert_eq!(store.users().unwrap(), vec![profile.clone()]);

    let rows = store.assemble_report().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, profile.id);
    assert_eq!(rows[0].user_name, "Noor");
    assert_eq!(rows[0].score, 2);
}

#[test]
fn test_collections_are_json_arrays_under_fixed_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    store
        .create_profile(ProfileDraft::new("Leo", "🐯", "2", "boy"))
        .unwrap();

    let users_file = dir.path().join(format!("{USERS_KEY}.json"));
    let raw = std::fs::read_to_string(users_file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(parsed.is_array());
    assert_eq!(parsed[0]["name"], "Leo");

    assert!(!dir.path().join(format!("{RESPONSES_KEY}.json")).exists());
}

#[test]
fn test_clear_removes_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    store
        .create_profile(ProfileDraft::new("Leo", "🐯", "2", "boy"))
        .unwrap();

    store.clear().unwrap();
    store.clear().unwrap();

    assert!(!dir.path().join(format!("{USERS_KEY}.json")).exists());
    assert!(store.users().unwrap().is_empty());
}
