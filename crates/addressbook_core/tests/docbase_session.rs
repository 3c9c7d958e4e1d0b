use addressbook_core::docbase::migrations::{latest_version, schema_version};
use addressbook_core::docbase::{docbase_path, Session};
use addressbook_core::{
    contact_repository, Contact, ContactRepository, Credentials, RepositoryConfig, StoreError,
};
use rusqlite::Connection;
use std::path::Path;

fn config(data_dir: &Path, username: &str, password: &str) -> RepositoryConfig {
    RepositoryConfig {
        name: "contacts".to_string(),
        username: username.to_string(),
        password: password.to_string(),
        data_dir: data_dir.to_path_buf(),
        create_if_missing: true,
        page_size: 10,
    }
}

#[test]
fn connect_creates_docbase_and_reconnect_sees_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir.path().join("nested"), "dmadmin", "secret");

    let id = {
        let session = Session::connect(&config).unwrap();
        assert_eq!(session.docbase(), "contacts");
        assert_eq!(session.username(), "dmadmin");
        let repo = contact_repository(&session, &config).unwrap();
        repo.save(&Contact::new("Persisted", "", "")).unwrap().id.unwrap()
    };

    let existing = RepositoryConfig {
        create_if_missing: false,
        ..config.clone()
    };
    let session = Session::connect(&existing).unwrap();
    let repo = contact_repository(&session, &existing).unwrap();
    assert_eq!(repo.find_one(&id).unwrap().unwrap().name, "Persisted");

    let path = docbase_path(&config.data_dir, &config.name).unwrap();
    let conn = Connection::open(path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
}

#[test]
fn missing_docbase_without_create_flag_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = RepositoryConfig {
        create_if_missing: false,
        ..config(dir.path(), "dmadmin", "secret")
    };

    let err = Session::connect(&config).err().unwrap();
    assert!(matches!(err, StoreError::DocbaseNotFound(_)));
    assert!(!dir.path().join("contacts.docbase").exists());
}

#[test]
fn wrong_password_or_unknown_user_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    drop(Session::connect(&config(dir.path(), "dmadmin", "secret")).unwrap());

    let wrong_password = Session::connect(&config(dir.path(), "dmadmin", "guess"))
        .err()
        .unwrap();
    assert!(matches!(
        wrong_password,
        StoreError::AuthenticationFailed { ref username, .. } if username == "dmadmin"
    ));

    let unknown_user = Session::connect(&config(dir.path(), "intruder", "secret"))
        .err()
        .unwrap();
    assert!(matches!(
        unknown_user,
        StoreError::AuthenticationFailed { .. }
    ));
}

#[test]
fn added_principal_can_connect() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Session::connect(&config(dir.path(), "dmadmin", "secret")).unwrap();
    owner
        .add_principal(&Credentials::new("reader", "read-only"))
        .unwrap();
    drop(owner);

    let session = Session::connect(&config(dir.path(), "reader", "read-only")).unwrap();
    assert_eq!(session.username(), "reader");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.docbase");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = Session::connect(&config(dir.path(), "dmadmin", "secret"))
        .err()
        .unwrap();
    match err {
        StoreError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_docbase_name_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = RepositoryConfig {
        name: "../outside".to_string(),
        ..config(dir.path(), "dmadmin", "secret")
    };

    let err = Session::connect(&config).err().unwrap();
    assert!(matches!(err, StoreError::InvalidDocbaseName(_)));
}

#[test]
fn in_memory_sessions_are_isolated() {
    let credentials = Credentials::new("dmadmin", "secret");
    let first = Session::connect_in_memory(&credentials).unwrap();
    let second = Session::connect_in_memory(&credentials).unwrap();
    let config = RepositoryConfig::default();

    contact_repository(&first, &config)
        .unwrap()
        .save(&Contact::new("Only in first", "", ""))
        .unwrap();

    let repo = contact_repository(&second, &config).unwrap();
    assert_eq!(repo.find_all().iter().count(), 0);
}

#[test]
fn failed_creation_leaves_no_docbase_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the rollback journal belongs makes the first
    // schema write fail after the docbase file was opened.
    std::fs::create_dir(dir.path().join("contacts.docbase-journal")).unwrap();

    let config = config(dir.path(), "dmadmin", "secret");
    assert!(Session::connect(&config).is_err());
    assert!(!dir.path().join("contacts.docbase").exists());

    let existing = RepositoryConfig {
        create_if_missing: false,
        ..config
    };
    let err = Session::connect(&existing).err().unwrap();
    assert!(matches!(err, StoreError::DocbaseNotFound(_)));
}
