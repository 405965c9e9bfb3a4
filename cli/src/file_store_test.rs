use std::sync::atomic::{AtomicU32, Ordering};

use session::{Role, Session, Tenant, User};

use super::*;

fn scratch_dir() -> PathBuf {
    static NEXT: AtomicU32 = AtomicU32::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("maos-cli-test-{}-{n}", std::process::id()))
}

fn sample() -> Session {
    Session::new(
        "tok-file-1".to_owned(),
        Tenant { id: "t-9".into(), role: Role::Viewer },
        User { id: "u-9".into(), name: "Grace".into(), email: "grace@example.com".into() },
    )
    .unwrap()
}

#[test]
fn missing_file_reads_as_none() {
    let backend = FileBackend::new("f", scratch_dir().join("absent"));
    assert_eq!(backend.read(), Ok(None));
    assert_eq!(backend.remove(), Ok(()));
}

#[test]
fn write_creates_parent_and_round_trips() {
    let dir = scratch_dir();
    let path = dir.join("nested").join("value");
    let backend = FileBackend::new("f", path.clone());
    backend.write("abc\n").unwrap();
    assert_eq!(backend.read(), Ok(Some("abc".to_owned())));
    assert!(!path.with_extension("tmp").exists());

    backend.remove().unwrap();
    assert_eq!(backend.read(), Ok(None));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unreadable_path_is_io_error() {
    let dir = scratch_dir();
    std::fs::create_dir_all(dir.join("is_a_dir")).unwrap();
    let backend = FileBackend::new("f", dir.join("is_a_dir"));
    assert!(matches!(backend.read(), Err(StorageError::Io(_))));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn store_writes_token_and_session_files() {
    let dir = scratch_dir();
    let store = session_store(&dir);
    store.save(&sample()).unwrap();

    assert_eq!(std::fs::read_to_string(dir.join(TOKEN_FILE)).unwrap(), "tok-file-1");
    assert!(std::fs::read_to_string(dir.join(SESSION_FILE)).unwrap().contains("\"viewer\""));
    assert_eq!(session_store(&dir).load(), Some(sample()));

    store.clear().unwrap();
    assert!(!dir.join(TOKEN_FILE).exists());
    assert!(!dir.join(SESSION_FILE).exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn mismatched_token_file_fails_closed() {
    let dir = scratch_dir();
    session_store(&dir).save(&sample()).unwrap();
    std::fs::write(dir.join(TOKEN_FILE), "tok-other").unwrap();
    assert_eq!(session_store(&dir).load(), None);
    let _ = std::fs::remove_dir_all(dir);
}
