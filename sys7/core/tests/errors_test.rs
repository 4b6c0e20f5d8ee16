//! OSErr mapping tests for sys7-core

use sys7_core::{os_status, OsErr, OsResult, NO_ERR};

#[test]
fn test_classic_codes() {
    assert_eq!(OsErr::ParamErr.code(), -50);
    assert_eq!(OsErr::MemFullErr.code(), -108);
    assert_eq!(OsErr::ProcNotFound.code(), -600);
    assert_eq!(OsErr::EvtNotEnb.code(), 1);
}

#[test]
fn test_code_roundtrip() {
    for err in [
        OsErr::EvtNotEnb,
        OsErr::QueueFull,
        OsErr::ParamErr,
        OsErr::ProcNotFound,
        OsErr::MemFullErr,
    ] {
        assert_eq!(OsErr::from_code(err.code()), Some(err));
    }
    assert_eq!(OsErr::from_code(NO_ERR), None);
}

#[test]
fn test_status_flattening() {
    let ok: OsResult<u8> = Ok(3);
    let err: OsResult<u8> = Err(OsErr::QueueFull);
    assert_eq!(os_status(&ok), NO_ERR);
    assert_eq!(os_status(&err), -1);
}

#[test]
fn test_display() {
    assert_eq!(OsErr::ProcNotFound.to_string(), "process not found");
}
