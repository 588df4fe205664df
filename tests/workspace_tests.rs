//! Process-wide workspace cleanup.
//!
//! Runs in its own test binary: `cleanup_registered` drains every
//! registered workspace, so it must not race other tests that hold live
//! workspaces in the same process.

use cellseg::workspace::{cleanup_registered, Workspace};

#[test]
fn test_cleanup_registered_removes_leaked_workspace() {
    let ws = Workspace::acquire().unwrap();
    let root = ws.path().to_path_buf();
    std::fs::create_dir(root.join("sub")).unwrap();
    std::fs::write(root.join("sub").join("0_cp_masks.png"), b"data").unwrap();
    std::fs::write(root.join("0.tif"), b"data").unwrap();
    // Simulate abnormal termination: the workspace is never dropped.
    std::mem::forget(ws);

    cleanup_registered();
    assert!(!root.exists());

    // Calling again with nothing registered is harmless.
    cleanup_registered();
}
