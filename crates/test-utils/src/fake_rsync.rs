//! Stand-in rsync executables for integration tests.
//!
//! Real rsync is not a test dependency; these helpers write small `sh`
//! scripts that emit rsync-shaped output and exit with a chosen code.
//! Unix-only, like the pipes-and-exit-codes behaviour they exercise.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable shell script into `dir` and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("writing fake rsync script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("marking fake rsync script executable");
    }

    path
}

/// A successful run: progress lines, a summary block, exit 0.
pub fn success_body() -> &'static str {
    r#"echo "sending incremental file list"
echo "photos/a.jpg"
echo "       1,024  50%    1.00MB/s    0:00:01 (xfer#1, to-check=1/2)"
echo "photos/b.jpg"
echo "       2,048 100%    2.00MB/s    0:00:00 (xfer#2, to-check=0/2)"
echo ""
echo "Number of files: 2"
echo "Number of files transferred: 2"
echo "Total transferred file size: 3,072 bytes"
exit 0"#
}

/// A partial transfer: one file failed, warning on stderr, exit 23.
pub fn partial_body() -> &'static str {
    r#"echo "photos/a.jpg"
echo "Number of files transferred: 1"
echo "Total transferred file size: 1,024 bytes"
echo "rsync: send_files failed to open \"/locked\": Permission denied (13)" >&2
exit 23"#
}

/// A run that prints a first progress line and then hangs until killed.
pub fn hang_body() -> &'static str {
    r#"echo "photos/a.jpg"
echo "       1,024  10%    1.00MB/s    0:00:30 (xfer#1, to-check=9/10)"
exec sleep 60"#
}
