//! Standard stream redirection. Kept in its own test binary with a single
//! test, since it rewires the process's descriptors.
#![cfg(unix)]

use {
    daylog::{DayLogBuilder, Severity},
    nix::{
        libc::{STDERR_FILENO, STDOUT_FILENO},
        unistd::{close, dup, dup2},
    },
    std::{
        fs,
        io::{self, Write},
        os::fd::RawFd,
    },
};

struct SavedStreams {
    stdout: RawFd,
    stderr: RawFd,
}

impl SavedStreams {
    fn save() -> Self {
        SavedStreams {
            stdout: dup(STDOUT_FILENO).unwrap(),
            stderr: dup(STDERR_FILENO).unwrap(),
        }
    }
}

impl Drop for SavedStreams {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
        let _ = dup2(self.stdout, STDOUT_FILENO);
        let _ = dup2(self.stderr, STDERR_FILENO);
        let _ = close(self.stdout);
        let _ = close(self.stderr);
    }
}

fn write_to_std_streams(out: &str, err: &str) {
    let mut stdout = io::stdout();
    stdout.write_all(out.as_bytes()).unwrap();
    stdout.flush().unwrap();
    io::stderr().write_all(err.as_bytes()).unwrap();
}

#[test]
fn rotation_redirects_standard_streams() {
    // Combined: both streams follow the single file.
    {
        let dir = tempfile::tempdir().unwrap();
        let log = DayLogBuilder::release(dir.path())
            .all_in_one(true)
            .redirect_std_streams(true)
            .build()
            .unwrap();

        let saved = SavedStreams::save();
        daylog::println_info!(log, "logged");
        write_to_std_streams("from stdout\n", "from stderr\n");
        drop(saved);

        let contents = fs::read_to_string(log.file_path(Severity::Info).unwrap()).unwrap();
        assert_eq!(contents, "logged\nfrom stdout\nfrom stderr\n");
    }

    // Split: stdout goes to the info file, stderr to the error file.
    {
        let dir = tempfile::tempdir().unwrap();
        let log = DayLogBuilder::release(dir.path())
            .redirect_std_streams(true)
            .build()
            .unwrap();

        let saved = SavedStreams::save();
        daylog::println_warning!(log, "warned");
        write_to_std_streams("out line\n", "err line\n");
        drop(saved);

        let info = fs::read_to_string(log.file_path(Severity::Info).unwrap()).unwrap();
        let warn = fs::read_to_string(log.file_path(Severity::Warning).unwrap()).unwrap();
        let err = fs::read_to_string(log.file_path(Severity::Error).unwrap()).unwrap();
        assert_eq!(info, "out line\n");
        assert_eq!(warn, "warned\n");
        assert_eq!(err, "err line\n");
    }

    // Without the flag nothing is rewired.
    {
        let dir = tempfile::tempdir().unwrap();
        let log = DayLogBuilder::release(dir.path()).all_in_one(true).build().unwrap();

        let saved = SavedStreams::save();
        daylog::println_info!(log, "only this");
        drop(saved);

        let contents = fs::read_to_string(log.file_path(Severity::Info).unwrap()).unwrap();
        assert_eq!(contents, "only this\n");
    }
}
