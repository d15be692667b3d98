//! Stop the shared embedded cluster when a test binary exits.
//!
//! The shared cluster handle lives for the whole process. Under nextest every
//! suite is its own process, and a postmaster left running blocks the next
//! suite from starting on the same data directory, so an `atexit` hook sends
//! it `SIGTERM`.

use std::time::Duration;

use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle};

const ATTEMPTS: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const STABLE_PASSWORD: &str = "journal_embedded_test";

#[cfg(unix)]
mod unix {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::path::{Path, PathBuf};
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;

    use color_eyre::eyre::eyre;
    use pg_embedded_setup_unpriv::{BootstrapError, BootstrapResult, ClusterHandle};

    const LOCK_FILE: &str = "journal-pg-embedded-shared-cluster.lock";

    static POSTMASTER_PID: AtomicI32 = AtomicI32::new(0);
    static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
    static LOCK_FD: OnceLock<i32> = OnceLock::new();

    /// Serialise cluster start-up across test processes with `flock`.
    pub fn lock_across_processes() -> BootstrapResult<()> {
        if LOCK_FD.get().is_some() {
            return Ok(());
        }
        let path = std::env::temp_dir().join(LOCK_FILE);
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|error| {
            BootstrapError::from(eyre!("encode lock path '{}': {error}", path.display()))
        })?;

        // SAFETY: `c_path` is NUL-terminated and outlives the call.
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_CREAT | libc::O_RDWR, 0o600) };
        if fd < 0 {
            let error = std::io::Error::last_os_error();
            return Err(BootstrapError::from(eyre!(
                "open lock file '{}': {error}",
                path.display()
            )));
        }
        // SAFETY: `fd` came from the successful `open` above.
        if unsafe { libc::flock(fd, libc::LOCK_EX) } != 0 {
            let error = std::io::Error::last_os_error();
            // SAFETY: `fd` is still open and owned here.
            unsafe { libc::close(fd) };
            return Err(BootstrapError::from(eyre!(
                "lock '{}': {error}",
                path.display()
            )));
        }
        if LOCK_FD.set(fd).is_err() {
            // SAFETY: another caller won the race; this descriptor is unused.
            unsafe { libc::close(fd) };
        }
        Ok(())
    }

    pub fn read_postmaster_pid(data_dir: &Path) -> Option<i32> {
        let dir = cap_std::fs::Dir::open_ambient_dir(data_dir, cap_std::ambient_authority()).ok()?;
        let content = dir.read_to_string("postmaster.pid").ok()?;
        content.lines().next()?.trim().parse().ok()
    }

    extern "C" fn stop_postmaster() {
        let stored = POSTMASTER_PID.load(Ordering::Relaxed);
        if stored <= 0 {
            return;
        }
        // The pid file must still name the same process, or the pid was reused.
        let Some(pid) = DATA_DIR
            .get()
            .and_then(|dir| read_postmaster_pid(dir))
            .filter(|pid| *pid == stored)
        else {
            return;
        };

        // SAFETY: `pid` matches the live `postmaster.pid`.
        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            return;
        }
        for _ in 0..50 {
            std::thread::sleep(Duration::from_millis(100));
            // SAFETY: signal 0 only probes whether the process exists.
            if unsafe { libc::kill(pid, 0) } != 0 {
                return;
            }
        }
        // SAFETY: same validated pid; smart shutdown took too long.
        unsafe { libc::kill(pid, libc::SIGKILL) };
    }

    /// Register the exit hook once per process.
    pub fn register(handle: &ClusterHandle) {
        let data_dir = &handle.settings().data_dir;
        let Some(pid) = read_postmaster_pid(data_dir) else {
            return;
        };
        if POSTMASTER_PID
            .compare_exchange(0, pid, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let _ = DATA_DIR.set(data_dir.clone());

        // SAFETY: `stop_postmaster` is a plain `extern "C"` function.
        let rc = unsafe { libc::atexit(stop_postmaster) };
        if rc != 0 {
            eprintln!("pg-embed: atexit registration failed (rc={rc}); postmaster {pid} may linger");
        }
    }
}

/// The process-wide cluster, started on first use and stopped at exit.
pub fn shared_cluster_handle() -> BootstrapResult<&'static ClusterHandle> {
    ensure_stable_password();
    #[cfg(unix)]
    unix::lock_across_processes()?;

    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => {
                #[cfg(unix)]
                unix::register(handle);
                return Ok(handle);
            }
            Err(error) if attempt >= ATTEMPTS => return Err(error),
            Err(_) => {
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

/// A reused data directory keeps the password it was initialised with, so
/// every process must present the same one.
fn ensure_stable_password() {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: runs before the cluster library starts any threads.
        unsafe { std::env::set_var("PG_PASSWORD", STABLE_PASSWORD) };
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    #[cfg(unix)]
    #[rstest]
    #[case("4242\n/var/data\n5432\n", Some(4242))]
    #[case("postmaster\n", None)]
    fn postmaster_pid_comes_from_the_first_line(
        #[case] content: &str,
        #[case] expected: Option<i32>,
    ) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("postmaster.pid"), content).expect("write pid file");
        assert_eq!(super::unix::read_postmaster_pid(dir.path()), expected);
    }

    #[cfg(unix)]
    #[rstest]
    fn missing_pid_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(super::unix::read_postmaster_pid(dir.path()), None);
    }

    #[rstest]
    fn an_existing_password_is_kept() {
        let _guard = env_lock::lock_env([("PG_PASSWORD", Some("operator-choice"))]);
        super::ensure_stable_password();
        assert_eq!(
            std::env::var("PG_PASSWORD").expect("PG_PASSWORD set"),
            "operator-choice"
        );
    }
}
