//! Live git executor built on `std::process::Command`.

use std::ffi::OsString;
use std::io::{self, Read};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::config::Settings;
use crate::error::{CommandError, KILLED_BY_SIGNAL};
use crate::ports::vcs::{VcsCommand, VcsExecutor};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long a timed-out process group gets between SIGTERM and SIGKILL.
/// A wrapper such as `sudo` relays SIGTERM to the command it runs.
const TERM_GRACE: Duration = Duration::from_millis(500);

/// How long the output pipes may stay open after the child exited.
/// Anything still holding them then (a backgrounded helper) is killed.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Shell convention for "terminated by SIGPIPE" (128 + 13), reported by
/// privilege wrappers that relay the child's fate as an exit code.
const SIGPIPE_EXIT: i32 = 141;

/// Runs the git executable, switching identity through a wrapper such as
/// `sudo` when a command carries an acting user.
#[derive(Debug, Clone)]
pub struct LiveVcsExecutor {
    git: String,
    wrapper: String,
    inject_global_config: bool,
}

impl LiveVcsExecutor {
    /// Creates an executor for the given git binary and privilege wrapper.
    #[must_use]
    pub fn new(git: impl Into<String>, wrapper: impl Into<String>) -> Self {
        Self { git: git.into(), wrapper: wrapper.into(), inject_global_config: true }
    }

    /// Creates an executor from configured settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            git: settings.git.clone(),
            wrapper: settings.wrapper.clone(),
            inject_global_config: settings.inject_global_config,
        }
    }

    /// Program and arguments that will be spawned for `command`.
    ///
    /// With an acting user this is
    /// `<wrapper> -u <user> [env GIT_CONFIG_GLOBAL=<home>/.gitconfig] <git> <args..>`.
    #[must_use]
    pub fn command_line(&self, command: &VcsCommand<'_>) -> (OsString, Vec<OsString>) {
        let mut args: Vec<OsString> = Vec::new();
        let program = match command.acting_user {
            Some(user) => {
                args.push("-u".into());
                args.push(user.name.clone().into());
                if self.inject_global_config {
                    if let Some(home) = &user.home {
                        args.push("env".into());
                        let mut assignment = OsString::from("GIT_CONFIG_GLOBAL=");
                        assignment.push(home.join(".gitconfig"));
                        args.push(assignment);
                    }
                }
                args.push(self.git.clone().into());
                OsString::from(&self.wrapper)
            }
            None => OsString::from(&self.git),
        };
        args.extend(command.args.iter().map(OsString::from));
        (program, args)
    }

    fn build(&self, command: &VcsCommand<'_>) -> Command {
        let (program, args) = self.command_line(command);
        debug!(
            repo = %command.repo.display(),
            user = command.acting_user.map(|u| u.name.as_str()),
            "git {}",
            command.display_args()
        );
        let mut process = Command::new(program);
        process.args(args).current_dir(command.repo);
        process
    }
}

impl VcsExecutor for LiveVcsExecutor {
    fn capture(&self, command: &VcsCommand<'_>) -> Result<String, CommandError> {
        let describe = format!("git {}", command.display_args());
        let deadline = command.timeout.map(|t| Instant::now() + t);
        // Own process group, so a timeout reaches whatever the wrapper started.
        let mut child = self
            .build(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|e| spawn_error(&describe, &e))?;

        // Drain both pipes on their own threads so a chatty child never blocks
        // on a full pipe while we wait on it.
        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            spawn_reader(pipe, Stream::Stdout, tx.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            spawn_reader(pipe, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let Some(status) = wait_with_deadline(&mut child, deadline, true)
            .map_err(|e| CommandError::new(format!("{describe}: wait failed: {e}"), 1))?
        else {
            return Err(timed_out(&describe, command.timeout));
        };

        let mut output = Captured::default();
        if !output.collect_until(&rx, Instant::now() + PIPE_GRACE) {
            debug!(pid = child.id(), "output pipes still open after exit; killing process group");
            kill_group(&child, Signal::SIGKILL);
            if !output.collect_until(&rx, Instant::now() + PIPE_GRACE) {
                debug!(pid = child.id(), "output pipes held outside the process group");
            }
        }
        check_status(status, &describe, &String::from_utf8_lossy(&output.stderr))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn interactive(&self, command: &VcsCommand<'_>) -> Result<(), CommandError> {
        let describe = format!("git {}", command.display_args());
        let deadline = command.timeout.map(|t| Instant::now() + t);
        let mut process = self.build(command);
        process.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
        // Untimed commands stay in the terminal's foreground group so pagers
        // and editors can read from it.
        if deadline.is_some() {
            process.process_group(0);
        }
        let mut child = process.spawn().map_err(|e| spawn_error(&describe, &e))?;

        let Some(status) = wait_with_deadline(&mut child, deadline, deadline.is_some())
            .map_err(|e| CommandError::new(format!("{describe}: wait failed: {e}"), 1))?
        else {
            return Err(timed_out(&describe, command.timeout));
        };
        check_status(status, &describe, "")
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn spawn_reader(
    mut pipe: impl Read + Send + 'static,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
    });
}

/// Output gathered from the reader threads.
#[derive(Debug, Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Captured {
    /// Collects chunks until every pipe is closed or `until` passes.
    ///
    /// Returns true when every pipe reached end of file.
    fn collect_until(&mut self, rx: &Receiver<(Stream, Vec<u8>)>, until: Instant) -> bool {
        loop {
            match rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
                Ok((Stream::Stdout, chunk)) => self.stdout.extend_from_slice(&chunk),
                Ok((Stream::Stderr, chunk)) => self.stderr.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Disconnected) => return true,
                Err(RecvTimeoutError::Timeout) => return false,
            }
        }
    }
}

/// Waits for `child`, killing it once `deadline` passes.
///
/// With `group` set the child leads its own process group, and the whole
/// group is terminated: SIGTERM first, SIGKILL after [`TERM_GRACE`].
/// Returns `Ok(None)` when the child had to be killed.
fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
    group: bool,
) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            if group {
                terminate_group(child);
            }
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn terminate_group(child: &mut Child) {
    kill_group(child, Signal::SIGTERM);
    let grace = Instant::now() + TERM_GRACE;
    while Instant::now() < grace {
        if matches!(child.try_wait(), Ok(Some(_))) {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    // The leader may be gone while the rest of the group lives on.
    kill_group(child, Signal::SIGKILL);
}

fn kill_group(child: &Child, signal: Signal) {
    let Ok(pgid) = i32::try_from(child.id()) else { return };
    if let Err(e) = killpg(Pid::from_raw(pgid), signal) {
        debug!(pgid, ?signal, "killpg failed: {e}");
    }
}

/// Maps an exit status to success or a [`CommandError`].
///
/// Death by `SIGPIPE` counts as success: it happens whenever a pager the
/// output was piped into exits before reading everything.
fn check_status(status: ExitStatus, describe: &str, stderr: &str) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    if let Some(signal) = status.signal() {
        if signal == Signal::SIGPIPE as i32 {
            return Ok(());
        }
        return Err(CommandError::new(format!("{describe} killed by signal {signal}"), -signal));
    }
    let code = status.code().unwrap_or(1);
    if code == SIGPIPE_EXIT {
        return Ok(());
    }
    let stderr = stderr.trim();
    let message = if stderr.is_empty() {
        format!("{describe} exited with status {code}")
    } else {
        stderr.to_string()
    };
    Err(CommandError::new(message, code))
}

fn spawn_error(describe: &str, err: &std::io::Error) -> CommandError {
    let code = if err.kind() == std::io::ErrorKind::NotFound { 127 } else { 126 };
    CommandError::new(format!("{describe}: cannot spawn: {err}"), code)
}

fn timed_out(describe: &str, timeout: Option<Duration>) -> CommandError {
    let limit = timeout.unwrap_or_default();
    CommandError::new(format!("{describe} timed out after {limit:?}"), KILLED_BY_SIGNAL)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::ports::Account;

    fn args_of(executor: &LiveVcsExecutor, command: &VcsCommand<'_>) -> (String, Vec<String>) {
        let (program, args) = executor.command_line(command);
        (
            program.to_string_lossy().into_owned(),
            args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
        )
    }

    #[test]
    fn runs_git_directly_without_acting_user() {
        let executor = LiveVcsExecutor::new("git", "sudo");
        let command = VcsCommand::new(Path::new("/srv/app"), ["rev-parse", "HEAD"]);
        let (program, args) = args_of(&executor, &command);
        assert_eq!(program, "git");
        assert_eq!(args, ["rev-parse", "HEAD"]);
    }

    #[test]
    fn wraps_with_sudo_and_global_config_for_acting_user() {
        let executor = LiveVcsExecutor::new("git", "sudo");
        let account =
            Account { name: "deploy".into(), uid: 1001, home: Some(PathBuf::from("/home/deploy")) };
        let command = VcsCommand::new(Path::new("/srv/app"), ["pull"]).as_user(Some(&account));
        let (program, args) = args_of(&executor, &command);
        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            ["-u", "deploy", "env", "GIT_CONFIG_GLOBAL=/home/deploy/.gitconfig", "git", "pull"]
        );
    }

    #[test]
    fn omits_env_override_without_home() {
        let executor = LiveVcsExecutor::new("/usr/bin/git", "doas");
        let account = Account { name: "www".into(), uid: 33, home: None };
        let command = VcsCommand::new(Path::new("/var/www"), ["push"]).as_user(Some(&account));
        let (program, args) = args_of(&executor, &command);
        assert_eq!(program, "doas");
        assert_eq!(args, ["-u", "www", "/usr/bin/git", "push"]);
    }

    #[test]
    fn captures_stdout_of_successful_command() {
        let executor = LiveVcsExecutor::new("echo", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["hello"]);
        assert_eq!(executor.capture(&command).unwrap().trim(), "hello");
    }

    #[test]
    fn non_zero_exit_carries_code_and_stderr() {
        let executor = LiveVcsExecutor::new("sh", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["-c", "echo nope >&2; exit 3"]);
        let err = executor.capture(&command).unwrap_err();
        assert_eq!(err.code, 3);
        assert_eq!(err.message, "nope");
    }

    #[test]
    fn timeout_kills_child_with_sentinel_code() {
        let executor = LiveVcsExecutor::new("sleep", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["5"])
            .with_timeout(Some(Duration::from_millis(100)));
        let err = executor.capture(&command).unwrap_err();
        assert_eq!(err.code, KILLED_BY_SIGNAL);
        assert!(err.message.contains("timed out"));
    }

    /// Zombies count as gone: nothing may reap them inside a container.
    fn is_running(pid: &str) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| stat.rsplit_once(") ").map(|(_, rest)| !rest.starts_with('Z')))
            .unwrap_or(false)
    }

    #[test]
    fn timeout_kills_command_running_behind_the_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());
        // `env -u deploy sh -c ..` stands in for `sudo -u deploy git ..`; the
        // shell forks the long-running command the way sudo does.
        let executor = LiveVcsExecutor::new("sh", "env");
        let account = Account { name: "deploy".into(), uid: 1001, home: None };
        let command = VcsCommand::new(Path::new("/"), ["-c", script.as_str()])
            .as_user(Some(&account))
            .with_timeout(Some(Duration::from_millis(300)));

        let err = executor.capture(&command).unwrap_err();
        assert_eq!(err.code, KILLED_BY_SIGNAL);

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let gone_by = Instant::now() + Duration::from_secs(2);
        while is_running(pid) && Instant::now() < gone_by {
            thread::sleep(POLL_INTERVAL);
        }
        assert!(!is_running(pid), "sleep {pid} outlived the timeout");
    }

    #[test]
    fn background_process_holding_pipes_does_not_stall_capture() {
        let executor = LiveVcsExecutor::new("sh", "sudo");
        for timeout in [Some(Duration::from_secs(2)), None] {
            let command = VcsCommand::new(Path::new("/"), ["-c", "sleep 10 & echo hi"])
                .with_timeout(timeout);
            let started = Instant::now();
            assert_eq!(executor.capture(&command).unwrap(), "hi\n");
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }

    #[test]
    fn sub_second_timeouts_are_reported_exactly() {
        let err = timed_out("git fetch", Some(Duration::from_millis(300)));
        assert_eq!(err.message, "git fetch timed out after 300ms");
        assert_eq!(err.code, KILLED_BY_SIGNAL);
    }

    #[test]
    fn sigpipe_termination_is_tolerated() {
        let executor = LiveVcsExecutor::new("sh", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["-c", "kill -PIPE $$"]);
        assert!(executor.capture(&command).is_ok());
    }

    #[test]
    fn other_signals_are_negative_codes() {
        let executor = LiveVcsExecutor::new("sh", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["-c", "kill -TERM $$"]);
        let err = executor.capture(&command).unwrap_err();
        assert_eq!(err.code, -15);
    }

    #[test]
    fn missing_executable_is_127() {
        let executor = LiveVcsExecutor::new("gitward-no-such-binary", "sudo");
        let command = VcsCommand::new(Path::new("/"), ["status"]);
        assert_eq!(executor.capture(&command).unwrap_err().code, 127);
    }
}
