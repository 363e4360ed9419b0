use crate::{
    chroot::{line_buffered, Chroot},
    decoder::LineDecoder,
    pkgman::{LockCleanup, PackageManager, PacmanLock},
};
use std::{
    cmp, fmt,
    io::{self, Read},
    os::unix::process::{CommandExt, ExitStatusExt},
    process::{self, Child, ExitStatus, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError, Sender},
    },
    thread,
    time::{Duration, Instant},
};

/// Timeout applied to commands which do not ask for a different one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_CHUNK: usize = 4096;

/// A shell command to execute, on the host or inside the target root.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: String,
    pub timeout: Duration,
    pub chroot:  bool,
}

impl Request {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Request { command: command.into(), timeout: DEFAULT_TIMEOUT, chroot: false }
    }

    /// A command which will be executed within the target root.
    pub fn chroot<S: Into<String>>(command: S) -> Self {
        Request { chroot: true, ..Request::new(command) }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Why a command did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Spawn(String),
    Timeout(Duration),
    Cancelled,
    Read(String),
    Wait(String),
    Status(i32),
    Signal(i32),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Failure::Spawn(ref why) => write!(f, "failed to spawn process: {}", why),
            Failure::Timeout(timeout) => write!(f, "timed out after {}s", timeout.as_secs_f64()),
            Failure::Cancelled => f.write_str("cancelled"),
            Failure::Read(ref why) => write!(f, "failed to read output: {}", why),
            Failure::Wait(ref why) => write!(f, "failed to wait on process: {}", why),
            Failure::Status(code) => write!(f, "exited with status {}", code),
            Failure::Signal(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}

/// The outcome of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub succeeded: bool,
    pub exit_code: Option<i32>,
    pub output:    Vec<String>,
    pub failure:   Option<Failure>,
}

impl CommandResult {
    pub fn success(output: Vec<String>) -> Self {
        CommandResult { succeeded: true, exit_code: Some(0), output, failure: None }
    }

    pub fn failed(failure: Failure, output: Vec<String>) -> Self {
        let exit_code = match failure {
            Failure::Status(code) => Some(code),
            _ => None,
        };

        CommandResult { succeeded: false, exit_code, output, failure: Some(failure) }
    }
}

/// Anything which can carry out a `Request`.
pub trait Execute {
    fn run(&mut self, request: &Request) -> CommandResult;
}

#[derive(Clone, Copy, Debug)]
enum Stream {
    Stdout = 0,
    Stderr = 1,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        })
    }
}

enum Message {
    Data(Stream, Vec<u8>),
    Closed,
    Failed(Stream, io::Error),
}

type Readers = Vec<(Stream, Box<dyn Read + Send>)>;

/// Takes the output pipes of a freshly spawned child.
fn pipes(child: &mut Child) -> Readers {
    let mut readers: Readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push((Stream::Stdout, Box::new(stdout)));
    }

    if let Some(stderr) = child.stderr.take() {
        readers.push((Stream::Stderr, Box::new(stderr)));
    }

    readers
}

/// Executes shell commands as the leaders of their own process group, streaming
/// their output line by line to a sink.
///
/// When `execute` returns, the child has been reaped and its process group has been
/// sent `SIGKILL`, so nothing the command left behind in the background survives.
pub struct Runner<'a> {
    chroot:        Chroot,
    sink:          Box<dyn FnMut(&str) + 'a>,
    cleanup:       Box<dyn LockCleanup + 'a>,
    cancel:        Option<&'a AtomicBool>,
    poll:          Duration,
    line_buffered: bool,
    shell:         String,
}

impl<'a> Runner<'a> {
    pub fn new(chroot: Chroot) -> Self {
        let cleanup = PacmanLock::new(&chroot.path);
        Runner {
            chroot,
            sink: Box::new(|line: &str| info!("{}", line)),
            cleanup: Box::new(cleanup),
            cancel: None,
            poll: POLL_INTERVAL,
            line_buffered: true,
            shell: "sh".into(),
        }
    }

    /// Sets the callback that receives each line of output.
    pub fn on_line<F: FnMut(&str) + 'a>(mut self, sink: F) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replaces the action taken after a package manager command fails.
    pub fn lock_cleanup<L: LockCleanup + 'a>(mut self, cleanup: L) -> Self {
        self.cleanup = Box::new(cleanup);
        self
    }

    /// Commands are killed once this flag has been raised.
    pub fn cancel_on(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The longest time to wait on output before checking the deadline again.
    pub fn poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Whether commands are prefixed with `stdbuf` to line-buffer their output.
    pub fn line_buffered(mut self, enable: bool) -> Self {
        self.line_buffered = enable;
        self
    }

    pub fn shell<S: Into<String>>(mut self, shell: S) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn get_chroot(&self) -> &Chroot { &self.chroot }

    /// Executes a command on the host.
    pub fn execute(&mut self, command: &str, timeout: Duration) -> CommandResult {
        self.execute_with(command, timeout, pipes)
    }

    fn execute_with<F>(&mut self, command: &str, timeout: Duration, readers: F) -> CommandResult
    where
        F: FnOnce(&mut Child) -> Readers,
    {
        info!("running: {}", command);
        let manager = PackageManager::detect(command);

        let result = match self.spawn(command) {
            Ok(mut child) => {
                let readers = readers(&mut child);
                self.supervise(child, readers, timeout)
            }
            Err(why) => CommandResult::failed(Failure::Spawn(why.to_string()), Vec::new()),
        };

        if let Some(ref failure) = result.failure {
            error!("command {}: {}", failure, command);
            if let Some(manager) = manager {
                if let Err(why) = self.cleanup.cleanup(manager) {
                    warn!("failed to clean up after {}: {}", manager.keyword(), why);
                }
            }
        }

        result
    }

    /// Executes a command within the target root.
    pub fn execute_in_root(&mut self, inner: &str, timeout: Duration) -> CommandResult {
        let command = self.chroot.wrap(inner);
        self.execute(&command, timeout)
    }

    fn spawn(&self, command: &str) -> io::Result<Child> {
        let command =
            if self.line_buffered { line_buffered(command) } else { command.to_owned() };

        let mut cmd = cascade! {
            process::Command::new(&self.shell);
            ..arg("-c");
            ..arg(command);
            ..stdin(Stdio::null());
            ..stdout(Stdio::piped());
            ..stderr(Stdio::piped());
        };

        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() < 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        cmd.spawn()
    }

    fn supervise(
        &mut self,
        mut child: Child,
        readers: Readers,
        timeout: Duration,
    ) -> CommandResult {
        // A timeout too large to represent is no deadline at all.
        let deadline = Instant::now().checked_add(timeout);
        let (tx, rx) = mpsc::channel();

        let mut open = readers.len();
        for (stream, reader) in readers {
            read_stream(stream, reader, tx.clone());
        }

        drop(tx);

        let mut decoders = [LineDecoder::new(), LineDecoder::new()];
        let mut output = Vec::new();

        let mut interrupted = None;
        while open != 0 {
            if let Some(failure) = self.expired(deadline, timeout) {
                interrupted = Some(failure);
                break;
            }

            match rx.recv_timeout(self.slice(deadline)) {
                Ok(Message::Data(stream, bytes)) => {
                    let sink = &mut self.sink;
                    decoders[stream as usize].push(&bytes, |line| forward(sink, &mut output, line));
                }
                Ok(Message::Closed) => open -= 1,
                Ok(Message::Failed(stream, why)) => {
                    interrupted = Some(Failure::Read(format!("{}: {}", stream, why)));
                    break;
                }
                Err(RecvTimeoutError::Timeout) => (),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let failure = match interrupted {
            Some(failure) => {
                terminate(&mut child);

                // Forward whatever was read before the group was killed.
                while let Ok(message) = rx.try_recv() {
                    if let Message::Data(stream, bytes) = message {
                        let sink = &mut self.sink;
                        decoders[stream as usize]
                            .push(&bytes, |line| forward(sink, &mut output, line));
                    }
                }

                Some(failure)
            }
            None => match self.wait(&mut child, deadline, timeout) {
                Ok(status) => {
                    // The leader is gone, but anything it forked may still be running.
                    kill_group(&mut child);
                    status_failure(status)
                }
                Err(failure) => {
                    terminate(&mut child);
                    Some(failure)
                }
            },
        };

        for decoder in &mut decoders {
            let sink = &mut self.sink;
            decoder.finish(|line| forward(sink, &mut output, line));
        }

        match failure {
            Some(failure) => CommandResult::failed(failure, output),
            None => CommandResult::success(output),
        }
    }

    /// Waits for the child to exit after its output streams have closed.
    fn wait(
        &self,
        child: &mut Child,
        deadline: Option<Instant>,
        timeout: Duration,
    ) -> Result<ExitStatus, Failure> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => (),
                Err(why) => return Err(Failure::Wait(why.to_string())),
            }

            if let Some(failure) = self.expired(deadline, timeout) {
                return Err(failure);
            }

            thread::sleep(self.slice(deadline));
        }
    }

    /// How long to block before checking the deadline and cancel flag again.
    fn slice(&self, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(deadline) => {
                cmp::min(self.poll, deadline.saturating_duration_since(Instant::now()))
            }
            None => self.poll,
        }
    }

    fn expired(&self, deadline: Option<Instant>, timeout: Duration) -> Option<Failure> {
        if self.cancel.map_or(false, |flag| flag.load(Ordering::SeqCst)) {
            Some(Failure::Cancelled)
        } else if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            Some(Failure::Timeout(timeout))
        } else {
            None
        }
    }
}

impl<'a> Execute for Runner<'a> {
    fn run(&mut self, request: &Request) -> CommandResult {
        if request.chroot {
            self.execute_in_root(&request.command, request.timeout)
        } else {
            self.execute(&request.command, request.timeout)
        }
    }
}

fn forward(sink: &mut Box<dyn FnMut(&str) + '_>, output: &mut Vec<String>, line: &str) {
    sink(line);
    output.push(line.to_owned());
}

fn read_stream(stream: Stream, mut reader: Box<dyn Read + Send>, tx: Sender<Message>) {
    thread::spawn(move || {
        let mut buffer = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => {
                    let _ = tx.send(Message::Closed);
                    break;
                }
                Ok(read) => {
                    if tx.send(Message::Data(stream, buffer[..read].to_vec())).is_err() {
                        break;
                    }
                }
                Err(ref why) if why.kind() == io::ErrorKind::Interrupted => continue,
                Err(why) => {
                    let _ = tx.send(Message::Failed(stream, why));
                    break;
                }
            }
        }
    });
}

/// Sends `SIGKILL` to every process in the child's group.
///
/// A group that no longer exists is not an error.
fn kill_group(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } < 0 {
        let why = io::Error::last_os_error();
        if why.raw_os_error() != Some(libc::ESRCH) {
            warn!("failed to kill process group {}: {}", pgid, why);
            let _ = child.kill();
        }
    }
}

/// Kills every process in the child's group, then reaps the child.
fn terminate(child: &mut Child) {
    kill_group(child);
    if let Err(why) = child.wait() {
        warn!("failed to reap process {}: {}", child.id(), why);
    }
}

fn status_failure(status: ExitStatus) -> Option<Failure> {
    if status.success() {
        None
    } else if let Some(code) = status.code() {
        Some(Failure::Status(code))
    } else {
        Some(Failure::Signal(status.signal().unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        fs,
        path::{Path, PathBuf},
        rc::Rc,
    };
    use tempdir::TempDir;

    struct Counter(Rc<Cell<usize>>);

    impl LockCleanup for Counter {
        fn cleanup(&mut self, _manager: PackageManager) -> io::Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    fn runner<'a>() -> Runner<'a> {
        Runner::new(Chroot::new("/nonexistent")).line_buffered(false)
    }

    fn is_running(pid: u32) -> bool {
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            // The state follows the parenthesized command name; zombies are not running.
            Ok(stat) => stat
                .rfind(')')
                .and_then(|pos| stat[pos + 1..].split_whitespace().next())
                .map_or(false, |state| state != "Z" && state != "X"),
            Err(_) => false,
        }
    }

    fn read_pid(path: &Path) -> u32 {
        for _ in 0..100 {
            if let Ok(pid) = fs::read_to_string(path) {
                if let Ok(pid) = pid.trim().parse() {
                    return pid;
                }
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("pid file was never written");
    }

    fn assert_dies(pid: u32) {
        let mut alive = true;
        for _ in 0..100 {
            alive = is_running(pid);
            if !alive {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!alive, "background process {} outlived its command", pid);
    }

    /// Fails to read as soon as the command has written its pid file.
    struct Broken(PathBuf);

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            read_pid(&self.0);
            Err(io::Error::new(io::ErrorKind::Other, "device vanished"))
        }
    }

    #[test]
    fn streams_lines_and_succeeds() {
        let mut lines = Vec::new();
        let result = runner()
            .on_line(|line| lines.push(line.to_owned()))
            .execute("echo one; echo two 1>&2; printf 'three'", Duration::from_secs(10));

        assert!(result.succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.failure, None);

        lines.sort();
        assert_eq!(lines, vec!["one", "three", "two"]);
    }

    #[test]
    fn output_arrives_before_completion() {
        let start = Instant::now();
        let mut seen = Vec::new();
        let result = runner()
            .on_line(|line| seen.push((line.to_owned(), start.elapsed())))
            .execute("echo first; sleep 1; echo second", Duration::from_secs(10));

        assert!(result.succeeded);
        assert_eq!(seen.len(), 2);
        assert!(seen[1].1 - seen[0].1 >= Duration::from_millis(500));
    }

    #[test]
    fn nonzero_exit_is_reported() {
        let result = runner().execute("echo failing; exit 3", Duration::from_secs(10));
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.failure, Some(Failure::Status(3)));
        assert_eq!(result.output, vec!["failing"]);
    }

    #[test]
    fn timeout_kills_the_whole_group() {
        let dir = TempDir::new("t2inst-runner").unwrap();
        let pidfile = dir.path().join("pid");
        let command = format!("sleep 30 & echo $! > {}; wait", pidfile.display());

        let start = Instant::now();
        let result = runner().execute(&command, Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_secs(10));

        assert!(!result.succeeded);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.failure, Some(Failure::Timeout(Duration::from_millis(500))));

        assert_dies(read_pid(&pidfile));
    }

    #[test]
    fn background_helpers_die_with_the_command() {
        let dir = TempDir::new("t2inst-runner").unwrap();
        for (last, succeeded) in &[("exit 3", false), ("true", true)] {
            let pidfile = dir.path().join(format!("pid-{}", succeeded));
            let command = format!(
                "sleep 30 >/dev/null 2>&1 & echo $! > {}; {}",
                pidfile.display(),
                last
            );

            let result = runner().execute(&command, Duration::from_secs(10));
            assert_eq!(result.succeeded, *succeeded);
            assert_dies(read_pid(&pidfile));
        }
    }

    #[test]
    fn oversized_timeout_means_no_deadline() {
        let result = runner().execute("echo done", Duration::from_secs(u64::MAX));
        assert!(result.succeeded);
        assert_eq!(result.output, vec!["done"]);
    }

    #[test]
    fn read_failure_kills_the_group_and_cleans_up() {
        let dir = TempDir::new("t2inst-runner").unwrap();
        let pidfile = dir.path().join("pid");
        let command = format!(": pacman; sleep 30 & echo $! > {}; wait", pidfile.display());

        let count = Rc::new(Cell::new(0));
        let broken = pidfile.clone();
        let start = Instant::now();
        let result = runner().lock_cleanup(Counter(count.clone())).execute_with(
            &command,
            Duration::from_secs(60),
            move |child| {
                let mut readers = pipes(child);
                readers[0].1 = Box::new(Broken(broken));
                readers
            },
        );

        assert!(start.elapsed() < Duration::from_secs(30));
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, None);
        assert_eq!(result.failure, Some(Failure::Read("stdout: device vanished".into())));
        assert_eq!(count.get(), 1);
        assert_dies(read_pid(&pidfile));
    }

    #[test]
    fn deadline_applies_after_output_closes() {
        let start = Instant::now();
        let result = runner().execute("exec >&- 2>&-; sleep 30", Duration::from_millis(300));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(result.failure, Some(Failure::Timeout(Duration::from_millis(300))));
    }

    #[test]
    fn cancellation_kills_the_command() {
        let flag = AtomicBool::new(false);
        let start = Instant::now();
        let result = thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(200));
                flag.store(true, Ordering::SeqCst);
            });

            runner().cancel_on(&flag).execute("sleep 30", Duration::from_secs(60))
        });

        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(result.failure, Some(Failure::Cancelled));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let result = runner().shell("/nonexistent/shell").execute("true", DEFAULT_TIMEOUT);
        assert!(!result.succeeded);
        match result.failure {
            Some(Failure::Spawn(_)) => (),
            other => panic!("expected a spawn failure, got {:?}", other),
        }
    }

    #[test]
    fn spawn_failure_cleans_up_after_package_managers() {
        let count = Rc::new(Cell::new(0));
        let result = runner()
            .shell("/nonexistent/shell")
            .lock_cleanup(Counter(count.clone()))
            .execute("pacman -Sy", DEFAULT_TIMEOUT);

        assert!(!result.succeeded);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn package_manager_failure_cleans_up_once() {
        let count = Rc::new(Cell::new(0));
        let mut runner = runner().lock_cleanup(Counter(count.clone()));

        assert!(!runner.execute("echo pacman -Sy; exit 1", Duration::from_secs(10)).succeeded);
        assert_eq!(count.get(), 1);

        assert!(!runner.execute(": PACSTRAP; sleep 30", Duration::from_millis(300)).succeeded);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn no_cleanup_for_successes_or_other_commands() {
        let count = Rc::new(Cell::new(0));
        let mut runner = runner().lock_cleanup(Counter(count.clone()));

        assert!(runner.execute("echo pacman", Duration::from_secs(10)).succeeded);
        assert!(!runner.execute("exit 1", Duration::from_secs(10)).succeeded);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn default_cleanup_removes_the_lock_in_the_target_root() {
        let root = TempDir::new("t2inst-root").unwrap();
        let lock = PacmanLock::new(root.path()).path();
        fs::create_dir_all(lock.parent().unwrap()).unwrap();
        fs::write(&lock, b"").unwrap();

        let result = Runner::new(Chroot::new(root.path()))
            .line_buffered(false)
            .execute("false pacman -S plymouth", Duration::from_secs(10));

        assert!(!result.succeeded);
        assert!(!lock.exists());
    }

    #[test]
    fn requests_default_to_the_host() {
        let request = Request::new("lsblk");
        assert!(!request.chroot);
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);

        let request = Request::chroot("mkinitcpio -P").timeout(Duration::from_secs(600));
        assert!(request.chroot);
        assert_eq!(request.timeout, Duration::from_secs(600));
    }
}
