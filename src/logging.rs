use dirs;
use fern;
use log::{Level, LevelFilter};
use std::{
    io,
    path::{Path, PathBuf},
};

const LOG_NAME: &str = "t2inst.log";

/// Where the log is written: `/tmp`, plus the Desktop of `home` if there is one,
/// or else `home` itself.
fn log_files(home: Option<&Path>) -> Vec<PathBuf> {
    let mut files = vec![Path::new("/tmp").join(LOG_NAME)];
    if let Some(home) = home {
        let desktop = home.join("Desktop");
        files.push(if desktop.is_dir() { desktop } else { home.to_path_buf() }.join(LOG_NAME));
    }

    files
}

/// Initialize logging with the fern logger
///
/// Every record goes to `callback` for the front end, and to stderr and the
/// log files as `[LEVEL t2inst:file:line] message`.
pub fn log<F: Fn(Level, &str) + Send + Sync + 'static>(callback: F) -> Result<(), fern::InitError> {
    let mut logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} t2inst{}] {}",
                record.level(),
                match (record.file(), record.line()) {
                    (Some(file), Some(line)) => format!(":{}:{}", file, line),
                    _ => "".into(),
                },
                message
            ))
        })
        .chain(io::stderr());

    for path in log_files(dirs::home_dir().as_ref().map(PathBuf::as_path)) {
        match fern::log_file(&path) {
            Ok(file) => logger = logger.chain(file),
            Err(why) => eprintln!("failed to create log file at {}: {}", path.display(), why),
        }
    }

    fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .chain(fern::Output::call(move |record| {
            callback(record.level(), &format!("{}", record.args()))
        }))
        .chain(logger)
        .apply()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn tmp_log_without_home() {
        assert_eq!(log_files(None), vec![PathBuf::from("/tmp/t2inst.log")]);
    }

    #[test]
    fn desktop_is_preferred_over_home() {
        let home = TempDir::new("t2inst-home").unwrap();
        assert_eq!(log_files(Some(home.path()))[1], home.path().join("t2inst.log"));

        fs::create_dir(home.path().join("Desktop")).unwrap();
        assert_eq!(log_files(Some(home.path())), vec![
            PathBuf::from("/tmp/t2inst.log"),
            home.path().join("Desktop/t2inst.log"),
        ]);
    }
}
