extern crate clap;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate libc;
extern crate t2inst;

mod errors;

use self::errors::T2instError;
use clap::{App, Arg, ArgMatches};
use t2inst::{
    partition_path, Config, FileSystem, Installer, LayoutOptions, Partitioning, Step,
    DEFAULT_TIMEOUT, KILL_SWITCH,
};

use std::io;
use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn app() -> App<'static, 'static> {
    App::new("t2inst")
        .about("Partitions, formats, and mounts a target for an Arch Linux install on T2 Macs")
        .arg(
            Arg::with_name("disk")
                .short("b")
                .long("block")
                .help(
                    "the device to partition automatically, such as /dev/nvme0n1, or the \
                     device which holds the partitions given by number to --efi and --root",
                )
                .takes_value(true),
        )
        .arg(
            Arg::with_name("filesystem")
                .short("f")
                .long("filesystem")
                .help("the file system of the root partition")
                .takes_value(true)
                .possible_values(&["ext4", "btrfs"])
                .default_value("ext4"),
        )
        .arg(Arg::with_name("no-lvm").long("no-lvm").help("format the root partition directly"))
        .arg(Arg::with_name("no-swap").long("no-swap").help("do not create a swap partition"))
        .arg(
            Arg::with_name("swap-size")
                .long("swap-size")
                .help("size of the swap partition, in MiB")
                .takes_value(true)
                .default_value("4096"),
        )
        .arg(
            Arg::with_name("efi")
                .long("efi")
                .help("an existing EFI partition to mount at /boot/efi, or its number on --block")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("root")
                .long("root")
                .help("an existing, formatted root partition, or its number on --block")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("swap")
                .long("swap")
                .help("an existing swap partition to activate, or its number on --block")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mount-root")
                .long("mount-root")
                .help("where the new system is mounted")
                .takes_value(true)
                .default_value("/mnt"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .help("seconds that any single command may run")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("exec")
                .long("exec")
                .help("runs a single command, streaming its output")
                .takes_value(true)
                .conflicts_with("unmount"),
        )
        .arg(
            Arg::with_name("chroot")
                .long("chroot")
                .help("runs the --exec command inside the mount root with arch-chroot")
                .requires("exec"),
        )
        .arg(
            Arg::with_name("unmount")
                .long("unmount")
                .help("unmounts the mount root and disables swap"),
        )
}

fn main() {
    let matches = app().get_matches();

    if let Err(err) = t2inst::log(|_level, _message| ()) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    let config = match configure(&matches) {
        Ok(config) => config,
        Err(why) => {
            eprintln!("t2inst: {}", why);
            exit(1);
        }
    };

    let mut installer = Installer::default();
    installer.on_output(|line| println!("{}", line));
    installer.on_error(|error| eprintln!("Error: {:?}", error));

    {
        let mut step_opt = None;
        installer.on_status(move |status| {
            if step_opt != Some(status.step) {
                step_opt = Some(status.step);
                println!("{}", match status.step {
                    Step::Init => "Initializing",
                    Step::Partition => "Partitioning disk",
                    Step::Format => "Creating file systems",
                    Step::Mount => "Mounting the new system",
                });
            }
        });
    }

    configure_signal_handling();

    if matches.is_present("unmount") {
        match installer.unmount(&config) {
            Ok(()) => exit(0),
            Err(why) => {
                eprintln!("t2inst: {}", why);
                exit(1);
            }
        }
    }

    if let Some(command) = matches.value_of("exec") {
        let result = if matches.is_present("chroot") {
            installer.execute_in_root(&config, command)
        } else {
            installer.execute(&config, command)
        };

        if let Some(ref failure) = result.failure {
            eprintln!("t2inst: {}", failure);
        }

        exit(if result.succeeded { 0 } else { result.exit_code.unwrap_or(1) });
    }

    let status = match installer.install(&config) {
        Ok(()) => {
            println!("install was successful");
            0
        }
        Err(err) => {
            println!("install failed: {}", err);
            1
        }
    };

    exit(status);
}

fn configure(matches: &ArgMatches) -> Result<Config, T2instError> {
    let mut config = Config::default();
    if !matches.is_present("exec") && !matches.is_present("unmount") {
        config.partitioning = partitioning(matches)?;
    }

    if let Some(root) = matches.value_of("mount-root") {
        config.mount_root = PathBuf::from(root);
    }

    config.timeout = match matches.value_of("timeout") {
        Some(secs) => Duration::from_secs(parse_number(secs)?),
        None => DEFAULT_TIMEOUT,
    };

    Ok(config)
}

fn partitioning(matches: &ArgMatches) -> Result<Partitioning, T2instError> {
    let disk = matches.value_of("disk").map(PathBuf::from);
    let part = |name: &str| {
        matches.value_of(name).map(|arg| partition_arg(disk.as_ref(), arg)).transpose()
    };

    let partitioning = match (part("efi")?, part("root")?) {
        (Some(efi), Some(root)) => Partitioning::Manual { efi, swap: part("swap")?, root },
        (None, None) if matches.value_of("swap").is_none() => match disk.clone() {
            Some(device) => Partitioning::Automatic { device, options: layout(matches)? },
            None => return Err(T2instError::NoBlockArg),
        },
        _ => return Err(T2instError::ManualArgs),
    };

    Ok(partitioning)
}

fn layout(matches: &ArgMatches) -> Result<LayoutOptions, T2instError> {
    let fs = matches.value_of("filesystem").unwrap_or("ext4");
    let filesystem = match fs.parse::<FileSystem>() {
        Ok(filesystem) if filesystem.is_supported_root() => filesystem,
        _ => return Err(T2instError::InvalidFileSystem { fs: fs.into() }),
    };

    Ok(LayoutOptions {
        include_swap: !matches.is_present("no-swap"),
        swap_mib: parse_number(matches.value_of("swap-size").unwrap_or("4096"))?,
        use_lvm: !matches.is_present("no-lvm"),
        filesystem,
    })
}

/// A partition given either as a path, or as a partition number on the `--block` device.
fn partition_arg(disk: Option<&PathBuf>, arg: &str) -> Result<PathBuf, T2instError> {
    match arg.parse::<u32>() {
        Ok(number) => match disk {
            Some(disk) => Ok(partition_path(disk, number)),
            None => Err(T2instError::NumberWithoutBlock { arg: arg.into() }),
        },
        Err(_) => Ok(PathBuf::from(arg)),
    }
}

fn parse_number(arg: &str) -> Result<u64, T2instError> {
    arg.parse::<u64>().map_err(|_| T2instError::ArgNaN { arg: arg.into() })
}

fn configure_signal_handling() {
    extern "C" fn handler(signal: i32) {
        match signal {
            libc::SIGINT => KILL_SWITCH.store(true, Ordering::SeqCst),
            _ => unreachable!(),
        }
    }

    if unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) == libc::SIG_ERR } {
        eprintln!("t2inst: signal handling error: {}", io::Error::last_os_error());
        exit(1);
    }
}
