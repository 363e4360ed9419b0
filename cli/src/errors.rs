#[derive(Debug, Fail)]
pub(crate) enum T2instError {
    #[fail(display = "no block argument provided; pass --block, or --efi with --root")]
    NoBlockArg,
    #[fail(display = "manual partitioning requires both --efi and --root")]
    ManualArgs,
    #[fail(display = "partition number '{}' needs a --block device", arg)]
    NumberWithoutBlock { arg: String },
    #[fail(display = "argument '{}' is not a number", arg)]
    ArgNaN { arg: String },
    #[fail(display = "provided file system, '{}', was invalid. Must be either 'ext4' or \
                      'btrfs'.", fs)]
    InvalidFileSystem { fs: String },
}
