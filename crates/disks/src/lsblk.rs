use crate::{error::InspectError, Inspect};
use disk_types::Partition;
use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

const COLUMNS: &str = "NAME,KNAME,SIZE,START,PARTTYPE,FSTYPE";

#[derive(Deserialize)]
struct Report {
    #[serde(default)]
    blockdevices: Vec<BlockDevice>,
}

#[derive(Deserialize)]
struct BlockDevice {
    name:     String,
    #[serde(default)]
    kname:    Option<String>,
    #[serde(default)]
    size:     Option<Number>,
    #[serde(default)]
    start:    Option<Number>,
    #[serde(default)]
    parttype: Option<String>,
    #[serde(default)]
    fstype:   Option<String>,
    #[serde(default)]
    children: Vec<BlockDevice>,
}

/// Older releases of lsblk report every column as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Text(String),
}

impl Number {
    fn value(&self) -> u64 {
        match *self {
            Number::Int(value) => value,
            Number::Text(ref value) => value.trim().parse().unwrap_or(0),
        }
    }
}

impl BlockDevice {
    fn is(&self, device: &Path) -> bool {
        let dev = Path::new("/dev");
        device == Path::new(&self.name)
            || device == dev.join(&self.name)
            || self.kname.as_ref().map_or(false, |kname| {
                device == Path::new(kname) || device == dev.join(kname)
            })
    }

    fn into_partition(self) -> Partition {
        let lower = |value: Option<String>| value.unwrap_or_default().to_lowercase();
        Partition {
            device_path:    PathBuf::from("/dev").join(&self.name),
            name:           self.name,
            size:           self.size.as_ref().map_or(0, Number::value),
            start:          self.start.as_ref().map_or(0, Number::value),
            partition_type: lower(self.parttype),
            filesystem:     lower(self.fstype),
        }
    }
}

/// Parses the JSON report of `lsblk -bJ` into the partitions of `device`, sorted by
/// their start offset.
pub fn parse_partitions(json: &str, device: &Path) -> Result<Vec<Partition>, InspectError> {
    let report: Report = serde_json::from_str(json)
        .map_err(|why| InspectError::Parse { device: device.to_path_buf(), why })?;

    let disk = report
        .blockdevices
        .into_iter()
        .find(|dev| dev.is(device))
        .ok_or_else(|| InspectError::DeviceNotFound { device: device.to_path_buf() })?;

    let mut partitions =
        disk.children.into_iter().map(BlockDevice::into_partition).collect::<Vec<_>>();
    partitions.sort_by_key(|part| part.start);
    Ok(partitions)
}

/// Inspects block devices with `lsblk`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lsblk;

impl Inspect for Lsblk {
    fn list_partitions(&self, device: &Path) -> Result<Vec<Partition>, InspectError> {
        info!("probing partitions on {}", device.display());
        let output = Command::new("lsblk")
            .args(&["-bJ", "-o", COLUMNS])
            .arg(device)
            .stdin(Stdio::null())
            .output()
            .map_err(|why| InspectError::Spawn { device: device.to_path_buf(), why })?;

        if !output.status.success() {
            return Err(InspectError::Status {
                device: device.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let partitions = parse_partitions(&String::from_utf8_lossy(&output.stdout), device)?;
        for part in &partitions {
            debug!(
                "{}: start {} size {} type '{}' fs '{}'",
                part.name, part.start, part.size, part.partition_type, part.filesystem
            );
        }

        Ok(partitions)
    }
}
