//! Linux adapter enumeration from sysfs.
//!
//! Each directory under `/sys/class/net` is one interface. The attributes
//! read are:
//!
//! | File | Used for |
//! |------|----------|
//! | `type` | ARPHRD hardware type → [`InterfaceType`] |
//! | `wireless`, `phy80211` | Presence marks an Ethernet-framed Wi-Fi device |
//! | `operstate` | [`OperStatus`] |
//! | `ifindex` | IPv4 binding index |
//! | `device/driver` | Driver name, used as the description |
//!
//! IPv4 is considered bound when `/proc/sys/net/ipv4/conf/<name>` exists.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::network::{AdapterDescriptor, AdapterFetcher, FetchError, InterfaceType, OperStatus};

// ARPHRD_* values from `linux/if_arp.h`.
const ARPHRD_ETHER: u32 = 1;
const ARPHRD_PPP: u32 = 512;
const ARPHRD_TUNNEL: u32 = 768;
const ARPHRD_TUNNEL6: u32 = 769;
const ARPHRD_LOOPBACK: u32 = 772;
const ARPHRD_SIT: u32 = 776;
const ARPHRD_IPGRE: u32 = 778;
const ARPHRD_IEEE80211: u32 = 801;
const ARPHRD_IP6GRE: u32 = 823;
const ARPHRD_NONE: u32 = 65534;

/// Linux implementation of [`AdapterFetcher`] backed by sysfs and procfs.
///
/// The roots are configurable so the parser can be exercised against a
/// fabricated tree.
///
/// # Example
///
/// ```no_run
/// use nicwatch::network::{AdapterFetcher, platform::SysfsFetcher};
///
/// let adapters = SysfsFetcher::new().fetch().expect("Failed to fetch adapters");
/// for adapter in adapters {
///     println!("{}: {:?} {}", adapter.name, adapter.if_type, adapter.status);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SysfsFetcher {
    sys_root: PathBuf,
    proc_root: PathBuf,
}

impl SysfsFetcher {
    /// Creates a fetcher reading `/sys` and `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_roots("/sys", "/proc")
    }

    /// Creates a fetcher reading from the given sysfs and procfs roots.
    #[must_use]
    pub fn with_roots(sys_root: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            sys_root: sys_root.into(),
            proc_root: proc_root.into(),
        }
    }

    fn read_interface(&self, dir: &Path, name: &str) -> AdapterDescriptor {
        let if_type = read_attr(dir, "type")
            .and_then(|raw| raw.parse::<u32>().ok())
            .map_or(InterfaceType::Unknown, |code| {
                map_arphrd(code, is_wireless(dir))
            });

        let status = read_attr(dir, "operstate")
            .as_deref()
            .map_or(OperStatus::Unknown, map_operstate);

        let ipv4_bound = self
            .proc_root
            .join("sys/net/ipv4/conf")
            .join(name)
            .is_dir();
        let ipv4_index = ipv4_bound
            .then(|| read_attr(dir, "ifindex").and_then(|raw| raw.parse::<u32>().ok()))
            .flatten();

        AdapterDescriptor::new(name, name, if_type)
            .with_description(describe(dir, name))
            .with_status(status)
            .with_ipv4_index(ipv4_index)
    }
}

impl Default for SysfsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterFetcher for SysfsFetcher {
    fn fetch(&self) -> Result<Vec<AdapterDescriptor>, FetchError> {
        let class_dir = self.sys_root.join("class/net");
        let entries = fs::read_dir(&class_dir).map_err(|source| io_error(&class_dir, source))?;

        let mut adapters = Vec::new();
        for entry in entries {
            // An interface removed mid-iteration shows up as an entry error.
            let Ok(entry) = entry else { continue };
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            adapters.push(self.read_interface(&entry.path(), &name));
        }

        Ok(adapters)
    }
}

fn io_error(path: &Path, source: io::Error) -> FetchError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => FetchError::PermissionDenied {
            context: format!("reading {}", path.display()),
        },
        // The stack is being reconfigured; the directory reappears shortly.
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => {
            FetchError::transient(source.to_string())
        }
        _ => FetchError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Reads a trimmed attribute, treating any failure as "unavailable".
fn read_attr(dir: &Path, attr: &str) -> Option<String> {
    fs::read_to_string(dir.join(attr))
        .ok()
        .map(|raw| raw.trim().to_string())
}

fn is_wireless(dir: &Path) -> bool {
    dir.join("wireless").exists() || dir.join("phy80211").exists()
}

/// Driver name, or a generic label for software devices without one.
fn describe(dir: &Path, name: &str) -> String {
    if let Some(driver) = fs::read_link(dir.join("device/driver"))
        .ok()
        .and_then(|target| target.file_name()?.to_str().map(str::to_string))
    {
        return driver;
    }

    let is_software = fs::canonicalize(dir)
        .is_ok_and(|real| real.components().any(|c| c.as_os_str() == "virtual"));
    if is_software {
        format!("Virtual network device ({name})")
    } else {
        String::new()
    }
}

const fn map_arphrd(code: u32, wireless: bool) -> InterfaceType {
    match code {
        ARPHRD_ETHER if wireless => InterfaceType::Wireless,
        ARPHRD_ETHER => InterfaceType::Ethernet,
        ARPHRD_IEEE80211 => InterfaceType::Wireless,
        ARPHRD_LOOPBACK => InterfaceType::Loopback,
        ARPHRD_PPP => InterfaceType::Ppp,
        ARPHRD_TUNNEL | ARPHRD_TUNNEL6 | ARPHRD_SIT | ARPHRD_IPGRE | ARPHRD_IP6GRE => {
            InterfaceType::Tunnel
        }
        // tun devices carry no link-layer header.
        ARPHRD_NONE => InterfaceType::PropVirtual,
        other => InterfaceType::Other(other),
    }
}

fn map_operstate(state: &str) -> OperStatus {
    match state {
        "up" => OperStatus::Up,
        "down" | "lowerlayerdown" | "notpresent" | "dormant" => OperStatus::Down,
        _ => OperStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    /// Builds a fake `/sys` + `/proc` tree.
    struct FakeHost {
        root: TempDir,
    }

    impl FakeHost {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            fs::create_dir_all(root.path().join("sys/class/net")).unwrap();
            fs::create_dir_all(root.path().join("sys/devices/virtual/net")).unwrap();
            fs::create_dir_all(root.path().join("sys/devices/pci0000:00/net")).unwrap();
            fs::create_dir_all(root.path().join("sys/bus/pci/drivers")).unwrap();
            fs::create_dir_all(root.path().join("proc/sys/net/ipv4/conf")).unwrap();
            Self { root }
        }

        fn fetcher(&self) -> SysfsFetcher {
            SysfsFetcher::with_roots(self.root.path().join("sys"), self.root.path().join("proc"))
        }

        fn add(
            &self,
            name: &str,
            arphrd: u32,
            operstate: &str,
            ifindex: u32,
            software: bool,
        ) -> PathBuf {
            let parent = if software { "virtual" } else { "pci0000:00" };
            let real = self.root.path().join(format!("sys/devices/{parent}/net/{name}"));
            fs::create_dir_all(&real).unwrap();
            fs::write(real.join("type"), format!("{arphrd}\n")).unwrap();
            fs::write(real.join("operstate"), format!("{operstate}\n")).unwrap();
            fs::write(real.join("ifindex"), format!("{ifindex}\n")).unwrap();
            symlink(&real, self.root.path().join("sys/class/net").join(name)).unwrap();
            real
        }

        fn bind_ipv4(&self, name: &str) {
            fs::create_dir_all(self.root.path().join("proc/sys/net/ipv4/conf").join(name)).unwrap();
        }

        fn set_driver(&self, real: &Path, driver: &str) {
            let driver_dir = self.root.path().join("sys/bus/pci/drivers").join(driver);
            fs::create_dir_all(&driver_dir).unwrap();
            fs::create_dir_all(real.join("device")).unwrap();
            symlink(driver_dir, real.join("device/driver")).unwrap();
        }
    }

    fn by_name<'a>(adapters: &'a [AdapterDescriptor], name: &str) -> &'a AdapterDescriptor {
        adapters.iter().find(|a| a.name == name).unwrap()
    }

    #[test]
    fn reads_physical_ethernet() {
        let host = FakeHost::new();
        let real = host.add("enp3s0", ARPHRD_ETHER, "up", 2, false);
        host.set_driver(&real, "r8169");
        host.bind_ipv4("enp3s0");

        let adapters = host.fetcher().fetch().unwrap();
        let nic = by_name(&adapters, "enp3s0");

        assert_eq!(nic.id.as_str(), "enp3s0");
        assert_eq!(nic.if_type, InterfaceType::Ethernet);
        assert_eq!(nic.status, OperStatus::Up);
        assert_eq!(nic.ipv4_index, Some(2));
        assert_eq!(nic.description, "r8169");
    }

    #[test]
    fn wireless_directory_marks_wifi() {
        let host = FakeHost::new();
        let real = host.add("wlp2s0", ARPHRD_ETHER, "dormant", 3, false);
        fs::create_dir_all(real.join("wireless")).unwrap();

        let adapters = host.fetcher().fetch().unwrap();
        let wifi = by_name(&adapters, "wlp2s0");

        assert_eq!(wifi.if_type, InterfaceType::Wireless);
        assert_eq!(wifi.status, OperStatus::Down);
        assert_eq!(wifi.ipv4_index, None);
    }

    #[test]
    fn software_devices_get_virtual_description() {
        let host = FakeHost::new();
        host.add("docker0", ARPHRD_ETHER, "down", 4, true);
        host.add("lo", ARPHRD_LOOPBACK, "unknown", 1, true);
        host.add("tun0", ARPHRD_NONE, "unknown", 5, true);

        let adapters = host.fetcher().fetch().unwrap();

        assert_eq!(
            by_name(&adapters, "docker0").description,
            "Virtual network device (docker0)"
        );
        assert_eq!(by_name(&adapters, "lo").if_type, InterfaceType::Loopback);
        assert_eq!(by_name(&adapters, "lo").status, OperStatus::Unknown);
        assert_eq!(by_name(&adapters, "tun0").if_type, InterfaceType::PropVirtual);
    }

    #[test]
    fn unreadable_type_is_unknown() {
        let host = FakeHost::new();
        let real = host.add("odd0", ARPHRD_ETHER, "up", 9, false);
        fs::write(real.join("type"), "garbage").unwrap();

        let adapters = host.fetcher().fetch().unwrap();

        assert_eq!(by_name(&adapters, "odd0").if_type, InterfaceType::Unknown);
    }

    #[test]
    fn missing_class_dir_is_io_error() {
        let root = TempDir::new().unwrap();
        let fetcher = SysfsFetcher::with_roots(root.path().join("nope"), root.path());

        let error = fetcher.fetch().unwrap_err();

        assert!(matches!(error, FetchError::Io { .. }));
        assert!(!error.is_transient());
    }

    #[test]
    fn map_arphrd_tunnels() {
        for code in [ARPHRD_TUNNEL, ARPHRD_TUNNEL6, ARPHRD_SIT, ARPHRD_IPGRE, ARPHRD_IP6GRE] {
            assert_eq!(map_arphrd(code, false), InterfaceType::Tunnel);
        }
        assert_eq!(map_arphrd(ARPHRD_PPP, false), InterfaceType::Ppp);
        assert_eq!(map_arphrd(ARPHRD_IEEE80211, false), InterfaceType::Wireless);
        assert_eq!(map_arphrd(280, false), InterfaceType::Other(280));
    }
}
