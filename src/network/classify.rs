//! Adapter classification policies.
//!
//! This module decides which adapters are worth exposing as monitorable
//! hardware.
//!
//! # Design
//!
//! - **Eligibility**: [`is_eligible_type`] is a hard exclusion by interface
//!   type (loopback, tunnel, unknown) applied regardless of strict mode.
//! - **Physical policies**: [`PhysicalPolicy`] is a pure predicate with two
//!   strategies, [`BindingPolicy`] and [`NamePolicy`]. They rely on different
//!   signals and disagree on some adapters; neither is authoritative, so they
//!   are composed explicitly with [`PolicyChain`] rather than merged.
//! - **Tables**: every keyword the heuristics look for lives in a documented
//!   constant table and is matched through a case-normalized [`KeywordTable`].

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use super::{AdapterDescriptor, InterfaceType};

// ============================================================================
// Keyword tables
// ============================================================================

/// Description fragments that identify hypervisor and container adapters.
///
/// Used by [`BindingPolicy`].
pub const VIRTUALIZATION_KEYWORDS: &[&str] = &[
    "virtual",
    "vmware",
    "virtualbox",
    "hyper-v",
    "vethernet",
    "docker",
    "wsl",
    "parallels",
    "qemu",
    "kvm",
    "xen",
    "container",
];

/// Description fragments naming VPN, tunnel and virtualization products.
///
/// Used by [`NamePolicy`].
pub const VPN_PRODUCT_KEYWORDS: &[&str] = &[
    "vpn",
    "tap-windows",
    "tap-",
    "wintun",
    "wireguard",
    "openvpn",
    "hamachi",
    "zerotier",
    "tailscale",
    "nordlynx",
    "fortinet",
    "cisco anyconnect",
    "pangp",
    "juniper",
    "sonicwall",
    "check point",
    "teredo",
    "isatap",
    "6to4",
    "miniport",
    "pseudo-interface",
    "virtual",
    "vmware",
    "virtualbox",
    "hyper-v",
];

/// Qualifiers NDIS appends to a base adapter name for filter-chain entries.
///
/// Filter pseudo-adapters are named `<base>-<qualifier...>-NNNN`, for example
/// `Ethernet-WFP Native MAC Layer LightWeight Filter-0000`.
pub const NDIS_FILTER_QUALIFIERS: &[&str] = &[
    "WFP",
    "QoS Packet Scheduler",
    "Npcap",
    "Native WiFi Filter",
    "Virtual WiFi Filter",
    "Kaspersky",
    "VirtualBox NDIS",
    "Packet Scheduler",
    "LightWeight Filter",
    "Filter Driver",
];

/// A case-insensitive list of substrings.
///
/// Keywords are lowercased once at construction; matching lowercases the
/// candidate text, so `"Hyper-V"` and `"HYPER-V"` hit the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    keywords: Vec<String>,
}

impl KeywordTable {
    /// Creates a table from any list of keywords. Empty entries are dropped.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        table.extend(keywords);
        table
    }

    /// Adds keywords to the table.
    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );
    }

    /// Returns the first keyword contained in `text`, if any.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Returns true if any keyword is contained in `text`.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Returns the number of keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Returns true if the table holds no keywords.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// Returns false for interface types that can never be monitorable hardware.
///
/// Loopback, tunnel and unknown-type interfaces are excluded unconditionally.
#[must_use]
pub const fn is_eligible_type(adapter: &AdapterDescriptor) -> bool {
    !matches!(
        adapter.if_type,
        InterfaceType::Loopback | InterfaceType::Tunnel | InterfaceType::Unknown
    )
}

// ============================================================================
// PhysicalPolicy
// ============================================================================

/// Decides whether an eligible adapter is genuine physical hardware.
///
/// Implementations must be pure: the same descriptor always yields the same
/// answer, independent of call order.
///
/// # Thread Safety
///
/// Policies must be `Send + Sync`; the snapshot provider is shared between
/// the construction path and the change notifier task.
pub trait PhysicalPolicy: Send + Sync {
    /// Returns `true` if the adapter is physical, `false` to filter it out.
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool;

    /// Short name used in logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Binding-based heuristic.
///
/// Rejects an adapter when:
/// - it has no IPv4 binding index (filter-layer pseudo-adapter),
/// - its type is [`InterfaceType::PropVirtual`] (TAP/TUN VPN drivers),
/// - its description contains a [`VIRTUALIZATION_KEYWORDS`] entry.
///
/// # Examples
///
/// ```
/// use nicwatch::network::classify::{BindingPolicy, PhysicalPolicy};
/// use nicwatch::network::{AdapterDescriptor, InterfaceType};
///
/// let policy = BindingPolicy::new();
///
/// let nic = AdapterDescriptor::new("1", "Ethernet", InterfaceType::Ethernet)
///     .with_description("Realtek PCIe GbE Family Controller")
///     .with_ipv4_index(Some(12));
/// let filter = AdapterDescriptor::new("2", "Ethernet-WFP-0000", InterfaceType::Ethernet);
///
/// assert!(policy.is_physical(&nic));
/// assert!(!policy.is_physical(&filter));
/// ```
#[derive(Debug, Clone)]
pub struct BindingPolicy {
    keywords: KeywordTable,
}

impl BindingPolicy {
    /// Creates the policy with the built-in virtualization keywords.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keywords: KeywordTable::new(VIRTUALIZATION_KEYWORDS),
        }
    }

    /// Adds description keywords to the denylist.
    #[must_use]
    pub fn with_extra_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(keywords);
        self
    }

    /// Returns the description denylist.
    #[must_use]
    pub const fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }
}

impl Default for BindingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalPolicy for BindingPolicy {
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool {
        if !adapter.has_ipv4_binding() {
            tracing::trace!("{}: no IPv4 binding, treated as filter adapter", adapter.id);
            return false;
        }
        if adapter.if_type == InterfaceType::PropVirtual {
            tracing::trace!("{}: proprietary virtual interface type", adapter.id);
            return false;
        }
        if let Some(keyword) = self.keywords.find(&adapter.description) {
            tracing::trace!("{}: description matches '{keyword}'", adapter.id);
            return false;
        }
        true
    }

    fn name(&self) -> &'static str {
        "binding"
    }
}

/// Name/description heuristic.
///
/// Rejects an adapter when:
/// - its name follows the NDIS filter-chain convention built from
///   [`NDIS_FILTER_QUALIFIERS`], or matches a user-supplied pattern,
/// - its description contains a [`VPN_PRODUCT_KEYWORDS`] entry.
///
/// # Examples
///
/// ```
/// use nicwatch::network::classify::{NamePolicy, PhysicalPolicy};
/// use nicwatch::network::{AdapterDescriptor, InterfaceType};
///
/// let policy = NamePolicy::new();
///
/// let wifi = AdapterDescriptor::new("1", "Wi-Fi", InterfaceType::Wireless)
///     .with_description("Intel(R) Wi-Fi 6 AX201 160MHz");
/// let qos =
///     AdapterDescriptor::new("2", "Wi-Fi-QoS Packet Scheduler-0000", InterfaceType::Wireless);
///
/// assert!(policy.is_physical(&wifi));
/// assert!(!policy.is_physical(&qos));
/// ```
#[derive(Debug, Clone)]
pub struct NamePolicy {
    filter_name: Regex,
    extra_names: Vec<Regex>,
    keywords: KeywordTable,
}

impl NamePolicy {
    /// Creates the policy with the built-in qualifier and product tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filter_name: ndis_filter_regex(),
            extra_names: Vec::new(),
            keywords: KeywordTable::new(VPN_PRODUCT_KEYWORDS),
        }
    }

    /// Adds description keywords to the denylist.
    #[must_use]
    pub fn with_extra_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(keywords);
        self
    }

    /// Adds a name pattern; adapters whose name matches are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn with_name_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.extra_names.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Returns true if the name looks like an NDIS filter-chain entry.
    #[must_use]
    pub fn is_filter_name(&self, name: &str) -> bool {
        self.filter_name.is_match(name)
    }

    /// Returns the description denylist.
    #[must_use]
    pub const fn keywords(&self) -> &KeywordTable {
        &self.keywords
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalPolicy for NamePolicy {
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool {
        if self.is_filter_name(&adapter.name) {
            tracing::trace!("{}: NDIS filter name '{}'", adapter.id, adapter.name);
            return false;
        }
        if self.extra_names.iter().any(|re| re.is_match(&adapter.name)) {
            tracing::trace!("{}: name '{}' excluded by pattern", adapter.id, adapter.name);
            return false;
        }
        if let Some(keyword) = self.keywords.find(&adapter.description) {
            tracing::trace!("{}: description matches '{keyword}'", adapter.id);
            return false;
        }
        true
    }

    fn name(&self) -> &'static str {
        "name"
    }
}

/// Builds `(?i)^.+-(?:<qualifier>|...).*-\d{4}$` from the qualifier table.
fn ndis_filter_regex() -> Regex {
    let alternation = NDIS_FILTER_QUALIFIERS
        .iter()
        .map(|q| regex::escape(q))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)^.+-(?:{alternation}).*-\d{{4}}$");
    // Assembled from escaped constants.
    Regex::new(&pattern).expect("NDIS filter pattern is valid")
}

// ============================================================================
// PolicyChain
// ============================================================================

/// Composes policies: an adapter is physical only if every member accepts it.
///
/// An empty chain accepts everything.
///
/// # Examples
///
/// ```
/// use nicwatch::network::classify::{BindingPolicy, NamePolicy, PhysicalPolicy, PolicyChain};
/// use nicwatch::network::{AdapterDescriptor, InterfaceType};
///
/// let chain = PolicyChain::new().with(BindingPolicy::new()).with(NamePolicy::new());
///
/// let nic = AdapterDescriptor::new("1", "Ethernet", InterfaceType::Ethernet)
///     .with_ipv4_index(Some(3));
/// let tap = AdapterDescriptor::new("2", "OpenVPN", InterfaceType::Ethernet)
///     .with_description("TAP-Windows Adapter V9")
///     .with_ipv4_index(Some(9));
///
/// assert!(chain.is_physical(&nic));
/// assert!(!chain.is_physical(&tap));
/// ```
#[derive(Default)]
pub struct PolicyChain {
    policies: Vec<Box<dyn PhysicalPolicy>>,
}

impl PolicyChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a policy to the chain.
    #[must_use]
    pub fn with<P: PhysicalPolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Returns the number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if no policies are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PhysicalPolicy for PolicyChain {
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool {
        self.policies.iter().all(|p| p.is_physical(adapter))
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}

impl fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.policies.iter().map(|p| p.name()).collect();
        f.debug_struct("PolicyChain")
            .field("policies", &names)
            .finish()
    }
}

impl<T: PhysicalPolicy + ?Sized> PhysicalPolicy for &T {
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool {
        (*self).is_physical(adapter)
    }

    fn name(&self) -> &'static str {
        (*self).name()
    }
}

impl PhysicalPolicy for Box<dyn PhysicalPolicy> {
    fn is_physical(&self, adapter: &AdapterDescriptor) -> bool {
        self.as_ref().is_physical(adapter)
    }

    fn name(&self) -> &'static str {
        self.as_ref().name()
    }
}

// ============================================================================
// PolicyKind
// ============================================================================

/// Which physical-adapter strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyKind {
    /// [`BindingPolicy`] only.
    Binding,
    /// [`NamePolicy`] only.
    Name,
    /// Both, via [`PolicyChain`]: physical only if both accept.
    #[default]
    Combined,
}

/// Extra user input applied to the built-in tables.
#[derive(Debug, Clone, Default)]
pub struct PolicyExtensions {
    /// Name regexes to reject (applies to [`NamePolicy`]).
    pub exclude_names: Vec<Regex>,
    /// Description keywords to reject (applies to both strategies).
    pub deny_keywords: Vec<String>,
}

impl PolicyKind {
    /// Builds the selected policy with the given extensions.
    #[must_use]
    pub fn build(self, extensions: &PolicyExtensions) -> Box<dyn PhysicalPolicy> {
        let binding =
            || BindingPolicy::new().with_extra_keywords(extensions.deny_keywords.iter());
        let name = || {
            let mut policy =
                NamePolicy::new().with_extra_keywords(extensions.deny_keywords.iter());
            policy.extra_names.extend(extensions.exclude_names.iter().cloned());
            policy
        };

        match self {
            Self::Binding => Box::new(binding()),
            Self::Name => Box::new(name()),
            Self::Combined => Box::new(PolicyChain::new().with(binding()).with(name())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding => write!(f, "binding"),
            Self::Name => write!(f, "name"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binding" | "index" => Ok(Self::Binding),
            "name" | "names" | "string" => Ok(Self::Name),
            "combined" | "both" | "all" => Ok(Self::Combined),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
