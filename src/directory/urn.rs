/// Platform identifier parsing and validation
///
/// Identifiers take the canonical form
/// `urn:ads:{namespace}:{service}[:{api}[:{resource}]]`. The resource segment
/// is the remainder of the string and may contain further colons.
use crate::{
    directory::IdentifierKind,
    error::{DirectoryError, DirectoryResult},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const URN_SCHEME: &str = "urn";
pub const PLATFORM_NID: &str = "ads";
/// Namespace reserved for core platform services
pub const PLATFORM_NAMESPACE: &str = "platform";

const MAX_SEGMENT_LENGTH: usize = 50;
const MAX_RESOURCE_LENGTH: usize = 1000;

/// Which partition of the platform an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Core,
    Tenant,
}

/// What an identifier points at beyond its service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Service,
    Api { api: String },
    Resource { api: String, resource: String },
}

/// Validated platform identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformIdentifier {
    namespace: String,
    service: String,
    locator: Locator,
}

impl PlatformIdentifier {
    /// Parse an identifier from its canonical string form
    pub fn parse(input: &str) -> DirectoryResult<Self> {
        let segments: Vec<&str> = input.splitn(6, ':').collect();
        if segments.len() < 4 {
            return Err(DirectoryError::malformed(
                input,
                "expected at least 4 colon-delimited segments",
            ));
        }

        if segments[0] != URN_SCHEME || segments[1] != PLATFORM_NID {
            return Err(DirectoryError::malformed(
                input,
                format!("identifier must start with '{}:{}'", URN_SCHEME, PLATFORM_NID),
            ));
        }

        let namespace = validate_segment(input, "namespace", segments[2])?;
        let service = validate_segment(input, "service", segments[3])?;

        let locator = match (segments.get(4), segments.get(5)) {
            (None, _) => Locator::Service,
            (Some(api), None) => Locator::Api {
                api: validate_segment(input, "api", api)?,
            },
            (Some(api), Some(resource)) => Locator::Resource {
                api: validate_segment(input, "api", api)?,
                resource: validate_resource(input, resource)?,
            },
        };

        Ok(Self {
            namespace,
            service,
            locator,
        })
    }

    /// Build a service identifier
    pub fn service(namespace: &str, service: &str) -> DirectoryResult<Self> {
        let raw = format!("{}:{}:{}:{}", URN_SCHEME, PLATFORM_NID, namespace, service);
        Ok(Self {
            namespace: validate_segment(&raw, "namespace", namespace)?,
            service: validate_segment(&raw, "service", service)?,
            locator: Locator::Service,
        })
    }

    /// Build the API identifier under this identifier's service
    pub fn with_api(&self, api: &str) -> DirectoryResult<Self> {
        let api = validate_segment(&format!("{}:{}", self.service_prefix(), api), "api", api)?;
        Ok(Self {
            namespace: self.namespace.clone(),
            service: self.service.clone(),
            locator: Locator::Api { api },
        })
    }

    /// Build a resource identifier under this identifier's API
    ///
    /// Fails with `InvalidIdentifierKind` unless this is an API identifier.
    pub fn with_resource(&self, resource: &str) -> DirectoryResult<Self> {
        self.assert_kind(&[IdentifierKind::Api])?;
        let api = self.api().unwrap_or_default().to_string();
        let resource = validate_resource(&format!("{}:{}", self, resource), resource)?;
        Ok(Self {
            namespace: self.namespace.clone(),
            service: self.service.clone(),
            locator: Locator::Resource { api, resource },
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn api(&self) -> Option<&str> {
        match &self.locator {
            Locator::Service => None,
            Locator::Api { api } | Locator::Resource { api, .. } => Some(api),
        }
    }

    pub fn resource(&self) -> Option<&str> {
        match &self.locator {
            Locator::Resource { resource, .. } => Some(resource),
            _ => None,
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        match self.locator {
            Locator::Service => IdentifierKind::Service,
            Locator::Api { .. } => IdentifierKind::Api,
            Locator::Resource { .. } => IdentifierKind::Resource,
        }
    }

    pub fn partition(&self) -> Partition {
        if self.is_platform() {
            Partition::Core
        } else {
            Partition::Tenant
        }
    }

    /// Whether this identifier is in the core platform namespace
    pub fn is_platform(&self) -> bool {
        self.namespace == PLATFORM_NAMESPACE
    }

    /// Check the identifier is one of the allowed kinds
    pub fn assert_kind(&self, allowed: &[IdentifierKind]) -> DirectoryResult<()> {
        let actual = self.kind();
        if allowed.contains(&actual) {
            Ok(())
        } else {
            Err(DirectoryError::InvalidIdentifierKind {
                identifier: self.to_string(),
                expected: allowed.to_vec(),
                actual,
            })
        }
    }

    /// The API identifier owning this resource identifier
    pub fn api_identifier(&self) -> DirectoryResult<Self> {
        self.assert_kind(&[IdentifierKind::Resource])?;
        match &self.locator {
            Locator::Resource { api, .. } => Ok(Self {
                namespace: self.namespace.clone(),
                service: self.service.clone(),
                locator: Locator::Api { api: api.clone() },
            }),
            _ => unreachable!("kind checked above"),
        }
    }

    fn service_prefix(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            URN_SCHEME, PLATFORM_NID, self.namespace, self.service
        )
    }
}

fn validate_segment(input: &str, name: &str, value: &str) -> DirectoryResult<String> {
    if value.is_empty() {
        return Err(DirectoryError::malformed(input, format!("{} is empty", name)));
    }
    if value.len() > MAX_SEGMENT_LENGTH {
        return Err(DirectoryError::malformed(
            input,
            format!("{} exceeds {} characters", name, MAX_SEGMENT_LENGTH),
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(DirectoryError::malformed(
            input,
            format!("{} may only contain letters, digits and '-'", name),
        ));
    }
    Ok(value.to_string())
}

fn validate_resource(input: &str, value: &str) -> DirectoryResult<String> {
    if value.is_empty() {
        return Err(DirectoryError::malformed(input, "resource is empty"));
    }
    if value.len() > MAX_RESOURCE_LENGTH {
        return Err(DirectoryError::malformed(
            input,
            format!("resource exceeds {} characters", MAX_RESOURCE_LENGTH),
        ));
    }
    if value.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(DirectoryError::malformed(
            input,
            "resource contains whitespace or control characters",
        ));
    }
    Ok(value.to_string())
}

impl fmt::Display for PlatformIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            URN_SCHEME, PLATFORM_NID, self.namespace, self.service
        )?;
        match &self.locator {
            Locator::Service => Ok(()),
            Locator::Api { api } => write!(f, ":{}", api),
            Locator::Resource { api, resource } => write!(f, ":{}:{}", api, resource),
        }
    }
}

impl FromStr for PlatformIdentifier {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PlatformIdentifier {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlatformIdentifier> for String {
    fn from(id: PlatformIdentifier) -> Self {
        id.to_string()
    }
}
