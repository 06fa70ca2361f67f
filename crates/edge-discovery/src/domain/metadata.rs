//! Advertised TXT metadata.
//!
//! On the wire the metadata is a flat list: `[platform, exec_type,
//! service...]`. Inside the crate it is kept structured so that the two
//! fixed slots can never be reordered or removed.

use super::errors::{DiscoveryError, DiscoveryResult};

/// Total byte budget of the TXT record.
pub const MAX_TXT_SIZE: usize = 400;

/// Structured form of the advertised metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisedMetadata {
    pub platform: String,
    pub exec_type: String,
    pub services: Vec<String>,
}

impl AdvertisedMetadata {
    pub fn new(platform: impl Into<String>, exec_type: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            exec_type: exec_type.into(),
            services: Vec::new(),
        }
    }

    /// Decode the wire form.
    ///
    /// Advertisements with fewer than two strings predate the fixed slots;
    /// every string in them is a service name.
    pub fn from_wire(text: &[String]) -> Self {
        match text {
            [platform, exec_type, services @ ..] => Self {
                platform: platform.clone(),
                exec_type: exec_type.clone(),
                services: services.to_vec(),
            },
            legacy => Self {
                platform: String::new(),
                exec_type: String::new(),
                services: legacy.to_vec(),
            },
        }
    }

    /// Flatten into the wire form.
    pub fn to_wire(&self) -> Vec<String> {
        let mut text = Vec::with_capacity(self.services.len() + 2);
        text.push(self.platform.clone());
        text.push(self.exec_type.clone());
        text.extend(self.services.iter().cloned());
        text
    }

    /// Sum of the byte lengths of every string on the wire.
    pub fn encoded_len(&self) -> usize {
        self.platform.len()
            + self.exec_type.len()
            + self.services.iter().map(String::len).sum::<usize>()
    }

    /// Reject metadata whose wire form exceeds `max` bytes.
    pub fn check_size(&self, max: usize) -> DiscoveryResult<()> {
        let size = self.encoded_len();
        tracing::debug!(size, max, "TXT size check");
        if size > max {
            return Err(DiscoveryError::InvalidParam(format!(
                "TXT size {size}B exceeds the {max}B multicast budget"
            )));
        }
        Ok(())
    }

    /// True if `name` occupies any slot, fixed or not.
    pub fn contains(&self, name: &str) -> bool {
        self.platform == name || self.exec_type == name || self.services.iter().any(|s| s == name)
    }

    /// Reject empty names and names equal to a fixed slot.
    pub fn validate_name(&self, name: &str) -> DiscoveryResult<()> {
        if name.is_empty() {
            return Err(DiscoveryError::InvalidParam("no argument".to_string()));
        }
        if name == self.platform || name == self.exec_type {
            return Err(DiscoveryError::InvalidParam(
                "cannot change fixed field".to_string(),
            ));
        }
        Ok(())
    }

    /// Append a service name, rejecting duplicates.
    pub fn add_service(&mut self, name: &str) -> DiscoveryResult<()> {
        if self.contains(name) {
            return Err(DiscoveryError::InvalidParam(
                "service name duplicated".to_string(),
            ));
        }
        self.services.push(name.to_string());
        Ok(())
    }

    /// Remove a service name, keeping the order of the rest.
    pub fn remove_service(&mut self, name: &str) -> DiscoveryResult<()> {
        let idx = self
            .services
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| DiscoveryError::NotFound("no service found".to_string()))?;
        self.services.remove(idx);
        Ok(())
    }

    /// Drop every service name, keeping the fixed slots.
    pub fn reset_services(&mut self) {
        self.services.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_wire_form_keeps_fixed_slots_first() {
        let mut meta = AdvertisedMetadata::new("ubuntu", "native");
        meta.add_service("ls").unwrap();
        meta.add_service("vlc").unwrap();

        assert_eq!(meta.to_wire(), wire(&["ubuntu", "native", "ls", "vlc"]));
        assert_eq!(AdvertisedMetadata::from_wire(&meta.to_wire()), meta);
    }

    #[test]
    fn test_legacy_wire_is_all_services() {
        let meta = AdvertisedMetadata::from_wire(&wire(&["ls"]));
        assert!(meta.platform.is_empty());
        assert!(meta.exec_type.is_empty());
        assert_eq!(meta.services, wire(&["ls"]));

        assert_eq!(AdvertisedMetadata::from_wire(&[]), AdvertisedMetadata::default());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut meta = AdvertisedMetadata::new("ubuntu", "native");
        meta.add_service("ls").unwrap();
        let err = meta.add_service("ls").unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidParam(_)));
        assert_eq!(meta.services, wire(&["ls"]));
    }

    #[test]
    fn test_reserved_and_empty_names_rejected() {
        let meta = AdvertisedMetadata::new("ubuntu", "native");
        for name in ["", "ubuntu", "native"] {
            assert!(matches!(
                meta.validate_name(name),
                Err(DiscoveryError::InvalidParam(_))
            ));
        }
        assert!(meta.validate_name("ls").is_ok());
    }

    #[test]
    fn test_size_budget_is_inclusive() {
        let mut meta = AdvertisedMetadata::new("ab", "cd");
        meta.services.push("x".repeat(MAX_TXT_SIZE - 4));
        assert_eq!(meta.encoded_len(), MAX_TXT_SIZE);
        assert!(meta.check_size(MAX_TXT_SIZE).is_ok());

        meta.services.push("y".into());
        assert!(matches!(
            meta.check_size(MAX_TXT_SIZE),
            Err(DiscoveryError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut meta = AdvertisedMetadata::new("ubuntu", "native");
        assert!(matches!(
            meta.remove_service("ls"),
            Err(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut meta = AdvertisedMetadata::from_wire(&wire(&["p", "e", "a", "b", "c"]));
        meta.remove_service("b").unwrap();
        assert_eq!(meta.services, wire(&["a", "c"]));
    }
}
