//! Device identity collected during bring-up.

/// The four identity fields that define a bound device.
///
/// Populated exclusively by decoded responses while the session is
/// bringing up; bring-up is complete exactly when all four are non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// User-visible device name.
    pub name: Option<String>,
    /// Serial number.
    pub serial_number: Option<String>,
    /// Firmware version.
    pub software_version: Option<String>,
    /// Main PCB version.
    pub hardware_version: Option<String>,
}

impl Identity {
    /// Whether every field has been learned.
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.serial_number,
            &self.software_version,
            &self.hardware_version,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_incomplete() {
        assert!(!Identity::default().is_complete());
    }

    #[test]
    fn test_complete_needs_all_four() {
        let mut id = Identity {
            name: Some("Studio lamp".into()),
            serial_number: Some("HL1-00412".into()),
            software_version: Some("2.4.1".into()),
            hardware_version: None,
        };
        assert!(!id.is_complete());

        id.hardware_version = Some("1.0.9".into());
        assert!(id.is_complete());
    }

    #[test]
    fn test_empty_string_does_not_count() {
        let id = Identity {
            name: Some(String::new()),
            serial_number: Some("HL1-00412".into()),
            software_version: Some("2.4.1".into()),
            hardware_version: Some("1.0.9".into()),
        };
        assert!(!id.is_complete());
    }
}
