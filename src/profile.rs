//! Static registry of supported spectrometer models.
//!
//! Each entry maps one or more USB product IDs to the model's spectrum
//! packet size and bulk endpoint assignments. The table is constant data
//! reproduced from the vendor's documented catalogue; it is never mutated
//! and profiles live for the whole process.

use crate::error::{Result, SpectroError};

/// Ocean Optics USB vendor ID.
pub const OCEAN_OPTICS_VENDOR_ID: u16 = 0x2457;

/// Bulk endpoint addresses used by this device family.
pub mod endpoint {
    /// Endpoint 1 OUT.
    pub const EP1_OUT: u8 = 0x01;
    /// Endpoint 1 IN.
    pub const EP1_IN: u8 = 0x81;
    /// Endpoint 2 OUT.
    pub const EP2_OUT: u8 = 0x02;
    /// Endpoint 2 IN.
    pub const EP2_IN: u8 = 0x82;
    /// Endpoint 7 IN.
    pub const EP7_IN: u8 = 0x87;
}

use endpoint::{EP1_IN, EP1_OUT, EP2_IN, EP2_OUT, EP7_IN};

/// Hardware profile for one supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// USB product IDs that share this profile.
    pub product_ids: &'static [u16],
    /// Display name of the model.
    pub model_name: &'static str,
    /// Exact byte length of one spectrum response packet.
    pub spectrum_packet_size: usize,
    /// Endpoint for command frames.
    pub command_out_endpoint: u8,
    /// Endpoint for status and information replies.
    pub data_in_endpoint: u8,
    /// Nominal transfer size of the data-in endpoint.
    pub data_in_size: usize,
    /// Endpoint for spectrum packets.
    pub spectrum_in_endpoint: u8,
    /// Nominal transfer size of the spectrum-in endpoint.
    pub spectrum_in_size: usize,
}

/// All supported models. Product IDs are unique across the table.
pub const PROFILES: &[DeviceProfile] = &[
    DeviceProfile {
        product_ids: &[0x102A],
        model_name: "Maya2000 Pro",
        spectrum_packet_size: 4609,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1026, 0x1028],
        model_name: "NIRQUEST",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 512,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x101E],
        model_name: "USB2000+",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1016, 0x1012],
        model_name: "HR2000+",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x4004],
        model_name: "QE65 Pro",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1018],
        model_name: "QE65000",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1002],
        model_name: "USB2000",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP2_OUT,
        data_in_endpoint: EP7_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 64,
    },
    DeviceProfile {
        product_ids: &[0x1014],
        model_name: "USB650",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP2_OUT,
        data_in_endpoint: EP7_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 64,
    },
    DeviceProfile {
        product_ids: &[0x100A, 0x1009],
        model_name: "HR2000",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP2_OUT,
        data_in_endpoint: EP7_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 64,
    },
    DeviceProfile {
        product_ids: &[0x1040],
        model_name: "Torus",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1044],
        model_name: "Apex",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x102C],
        model_name: "Maya",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x2000],
        model_name: "Jaz",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP1_OUT,
        data_in_endpoint: EP1_IN,
        data_in_size: 512,
        spectrum_in_endpoint: EP2_IN,
        spectrum_in_size: 512,
    },
    DeviceProfile {
        product_ids: &[0x1010, 0x100C],
        model_name: "NIR",
        spectrum_packet_size: 4097,
        command_out_endpoint: EP2_OUT,
        data_in_endpoint: EP7_IN,
        data_in_size: 64,
        spectrum_in_endpoint: EP7_IN,
        spectrum_in_size: 64,
    },
];

/// Look up the profile for a USB product ID.
///
/// The table is small and fixed, so a linear scan is fine. Fails with
/// [`SpectroError::UnknownProduct`] when no profile lists the ID; whether
/// that is fatal is the caller's call.
pub fn lookup(product_id: u16) -> Result<&'static DeviceProfile> {
    PROFILES
        .iter()
        .find(|profile| profile.product_ids.contains(&product_id))
        .ok_or(SpectroError::UnknownProduct { product_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_id_resolves_to_its_profile() {
        for profile in PROFILES {
            assert!(!profile.product_ids.is_empty(), "{}", profile.model_name);
            for &id in profile.product_ids {
                let found = lookup(id).unwrap();
                assert_eq!(found, profile, "product id 0x{id:04X}");
            }
        }
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let err = lookup(0xBEEF).unwrap_err();
        assert!(matches!(
            err,
            SpectroError::UnknownProduct { product_id: 0xBEEF }
        ));
    }

    #[test]
    fn test_product_ids_are_unique_across_profiles() {
        let mut seen = std::collections::HashSet::new();
        for profile in PROFILES {
            for &id in profile.product_ids {
                assert!(seen.insert(id), "duplicate product id 0x{id:04X}");
            }
        }
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(PROFILES.len(), 14);
        // Every profile's packet holds the 4096-byte payload plus trailer.
        for profile in PROFILES {
            assert!(profile.spectrum_packet_size > 4096, "{}", profile.model_name);
        }
    }

    #[test]
    fn test_maya2000_pro_has_the_large_packet() {
        let profile = lookup(0x102A).unwrap();
        assert_eq!(profile.model_name, "Maya2000 Pro");
        assert_eq!(profile.spectrum_packet_size, 4609);
        assert_eq!(profile.command_out_endpoint, endpoint::EP1_OUT);
        assert_eq!(profile.spectrum_in_endpoint, endpoint::EP2_IN);
    }
}
