//! Static vendor/model table for USB fingerprint readers.
//!
//! Discovery classifies raw USB descriptors against this table; devices
//! from unlisted vendors are dropped. A known vendor with an unlisted
//! product id classifies as a generic "Scanner".

pub struct VendorEntry {
    pub vendor_id: u16,
    pub name: &'static str,
    pub models: &'static [(u16, &'static str)],
}

pub const BIOMETRIC_VENDORS: &[VendorEntry] = &[
    VendorEntry {
        vendor_id: 0x1491,
        name: "Futronic",
        models: &[
            (0x0020, "Scanner 2.0"),
            (0x0410, "FS80H"),
            (0x0411, "FS80"),
            (0x0401, "FS88"),
        ],
    },
    VendorEntry {
        vendor_id: 0x0647,
        name: "Futronic",
        models: &[(0x0410, "FS80H"), (0x0411, "FS80")],
    },
    VendorEntry {
        vendor_id: 0x05BA,
        name: "DigitalPersona",
        models: &[
            (0x0007, "U.are.U 4000"),
            (0x000A, "U.are.U 4500"),
            (0x0010, "U.are.U 5160"),
        ],
    },
    VendorEntry {
        vendor_id: 0x1FAE,
        name: "DigitalPersona",
        models: &[],
    },
    VendorEntry {
        vendor_id: 0x1B55,
        name: "ZKTeco",
        models: &[(0x0120, "ZK4500"), (0x0200, "ZK7500"), (0x0408, "ZK9500")],
    },
    VendorEntry {
        vendor_id: 0x16D1,
        name: "Suprema",
        models: &[(0x0401, "BioMini"), (0x0402, "BioMini Plus")],
    },
    VendorEntry {
        vendor_id: 0x1162,
        name: "SecuGen",
        models: &[(0x0320, "Hamster Plus"), (0x0330, "Hamster Pro 20")],
    },
    VendorEntry {
        vendor_id: 0x0A86,
        name: "Nitgen",
        models: &[(0x1010, "Fingkey Hamster")],
    },
    VendorEntry {
        vendor_id: 0x08FF,
        name: "AuthenTec",
        models: &[],
    },
    VendorEntry {
        vendor_id: 0x147E,
        name: "Validity/Synaptics",
        models: &[],
    },
    VendorEntry {
        vendor_id: 0x138A,
        name: "Validity",
        models: &[],
    },
    VendorEntry {
        vendor_id: 0x0483,
        name: "Eikon/UPEK",
        models: &[],
    },
    VendorEntry {
        vendor_id: 0x27C6,
        name: "Goodix",
        models: &[],
    },
];

/// Look up (manufacturer, model) for a vendor/product id pair.
pub fn classify(vendor_id: u16, product_id: u16) -> Option<(&'static str, &'static str)> {
    let entry = BIOMETRIC_VENDORS.iter().find(|e| e.vendor_id == vendor_id)?;
    let model = entry
        .models
        .iter()
        .find(|(pid, _)| *pid == product_id)
        .map(|(_, name)| *name)
        .unwrap_or("Scanner");
    Some((entry.name, model))
}

/// Distinct vendor names, for operator-facing listings.
pub fn supported_vendors() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BIOMETRIC_VENDORS.iter().map(|e| e.name).collect();
    names.sort_unstable();
    names.dedup();
    names
}
