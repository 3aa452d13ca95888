//! Static sound manifest.
//!
//! The alarm sound catalog is a fixed table declared here rather than
//! discovered by scanning resource identifiers at runtime. Each entry maps
//! a resource key to a display name and a category; the scheduler treats an
//! empty or unknown key as "use the platform default sound".

/// One entry in the sound catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundEntry {
    pub resource_key: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
}

/// The complete catalog, grouped by category in display order.
pub const MANIFEST: &[SoundEntry] = &[
    SoundEntry {
        resource_key: "classicalarm_digital",
        display_name: "Digital Beep",
        category: "Classic Alarm",
    },
    SoundEntry {
        resource_key: "classicalarm_bell",
        display_name: "Classic Bell",
        category: "Classic Alarm",
    },
    SoundEntry {
        resource_key: "classicalarm_chime",
        display_name: "Gentle Chime",
        category: "Classic Alarm",
    },
    SoundEntry {
        resource_key: "naturalsound_birds",
        display_name: "Birds Chirping",
        category: "Natural Sound",
    },
    SoundEntry {
        resource_key: "naturalsound_rain",
        display_name: "Rain",
        category: "Natural Sound",
    },
    SoundEntry {
        resource_key: "naturalsound_wind",
        display_name: "Wind",
        category: "Natural Sound",
    },
    SoundEntry {
        resource_key: "ambiencesound_forest",
        display_name: "Forest",
        category: "Ambience",
    },
    SoundEntry {
        resource_key: "ambiencesound_ocean",
        display_name: "Ocean",
        category: "Ambience",
    },
    SoundEntry {
        resource_key: "ambiencesound_cafe",
        display_name: "Cafe",
        category: "Ambience",
    },
    SoundEntry {
        resource_key: "ambiencesound_airport",
        display_name: "Airport",
        category: "Ambience",
    },
];

/// Category names in manifest order, deduplicated.
pub fn categories() -> Vec<&'static str> {
    let mut seen = Vec::new();
    for entry in MANIFEST {
        if !seen.contains(&entry.category) {
            seen.push(entry.category);
        }
    }
    seen
}

/// Entries belonging to one category. Empty for unknown categories.
pub fn sounds_for_category(category: &str) -> Vec<SoundEntry> {
    MANIFEST
        .iter()
        .filter(|e| e.category.eq_ignore_ascii_case(category))
        .copied()
        .collect()
}

/// Whether `key` names a manifest entry.
pub fn is_known(key: &str) -> bool {
    MANIFEST.iter().any(|e| e.resource_key == key)
}

/// Display name for a key, falling back to the key itself.
pub fn display_name(key: &str) -> &str {
    MANIFEST
        .iter()
        .find(|e| e.resource_key == key)
        .map(|e| e.display_name)
        .unwrap_or(key)
}
