//! Fixed lookup tables turning upstream classification keys into the display
//! labels shown by the recipe plugin.

/// A lookup table with a designated fallback row.
#[derive(Debug)]
pub struct LabelTable {
    rows: &'static [(&'static str, &'static str)],
    default_key: &'static str,
}

pub static DIFFICULTY: LabelTable = LabelTable {
    rows: &[
        ("beginner", "Początkujący"),
        ("intermediate", "Średniozaawansowany"),
        ("advanced", "Zaawansowany"),
    ],
    default_key: "beginner",
};

pub static SEASON: LabelTable = LabelTable {
    rows: &[
        ("spring", "Wiosna"),
        ("summer", "Lato"),
        ("autumn", "Jesień"),
        ("winter", "Zima"),
        ("all_year", "Cały rok"),
    ],
    default_key: "all_year",
};

impl LabelTable {
    /// Label for `raw` after trimming and lower-casing; unknown or absent
    /// keys resolve to the default row.
    pub fn label(&self, raw: Option<&str>) -> &'static str {
        let key = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        self.find(&key)
            .or_else(|| self.find(self.default_key))
            .unwrap_or_default()
    }

    pub fn default_label(&self) -> &'static str {
        self.label(None)
    }

    fn find(&self, key: &str) -> Option<&'static str> {
        self.rows
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, label)| *label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        assert_eq!(DIFFICULTY.label(Some("  Advanced ")), "Zaawansowany");
        assert_eq!(SEASON.label(Some("WINTER")), "Zima");
    }

    #[test]
    fn unknown_keys_fall_back() {
        assert_eq!(DIFFICULTY.label(Some("expert")), "Początkujący");
        assert_eq!(DIFFICULTY.label(None), "Początkujący");
        assert_eq!(SEASON.label(Some("")), "Cały rok");
        assert_eq!(SEASON.default_label(), "Cały rok");
    }
}
