/// Color given to categories that arrive after every catch-all entry has
/// been claimed.
pub const FALLBACK_COLOR: &str = "#6e00ff";
pub const FALLBACK_ICON: &str = "general";

/// One category-to-display binding. A None category is a catch-all entry
/// waiting to be claimed by the first unmatched category.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorEntry {
    pub category: Option<String>,
    pub color: String,
    pub icon: String,
}

impl ColorEntry {
    pub fn new(category: Option<&str>, color: &str, icon: &str) -> Self {
        Self {
            category: category.map(str::to_string),
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Result of one assignment: the icon to render with, and whether the table
/// was mutated (claim or append) by the lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub icon: String,
    pub changed: bool,
}

/// Ordered category color table, owned by the application and mutated in
/// place by assignment. Entries are only ever added or claimed, never
/// removed or merged; first match in insertion order wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    entries: Vec<ColorEntry>,
}

impl ColorTable {
    pub fn new(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the icon for a category, growing the table when needed:
    /// an exact match is reused, otherwise the first catch-all entry is
    /// claimed for this category, otherwise a new fallback entry is
    /// appended.
    pub fn assign(&mut self, category: &str) -> Assignment {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.category.as_deref() == Some(category))
        {
            return Assignment {
                icon: entry.icon.clone(),
                changed: false,
            };
        }

        if let Some(entry) = self.entries.iter_mut().find(|e| e.category.is_none()) {
            entry.category = Some(category.to_string());
            return Assignment {
                icon: entry.icon.clone(),
                changed: true,
            };
        }

        self.entries.push(ColorEntry::new(
            Some(category),
            FALLBACK_COLOR,
            FALLBACK_ICON,
        ));
        Assignment {
            icon: FALLBACK_ICON.to_string(),
            changed: true,
        }
    }

    /// Display color for a previously assigned icon name.
    pub fn color_for_icon(&self, icon: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.icon == icon)
            .map(|e| e.color.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> ColorTable {
        ColorTable::new(vec![
            ColorEntry::new(Some("campaign"), "#f7ed54", "campaign"),
            ColorEntry::new(None, "#2b83ba", "town-hall"),
        ])
    }

    #[test]
    fn test_reuse_does_not_grow() {
        let mut table = seeded();
        let first = table.assign("campaign");
        let second = table.assign("campaign");
        assert_eq!(first.icon, "campaign");
        assert_eq!(first.icon, second.icon);
        assert!(!first.changed);
        assert!(!second.changed);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_category_claims_catch_all() {
        let mut table = seeded();
        let assignment = table.assign("staff");
        assert_eq!(assignment.icon, "town-hall");
        assert!(assignment.changed);
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[1].category.as_deref(), Some("staff"));
    }

    #[test]
    fn test_claimed_entry_is_stable_on_second_assign() {
        let mut table = seeded();
        table.assign("staff");
        let again = table.assign("staff");
        assert_eq!(again.icon, "town-hall");
        assert!(!again.changed);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_append_when_no_catch_all() {
        let mut table = seeded();
        table.assign("staff"); // claims the catch-all
        let assignment = table.assign("hr676");
        assert_eq!(assignment.icon, FALLBACK_ICON);
        assert!(assignment.changed);
        assert_eq!(table.len(), 3);
        let appended = &table.entries()[2];
        assert_eq!(appended.category.as_deref(), Some("hr676"));
        assert_eq!(appended.color, FALLBACK_COLOR);
    }

    #[test]
    fn test_same_category_twice_grows_at_most_once() {
        let mut table = ColorTable::default();
        table.assign("campaign");
        table.assign("campaign");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let mut table = ColorTable::new(vec![
            ColorEntry::new(Some("campaign"), "#f7ed54", "first"),
            ColorEntry::new(Some("campaign"), "#000000", "second"),
        ]);
        assert_eq!(table.assign("campaign").icon, "first");
    }
}
