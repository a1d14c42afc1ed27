//! Static doctor and slot catalogs

/// Immutable, ordered lookup table from a choice key ("1", "2", ...) to a label
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [(&'static str, &'static str)],
}

/// Bookable doctors
pub static DOCTORS: Catalog = Catalog::new(&[
    ("1", "Dr. A (General Physician)"),
    ("2", "Dr. B (Dermatologist)"),
    ("3", "Dr. C (Cardiologist)"),
]);

/// Bookable time slots
pub static SLOTS: Catalog = Catalog::new(&[
    ("1", "10:00 AM"),
    ("2", "11:30 AM"),
    ("3", "4:00 PM"),
]);

impl Catalog {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Exact key lookup
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    /// Numbered menu, one `key. label` line per entry
    pub fn menu(&self) -> String {
        self.iter()
            .map(|(key, label)| format!("{}. {}", key, label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Keys as an English list: "1, 2, or 3"
    pub fn choice_hint(&self) -> String {
        let keys: Vec<&str> = self.iter().map(|(key, _)| key).collect();
        match keys.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            [first, second] => format!("{} or {}", first, second),
            [init @ .., last] => format!("{}, or {}", init.join(", "), last),
        }
    }
}
