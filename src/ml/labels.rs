use std::fmt;

use serde::{Deserialize, Serialize};

/// Cry categories in the fixed order every model family emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryLabel {
    BellyPain,
    Burping,
    Discomfort,
    Hungry,
    Tired,
}

impl CryLabel {
    /// Label table, indexed by model class index.
    pub const ALL: [CryLabel; 5] = [
        CryLabel::BellyPain,
        CryLabel::Burping,
        CryLabel::Discomfort,
        CryLabel::Hungry,
        CryLabel::Tired,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CryLabel::BellyPain => "belly_pain",
            CryLabel::Burping => "burping",
            CryLabel::Discomfort => "discomfort",
            CryLabel::Hungry => "hungry",
            CryLabel::Tired => "tired",
        }
    }
}

impl fmt::Display for CryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_and_spelling_are_fixed() {
        let names: Vec<&str> = CryLabel::ALL.iter().map(|label| label.as_str()).collect();
        assert_eq!(
            names,
            ["belly_pain", "burping", "discomfort", "hungry", "tired"]
        );
        for (index, label) in CryLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), index);
            assert_eq!(CryLabel::from_index(index), Some(*label));
        }
        assert_eq!(CryLabel::from_index(5), None);
    }

    #[test]
    fn serde_uses_wire_spelling() {
        let json = serde_json::to_string(&CryLabel::BellyPain).unwrap();
        assert_eq!(json, "\"belly_pain\"");
        let parsed: CryLabel = serde_json::from_str("\"tired\"").unwrap();
        assert_eq!(parsed, CryLabel::Tired);
    }
}
