use serde::{Deserialize, Serialize};
use std::fmt;

/// The six parties whose positions are summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Cdu,
    Spd,
    Gruene,
    Linke,
    Fdp,
    Afd,
}

impl Party {
    /// All parties, in the order they appear in answers and prompts.
    pub const ALL: [Party; 6] = [
        Party::Cdu,
        Party::Spd,
        Party::Gruene,
        Party::Linke,
        Party::Fdp,
        Party::Afd,
    ];

    /// JSON key used in structured answers and document files.
    pub fn key(&self) -> &'static str {
        match self {
            Party::Cdu => "cdu",
            Party::Spd => "spd",
            Party::Gruene => "gruene",
            Party::Linke => "linke",
            Party::Fdp => "fdp",
            Party::Afd => "afd",
        }
    }

    /// Name as written in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Party::Cdu => "CDU/CSU",
            Party::Spd => "SPD",
            Party::Gruene => "Bündnis 90/Die Grünen",
            Party::Linke => "Die Linke",
            Party::Fdp => "FDP",
            Party::Afd => "AfD",
        }
    }

    /// Field description embedded in the structured-output instructions.
    pub fn field_description(&self) -> String {
        format!(
            "Antwort auf die Frage des Nutzers basierend auf den Positionen der Partei {}",
            self.display_name()
        )
    }

    /// Looks a party up by its JSON key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Structured answer: one free-text answer per party.
///
/// Every field is required; model output missing one of them does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySummaries {
    pub cdu: String,
    pub spd: String,
    pub gruene: String,
    pub linke: String,
    pub fdp: String,
    pub afd: String,
}

impl PartySummaries {
    /// Returns the answer for one party.
    pub fn get(&self, party: Party) -> &str {
        match party {
            Party::Cdu => &self.cdu,
            Party::Spd => &self.spd,
            Party::Gruene => &self.gruene,
            Party::Linke => &self.linke,
            Party::Fdp => &self.fdp,
            Party::Afd => &self.afd,
        }
    }

    /// Iterates over `(party, answer)` pairs in party order.
    pub fn iter(&self) -> impl Iterator<Item = (Party, &str)> + '_ {
        Party::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// JSON schema of this type, as shown to the model.
    pub fn json_schema() -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = Party::ALL
            .iter()
            .map(|p| {
                (
                    p.key().to_string(),
                    serde_json::json!({
                        "title": capitalize(p.key()),
                        "description": p.field_description(),
                        "type": "string",
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "properties": properties,
            "required": Party::ALL.iter().map(|p| p.key()).collect::<Vec<_>>(),
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for party in Party::ALL {
            assert_eq!(Party::from_key(party.key()), Some(party));
        }
        assert_eq!(Party::from_key("piraten"), None);
    }

    #[test]
    fn test_serde_key_matches_key() {
        let json = serde_json::to_string(&Party::Gruene).unwrap();
        assert_eq!(json, "\"gruene\"");
    }

    #[test]
    fn test_schema_lists_all_parties() {
        let schema = PartySummaries::json_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 6);
        assert_eq!(schema["properties"]["cdu"]["title"], "Cdu");
        assert!(schema["properties"]["afd"]["description"]
            .as_str()
            .unwrap()
            .ends_with("Partei AfD"));
    }
}
