use serde::Serialize;

/// One lifter's line in an event's results table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionResult {
    pub lifter: String,
    pub body_weight: f64,
    pub snatch1: f64,
    pub snatch2: f64,
    pub snatch3: f64,
    pub snatch: f64,
    pub cj1: f64,
    pub cj2: f64,
    pub cj3: f64,
    pub cj: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub id: u32,
    pub name: String,
    pub date: String,
    pub results: Vec<CompetitionResult>,
}

impl CompetitionResult {
    /// Numeric fields in output order, paired with their serialized names.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 10] {
        [
            ("bodyWeight", self.body_weight),
            ("snatch1", self.snatch1),
            ("snatch2", self.snatch2),
            ("snatch3", self.snatch3),
            ("snatch", self.snatch),
            ("cj1", self.cj1),
            ("cj2", self.cj2),
            ("cj3", self.cj3),
            ("cj", self.cj),
            ("total", self.total),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let r = CompetitionResult {
            lifter: "Doe, Jane".into(),
            body_weight: 81.5,
            ..Default::default()
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["bodyWeight"], 81.5);
        assert_eq!(json["lifter"], "Doe, Jane");
        assert!(json.get("body_weight").is_none());
    }

    #[test]
    fn numeric_field_names_match_serde() {
        let r = CompetitionResult::default();
        let json = serde_json::to_value(&r).unwrap();
        for (name, _) in r.numeric_fields() {
            assert!(json.get(name).is_some(), "missing {}", name);
        }
    }
}
