use serde_json::Value;

/// Record is a wrapper around serde_json::Value
/// It represents one row of a table, always a JSON object
#[derive(Clone, Debug, PartialEq)]
pub struct Record(pub Value);

impl Record {
    /// Create from a JSON Value, only objects are valid records
    pub fn from_value(value: Value) -> Option<Self> {
        if value.is_object() {
            Some(Record(value))
        } else {
            None
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, k: &str) -> Option<&Value> {
        self.0.get(k)
    }

    pub fn get_str(&self, k: &str) -> Option<&str> {
        self.0.get(k)?.as_str()
    }

    pub fn get_i64(&self, k: &str) -> Option<i64> {
        self.0.get(k)?.as_i64()
    }

    pub fn get_f64(&self, k: &str) -> Option<f64> {
        self.0.get(k)?.as_f64()
    }

    pub fn get_bool(&self, k: &str) -> Option<bool> {
        self.0.get(k)?.as_bool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_objects_are_records() {
        assert!(Record::from_value(json!({"id": 1})).is_some());
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("text")).is_none());
    }

    #[test]
    fn typed_getters() {
        let record = Record::from_value(json!({
            "title": "article1",
            "count": 22,
            "score": 0.5,
            "deleted": false,
        }))
        .unwrap();

        assert_eq!(record.get_str("title"), Some("article1"));
        assert_eq!(record.get_i64("count"), Some(22));
        assert_eq!(record.get_f64("score"), Some(0.5));
        assert_eq!(record.get_bool("deleted"), Some(false));
        assert_eq!(record.get_i64("title"), None);
        assert!(record.get("missing").is_none());
    }
}
