//! Form-encoded bodies with repeated keys (`labour_codes`, `services`...),
//! which a plain `Form<HashMap>` would collapse.

#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value for `key`, trimmed; `None` when absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First value for `key`, trimmed, blank included; `None` only when the key
    /// was not submitted. Lets an edit tell "cleared" from "left out".
    pub fn submitted(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Every non-blank value for `key`, in submission order.
    pub fn all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Checkbox semantics: `true`, `on`, `1`, `yes`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes"))
    }

    pub fn number<T: core::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_and_blanks() {
        let f = FormFields::parse(b"action=update_order_details&services=Oil+Change&services=&services=Wheel%20Alignment&note=+");
        assert_eq!(f.get("action"), Some("update_order_details"));
        assert_eq!(f.all("services"), vec!["Oil Change", "Wheel Alignment"]);
        assert_eq!(f.get("note"), None);
        assert_eq!(f.get("missing"), None);
        assert_eq!(f.submitted("note"), Some(""));
        assert_eq!(f.submitted("missing"), None);
    }

    #[test]
    fn flags_and_numbers() {
        let f = FormFields::parse(b"add_component=on&quantity=4&estimated_duration=abc");
        assert!(f.flag("add_component"));
        assert!(!f.flag("force_new_order"));
        assert_eq!(f.number::<u32>("quantity"), Some(4));
        assert_eq!(f.number::<u32>("estimated_duration"), None);
    }
}
