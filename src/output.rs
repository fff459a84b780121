//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{EntityView, ReplistView, StoredQueryView, UserView};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Trait for human-readable key-value output.
///
/// Implemented by full views to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

fn header(title: String) -> Vec<String> {
    let divider = "─".repeat(title.chars().count().max(30));
    vec![title, divider]
}

impl PrettyPrint for ReplistView {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Replist: {}", self.uuid));
        lines.push(format!("Query:          {} ({})", self.query.name, self.query.uuid));
        lines.push(format!("Share Level:    {}", self.share_level));
        lines.push(format!(
            "Enabled:        {}",
            if self.is_enabled { "yes" } else { "no" }
        ));
        lines.push(format!("Status:         {}", self.status));

        if let Some(ref updated) = self.updated_at {
            lines.push(format!("Updated:        {}", updated.format(TIME_FORMAT)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for EntityView {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Entity: {}", self.uuid));
        lines.push(format!("Type:           {}", self.entity_type));
        for key in &self.keys {
            lines.push(format!("Key:            {} = {}", key.key_type, key.value));
        }
        lines.join("\n")
    }
}

impl PrettyPrint for UserView {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("User: {}", self.login));
        lines.push(format!("UUID:           {}", self.uuid));

        if let Some(ref name) = self.full_name {
            lines.push(format!("Name:           {}", name));
        }
        if let Some(ref email) = self.email {
            lines.push(format!("Email:          {}", email));
        }

        lines.push(format!("Access Level:   {}", self.access_level));
        if !self.roles.is_empty() {
            let roles: Vec<_> = self.roles.iter().map(|r| r.name.as_str()).collect();
            lines.push(format!("Roles:          {}", roles.join(", ")));
        }
        if self.is_disabled {
            lines.push("Status:         disabled".to_string());
        }

        lines.join("\n")
    }
}

impl PrettyPrint for StoredQueryView {
    fn pretty_print(&self) -> String {
        let mut lines = header(format!("Stored Query: {}", self.name));
        lines.push(format!("UUID:           {}", self.uuid));
        lines.push(format!("Author:         {}", self.author.uuid));
        lines.push(format!("Text:           {}", self.text));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replist_pretty_print_format() {
        let replist: ReplistView = serde_json::from_value(serde_json::json!({
            "uuid": "a5d2f13c-5a0f-4bc9-9b0c-6f1f0a4a2b4e",
            "query": {"uuid": "0f7c6b1e-0e35-4d1c-9d0b-8d5f3b0b3b7d", "name": "domains"},
            "author": {"uuid": "5a0b7e8e-2d2c-4f5b-8a37-0a0e8f6b2b11"},
            "shareLevel": "Red",
            "isEnabled": false,
            "status": "Active"
        }))
        .unwrap();

        let output = replist.pretty_print();
        assert!(output.starts_with("Replist:"));
        assert!(output.contains("Share Level:    Red"));
        assert!(output.contains("Enabled:        no"));
        assert!(!output.contains("Updated:"));
    }

    #[test]
    fn test_entity_pretty_print_lists_keys() {
        let entity: EntityView = serde_json::from_value(serde_json::json!({
            "uuid": "2c1cb0e2-5a4b-4ed2-a1d1-b6a1b1e8b7c5",
            "type": "File",
            "keys": [
                {"type": "MD5Hash", "value": "d41d8cd98f00b204e9800998ecf8427e"},
                {"type": "SHA1Hash", "value": "da39a3ee5e6b4b0d3255bfef95601890afd80709"}
            ]
        }))
        .unwrap();

        let output = entity.pretty_print();
        assert!(output.contains("Type:           File"));
        assert_eq!(output.matches("Key:").count(), 2);
    }
}
