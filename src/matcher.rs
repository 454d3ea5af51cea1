//! Best-effort field auto-matching and display-time field filters.
//!
//! The matcher guesses which source field plays a role from its name. It only pre-fills
//! roles that are still empty, and a wrong or missing guess never blocks anything: the
//! user can always rebind the role by hand.

use crate::config::RoleMapping;
use crate::fields::{FieldDescriptor, FieldType, Role};

/// Ordered `(keyword, role)` pairs used to guess field bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
    pairs: Vec<(String, Role)>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        let mut rules = KeywordRules::empty();
        rules.extend(Role::TaskName, &["任务", "事项", "步骤", "task", "item"]);
        rules.extend(Role::PlanStart, &["开始", "start", "开工"]);
        rules.extend(Role::PlanEnd, &["截止", "到期", "结束", "end", "due"]);
        rules.extend(
            Role::ActualEnd,
            &["实际完成", "实际完成时间", "完成时间", "实际", "actual"],
        );
        rules
    }
}

impl KeywordRules {
    pub fn empty() -> Self {
        KeywordRules { pairs: Vec::new() }
    }

    /// Append keywords for a role, after any already present.
    pub fn extend(&mut self, role: Role, keywords: &[&str]) {
        self.pairs
            .extend(keywords.iter().map(|k| (k.to_string(), role)));
    }

    /// Keywords for a role, in rule order.
    pub fn keywords(&self, role: Role) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Keywords that make a text field eligible for a date role.
const DATE_NAME_HINTS: &[&str] = &["时间", "日期", "date", "time", "开始", "截止", "完成", "start", "end"];

/// First field, in iteration order, whose name contains any keyword (case-insensitive).
pub fn find_field_by_keywords<'a, K: AsRef<str>>(
    fields: &'a [FieldDescriptor],
    keywords: &[K],
) -> Option<&'a FieldDescriptor> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
    fields.iter().find(|field| {
        let name = field.name.to_lowercase();
        lowered.iter().any(|k| name.contains(k.as_str()))
    })
}

/// Fill every empty field role with a keyword guess. Returns the roles that were filled.
pub fn auto_fill(mapping: &mut RoleMapping, fields: &[FieldDescriptor], rules: &KeywordRules) -> Vec<Role> {
    let mut filled = Vec::new();
    for role in Role::FIELDS {
        if mapping.get(role).is_some() {
            continue;
        }
        if let Some(field) = find_field_by_keywords(fields, &rules.keywords(role)) {
            mapping.set(role, &field.id);
            filled.push(role);
        }
    }
    filled
}

/// Fields offered for a date role: date-times, formulas, and text fields with a date-like name.
pub fn date_field_options(fields: &[FieldDescriptor]) -> Vec<&FieldDescriptor> {
    fields
        .iter()
        .filter(|field| match field.field_type {
            FieldType::DateTime | FieldType::Formula => true,
            FieldType::Text => find_field_by_keywords(std::slice::from_ref(*field), DATE_NAME_HINTS).is_some(),
            _ => false,
        })
        .collect()
}

/// Fields offered for the task-name role: text, numbers and formulas.
pub fn text_field_options(fields: &[FieldDescriptor]) -> Vec<&FieldDescriptor> {
    fields
        .iter()
        .filter(|field| {
            matches!(
                field.field_type,
                FieldType::Text | FieldType::Number | FieldType::Formula
            )
        })
        .collect()
}

/// Fields offered for `role`. The table role has no field options.
pub fn field_options(fields: &[FieldDescriptor], role: Role) -> Vec<&FieldDescriptor> {
    match role {
        Role::Table => Vec::new(),
        r if r.is_date() => date_field_options(fields),
        _ => text_field_options(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("f1", "Owner", FieldType::User),
            FieldDescriptor::new("f2", "任务名称", FieldType::Text),
            FieldDescriptor::new("f3", "Plan Start", FieldType::DateTime),
            FieldDescriptor::new("f4", "Plan End", FieldType::DateTime),
            FieldDescriptor::new("f5", "实际完成时间", FieldType::DateTime),
            FieldDescriptor::new("f6", "Start note", FieldType::Text),
            FieldDescriptor::new("f7", "Effort", FieldType::Number),
            FieldDescriptor::new("f8", "Days left", FieldType::Formula),
        ]
    }

    #[test]
    fn test_first_textual_hit_wins() {
        let fields = fields();
        let hit = find_field_by_keywords(&fields, &["start"]).unwrap();
        assert_eq!(hit.id, "f3");
        let hit = find_field_by_keywords(&fields, &["END", "owner"]).unwrap();
        assert_eq!(hit.id, "f1");
        assert!(find_field_by_keywords(&fields, &["budget"]).is_none());
        let none: [&str; 0] = [];
        assert!(find_field_by_keywords(&fields, &none).is_none());
    }

    #[test]
    fn test_auto_fill_empty_mapping() {
        let mut mapping = RoleMapping {
            table_id: "tbl".into(),
            ..RoleMapping::default()
        };
        let filled = auto_fill(&mut mapping, &fields(), &KeywordRules::default());
        assert_eq!(filled, Role::FIELDS.to_vec());
        assert_eq!(mapping.get(Role::TaskName), Some("f2"));
        assert_eq!(mapping.get(Role::PlanStart), Some("f3"));
        assert_eq!(mapping.get(Role::PlanEnd), Some("f4"));
        assert_eq!(mapping.get(Role::ActualEnd), Some("f5"));
        assert_eq!(mapping.get(Role::Table), Some("tbl"));
    }

    #[test]
    fn test_auto_fill_never_overrides() {
        let mut mapping = RoleMapping {
            table_id: "tbl".into(),
            task_field_id: "f7".into(),
            ..RoleMapping::default()
        };
        let filled = auto_fill(&mut mapping, &fields(), &KeywordRules::default());
        assert!(!filled.contains(&Role::TaskName));
        assert_eq!(mapping.get(Role::TaskName), Some("f7"));
    }

    #[test]
    fn test_auto_fill_without_hits_leaves_roles_empty() {
        let mut mapping = RoleMapping::default();
        let fields = vec![FieldDescriptor::new("f1", "Owner", FieldType::User)];
        assert!(auto_fill(&mut mapping, &fields, &KeywordRules::default()).is_empty());
        assert_eq!(mapping, RoleMapping::default());
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = KeywordRules::empty();
        rules.extend(Role::TaskName, &["effort"]);
        assert_eq!(rules.keywords(Role::TaskName), vec!["effort"]);
        assert!(rules.keywords(Role::PlanEnd).is_empty());
        let mut mapping = RoleMapping::default();
        assert_eq!(auto_fill(&mut mapping, &fields(), &rules), vec![Role::TaskName]);
        assert_eq!(mapping.get(Role::TaskName), Some("f7"));
    }

    #[test]
    fn test_type_filters() {
        let fields = fields();
        let ids = |v: Vec<&FieldDescriptor>| v.into_iter().map(|f| f.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(date_field_options(&fields)), ["f3", "f4", "f5", "f6", "f8"]);
        assert_eq!(ids(text_field_options(&fields)), ["f2", "f6", "f7", "f8"]);
        assert!(field_options(&fields, Role::Table).is_empty());
        assert_eq!(field_options(&fields, Role::ActualEnd), date_field_options(&fields));
        assert_eq!(field_options(&fields, Role::PlanStart), date_field_options(&fields));
        assert_eq!(field_options(&fields, Role::TaskName), text_field_options(&fields));
    }
}
