use bson::{DateTime, Uuid};
use bugdesk_store::{document::Document, query::Expr};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    FieldEnum, ParamValue, Violations, append_param, double_option, equality_filter, field_enum, trimmed,
    trimmed_all,
};

pub const DEFAULT_DEPARTMENT: &str = "Engineering";
const MAX_NAME_CHARS: usize = 100;

/// Word characters are ASCII only.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?-u:\w)+([.-]?(?-u:\w)+)*@(?-u:\w)+([.-]?(?-u:\w)+)*(\.(?-u:\w){2,3})+$")
        .expect("Failed to compile email regex")
});

field_enum! {
    pub enum Role in "role" {
        Developer => "developer",
        Tester => "tester",
        Manager => "manager",
        Admin => "admin",
    }
}

field_enum! {
    pub enum UserStatus in "status" {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

/// A stored user. `email` is lowercased and unique across all users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub department: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Document for User {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "users"
    }
}

impl User {
    pub fn new(fields: UserFields) -> Self {
        let now = DateTime::now();

        Self {
            id: Uuid::new(),
            name: fields.name,
            email: fields.email,
            role: fields.role,
            status: fields.status,
            department: fields.department,
            phone: fields.phone,
            skills: fields.skills,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces every field with `fields` and refreshes `updated_at`.
    pub fn apply(&mut self, fields: UserFields) {
        self.name = fields.name;
        self.email = fields.email;
        self.role = fields.role;
        self.status = fields.status;
        self.department = fields.department;
        self.phone = fields.phone;
        self.skills = fields.skills;
        self.updated_at = DateTime::now();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub department: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub skills: Option<Vec<String>>,
}

impl UserPayload {
    /// Overlays this payload onto `base`. Fields present here win, including an
    /// explicit `null`.
    pub fn overlay(self, base: UserPayload) -> UserPayload {
        UserPayload {
            name: self.name.or(base.name),
            email: self.email.or(base.email),
            role: self.role.or(base.role),
            status: self.status.or(base.status),
            department: self.department.or(base.department),
            phone: self.phone.or(base.phone),
            skills: self.skills.or(base.skills),
        }
    }

    pub fn validate(self) -> Result<UserFields, Vec<String>> {
        let mut violations = Violations::default();

        let name = violations.required(self.name.flatten(), "User name is required");
        violations.max_chars(&name, MAX_NAME_CHARS, "Name cannot exceed 100 characters");
        let email = violations
            .required(self.email.flatten(), "Email is required")
            .to_lowercase();
        if !email.is_empty() {
            violations.check(EMAIL_PATTERN.is_match(&email), "Please provide a valid email");
        }
        let role = violations.one_of(self.role, Role::Developer);
        let status = violations.one_of(self.status, UserStatus::Active);
        let department = self
            .department
            .map(trimmed)
            .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());
        let phone = self.phone.flatten().map(trimmed);
        let skills = trimmed_all(self.skills.unwrap_or_default());

        violations.finish(UserFields {
            name,
            email,
            role,
            status,
            department,
            phone,
            skills,
        })
    }
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        UserPayload {
            name: Some(Some(user.name.clone())),
            email: Some(Some(user.email.clone())),
            role: Some(user.role.as_str().to_string()),
            status: Some(user.status.as_str().to_string()),
            department: Some(user.department.clone()),
            phone: Some(user.phone.clone()),
            skills: Some(user.skills.clone()),
        }
    }
}

/// Query-string filters for listing users.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct UserFilter {
    pub status: Option<ParamValue>,
    pub role: Option<ParamValue>,
    pub department: Option<ParamValue>,
}

impl UserFilter {
    pub fn to_expr(&self) -> Option<Expr> {
        equality_filter([
            ("status", self.status.as_ref()),
            ("role", self.role.as_ref()),
            ("department", self.department.as_ref()),
        ])
    }
}

impl From<Vec<(String, String)>> for UserFilter {
    fn from(params: Vec<(String, String)>) -> Self {
        let mut filter = UserFilter::default();

        for (name, value) in params {
            let slot = match name.as_str() {
                "status" => &mut filter.status,
                "role" => &mut filter.role,
                "department" => &mut filter.department,
                _ => continue,
            };
            append_param(slot, value);
        }

        filter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub suspended: u64,
    pub developer: u64,
    pub tester: u64,
    pub manager: u64,
    pub admin: u64,
}

impl<'a> FromIterator<&'a User> for UserStats {
    fn from_iter<I: IntoIterator<Item = &'a User>>(users: I) -> Self {
        users.into_iter().fold(UserStats::default(), |mut stats, user| {
            stats.total += 1;

            match user.status {
                UserStatus::Active => stats.active += 1,
                UserStatus::Inactive => stats.inactive += 1,
                UserStatus::Suspended => stats.suspended += 1,
            }

            match user.role {
                Role::Developer => stats.developer += 1,
                Role::Tester => stats.tester += 1,
                Role::Manager => stats.manager += 1,
                Role::Admin => stats.admin += 1,
            }

            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> UserPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let fields = payload(json!({ "name": "Alice", "email": "alice@example.com" }))
            .validate()
            .unwrap();

        assert_eq!(fields.role, Role::Developer);
        assert_eq!(fields.status, UserStatus::Active);
        assert_eq!(fields.department, DEFAULT_DEPARTMENT);
        assert_eq!(fields.phone, None);
        assert!(fields.skills.is_empty());
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let fields = payload(json!({ "name": "Alice", "email": "  Alice@Example.COM " }))
            .validate()
            .unwrap();

        assert_eq!(fields.email, "alice@example.com");
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in [
            "alice",
            "alice@",
            "alice@example",
            "alice@example.company",
            "a b@example.com",
            "josé@example.com",
            "jose@exämple.com",
            "alice@example.cöm",
        ] {
            let errors = payload(json!({ "name": "Alice", "email": email }))
                .validate()
                .unwrap_err();

            assert_eq!(errors, vec!["Please provide a valid email".to_string()], "{email}");
        }
    }

    #[test]
    fn dotted_and_dashed_emails_are_accepted() {
        for email in ["first.last@example.com", "first-last@mail.example.co.uk", "dev_1@corp.io"] {
            assert!(
                payload(json!({ "name": "Alice", "email": email })).validate().is_ok(),
                "{email}"
            );
        }
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let errors = UserPayload::default().validate().unwrap_err();

        assert_eq!(errors, vec!["User name is required".to_string(), "Email is required".to_string()]);
    }

    #[test]
    fn name_of_exactly_the_limit_is_accepted() {
        let fields = payload(json!({ "name": "n".repeat(100), "email": "alice@example.com" }))
            .validate()
            .unwrap();

        assert_eq!(fields.name.len(), 100);
    }

    #[test]
    fn explicit_null_email_fails_after_overlay() {
        let existing = User::new(
            payload(json!({ "name": "Alice", "email": "alice@example.com" }))
                .validate()
                .unwrap(),
        );

        let errors = payload(json!({ "email": null }))
            .overlay(UserPayload::from(&existing))
            .validate()
            .unwrap_err();

        assert_eq!(errors, vec!["Email is required".to_string()]);
    }

    #[test]
    fn long_names_and_bad_roles_are_rejected() {
        let errors = payload(json!({
            "name": "n".repeat(101),
            "email": "alice@example.com",
            "role": "owner",
        }))
        .validate()
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Name cannot exceed 100 characters".to_string(),
                "`owner` is not a valid enum value for path `role`.".to_string(),
            ]
        );
    }

    #[test]
    fn overlay_clears_phone_on_explicit_null() {
        let mut existing = User::new(
            payload(json!({ "name": "Alice", "email": "alice@example.com" }))
                .validate()
                .unwrap(),
        );
        existing.phone = Some("555-0100".into());

        let fields = payload(json!({ "phone": null, "department": "QA" }))
            .overlay(UserPayload::from(&existing))
            .validate()
            .unwrap();

        assert_eq!(fields.phone, None);
        assert_eq!(fields.department, "QA");
        assert_eq!(fields.email, "alice@example.com");
    }

    #[test]
    fn stats_count_status_and_role() {
        let base = payload(json!({ "name": "Alice", "email": "alice@example.com" }))
            .validate()
            .unwrap();
        let mut users = (0..3).map(|_| User::new(base.clone())).collect::<Vec<_>>();
        users[0].role = Role::Admin;
        users[1].status = UserStatus::Suspended;

        let stats = users.iter().collect::<UserStats>();

        assert_eq!(
            stats,
            UserStats { total: 3, active: 2, suspended: 1, developer: 2, admin: 1, ..UserStats::default() }
        );
    }
}
