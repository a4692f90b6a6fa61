use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Role granted to an LMS account.
///
/// Parsing is case-insensitive. Role names the client does not know map to
/// [`Role::Unknown`], which never satisfies a role query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Instructor,
    Admin,
    Unknown,
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from_str(raw.trim()).unwrap_or(Role::Unknown))
    }
}

/// Profile returned by `GET /auth/me`, login, and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Accepts either `"roles": [..]` or a single `"role": ".."`.
    #[serde(default, alias = "role", deserialize_with = "one_or_many")]
    pub roles: Vec<Role>,
}

impl UserProfile {
    /// Whether this user holds `role`. Unknown and empty role names never match.
    pub fn has_role(&self, role: &str) -> bool {
        match Role::from_str(role.trim()) {
            Ok(Role::Unknown) | Err(_) => false,
            Ok(role) => self.roles.contains(&role),
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Role),
        Many(Vec<Role>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(role) => vec![role],
        OneOrMany::Many(roles) => roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_role_field_is_accepted() {
        let user: UserProfile = serde_json::from_str(
            r#"{"_id":"u1","name":"Ada","email":"ada@example.edu","role":"Instructor"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.roles, vec![Role::Instructor]);
    }

    #[test]
    fn unknown_roles_never_match() {
        let user: UserProfile =
            serde_json::from_str(r#"{"id":"u2","roles":["student","librarian"]}"#).unwrap();
        assert_eq!(user.roles, vec![Role::Student, Role::Unknown]);
        assert!(user.has_role("STUDENT"));
        assert!(!user.has_role("librarian"));
        assert!(!user.has_role("unknown"));
        assert!(!user.has_role(""));
    }

    #[test]
    fn roles_serialize_lowercase() {
        let user = UserProfile {
            id: "u3".to_string(),
            name: "Grace".to_string(),
            email: "grace@example.edu".to_string(),
            roles: vec![Role::Admin],
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["admin"]));
    }
}
