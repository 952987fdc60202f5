//! Domain model for writing member rows.
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::{CreateMemberRequest, MemberRole, MemberStatus};

pub const MAX_NAME_LENGTH: usize = 100;

/// Row inserted into `members`; id and timestamps come from the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMemberRow {
    pub member_code: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub join_date: Option<NaiveDate>,
    pub role: MemberRole,
    pub status: MemberStatus,
}

impl NewMemberRow {
    /// Trim the request's text fields and fill in defaults
    pub fn from_request(request: CreateMemberRequest) -> Self {
        Self {
            member_code: request.member_code.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            middle_name: trimmed(request.middle_name),
            last_name: request.last_name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            phone: trimmed(request.phone),
            address: trimmed(request.address),
            birth_date: request.birth_date,
            join_date: request.join_date,
            role: request.role.unwrap_or_default(),
            status: MemberStatus::Active,
        }
    }
}

/// Partial update of a `members` row; `None` fields are not sent
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MemberChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl MemberChanges {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            ..Self::default()
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a personal name field
pub fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    if value.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(format!("{} cannot exceed {} characters", field, MAX_NAME_LENGTH));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), String> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("Invalid email address: {}", value)),
    }
}

/// A member cannot have joined before being born
pub fn validate_dates(birth_date: Option<NaiveDate>, join_date: Option<NaiveDate>) -> Result<(), String> {
    if let (Some(birth), Some(join)) = (birth_date, join_date) {
        if join < birth {
            return Err(format!(
                "Join date {} cannot be before birth date {}",
                join, birth
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_trims_and_defaults() {
        let row = NewMemberRow::from_request(CreateMemberRequest {
            member_code: " M-0007 ".to_string(),
            first_name: " Ana ".to_string(),
            middle_name: Some("  ".to_string()),
            last_name: "Reyes".to_string(),
            email: "Ana@Example.COM".to_string(),
            phone: None,
            address: Some(" Quezon City ".to_string()),
            birth_date: None,
            join_date: None,
            role: None,
        });

        assert_eq!(row.member_code, "M-0007");
        assert_eq!(row.first_name, "Ana");
        assert_eq!(row.middle_name, None);
        assert_eq!(row.email, "ana@example.com");
        assert_eq!(row.address.as_deref(), Some("Quezon City"));
        assert_eq!(row.role, MemberRole::Member);
        assert_eq!(row.status, MemberStatus::Active);
    }

    #[test]
    fn test_changes_only_serialize_present_fields() {
        let mut changes = MemberChanges::at(Utc::now());
        changes.status = Some(MemberStatus::Inactive);

        let json = serde_json::to_value(&changes).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["status"], "inactive");
        assert!(object.contains_key("updated_at"));
    }

    #[test]
    fn test_validators() {
        assert!(validate_name("First name", "Ana").is_ok());
        assert!(validate_name("First name", "  ").is_err());
        assert!(validate_name("First name", &"x".repeat(101)).is_err());

        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("@example.com").is_err());

        let birth = NaiveDate::from_ymd_opt(2000, 1, 1);
        let join = NaiveDate::from_ymd_opt(1999, 12, 31);
        assert!(validate_dates(birth, join).is_err());
        assert!(validate_dates(birth, None).is_ok());
    }
}
