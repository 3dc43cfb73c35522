use crate::domain::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const TITLE_REQUIRED: &str = "Requires a title.";
pub const DESCRIPTION_REQUIRED: &str = "Requires a description.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// A course together with the public part of its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWithOwner {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
    pub user_id: i64,
    #[serde(rename = "User")]
    pub owner: UserSummary,
}

impl CourseWithOwner {
    pub fn new(course: Course, owner: UserSummary) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            estimated_time: course.estimated_time,
            materials_needed: course.materials_needed,
            user_id: course.user_id,
            owner,
        }
    }
}

/// Body of `POST /courses` and `PUT /courses/{id}`.
///
/// Any `userId` sent by the client is ignored; ownership always comes from
/// the authenticated user.
///
/// The optional columns distinguish a missing key (`None`) from an explicit
/// `null` (`Some(None)`), so an update only touches the keys it was sent.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub materials_needed: Option<Option<String>>,
}

/// Marks a key that appeared in the body, even when its value is `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Validated, writable course columns.
///
/// `None` for an optional column leaves it untouched on update and stores
/// NULL on insert; `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub title: String,
    pub description: String,
    pub estimated_time: Option<Option<String>>,
    pub materials_needed: Option<Option<String>>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CourseInput {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if non_blank(&self.title).is_none() {
            errors.push(TITLE_REQUIRED.to_string());
        }
        if non_blank(&self.description).is_none() {
            errors.push(DESCRIPTION_REQUIRED.to_string());
        }
        errors
    }

    /// Validates and converts in one step; `Err` carries the message list.
    pub fn into_fields(self) -> Result<CourseFields, Vec<String>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let optional = |v: Option<Option<String>>| {
            v.map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        };
        Ok(CourseFields {
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default().trim().to_string(),
            estimated_time: optional(self.estimated_time),
            materials_needed: optional(self.materials_needed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_title_and_description() {
        let errors = CourseInput::default().validate();
        assert_eq!(errors, vec![TITLE_REQUIRED, DESCRIPTION_REQUIRED]);
    }

    #[test]
    fn test_blank_description_only() {
        let input = CourseInput {
            title: Some("Build a Basic Bookcase".to_string()),
            description: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(input.validate(), vec![DESCRIPTION_REQUIRED]);
    }

    #[test]
    fn test_into_fields_normalizes_optional_columns() {
        let input = CourseInput {
            title: Some(" Learn How to Program ".to_string()),
            description: Some("In this course, you'll learn how to write code.".to_string()),
            estimated_time: Some(Some("".to_string())),
            materials_needed: Some(Some("* Notebook computer".to_string())),
        };
        let fields = input.into_fields().unwrap();
        assert_eq!(fields.title, "Learn How to Program");
        assert_eq!(fields.estimated_time, Some(None));
        assert_eq!(fields.materials_needed, Some(Some("* Notebook computer".to_string())));
    }

    #[test]
    fn test_absent_and_null_optional_columns_differ() {
        let input: CourseInput = serde_json::from_str(
            r#"{"title": "t", "description": "d", "materialsNeeded": null}"#,
        )
        .unwrap();
        assert_eq!(input.estimated_time, None);
        assert_eq!(input.materials_needed, Some(None));

        let fields = input.into_fields().unwrap();
        assert_eq!(fields.estimated_time, None);
        assert_eq!(fields.materials_needed, Some(None));
    }

    #[test]
    fn test_absent_optional_columns_are_not_serialized() {
        let input = CourseInput {
            title: Some("t".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("estimatedTime").is_none());
    }

    #[test]
    fn test_into_fields_returns_errors() {
        let input = CourseInput {
            description: Some("desc".to_string()),
            ..Default::default()
        };
        assert_eq!(input.into_fields().unwrap_err(), vec![TITLE_REQUIRED]);
    }

    #[test]
    fn test_course_with_owner_serializes_owner_under_user_key() {
        let course = CourseWithOwner {
            id: 7,
            title: "t".to_string(),
            description: "d".to_string(),
            estimated_time: Some("6 hours".to_string()),
            materials_needed: None,
            user_id: 3,
            owner: UserSummary {
                id: 3,
                first_name: "Sally".to_string(),
                last_name: "Jones".to_string(),
                email_address: "sally@jones.com".to_string(),
            },
        };
        let json = serde_json::to_value(&course).unwrap();
        assert_eq!(json["estimatedTime"], "6 hours");
        assert_eq!(json["userId"], 3);
        assert_eq!(json["User"]["firstName"], "Sally");
        assert!(json["materialsNeeded"].is_null());
    }
}
