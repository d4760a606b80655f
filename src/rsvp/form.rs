use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Rsvp;
use crate::rsvp::RsvpError;

pub const MISSING_FIELDS: &str = "Please enter your name, attendance, and side.";
pub const MISSING_MEAL: &str = "Please select your meal preference.";

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Bride,
    Groom,
}

impl Side {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRIDE" => Some(Self::Bride),
            "GROOM" => Some(Self::Groom),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bride => "Bride's side",
            Self::Groom => "Groom's side",
        }
    }
}

/// Body of `POST /api/rsvp`, as the page sends it.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    #[serde(default)]
    pub name: String,
    pub side: Option<String>,
    pub is_attending: Option<bool>,
    pub guest_count: Option<u32>,
    pub has_meal: Option<bool>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A checked and normalized RSVP.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSubmission {
    pub id: Uuid,
    pub name: String,
    pub side: Side,
    pub is_attending: bool,
    pub guest_count: u32,
    pub has_meal: Option<bool>,
    pub timestamp: DateTime<Utc>,
}

impl RsvpRequest {
    pub fn validate(self, rules: &Rsvp) -> Result<RsvpSubmission, RsvpError> {
        let name = self.name.trim().to_string();
        let side = self.side.as_deref().and_then(Side::parse);

        let (Some(side), Some(is_attending)) = (side, self.is_attending) else {
            return Err(RsvpError::invalid(MISSING_FIELDS));
        };
        if name.is_empty() {
            return Err(RsvpError::invalid(MISSING_FIELDS));
        }

        if rules.show_meal_option && is_attending && self.has_meal.is_none() {
            return Err(RsvpError::invalid(MISSING_MEAL));
        }

        let guest_count = if is_attending {
            let count = self.guest_count.unwrap_or(1);
            if count < 1 || count > rules.max_guests {
                return Err(RsvpError::invalid(format!(
                    "Number of guests must be between 1 and {}.",
                    rules.max_guests
                )));
            }
            count
        } else {
            0
        };

        let has_meal = if is_attending {
            self.has_meal
        } else {
            Some(false)
        };

        Ok(RsvpSubmission {
            id: Uuid::new_v4(),
            name,
            side,
            is_attending,
            guest_count,
            has_meal,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(show_meal_option: bool) -> Rsvp {
        Rsvp {
            enabled: true,
            show_meal_option,
            max_guests: 5,
        }
    }

    fn request() -> RsvpRequest {
        RsvpRequest {
            name: "  Jiwoo Kim ".to_string(),
            side: Some("BRIDE".to_string()),
            is_attending: Some(true),
            guest_count: Some(2),
            has_meal: Some(true),
            timestamp: None,
        }
    }

    fn message(err: RsvpError) -> String {
        err.to_string()
    }

    #[test]
    fn complete_request_is_accepted() {
        let submission = request().validate(&rules(true)).expect("request should validate");
        assert_eq!(submission.name, "Jiwoo Kim");
        assert_eq!(submission.side, Side::Bride);
        assert_eq!(submission.guest_count, 2);
        assert_eq!(submission.has_meal, Some(true));
    }

    #[test]
    fn name_side_and_attendance_are_required() {
        let blank = RsvpRequest {
            name: "   ".to_string(),
            ..request()
        };
        assert_eq!(message(blank.validate(&rules(false)).unwrap_err()), MISSING_FIELDS);

        let no_side = RsvpRequest {
            side: Some(String::new()),
            ..request()
        };
        assert_eq!(message(no_side.validate(&rules(false)).unwrap_err()), MISSING_FIELDS);

        let undecided = RsvpRequest {
            is_attending: None,
            ..request()
        };
        assert_eq!(message(undecided.validate(&rules(false)).unwrap_err()), MISSING_FIELDS);
    }

    #[test]
    fn meal_is_required_only_when_asked_and_attending() {
        let no_meal = RsvpRequest {
            has_meal: None,
            ..request()
        };
        assert_eq!(message(no_meal.validate(&rules(true)).unwrap_err()), MISSING_MEAL);

        let no_meal = RsvpRequest {
            has_meal: None,
            ..request()
        };
        let submission = no_meal.validate(&rules(false)).expect("meal is optional");
        assert_eq!(submission.has_meal, None);

        let absent = RsvpRequest {
            is_attending: Some(false),
            has_meal: None,
            ..request()
        };
        assert!(absent.validate(&rules(true)).is_ok());
    }

    #[test]
    fn declining_guests_are_normalized() {
        let declined = RsvpRequest {
            is_attending: Some(false),
            guest_count: Some(4),
            has_meal: Some(true),
            ..request()
        };
        let submission = declined.validate(&rules(true)).expect("request should validate");
        assert_eq!(submission.guest_count, 0);
        assert_eq!(submission.has_meal, Some(false));
    }

    #[test]
    fn guest_count_is_bounded() {
        let crowd = RsvpRequest {
            guest_count: Some(6),
            ..request()
        };
        assert!(crowd.validate(&rules(false)).is_err());

        let nobody = RsvpRequest {
            guest_count: Some(0),
            ..request()
        };
        assert!(nobody.validate(&rules(false)).is_err());

        let unspecified = RsvpRequest {
            guest_count: None,
            ..request()
        };
        let submission = unspecified.validate(&rules(false)).expect("one guest by default");
        assert_eq!(submission.guest_count, 1);
    }

    #[test]
    fn side_is_case_insensitive() {
        let groom = RsvpRequest {
            side: Some("groom".to_string()),
            ..request()
        };
        let submission = groom.validate(&rules(false)).expect("request should validate");
        assert_eq!(submission.side, Side::Groom);
        assert_eq!(submission.side.label(), "Groom's side");
    }
}
