use crate::error::{PtoError, PtoResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl EmployeeId {
    pub fn new(id: i64) -> PtoResult<Self> {
        if id <= 0 {
            return Err(PtoError::validation(format!(
                "Employee id must be positive, got {id}"
            )));
        }
        Ok(Self(id))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub job_description: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> PtoResult<()> {
        require_fields(&[&self.first_name, &self.last_name, &self.job_description])
    }
}

/// Employee fields as entered, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub job_description: String,
}

impl NewEmployee {
    pub fn validate(&self) -> PtoResult<()> {
        require_fields(&[&self.first_name, &self.last_name, &self.job_description])
    }

    pub fn with_id(self, id: EmployeeId) -> Employee {
        Employee {
            id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: self.date_of_birth,
            job_description: self.job_description.trim().to_string(),
        }
    }
}

fn require_fields(fields: &[&str]) -> PtoResult<()> {
    if fields.iter().any(|field| field.trim().is_empty()) {
        return Err(PtoError::validation("All fields are required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewEmployee {
        NewEmployee {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            job_description: "Analyst".to_string(),
        }
    }

    #[test]
    fn ids_must_be_positive() {
        assert!(EmployeeId::new(0).is_err());
        assert!(EmployeeId::new(-3).is_err());
        assert_eq!(EmployeeId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut employee = draft();
        employee.job_description = "   ".to_string();
        let err = employee.validate().unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
    }

    #[test]
    fn with_id_trims_names() {
        let employee = draft().with_id(EmployeeId(1));
        assert_eq!(employee.full_name(), "Ada Lovelace");
        assert!(employee.validate().is_ok());
    }

    #[test]
    fn serializes_with_a_bare_numeric_id() {
        let json = serde_json::to_value(draft().with_id(EmployeeId(3))).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["first_name"], "Ada");
        assert_eq!(json["date_of_birth"], "1990-12-10");
    }
}
