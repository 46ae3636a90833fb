//! Plain comma-joined CSV for the two collections.
//!
//! Employee rows: `id,firstName,lastName,dateOfBirth,jobDescription`.
//! PTO rows: `employeeId,startDate,endDate`.
//! Fields are not quoted, so a comma inside a field cannot round-trip.

use crate::domain::{DATE_FORMAT, DateRange, Employee, EmployeeId, NewPto, PtoInterval, parse_day};
use crate::error::{PtoError, PtoResult};

const ROW_END: &str = "\r\n";

pub fn employees_to_csv(employees: &[Employee]) -> String {
    employees
        .iter()
        .map(|employee| {
            format!(
                "{},{},{},{},{}{ROW_END}",
                employee.id,
                employee.first_name,
                employee.last_name,
                employee.date_of_birth.format(DATE_FORMAT),
                employee.job_description
            )
        })
        .collect()
}

pub fn pto_to_csv(intervals: &[PtoInterval]) -> String {
    intervals
        .iter()
        .map(|interval| {
            format!(
                "{},{},{}{ROW_END}",
                interval.employee_id,
                interval.start().format(DATE_FORMAT),
                interval.end().format(DATE_FORMAT)
            )
        })
        .collect()
}

/// One result per non-empty line; errors name the 1-based line.
pub fn parse_employee_rows(text: &str) -> Vec<PtoResult<Employee>> {
    rows(text)
        .map(|(line, fields)| -> PtoResult<Employee> {
            let [id, first_name, last_name, date_of_birth, job_description] =
                <[&str; 5]>::try_from(fields.as_slice()).map_err(|_| {
                    row_error(line, format!("expected 5 fields, found {}", fields.len()))
                })?;

            let employee = Employee {
                id: parse_id(line, id)?,
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                date_of_birth: parse_day(date_of_birth).map_err(|e| row_error(line, e))?,
                job_description: job_description.trim().to_string(),
            };
            employee.validate().map_err(|e| row_error(line, e))?;
            Ok(employee)
        })
        .collect()
}

pub fn parse_pto_rows(text: &str) -> Vec<PtoResult<NewPto>> {
    rows(text)
        .map(|(line, fields)| -> PtoResult<NewPto> {
            let [id, start, end] = <[&str; 3]>::try_from(fields.as_slice()).map_err(|_| {
                row_error(line, format!("expected 3 fields, found {}", fields.len()))
            })?;

            let start = parse_day(start).map_err(|e| row_error(line, e))?;
            let end = parse_day(end).map_err(|e| row_error(line, e))?;
            Ok(NewPto {
                employee_id: parse_id(line, id)?,
                span: DateRange::new(start, end).map_err(|e| row_error(line, e))?,
            })
        })
        .collect()
}

fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.trim()
        .lines()
        .enumerate()
        .filter(|(_, row)| !row.trim().is_empty())
        .map(|(index, row)| (index + 1, row.trim_end_matches('\r').split(',').collect()))
}

fn parse_id(line: usize, raw: &str) -> PtoResult<EmployeeId> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| row_error(line, format!("invalid employee id '{raw}'")))?;
    EmployeeId::new(id).map_err(|e| row_error(line, e))
}

fn row_error(line: usize, reason: impl std::fmt::Display) -> PtoError {
    PtoError::validation(format!("line {line}: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PtoKey;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn employee_rows_are_five_fields_with_crlf() {
        let employees = vec![Employee {
            id: EmployeeId(3),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            date_of_birth: date(1990, 12, 10),
            job_description: "Analyst".to_string(),
        }];
        assert_eq!(
            employees_to_csv(&employees),
            "3,Ada,Lovelace,1990-12-10,Analyst\r\n"
        );
    }

    #[test]
    fn pto_rows_are_three_fields() {
        let intervals = vec![PtoInterval {
            key: PtoKey(8),
            employee_id: EmployeeId(3),
            span: DateRange::new(date(2024, 7, 1), date(2024, 7, 12)).unwrap(),
        }];
        assert_eq!(pto_to_csv(&intervals), "3,2024-07-01,2024-07-12\r\n");
    }

    #[test]
    fn parses_mixed_line_endings_and_skips_blank_lines() {
        let text =
            "1,Ada,Lovelace,1990-12-10,Analyst\r\n\n2,Alan,Turing,1912-06-23,Mathematician\n";
        let parsed: Vec<_> = parse_employee_rows(text)
            .into_iter()
            .collect::<PtoResult<_>>()
            .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].id, EmployeeId(2));
        assert_eq!(parsed[1].job_description, "Mathematician");
    }

    #[test]
    fn bad_rows_report_their_line() {
        let text = concat!(
            "1,2024-01-01,2024-01-03\n",
            "2,2024-02-05\n",
            "x,2024-01-01,2024-01-02\n",
            "4,2024-03-09,2024-03-01",
        );
        let parsed = parse_pto_rows(text);
        assert_eq!(parsed.len(), 4);
        assert!(parsed[0].is_ok());
        assert!(parsed[1].as_ref().unwrap_err().to_string().starts_with("line 2:"));
        assert!(parsed[2].as_ref().unwrap_err().to_string().contains("invalid employee id"));
        assert!(parsed[3].as_ref().unwrap_err().to_string().starts_with("line 4:"));
    }

    #[test]
    fn accepts_timestamp_dates_from_older_exports() {
        let parsed = parse_pto_rows("5,2024-01-01T00:00:00.000Z,2024-01-03T00:00:00.000Z");
        let pto = parsed.into_iter().next().unwrap().unwrap();
        assert_eq!(pto.span.len_days(), 3);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(parse_employee_rows("  \r\n ").is_empty());
    }
}
