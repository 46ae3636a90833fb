use crate::domain::{
    Bucket, DateRange, Employee, EmployeeId, NewEmployee, NewPto, PtoInterval, PtoKey,
    find_conflict, parse_day,
};
use crate::error::{PtoError, PtoResult};
use crate::infrastructure::csv_transfer::{
    employees_to_csv, parse_employee_rows, parse_pto_rows, pto_to_csv,
};
use crate::infrastructure::{EmployeeDirectory, EmployeeRegistry, PtoRepository, RosterStorage};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// What happens to an employee's PTO when the employee is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    Cascade,
    Orphan,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(DeletePolicy::Cascade),
            "orphan" => Ok(DeletePolicy::Orphan),
            other => Err(format!(
                "unknown delete policy '{other}' (expected cascade or orphan)"
            )),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Cascade => f.write_str("cascade"),
            DeletePolicy::Orphan => f.write_str("orphan"),
        }
    }
}

/// Raw PTO form input; every field may still be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PtoRequest {
    pub employee_id: Option<EmployeeId>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl PtoRequest {
    pub fn new(employee_id: EmployeeId, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            employee_id: Some(employee_id),
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Checks presence, then date syntax, then ordering.
    pub fn validate(&self) -> PtoResult<(EmployeeId, DateRange)> {
        let employee_id = self
            .employee_id
            .ok_or_else(|| PtoError::validation("Please select an employee"))?;
        let start = present(&self.start).ok_or_else(|| PtoError::validation("Missing start date"))?;
        let end = present(&self.end).ok_or_else(|| PtoError::validation("Missing end date"))?;

        let span = DateRange::new(parse_day(start)?, parse_day(end)?)?;
        Ok((employee_id, span))
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeCard {
    pub employee: Employee,
    pub past: Vec<PtoInterval>,
    pub current: Vec<PtoInterval>,
    pub upcoming: Vec<PtoInterval>,
}

impl EmployeeCard {
    fn new(employee: Employee) -> Self {
        Self {
            employee,
            past: Vec::new(),
            current: Vec::new(),
            upcoming: Vec::new(),
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[PtoInterval] {
        match bucket {
            Bucket::Past => &self.past,
            Bucket::Current => &self.current,
            Bucket::Upcoming => &self.upcoming,
        }
    }

    fn push(&mut self, bucket: Bucket, interval: PtoInterval) {
        match bucket {
            Bucket::Past => self.past.push(interval),
            Bucket::Current => self.current.push(interval),
            Bucket::Upcoming => self.upcoming.push(interval),
        }
    }

    pub fn total(&self) -> usize {
        self.past.len() + self.current.len() + self.upcoming.len()
    }
}

/// Every employee's PTO split into buckets relative to `today`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub today: NaiveDate,
    pub cards: Vec<EmployeeCard>,
    /// Intervals whose employee no longer exists.
    pub orphans: Vec<PtoInterval>,
}

impl Board {
    pub fn card(&self, id: EmployeeId) -> Option<&EmployeeCard> {
        self.cards.iter().find(|card| card.employee.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dismissal {
    pub removed_pto: usize,
    pub orphaned_pto: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub struct Roster {
    storage: Box<dyn RosterStorage>,
    policy: DeletePolicy,
}

impl Roster {
    pub fn new(storage: Box<dyn RosterStorage>, policy: DeletePolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    pub fn backend_info(&self) -> &str {
        self.storage.backend_info()
    }

    pub fn employees(&self) -> PtoResult<Vec<Employee>> {
        self.storage.list_all()
    }

    pub fn employee(&self, id: EmployeeId) -> PtoResult<Option<Employee>> {
        self.storage.find(id)
    }

    fn require_employee(&self, id: EmployeeId) -> PtoResult<Employee> {
        self.storage
            .find(id)?
            .ok_or_else(|| PtoError::validation(format!("No employee with id {id}")))
    }

    pub fn hire(&self, draft: NewEmployee) -> PtoResult<Employee> {
        draft.validate()?;
        let id = self.storage.allocate_id()?;
        let employee = draft.with_id(id);
        self.storage.add(&employee)?;
        Ok(employee)
    }

    /// Replaces every field of an existing employee.
    pub fn update_employee(&self, employee: &Employee) -> PtoResult<()> {
        employee.validate()?;
        if !self.storage.replace(employee)? {
            return Err(PtoError::validation(format!(
                "No employee with id {}",
                employee.id
            )));
        }
        info!("updated employee {}", employee.id);
        Ok(())
    }

    pub fn dismiss(&self, id: EmployeeId) -> PtoResult<Dismissal> {
        self.dismiss_with(id, self.policy)
    }

    pub fn dismiss_with(&self, id: EmployeeId, policy: DeletePolicy) -> PtoResult<Dismissal> {
        self.require_employee(id)?;

        let orphaned_pto = match policy {
            DeletePolicy::Cascade => 0,
            DeletePolicy::Orphan => self.storage.list_by_employee(id)?.len(),
        };
        let removed_pto = self
            .storage
            .remove_employee(id, policy)?
            .ok_or_else(|| PtoError::validation(format!("No employee with id {id}")))?;

        if orphaned_pto > 0 {
            warn!("keeping {orphaned_pto} PTO record(s) of deleted employee {id}");
        }
        info!("deleted employee {id} ({policy})");
        Ok(Dismissal {
            removed_pto,
            orphaned_pto,
        })
    }

    pub fn pto_for(&self, id: EmployeeId) -> PtoResult<Vec<PtoInterval>> {
        self.storage.list_by_employee(id)
    }

    /// Validates a raw request and books it when it clashes with nothing.
    pub fn request_pto(&self, request: &PtoRequest) -> PtoResult<PtoInterval> {
        let (employee_id, span) = request.validate()?;
        self.book_pto(employee_id, span)
    }

    pub fn book_pto(&self, employee_id: EmployeeId, span: DateRange) -> PtoResult<PtoInterval> {
        self.require_employee(employee_id)?;

        let existing = self.storage.list_by_employee(employee_id)?;
        if let Some(clash) = find_conflict(employee_id, &span, &existing) {
            info!(
                "rejected PTO {span} for employee {employee_id}: overlaps {}",
                clash.key
            );
            return Err(PtoError::Conflict {
                employee_id,
                requested: span,
                existing: clash.key,
            });
        }

        let key = self.storage.insert(NewPto { employee_id, span })?;
        Ok(PtoInterval {
            key,
            employee_id,
            span,
        })
    }

    pub fn cancel_pto(&self, key: PtoKey) -> PtoResult<()> {
        self.storage.delete_by_key(key)
    }

    pub fn board(&self, today: NaiveDate) -> PtoResult<Board> {
        let employees = self.storage.list_all()?;
        let mut intervals = self.storage.list_all_intervals()?;
        intervals.sort_by_key(|interval| (interval.start(), interval.key));

        let index: HashMap<EmployeeId, usize> = employees
            .iter()
            .enumerate()
            .map(|(position, employee)| (employee.id, position))
            .collect();
        let mut cards: Vec<EmployeeCard> = employees.into_iter().map(EmployeeCard::new).collect();
        let mut orphans = Vec::new();

        for interval in intervals {
            match index.get(&interval.employee_id) {
                Some(&position) => cards[position].push(interval.bucket(today), interval),
                None => orphans.push(interval),
            }
        }

        Ok(Board {
            today,
            cards,
            orphans,
        })
    }

    pub fn export_employees(&self) -> PtoResult<String> {
        Ok(employees_to_csv(&self.storage.list_all()?))
    }

    pub fn export_pto(&self) -> PtoResult<String> {
        Ok(pto_to_csv(&self.storage.list_all_intervals()?))
    }

    /// Imports employees keeping their ids; rows that fail to parse or reuse an id are skipped.
    pub fn import_employees(&self, csv: &str) -> PtoResult<ImportSummary> {
        let mut known: HashSet<EmployeeId> = self
            .storage
            .list_all()?
            .into_iter()
            .map(|employee| employee.id)
            .collect();
        let mut summary = ImportSummary::default();
        let mut highest: Option<EmployeeId> = None;

        for row in parse_employee_rows(csv) {
            let employee = match row {
                Ok(employee) => employee,
                Err(e) => {
                    warn!("skipping employee row: {e}");
                    summary.skipped += 1;
                    continue;
                }
            };
            if !known.insert(employee.id) {
                warn!("skipping employee {}: id already in use", employee.id);
                summary.skipped += 1;
                continue;
            }

            self.storage.add(&employee)?;
            highest = highest.max(Some(employee.id));
            summary.imported += 1;
        }

        if let Some(highest) = highest {
            self.storage.ensure_id_floor(highest)?;
        }
        info!(
            "imported {} employee(s), skipped {}",
            summary.imported, summary.skipped
        );
        Ok(summary)
    }

    /// Imports PTO rows as given, without conflict checks.
    pub fn import_pto(&self, csv: &str) -> PtoResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for row in parse_pto_rows(csv) {
            match row {
                Ok(pto) => {
                    self.storage.insert(pto)?;
                    summary.imported += 1;
                }
                Err(e) => {
                    warn!("skipping PTO row: {e}");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "imported {} PTO record(s), skipped {}",
            summary.imported, summary.skipped
        );
        Ok(summary)
    }

    pub fn wipe(&self) -> PtoResult<()> {
        self.storage.wipe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_utils::test_harness::TestStorage;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(first: &str) -> NewEmployee {
        NewEmployee {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: date(1990, 1, 1),
            job_description: "Clerk".to_string(),
        }
    }

    #[test]
    fn request_validation_order() {
        let mut request = PtoRequest::default();
        let message = |request: &PtoRequest| request.validate().unwrap_err().to_string();

        assert_eq!(message(&request), "Please select an employee");
        request.employee_id = Some(EmployeeId(1));
        assert_eq!(message(&request), "Missing start date");
        request.start = Some("2024-01-10".to_string());
        request.end = Some(" ".to_string());
        assert_eq!(message(&request), "Missing end date");
        request.end = Some("2024-01-09".to_string());
        assert_eq!(
            message(&request),
            "Start date must not be greater than end date"
        );
        request.end = Some("2024-01-10".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn hire_assigns_sequential_ids() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();

        let first = roster.hire(draft("Ann")).unwrap();
        let second = roster.hire(draft("Bob")).unwrap();
        assert_eq!((first.id, second.id), (EmployeeId(1), EmployeeId(2)));

        let mut blank = draft("Cy");
        blank.last_name = String::new();
        assert!(matches!(roster.hire(blank), Err(PtoError::Validation(_))));
        assert_eq!(roster.employees().unwrap().len(), 2);
    }

    #[test]
    fn update_replaces_all_fields() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let mut employee = roster.hire(draft("Ann")).unwrap();

        employee.first_name = "Anne".to_string();
        employee.date_of_birth = date(1991, 2, 3);
        roster.update_employee(&employee).unwrap();
        assert_eq!(roster.employee(employee.id).unwrap(), Some(employee.clone()));

        employee.id = EmployeeId(42);
        assert!(matches!(
            roster.update_employee(&employee),
            Err(PtoError::Validation(_))
        ));
    }

    #[test]
    fn conflicting_request_is_rejected_without_writing() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let employee = roster.hire(draft("Ann")).unwrap();

        let booked = roster
            .request_pto(&PtoRequest::new(employee.id, "2024-01-01", "2024-01-05"))
            .unwrap();

        let err = roster
            .request_pto(&PtoRequest::new(employee.id, "2024-01-05", "2024-01-10"))
            .unwrap_err();
        match err {
            PtoError::Conflict { existing, .. } => assert_eq!(existing, booked.key),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(roster.pto_for(employee.id).unwrap().len(), 1);

        roster
            .request_pto(&PtoRequest::new(employee.id, "2024-01-06", "2024-01-10"))
            .unwrap();
        assert_eq!(roster.pto_for(employee.id).unwrap().len(), 2);
    }

    #[test]
    fn other_employees_do_not_block_requests() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let ann = roster.hire(draft("Ann")).unwrap();
        let bob = roster.hire(draft("Bob")).unwrap();

        roster
            .request_pto(&PtoRequest::new(ann.id, "2024-01-01", "2024-01-05"))
            .unwrap();
        roster
            .request_pto(&PtoRequest::new(bob.id, "2024-01-01", "2024-01-05"))
            .unwrap();
    }

    #[test]
    fn unknown_employee_cannot_book() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let err = roster
            .request_pto(&PtoRequest::new(EmployeeId(9), "2024-01-01", "2024-01-05"))
            .unwrap_err();
        assert_eq!(err.to_string(), "No employee with id 9");
    }

    #[test]
    fn invalid_requests_leave_storage_untouched() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let employee = roster.hire(draft("Ann")).unwrap();

        let missing_start = PtoRequest {
            employee_id: Some(employee.id),
            start: None,
            end: Some("2024-01-05".to_string()),
        };
        let reversed = PtoRequest::new(employee.id, "2024-01-06", "2024-01-05");
        let unknown = PtoRequest::new(EmployeeId(9), "2024-01-01", "2024-01-05");

        for request in [missing_start, reversed, unknown] {
            let err = roster.request_pto(&request).unwrap_err();
            assert!(matches!(err, PtoError::Validation(_)), "{err}");
            assert!(test_storage.storage().list_all_intervals().unwrap().is_empty());
        }
    }

    #[test]
    fn cancelled_pto_frees_the_dates() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let employee = roster.hire(draft("Ann")).unwrap();
        let span = DateRange::new(date(2024, 5, 1), date(2024, 5, 3)).unwrap();

        let booked = roster.book_pto(employee.id, span).unwrap();
        roster.cancel_pto(booked.key).unwrap();
        roster.cancel_pto(booked.key).unwrap();
        assert!(roster.book_pto(employee.id, span).is_ok());
    }

    #[test]
    fn dismiss_cascade_removes_pto() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster_with(DeletePolicy::Cascade);
        let employee = roster.hire(draft("Ann")).unwrap();
        test_storage
            .create_sample_pto(&employee, date(2024, 1, 1), date(2024, 1, 2))
            .unwrap();

        let colleague = roster.hire(draft("Bea")).unwrap();
        test_storage
            .create_sample_pto(&colleague, date(2024, 1, 1), date(2024, 1, 2))
            .unwrap();

        let dismissal = roster.dismiss(employee.id).unwrap();
        assert_eq!(dismissal.removed_pto, 1);
        assert_eq!(dismissal.orphaned_pto, 0);
        assert_eq!(roster.employees().unwrap(), vec![colleague.clone()]);
        let storage = test_storage.storage();
        assert!(storage.list_by_employee(employee.id).unwrap().is_empty());
        assert_eq!(storage.list_all_intervals().unwrap().len(), 1);
        assert!(roster.board(date(2024, 1, 1)).unwrap().orphans.is_empty());
        assert!(matches!(
            roster.dismiss(employee.id),
            Err(PtoError::Validation(_))
        ));
    }

    #[test]
    fn dismiss_orphan_keeps_pto_visible_on_board() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster_with(DeletePolicy::Orphan);
        let employee = roster.hire(draft("Ann")).unwrap();
        test_storage
            .create_sample_pto(&employee, date(2024, 1, 1), date(2024, 1, 2))
            .unwrap();

        let dismissal = roster.dismiss(employee.id).unwrap();
        assert_eq!(dismissal.orphaned_pto, 1);

        let board = roster.board(date(2024, 1, 1)).unwrap();
        assert!(board.cards.is_empty());
        assert_eq!(board.orphans.len(), 1);
    }

    #[test]
    fn board_buckets_and_sorts() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let ann = roster.hire(draft("Ann")).unwrap();
        let bob = roster.hire(draft("Bob")).unwrap();

        test_storage
            .create_sample_pto(&ann, date(2024, 1, 20), date(2024, 1, 25))
            .unwrap();
        test_storage
            .create_sample_pto(&ann, date(2024, 1, 1), date(2024, 1, 10))
            .unwrap();
        test_storage
            .create_sample_pto(&ann, date(2024, 1, 10), date(2024, 1, 20))
            .unwrap();
        test_storage
            .create_sample_pto(&ann, date(2023, 12, 1), date(2023, 12, 2))
            .unwrap();

        let board = roster.board(date(2024, 1, 15)).unwrap();
        assert_eq!(board.cards.len(), 2);

        let card = board.card(ann.id).unwrap();
        assert_eq!(card.past.len(), 2);
        assert_eq!(card.past[0].start(), date(2023, 12, 1));
        assert_eq!(card.current.len(), 1);
        assert_eq!(card.upcoming.len(), 1);
        assert_eq!(card.bucket(Bucket::Upcoming)[0].start(), date(2024, 1, 20));
        assert_eq!(card.total(), 4);

        assert_eq!(board.card(bob.id).unwrap().total(), 0);
    }

    #[test]
    fn employee_import_keeps_ids_and_moves_sequence() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        roster.hire(draft("Ann")).unwrap();

        let csv = concat!(
            "1,Dup,Licate,1990-01-01,Clerk\r\n",
            "7,Grace,Hopper,1906-12-09,Admiral\r\n",
            "bad row\r\n",
        );
        let summary = roster.import_employees(csv).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                skipped: 2
            }
        );

        let next = roster.hire(draft("Zed")).unwrap();
        assert_eq!(next.id, EmployeeId(8));
    }

    #[test]
    fn export_then_import_into_fresh_storage() {
        let source = TestStorage::new();
        let roster = source.roster();
        let ann = roster.hire(draft("Ann")).unwrap();
        roster
            .request_pto(&PtoRequest::new(ann.id, "2024-02-28", "2024-03-01"))
            .unwrap();

        let employees_csv = roster.export_employees().unwrap();
        let pto_csv = roster.export_pto().unwrap();

        let target = TestStorage::new();
        let copy = target.roster();
        copy.import_employees(&employees_csv).unwrap();
        copy.import_pto(&pto_csv).unwrap();

        assert_eq!(copy.employees().unwrap(), roster.employees().unwrap());
        let copied = copy.pto_for(ann.id).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].span.len_days(), 3);
    }

    #[test]
    fn wipe_empties_everything() {
        let test_storage = TestStorage::new();
        let roster = test_storage.roster();
        let ann = roster.hire(draft("Ann")).unwrap();
        roster
            .request_pto(&PtoRequest::new(ann.id, "2024-02-28", "2024-03-01"))
            .unwrap();

        roster.wipe().unwrap();
        let board = roster.board(date(2024, 3, 1)).unwrap();
        assert!(board.cards.is_empty() && board.orphans.is_empty());
    }
}
