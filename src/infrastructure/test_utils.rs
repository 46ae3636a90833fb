/// Test utilities for DuckDB-backed tests
///
/// Every `TestStorage` owns a fresh database file inside its own temporary
/// directory, so tests stay isolated without any rollback logic. The
/// directory is removed when the harness is dropped.
///
/// ```rust,ignore
/// let test_storage = TestStorage::new();
/// let employee = test_storage.create_sample_employee("Ada", "Lovelace")?;
/// let roster = test_storage.roster();
/// ```
#[cfg(test)]
pub mod test_harness {
    use crate::domain::{DateRange, DeletePolicy, Employee, NewPto, PtoKey, Roster};
    use crate::error::PtoResult;
    use crate::infrastructure::{DuckDbStorage, EmployeeRegistry, PtoRepository};
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub struct TestStorage {
        pub storage: Arc<DuckDbStorage>,
        _temp_dir: TempDir,
    }

    impl TestStorage {
        pub fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let db_path = temp_dir.path().join("test.db");

            let storage =
                DuckDbStorage::new(&db_path).expect("Failed to initialize test DuckDB storage");

            Self {
                storage: Arc::new(storage),
                _temp_dir: temp_dir,
            }
        }

        pub fn storage(&self) -> &DuckDbStorage {
            &self.storage
        }

        pub fn db_path(&self) -> PathBuf {
            self._temp_dir.path().join("test.db")
        }

        /// A roster sharing this harness's database.
        pub fn roster(&self) -> Roster {
            self.roster_with(DeletePolicy::Cascade)
        }

        pub fn roster_with(&self, policy: DeletePolicy) -> Roster {
            Roster::new(Box::new(Arc::clone(&self.storage)), policy)
        }

        pub fn create_sample_employee(&self, first: &str, last: &str) -> PtoResult<Employee> {
            let employee = Employee {
                id: self.storage.allocate_id()?,
                first_name: first.to_string(),
                last_name: last.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 1).expect("valid date"),
                job_description: "Engineer".to_string(),
            };
            self.storage.add(&employee)?;
            Ok(employee)
        }

        pub fn create_sample_pto(
            &self,
            employee: &Employee,
            start: NaiveDate,
            end: NaiveDate,
        ) -> PtoResult<PtoKey> {
            self.storage.insert(NewPto {
                employee_id: employee.id,
                span: DateRange::new(start, end)?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_harness::*;
    use crate::infrastructure::{EmployeeDirectory, PtoRepository};
    use chrono::NaiveDate;

    #[test]
    fn test_harness_basic_functionality() {
        let test_storage = TestStorage::new();
        assert!(test_storage.storage().list_all().unwrap().is_empty());

        let employee = test_storage.create_sample_employee("Ada", "Lovelace").unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        test_storage
            .create_sample_pto(&employee, start, start)
            .unwrap();

        let loaded = test_storage.storage().list_by_employee(employee.id).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(test_storage.db_path().exists());
    }

    #[test]
    fn test_harness_isolation() {
        let test_storage1 = TestStorage::new();
        let test_storage2 = TestStorage::new();

        test_storage1.create_sample_employee("Ada", "Lovelace").unwrap();

        assert!(test_storage2.storage().list_all().unwrap().is_empty());
    }
}
