use crate::domain::{
    DATE_FORMAT, DateRange, DeletePolicy, Employee, EmployeeId, NewPto, PtoInterval, PtoKey,
};
use crate::error::{PtoError, PtoResult};
use crate::infrastructure::repository::{
    EmployeeDirectory, EmployeeRegistry, PtoRepository, RosterStorage,
};
use chrono::NaiveDate;
use duckdb::{Connection, OptionalExt, params};
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MIGRATIONS: &[(i32, &str, &str)] = &[(
    1,
    "001_initial_schema",
    include_str!("../../migrations/001_initial_schema.sql"),
)];

type EmployeeRow = (i64, String, String, String, String);

pub struct DuckDbStorage {
    conn: Mutex<Connection>,
}

impl DuckDbStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> PtoResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PtoError::unavailable(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| {
            PtoError::unavailable(format!("cannot open {}: {e}", db_path.display()))
        })?;
        debug!("opened database at {}", db_path.display());

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    pub fn in_memory() -> PtoResult<Self> {
        let conn = Connection::open_in_memory().map_err(PtoError::unavailable)?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn lock(&self) -> PtoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PtoError::unavailable("database connection lock poisoned"))
    }

    fn interval_from_row(
        key: i64,
        employee_id: i64,
        start: &str,
        end: &str,
    ) -> PtoResult<PtoInterval> {
        let span = DateRange::new(stored_date(start)?, stored_date(end)?)
            .map_err(|e| PtoError::unavailable(format!("stored PTO #{key} is invalid: {e}")))?;
        Ok(PtoInterval {
            key: PtoKey(key),
            employee_id: EmployeeId(employee_id),
            span,
        })
    }

    fn query_intervals(
        &self,
        sql: &str,
        employee_id: Option<EmployeeId>,
    ) -> PtoResult<Vec<PtoInterval>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(PtoError::unavailable)?;

        let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<(i64, i64, String, String)> {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        };
        let rows = match employee_id {
            Some(id) => stmt.query_map(params![id.get()], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(PtoError::unavailable)?;

        let mut intervals = Vec::new();
        for row in rows {
            let (key, employee, start, end) = row.map_err(PtoError::unavailable)?;
            intervals.push(Self::interval_from_row(key, employee, &start, &end)?);
        }
        Ok(intervals)
    }

    fn query_employees(&self, id: Option<EmployeeId>) -> PtoResult<Vec<Employee>> {
        let conn = self.lock()?;
        let sql = match id {
            Some(_) => {
                "SELECT id, first_name, last_name, date_of_birth, job_description \
                 FROM employee WHERE id = ?"
            }
            None => {
                "SELECT id, first_name, last_name, date_of_birth, job_description \
                 FROM employee ORDER BY id"
            }
        };
        let mut stmt = conn.prepare(sql).map_err(PtoError::unavailable)?;

        let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<EmployeeRow> {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        };
        let rows = match id {
            Some(id) => stmt.query_map(params![id.get()], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(PtoError::unavailable)?;

        let mut employees = Vec::new();
        for row in rows {
            let (id, first_name, last_name, date_of_birth, job_description) =
                row.map_err(PtoError::unavailable)?;
            employees.push(Employee {
                id: EmployeeId(id),
                first_name,
                last_name,
                date_of_birth: stored_date(&date_of_birth)?,
                job_description,
            });
        }
        Ok(employees)
    }

    fn setup_migration_system(&self) -> PtoResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        )
        .map_err(|e| PtoError::unavailable(format!("failed to create migrations table: {e}")))?;
        Ok(())
    }

    fn run_migrations(&self) -> PtoResult<()> {
        let applied = self.get_applied_migrations()?;

        for (version, name, sql) in MIGRATIONS {
            if !applied.contains(version) {
                self.apply_migration(*version, name, sql)?;
            }
        }

        Ok(())
    }

    fn get_applied_migrations(&self) -> PtoResult<HashSet<i32>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY version")
            .map_err(PtoError::unavailable)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i32>(0))
            .map_err(PtoError::unavailable)?;

        let mut applied = HashSet::new();
        for version in rows {
            applied.insert(version.map_err(PtoError::unavailable)?);
        }

        Ok(applied)
    }

    fn apply_migration(&self, version: i32, name: &str, sql: &str) -> PtoResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(sql).map_err(|e| {
            PtoError::unavailable(format!("failed to apply migration {name}: {e}"))
        })?;

        conn.execute(
            "INSERT INTO migrations (version, name) VALUES (?, ?)",
            params![version, name],
        )
        .map_err(|e| PtoError::unavailable(format!("failed to record migration {name}: {e}")))?;

        info!("applied migration {name}");
        Ok(())
    }
}

fn stored_date(value: &str) -> PtoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| PtoError::unavailable(format!("stored date '{value}' is unreadable: {e}")))
}

fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl PtoRepository for DuckDbStorage {
    fn list_by_employee(&self, employee_id: EmployeeId) -> PtoResult<Vec<PtoInterval>> {
        debug!("loading PTO for employee {employee_id}");
        self.query_intervals(
            "SELECT pto_key, employee_id, start_date, end_date FROM pto \
             WHERE employee_id = ? ORDER BY start_date, pto_key",
            Some(employee_id),
        )
    }

    fn list_all_intervals(&self) -> PtoResult<Vec<PtoInterval>> {
        self.query_intervals(
            "SELECT pto_key, employee_id, start_date, end_date FROM pto \
             ORDER BY start_date, pto_key",
            None,
        )
    }

    fn insert(&self, pto: NewPto) -> PtoResult<PtoKey> {
        let conn = self.lock()?;
        let key = conn
            .query_row(
                "INSERT INTO pto (employee_id, start_date, end_date) VALUES (?, ?, ?) \
                 RETURNING pto_key",
                params![
                    pto.employee_id.get(),
                    date_text(pto.span.start()),
                    date_text(pto.span.end())
                ],
                |row| row.get::<_, i64>(0),
            )
            .map_err(PtoError::write)?;

        info!(
            "stored PTO #{key} for employee {} ({})",
            pto.employee_id, pto.span
        );
        Ok(PtoKey(key))
    }

    fn delete_by_key(&self, key: PtoKey) -> PtoResult<()> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM pto WHERE pto_key = ?", params![key.0])
            .map_err(PtoError::write)?;

        if removed == 0 {
            debug!("PTO {key} was already gone");
        } else {
            info!("deleted PTO {key}");
        }
        Ok(())
    }
}

impl EmployeeDirectory for DuckDbStorage {
    fn list_all(&self) -> PtoResult<Vec<Employee>> {
        self.query_employees(None)
    }

    fn find(&self, id: EmployeeId) -> PtoResult<Option<Employee>> {
        Ok(self.query_employees(Some(id))?.into_iter().next())
    }
}

impl EmployeeRegistry for DuckDbStorage {
    fn allocate_id(&self) -> PtoResult<EmployeeId> {
        let conn = self.lock()?;
        conn.execute("UPDATE employee_id_sequence SET last_id = last_id + 1", [])
            .map_err(PtoError::write)?;
        let id = conn
            .query_row("SELECT last_id FROM employee_id_sequence", [], |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map_err(PtoError::write)?
            .ok_or_else(|| PtoError::write("employee id sequence is missing"))?;
        Ok(EmployeeId(id))
    }

    fn ensure_id_floor(&self, id: EmployeeId) -> PtoResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE employee_id_sequence SET last_id = greatest(last_id, ?)",
            params![id.get()],
        )
        .map_err(PtoError::write)?;
        Ok(())
    }

    fn add(&self, employee: &Employee) -> PtoResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO employee (id, first_name, last_name, date_of_birth, job_description) \
             VALUES (?, ?, ?, ?, ?)",
            params![
                employee.id.get(),
                employee.first_name,
                employee.last_name,
                date_text(employee.date_of_birth),
                employee.job_description
            ],
        )
        .map_err(PtoError::write)?;

        info!("added employee {} ({})", employee.id, employee.full_name());
        Ok(())
    }

    fn replace(&self, employee: &Employee) -> PtoResult<bool> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE employee SET first_name = ?, last_name = ?, date_of_birth = ?, \
                 job_description = ? WHERE id = ?",
                params![
                    employee.first_name,
                    employee.last_name,
                    date_text(employee.date_of_birth),
                    employee.job_description,
                    employee.id.get()
                ],
            )
            .map_err(PtoError::write)?;
        Ok(updated > 0)
    }
}

impl RosterStorage for DuckDbStorage {
    fn initialize(&self) -> PtoResult<()> {
        self.setup_migration_system()?;
        self.run_migrations()?;
        Ok(())
    }

    fn backend_info(&self) -> &str {
        "DuckDB Storage Backend v1.0"
    }

    fn remove_employee(&self, id: EmployeeId, policy: DeletePolicy) -> PtoResult<Option<usize>> {
        let mut conn = self.lock()?;
        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction().map_err(PtoError::write)?;

        let intervals = match policy {
            DeletePolicy::Cascade => tx
                .execute("DELETE FROM pto WHERE employee_id = ?", params![id.get()])
                .map_err(PtoError::write)?,
            DeletePolicy::Orphan => 0,
        };
        let removed = tx
            .execute("DELETE FROM employee WHERE id = ?", params![id.get()])
            .map_err(PtoError::write)?;
        if removed == 0 {
            return Ok(None);
        }

        tx.commit().map_err(PtoError::write)?;
        info!("deleted employee {id} with {intervals} PTO record(s)");
        Ok(Some(intervals))
    }

    fn wipe(&self) -> PtoResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "DELETE FROM pto; DELETE FROM employee; UPDATE employee_id_sequence SET last_id = 0;",
        )
        .map_err(PtoError::write)?;
        info!("deleted all employee and PTO data");
        Ok(())
    }
}
