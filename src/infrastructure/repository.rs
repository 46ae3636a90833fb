use crate::domain::{DeletePolicy, Employee, EmployeeId, NewPto, PtoInterval, PtoKey};
use crate::error::PtoResult;
use std::sync::Arc;

/// Storage of PTO intervals.
pub trait PtoRepository {
    /// Every interval of one employee. Fails with `StorageUnavailable`.
    fn list_by_employee(&self, employee_id: EmployeeId) -> PtoResult<Vec<PtoInterval>>;

    fn list_all_intervals(&self) -> PtoResult<Vec<PtoInterval>>;

    /// Fails with `StorageWrite`.
    fn insert(&self, pto: NewPto) -> PtoResult<PtoKey>;

    /// Deleting a key that does not exist is not an error.
    fn delete_by_key(&self, key: PtoKey) -> PtoResult<()>;
}

/// Read-only view of employees.
pub trait EmployeeDirectory {
    fn list_all(&self) -> PtoResult<Vec<Employee>>;
    fn find(&self, id: EmployeeId) -> PtoResult<Option<Employee>>;
}

/// Employee writes, including the id sequence.
pub trait EmployeeRegistry: EmployeeDirectory {
    /// Next id from a sequence that never hands out the same id twice.
    fn allocate_id(&self) -> PtoResult<EmployeeId>;

    /// Moves the sequence forward so later allocations exceed `id`.
    fn ensure_id_floor(&self, id: EmployeeId) -> PtoResult<()>;

    fn add(&self, employee: &Employee) -> PtoResult<()>;

    /// Full-field replace. Returns false when no employee has that id.
    fn replace(&self, employee: &Employee) -> PtoResult<bool>;
}

/// Combined storage backend holding both collections.
pub trait RosterStorage: PtoRepository + EmployeeRegistry {
    /// Create tables and run pending migrations.
    fn initialize(&self) -> PtoResult<()>;

    fn backend_info(&self) -> &str;

    /// Deletes an employee in one transaction. Under `Cascade` their intervals go too;
    /// under `Orphan` they stay. Returns how many intervals were deleted, or `None` when
    /// no employee has that id, in which case nothing changes.
    fn remove_employee(&self, id: EmployeeId, policy: DeletePolicy) -> PtoResult<Option<usize>>;

    /// Delete every employee and interval and restart the id sequence.
    fn wipe(&self) -> PtoResult<()>;
}

impl<T: PtoRepository + ?Sized> PtoRepository for Arc<T> {
    fn list_by_employee(&self, employee_id: EmployeeId) -> PtoResult<Vec<PtoInterval>> {
        (**self).list_by_employee(employee_id)
    }

    fn list_all_intervals(&self) -> PtoResult<Vec<PtoInterval>> {
        (**self).list_all_intervals()
    }

    fn insert(&self, pto: NewPto) -> PtoResult<PtoKey> {
        (**self).insert(pto)
    }

    fn delete_by_key(&self, key: PtoKey) -> PtoResult<()> {
        (**self).delete_by_key(key)
    }
}

impl<T: EmployeeDirectory + ?Sized> EmployeeDirectory for Arc<T> {
    fn list_all(&self) -> PtoResult<Vec<Employee>> {
        (**self).list_all()
    }

    fn find(&self, id: EmployeeId) -> PtoResult<Option<Employee>> {
        (**self).find(id)
    }
}

impl<T: EmployeeRegistry + ?Sized> EmployeeRegistry for Arc<T> {
    fn allocate_id(&self) -> PtoResult<EmployeeId> {
        (**self).allocate_id()
    }

    fn ensure_id_floor(&self, id: EmployeeId) -> PtoResult<()> {
        (**self).ensure_id_floor(id)
    }

    fn add(&self, employee: &Employee) -> PtoResult<()> {
        (**self).add(employee)
    }

    fn replace(&self, employee: &Employee) -> PtoResult<bool> {
        (**self).replace(employee)
    }
}

impl<T: RosterStorage + ?Sized> RosterStorage for Arc<T> {
    fn initialize(&self) -> PtoResult<()> {
        (**self).initialize()
    }

    fn backend_info(&self) -> &str {
        (**self).backend_info()
    }

    fn remove_employee(&self, id: EmployeeId, policy: DeletePolicy) -> PtoResult<Option<usize>> {
        (**self).remove_employee(id, policy)
    }

    fn wipe(&self) -> PtoResult<()> {
        (**self).wipe()
    }
}
