use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::record_repository::RecordRepository;
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::territory::{Department, DepartmentInput, Mayoralty, MayoraltyInput};
use crate::domain::validation::FieldErrors;

#[derive(Default)]
pub(crate) struct MemoryDepartments {
    rows: Mutex<Vec<Department>>,
    dependents: Mutex<HashMap<Uuid, i64>>,
}

impl MemoryDepartments {
    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub(crate) fn set_dependents(&self, id: Uuid, count: i64) {
        self.dependents.lock().unwrap().insert(id, count);
    }
}

#[async_trait]
impl RecordRepository for MemoryDepartments {
    type Record = Department;
    type Input = DepartmentInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Department>> {
        let rows = self.rows.lock().unwrap();
        let matching: Vec<Department> = rows
            .iter()
            .filter(|d| filter.include_inactive || d.is_active)
            .filter(|d| match filter.search_term() {
                Some(term) => d.name.to_lowercase().contains(&term.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.per_page as usize)
            .collect();
        Ok(Page::new(items, filter.page, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Department>> {
        Ok(self.rows.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn insert(&self, input: &DepartmentInput) -> anyhow::Result<Department> {
        let now = Utc::now();
        let dept = Department {
            id: Uuid::new_v4(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(dept.clone());
        Ok(dept)
    }

    async fn update(
        &self,
        id: Uuid,
        input: &DepartmentInput,
    ) -> anyhow::Result<Option<Department>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|d| d.id == id).map(|d| {
            d.code = input.code.trim().to_string();
            d.name = input.name.trim().to_string();
            d.updated_at = Utc::now();
            d.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|d| d.id == id)
            .map(|d| d.is_active = active)
            .is_some())
    }

    async fn conflicts(
        &self,
        input: &DepartmentInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let rows = self.rows.lock().unwrap();
        let mut errors = FieldErrors::new();
        if rows
            .iter()
            .any(|d| Some(d.id) != except && d.code == input.code.trim())
        {
            errors.add("code", "Code is already in use");
        }
        Ok(errors)
    }

    async fn active_dependents(&self, id: Uuid) -> anyhow::Result<i64> {
        Ok(self.dependents.lock().unwrap().get(&id).copied().unwrap_or(0))
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_active)
            .map(|d| SelectOption {
                id: d.id,
                label: d.name.clone(),
            })
            .collect())
    }
}

/// Enforces one active mayoralty per municipality and an active parent,
/// like the SQL repository.
#[derive(Default)]
pub(crate) struct MemoryMayoralties {
    rows: Mutex<Vec<Mayoralty>>,
    inactive_municipalities: Mutex<HashSet<Uuid>>,
}

impl MemoryMayoralties {
    pub(crate) fn deactivate_municipality(&self, id: Uuid) {
        self.inactive_municipalities.lock().unwrap().insert(id);
    }

    pub(crate) fn active_for(&self, municipality_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.municipality_id == municipality_id && a.is_active)
            .count()
    }
}

#[async_trait]
impl RecordRepository for MemoryMayoralties {
    type Record = Mayoralty;
    type Input = MayoraltyInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Mayoralty>> {
        let rows: Vec<Mayoralty> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| filter.include_inactive || a.is_active)
            .cloned()
            .collect();
        let total = rows.len() as i64;
        Ok(Page::new(rows, filter.page, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Mayoralty>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, input: &MayoraltyInput) -> anyhow::Result<Mayoralty> {
        let now = Utc::now();
        let row = Mayoralty {
            id: Uuid::new_v4(),
            municipality_id: input.municipality_id,
            municipality_name: "Cali".into(),
            department_name: "Valle del Cauca".into(),
            name: input.name.trim().to_string(),
            nit: input.nit.trim().to_string(),
            address: input.address.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _id: Uuid,
        _input: &MayoraltyInput,
    ) -> anyhow::Result<Option<Mayoralty>> {
        anyhow::bail!("not used")
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|a| a.id == id)
            .map(|a| a.is_active = active)
            .is_some())
    }

    async fn conflicts(
        &self,
        input: &MayoraltyInput,
        except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if self
            .inactive_municipalities
            .lock()
            .unwrap()
            .contains(&input.municipality_id)
        {
            errors.add("municipality_id", "Select an active municipality");
            return Ok(errors);
        }
        let occupied = self.rows.lock().unwrap().iter().any(|a| {
            a.municipality_id == input.municipality_id && a.is_active && Some(a.id) != except
        });
        if occupied {
            errors.add(
                "municipality_id",
                "This municipality already has an active mayoralty",
            );
        }
        Ok(errors)
    }

    async fn active_dependents(&self, _id: Uuid) -> anyhow::Result<i64> {
        Ok(0)
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        Ok(Vec::new())
    }
}
