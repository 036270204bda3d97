use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::validation::{CODE_MAX, DESCRIPTION_MAX, FieldErrors, NAME_MAX, Validate};

/// Inclusive year ranges share at least one year.
pub fn periods_overlap(a: (i32, i32), b: (i32, i32)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

#[derive(Debug, Clone, Serialize)]
pub struct Sdg {
    pub id: Uuid,
    pub number: i16,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SdgInput {
    pub number: i16,
    pub name: String,
    pub description: Option<String>,
}

impl Validate for SdgInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !(1..=17).contains(&self.number) {
            errors.add("number", "SDG number must be between 1 and 17");
        }
        errors.require_text("name", &self.name, NAME_MAX);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        errors
    }
}

/// SDG as referenced from a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdgRef {
    pub id: Uuid,
    pub number: i16,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NationalPlan {
    pub id: Uuid,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NationalPlanInput {
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
}

impl Validate for NationalPlanInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors.year_range(self.start_year, self.end_year);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentalPlan {
    pub id: Uuid,
    pub department_id: Uuid,
    pub department_name: String,
    pub national_plan_id: Option<Uuid>,
    pub national_plan_name: Option<String>,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentalPlanInput {
    pub department_id: Uuid,
    pub national_plan_id: Option<Uuid>,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
}

impl Validate for DepartmentalPlanInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors.year_range(self.start_year, self.end_year);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MunicipalPlan {
    pub id: Uuid,
    pub mayoralty_id: Uuid,
    pub mayoralty_name: String,
    pub departmental_plan_id: Option<Uuid>,
    pub departmental_plan_name: Option<String>,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalPlanInput {
    pub mayoralty_id: Uuid,
    pub departmental_plan_id: Option<Uuid>,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub description: Option<String>,
}

impl Validate for MunicipalPlanInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("name", &self.name, NAME_MAX);
        errors.year_range(self.start_year, self.end_year);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        errors
    }
}

/// The parts of a departmental plan a municipal plan is checked against.
#[derive(Debug, Clone, Copy)]
pub struct DepartmentalPlanScope {
    pub department_id: Uuid,
    pub start_year: i32,
    pub end_year: i32,
}

impl MunicipalPlanInput {
    /// The linked departmental plan must cover the mayoralty's department and
    /// share at least one year with this plan.
    pub fn departmental_plan_error(
        &self,
        mayoralty_department: Uuid,
        plan: &DepartmentalPlanScope,
    ) -> Option<String> {
        if plan.department_id != mayoralty_department {
            return Some("The departmental plan belongs to another department".into());
        }
        if !periods_overlap(
            (plan.start_year, plan.end_year),
            (self.start_year, self.end_year),
        ) {
            return Some(format!(
                "The departmental plan runs {}-{} and does not overlap",
                plan.start_year, plan.end_year
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub id: Uuid,
    pub municipal_plan_id: Uuid,
    pub municipal_plan_name: String,
    pub secretariat_id: Option<Uuid>,
    pub secretariat_name: Option<String>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInput {
    pub municipal_plan_id: Uuid,
    pub secretariat_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

impl Validate for ProgramInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("code", &self.code, CODE_MAX);
        errors.require_text("name", &self.name, NAME_MAX);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub program_id: Uuid,
    pub program_name: String,
    pub responsible_id: Option<Uuid>,
    pub responsible_name: Option<String>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub sdgs: Vec<SdgRef>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub program_id: Uuid,
    pub responsible_id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub sdg_ids: Vec<Uuid>,
}

impl Validate for ProductInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("code", &self.code, CODE_MAX);
        errors.require_text("name", &self.name, NAME_MAX);
        errors.optional_text("description", self.description.as_deref(), DESCRIPTION_MAX);
        if self.sdg_ids.len() > 17 {
            errors.add("sdg_ids", "At most 17 goals can be linked");
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Indicator {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub baseline: f64,
    pub target: f64,
    pub current_value: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Indicator {
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.baseline, self.target, self.current_value)
    }
}

/// Share of the distance from baseline to target already covered, 0..=100.
/// Decreasing targets (target below baseline) are handled symmetrically.
pub fn progress_percent(baseline: f64, target: f64, current: f64) -> f64 {
    let span = target - baseline;
    if span == 0.0 || !span.is_finite() {
        return if current == target { 100.0 } else { 0.0 };
    }
    ((current - baseline) / span * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorInput {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub baseline: f64,
    pub target: f64,
    pub current_value: f64,
}

impl Validate for IndicatorInput {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require_text("code", &self.code, CODE_MAX);
        errors.require_text("name", &self.name, NAME_MAX);
        errors.require_text("unit", &self.unit, 50);
        for (field, value) in [
            ("baseline", self.baseline),
            ("target", self.target),
            ("current_value", self.current_value),
        ] {
            if !value.is_finite() {
                errors.add(field, "Enter a finite number");
            }
        }
        if self.target == self.baseline {
            errors.add("target", "Target must differ from the baseline");
        }
        errors
    }
}

impl From<&Sdg> for SdgInput {
    fn from(s: &Sdg) -> Self {
        Self {
            number: s.number,
            name: s.name.clone(),
            description: s.description.clone(),
        }
    }
}

impl From<&NationalPlan> for NationalPlanInput {
    fn from(p: &NationalPlan) -> Self {
        Self {
            name: p.name.clone(),
            start_year: p.start_year,
            end_year: p.end_year,
            description: p.description.clone(),
        }
    }
}

impl From<&DepartmentalPlan> for DepartmentalPlanInput {
    fn from(p: &DepartmentalPlan) -> Self {
        Self {
            department_id: p.department_id,
            national_plan_id: p.national_plan_id,
            name: p.name.clone(),
            start_year: p.start_year,
            end_year: p.end_year,
            description: p.description.clone(),
        }
    }
}

impl From<&MunicipalPlan> for MunicipalPlanInput {
    fn from(p: &MunicipalPlan) -> Self {
        Self {
            mayoralty_id: p.mayoralty_id,
            departmental_plan_id: p.departmental_plan_id,
            name: p.name.clone(),
            start_year: p.start_year,
            end_year: p.end_year,
            description: p.description.clone(),
        }
    }
}

impl From<&Program> for ProgramInput {
    fn from(p: &Program) -> Self {
        Self {
            municipal_plan_id: p.municipal_plan_id,
            secretariat_id: p.secretariat_id,
            code: p.code.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}

impl From<&Product> for ProductInput {
    fn from(p: &Product) -> Self {
        Self {
            program_id: p.program_id,
            responsible_id: p.responsible_id,
            code: p.code.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            sdg_ids: p.sdgs.iter().map(|s| s.id).collect(),
        }
    }
}

impl From<&Indicator> for IndicatorInput {
    fn from(i: &Indicator) -> Self {
        Self {
            product_id: i.product_id,
            code: i.code.clone(),
            name: i.name.clone(),
            unit: i.unit.clone(),
            baseline: i.baseline,
            target: i.target,
            current_value: i.current_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_periods() {
        assert!(periods_overlap((2022, 2026), (2024, 2027)));
        assert!(periods_overlap((2024, 2027), (2027, 2030)));
        assert!(!periods_overlap((2020, 2023), (2024, 2027)));
    }

    #[test]
    fn progress_for_increasing_target() {
        assert_eq!(progress_percent(0.0, 200.0, 50.0), 25.0);
        assert_eq!(progress_percent(10.0, 20.0, 25.0), 100.0);
        assert_eq!(progress_percent(10.0, 20.0, 5.0), 0.0);
    }

    #[test]
    fn progress_for_decreasing_target() {
        // e.g. reduce infant mortality from 12 to 8 per thousand
        assert_eq!(progress_percent(12.0, 8.0, 10.0), 50.0);
        assert_eq!(progress_percent(12.0, 8.0, 14.0), 0.0);
    }

    #[test]
    fn progress_with_degenerate_span() {
        assert_eq!(progress_percent(5.0, 5.0, 5.0), 100.0);
        assert_eq!(progress_percent(5.0, 5.0, 4.0), 0.0);
    }

    #[test]
    fn indicator_rejects_equal_target_and_nan() {
        let input = IndicatorInput {
            product_id: Uuid::new_v4(),
            code: "IND-1".into(),
            name: "Coverage".into(),
            unit: "%".into(),
            baseline: 40.0,
            target: 40.0,
            current_value: f64::NAN,
        };
        let errors = input.validate();
        assert!(errors.contains("target"));
        assert!(errors.contains("current_value"));
    }

    #[test]
    fn sdg_number_range() {
        let input = SdgInput {
            number: 18,
            name: "Extra".into(),
            description: None,
        };
        assert!(input.validate().contains("number"));
    }

    #[test]
    fn plan_years_are_validated() {
        let input = NationalPlanInput {
            name: "Colombia, potencia mundial de la vida".into(),
            start_year: 2026,
            end_year: 2022,
            description: None,
        };
        assert!(input.validate().contains("end_year"));
    }

    #[test]
    fn municipal_plan_must_match_department_and_years() {
        let department = Uuid::new_v4();
        let input = MunicipalPlanInput {
            mayoralty_id: Uuid::new_v4(),
            departmental_plan_id: Some(Uuid::new_v4()),
            name: "Cali, capital pacífica".into(),
            start_year: 2024,
            end_year: 2027,
            description: None,
        };
        let plan = DepartmentalPlanScope {
            department_id: department,
            start_year: 2024,
            end_year: 2027,
        };
        assert_eq!(input.departmental_plan_error(department, &plan), None);

        assert_eq!(
            input
                .departmental_plan_error(Uuid::new_v4(), &plan)
                .as_deref(),
            Some("The departmental plan belongs to another department")
        );

        let earlier = DepartmentalPlanScope {
            start_year: 2016,
            end_year: 2019,
            ..plan
        };
        assert_eq!(
            input.departmental_plan_error(department, &earlier).as_deref(),
            Some("The departmental plan runs 2016-2019 and does not overlap")
        );
    }
}
