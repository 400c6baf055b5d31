//! Operators, treatments and custom examinations.
//!
//! Catalog edits are not written to the activity log.

use tracing::info;

use super::{position, required, ClinicDesk};
use crate::db::Collection;
use crate::error::{DeskError, DeskResult};
use crate::models::dates::now_timestamp;
use crate::models::{max_id, CustomExamination, Operator, Treatment};

/// Fields supplied when adding or editing a treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentForm {
    pub name: String,
    pub description: String,
    /// Minor currency units
    pub price: i64,
}

impl TreatmentForm {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
        }
    }
}

fn validate_treatment(form: &TreatmentForm) -> DeskResult<String> {
    let name = required(&form.name, "Treatment name is required")?;
    if form.price <= 0 {
        return Err(DeskError::invalid("Price must be greater than 0"));
    }
    Ok(name)
}

impl ClinicDesk {
    // =========================================================================
    // Operators
    // =========================================================================

    pub fn create_operator(&mut self, name: &str, role: &str) -> DeskResult<Operator> {
        let name = required(name, "Operator name is required")?;
        let role = required(role, "Operator role is required")?;

        let mut operators: Vec<Operator> = self.db.load(Collection::Operators)?;
        let operator = Operator {
            id: self.db.next_id(Collection::Operators, max_id(&operators))?,
            name,
            role,
            created_at: now_timestamp(),
        };

        operators.push(operator.clone());
        self.db.save(Collection::Operators, &operators)?;
        info!(id = operator.id, name = %operator.name, "Operator created");
        Ok(operator)
    }

    pub fn update_operator(&mut self, id: i64, name: &str, role: &str) -> DeskResult<Operator> {
        let name = required(name, "Operator name is required")?;
        let role = required(role, "Operator role is required")?;

        let mut operators: Vec<Operator> = self.db.load(Collection::Operators)?;
        let index = position(&operators, "Operator", id)?;
        operators[index].name = name;
        operators[index].role = role;

        self.db.save(Collection::Operators, &operators)?;
        info!(id, "Operator updated");
        Ok(operators[index].clone())
    }

    pub fn delete_operator(&mut self, id: i64) -> DeskResult<Operator> {
        let mut operators: Vec<Operator> = self.db.load(Collection::Operators)?;
        let index = position(&operators, "Operator", id)?;
        let removed = operators.remove(index);

        self.db.save(Collection::Operators, &operators)?;
        info!(id, "Operator deleted");
        Ok(removed)
    }

    pub fn get_operator(&self, id: i64) -> DeskResult<Operator> {
        let operators: Vec<Operator> = self.db.load(Collection::Operators)?;
        let index = position(&operators, "Operator", id)?;
        Ok(operators[index].clone())
    }

    pub fn list_operators(&self) -> DeskResult<Vec<Operator>> {
        Ok(self.db.load(Collection::Operators)?)
    }

    // =========================================================================
    // Treatments
    // =========================================================================

    pub fn create_treatment(&mut self, form: TreatmentForm) -> DeskResult<Treatment> {
        let name = validate_treatment(&form)?;

        let mut treatments: Vec<Treatment> = self.db.load(Collection::Treatments)?;
        let treatment = Treatment {
            id: self.db.next_id(Collection::Treatments, max_id(&treatments))?,
            name,
            description: form.description.trim().to_string(),
            price: form.price,
            created_at: now_timestamp(),
        };

        treatments.push(treatment.clone());
        self.db.save(Collection::Treatments, &treatments)?;
        info!(id = treatment.id, price = treatment.price, "Treatment created");
        Ok(treatment)
    }

    /// Edit a catalog treatment. Prices already copied onto appointments and
    /// invoices are not changed.
    pub fn update_treatment(&mut self, id: i64, form: TreatmentForm) -> DeskResult<Treatment> {
        let name = validate_treatment(&form)?;

        let mut treatments: Vec<Treatment> = self.db.load(Collection::Treatments)?;
        let index = position(&treatments, "Treatment", id)?;
        let treatment = &mut treatments[index];
        treatment.name = name;
        treatment.description = form.description.trim().to_string();
        treatment.price = form.price;
        let updated = treatment.clone();

        self.db.save(Collection::Treatments, &treatments)?;
        info!(id, "Treatment updated");
        Ok(updated)
    }

    pub fn delete_treatment(&mut self, id: i64) -> DeskResult<Treatment> {
        let mut treatments: Vec<Treatment> = self.db.load(Collection::Treatments)?;
        let index = position(&treatments, "Treatment", id)?;
        let removed = treatments.remove(index);

        self.db.save(Collection::Treatments, &treatments)?;
        info!(id, "Treatment deleted");
        Ok(removed)
    }

    pub fn list_treatments(&self) -> DeskResult<Vec<Treatment>> {
        Ok(self.db.load(Collection::Treatments)?)
    }

    // =========================================================================
    // Custom examinations
    // =========================================================================

    pub fn create_custom_examination(
        &mut self,
        name: &str,
        unit: &str,
    ) -> DeskResult<CustomExamination> {
        let name = required(name, "Examination name is required")?;

        let mut exams: Vec<CustomExamination> = self.db.load(Collection::CustomExaminations)?;
        let exam = CustomExamination {
            id: self.db.next_id(Collection::CustomExaminations, max_id(&exams))?,
            name,
            unit: unit.trim().to_string(),
            created_at: now_timestamp(),
        };

        exams.push(exam.clone());
        self.db.save(Collection::CustomExaminations, &exams)?;
        info!(id = exam.id, name = %exam.name, "Custom examination created");
        Ok(exam)
    }

    pub fn update_custom_examination(
        &mut self,
        id: i64,
        name: &str,
        unit: &str,
    ) -> DeskResult<CustomExamination> {
        let name = required(name, "Examination name is required")?;

        let mut exams: Vec<CustomExamination> = self.db.load(Collection::CustomExaminations)?;
        let index = position(&exams, "Custom examination", id)?;
        exams[index].name = name;
        exams[index].unit = unit.trim().to_string();

        self.db.save(Collection::CustomExaminations, &exams)?;
        info!(id, "Custom examination updated");
        Ok(exams[index].clone())
    }

    /// Remove an examination definition. Values already recorded on
    /// appointments keep their stored name and unit.
    pub fn delete_custom_examination(&mut self, id: i64) -> DeskResult<CustomExamination> {
        let mut exams: Vec<CustomExamination> = self.db.load(Collection::CustomExaminations)?;
        let index = position(&exams, "Custom examination", id)?;
        let removed = exams.remove(index);

        self.db.save(Collection::CustomExaminations, &exams)?;
        info!(id, "Custom examination deleted");
        Ok(removed)
    }

    pub fn list_custom_examinations(&self) -> DeskResult<Vec<CustomExamination>> {
        Ok(self.db.load(Collection::CustomExaminations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ClinicDesk {
        ClinicDesk::open_in_memory().unwrap()
    }

    #[test]
    fn test_operator_crud() {
        let mut desk = setup();
        let op = desk.create_operator("Dr. Sari", "Physiotherapist").unwrap();
        assert_eq!(op.id, 1);

        let op = desk.update_operator(op.id, "Dr. Sari W.", "Head Physiotherapist").unwrap();
        assert_eq!(desk.get_operator(op.id).unwrap().role, "Head Physiotherapist");

        desk.delete_operator(op.id).unwrap();
        assert!(desk.list_operators().unwrap().is_empty());
        assert!(matches!(
            desk.get_operator(op.id).unwrap_err(),
            DeskError::NotFound { entity: "Operator", .. }
        ));
    }

    #[test]
    fn test_operator_requires_name_and_role() {
        let mut desk = setup();
        assert!(desk.create_operator("", "Physiotherapist").is_err());
        assert!(desk.create_operator("Dr. Sari", " ").is_err());
    }

    #[test]
    fn test_treatment_price_must_be_positive() {
        let mut desk = setup();
        let err = desk.create_treatment(TreatmentForm::new("Manual therapy", 0)).unwrap_err();
        assert!(matches!(err, DeskError::ValidationFailed(_)));

        let treatment = desk.create_treatment(TreatmentForm::new("Manual therapy", 150000)).unwrap();
        assert!(desk
            .update_treatment(treatment.id, TreatmentForm::new("Manual therapy", -5))
            .is_err());
        assert_eq!(desk.list_treatments().unwrap()[0].price, 150000);
    }

    #[test]
    fn test_treatment_update_and_delete() {
        let mut desk = setup();
        let treatment = desk.create_treatment(TreatmentForm::new("Ultrasound", 80000)).unwrap();

        let form = TreatmentForm {
            description: "15 min".into(),
            ..TreatmentForm::new("Ultrasound therapy", 90000)
        };
        let updated = desk.update_treatment(treatment.id, form).unwrap();
        assert_eq!(updated.price, 90000);
        assert_eq!(updated.description, "15 min");
        assert_eq!(updated.created_at, treatment.created_at);

        desk.delete_treatment(treatment.id).unwrap();
        assert!(desk.delete_treatment(treatment.id).is_err());
    }

    #[test]
    fn test_custom_examinations() {
        let mut desk = setup();
        let exam = desk.create_custom_examination("Range of motion", "degrees").unwrap();
        assert_eq!(exam.vital_sign_key(), format!("custom_{}", exam.id));

        let exam = desk.update_custom_examination(exam.id, "ROM", "deg").unwrap();
        assert_eq!(desk.list_custom_examinations().unwrap()[0].name, "ROM");

        desk.delete_custom_examination(exam.id).unwrap();
        assert!(desk.list_custom_examinations().unwrap().is_empty());
        assert!(desk.create_custom_examination(" ", "cm").is_err());
    }

    #[test]
    fn test_catalog_changes_not_logged() {
        let mut desk = setup();
        desk.create_operator("Dr. Sari", "Physiotherapist").unwrap();
        desk.create_treatment(TreatmentForm::new("Manual therapy", 150000)).unwrap();
        assert!(desk.activity_log().unwrap().is_empty());
    }
}
