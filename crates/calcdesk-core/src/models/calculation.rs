use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::format_number;
use crate::validate::{validate_calculation_inputs, ValidationError};

/// Arithmetic operations supported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl CalculationType {
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Addition,
        CalculationType::Subtraction,
        CalculationType::Multiplication,
        CalculationType::Division,
    ];

    /// Wire name, as used in payloads and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationType::Addition => "addition",
            CalculationType::Subtraction => "subtraction",
            CalculationType::Multiplication => "multiplication",
            CalculationType::Division => "division",
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            CalculationType::Addition => '+',
            CalculationType::Subtraction => '-',
            CalculationType::Multiplication => '×',
            CalculationType::Division => '÷',
        }
    }

    /// Evaluate the operation left to right over `inputs`.
    ///
    /// This matches what the server stores as the result, so it can be used to
    /// preview a calculation before submitting it.
    pub fn compute(&self, inputs: &[f64]) -> Result<f64, ValidationError> {
        validate_calculation_inputs(inputs, *self)?;

        let (first, rest) = (inputs[0], &inputs[1..]);
        let result: f64 = match self {
            CalculationType::Addition => inputs.iter().sum(),
            CalculationType::Subtraction => rest.iter().fold(first, |acc, v| acc - v),
            CalculationType::Multiplication => inputs.iter().product(),
            CalculationType::Division => rest.iter().fold(first, |acc, v| acc / v),
        };
        Ok(result)
    }

    /// Render inputs as an expression, e.g. "10 ÷ 2 ÷ 5".
    pub fn expression(&self, inputs: &[f64]) -> String {
        let sep = format!(" {} ", self.symbol());
        inputs
            .iter()
            .map(|&n| format_number(n))
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        CalculationType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| ValidationError::UnsupportedOperation(s.to_string()))
    }
}

/// A calculation as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: String,
    /// Absent in the statistics endpoint's recent list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CalculationType,
    pub inputs: Vec<f64>,
    pub result: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Calculation {
    pub fn result_display(&self) -> String {
        match self.result {
            Some(r) => format_number(r),
            None => "-".to_string(),
        }
    }

    /// Whether the record was edited after it was created.
    pub fn was_edited(&self) -> bool {
        self.updated_at != self.created_at
    }
}

/// Body of `POST /calculations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalculation {
    #[serde(rename = "type")]
    pub kind: CalculationType,
    pub inputs: Vec<f64>,
}

/// Body of `PUT /calculations/{id}`. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationUpdate {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CalculationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<f64>>,
}

impl CalculationUpdate {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.inputs.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute() {
        assert_eq!(CalculationType::Addition.compute(&[1.0, 2.0, 3.5]), Ok(6.5));
        assert_eq!(CalculationType::Subtraction.compute(&[10.0, 3.0, 2.0]), Ok(5.0));
        assert_eq!(CalculationType::Multiplication.compute(&[2.0, 3.0, 4.0]), Ok(24.0));
        assert_eq!(CalculationType::Division.compute(&[100.0, 5.0, 2.0]), Ok(10.0));
    }

    #[test]
    fn test_compute_rejects_bad_inputs() {
        assert_eq!(
            CalculationType::Multiplication.compute(&[7.0]),
            Err(ValidationError::InsufficientInput)
        );
        assert_eq!(
            CalculationType::Division.compute(&[1.0, 2.0, 0.0]),
            Err(ValidationError::DivisionByZero)
        );
    }

    #[test]
    fn test_parse_calculation_type() {
        assert_eq!("division".parse::<CalculationType>(), Ok(CalculationType::Division));
        assert_eq!(" Addition ".parse::<CalculationType>(), Ok(CalculationType::Addition));
        assert_eq!(
            "modulo".parse::<CalculationType>(),
            Err(ValidationError::UnsupportedOperation("modulo".to_string()))
        );
    }

    #[test]
    fn test_expression() {
        assert_eq!(CalculationType::Division.expression(&[10.0, 2.5]), "10 ÷ 2.5");
        assert_eq!(CalculationType::Subtraction.expression(&[3.0, -1.0]), "3 - -1");
    }

    #[test]
    fn test_parse_calculation_response() {
        let json = r#"{"id": "6f1c2a7e-8d1b-4b7e-9c51-0a4c3e1f2b3d", "user_id": "0e65066c-ab20-4da0-b3bf-79dfd0668049", "type": "division", "inputs": [100, 5, 2], "result": 10.0, "created_at": "2025-12-01T10:00:00", "updated_at": "2025-12-01T10:00:00"}"#;

        let calc: Calculation = serde_json::from_str(json)
            .expect("Failed to parse calculation test JSON");
        assert_eq!(calc.kind, CalculationType::Division);
        assert_eq!(calc.inputs, vec![100.0, 5.0, 2.0]);
        assert_eq!(calc.result_display(), "10");
        assert!(!calc.was_edited());
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let update = CalculationUpdate {
            kind: None,
            inputs: Some(vec![1.0, 2.0]),
        };
        let json = serde_json::to_value(&update).expect("Failed to serialize update");
        assert_eq!(json, serde_json::json!({"inputs": [1.0, 2.0]}));
        assert!(CalculationUpdate::default().is_empty());
    }
}
