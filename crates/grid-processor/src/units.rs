//! Explicit, validated temperature unit conversion.

use std::fmt;
use std::str::FromStr;

use grid_common::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::field::{AttrValue, GriddedField};

/// Kelvin offset reproducing the reference outputs (300.0 K -> 26.5 °C).
pub const DEFAULT_KELVIN_OFFSET: f64 = 273.5;

/// The physical Kelvin/Celsius offset.
pub const KELVIN_OFFSET_EXACT: f64 = 273.15;

/// Temperature units understood by the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    Kelvin,
    Celsius,
    Fahrenheit,
    Other(String),
}

impl Units {
    /// Canonical CF spelling.
    pub fn symbol(&self) -> &str {
        match self {
            Units::Kelvin => "K",
            Units::Celsius => "degC",
            Units::Fahrenheit => "degF",
            Units::Other(s) => s,
        }
    }

    pub fn is_temperature(&self) -> bool {
        !matches!(self, Units::Other(_))
    }
}

impl From<&str> for Units {
    fn from(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "k" | "degk" | "deg_k" | "kelvin" | "kelvins" => Units::Kelvin,
            "c" | "degc" | "deg_c" | "°c" | "celsius" | "degree_celsius" | "degrees_celsius" => Units::Celsius,
            "f" | "degf" | "deg_f" | "°f" | "fahrenheit" | "degree_fahrenheit" | "degrees_fahrenheit" => {
                Units::Fahrenheit
            }
            _ => Units::Other(s.trim().to_string()),
        }
    }
}

impl FromStr for Units {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Units::from(s))
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Converts a field's values to a target temperature unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConversion {
    pub target: Units,
    /// Offset subtracted from Kelvin values to get Celsius. Fahrenheit
    /// conversions always use the physical offset.
    pub kelvin_offset: f64,
    /// Units to assume when the field declares none
    pub assume_source: Option<Units>,
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self {
            target: Units::Celsius,
            kelvin_offset: DEFAULT_KELVIN_OFFSET,
            assume_source: None,
        }
    }
}

impl UnitConversion {
    pub fn to(target: Units) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_kelvin_offset(mut self, offset: f64) -> Self {
        self.kelvin_offset = offset;
        self
    }

    pub fn assuming(mut self, source: Units) -> Self {
        self.assume_source = Some(source);
        self
    }

    /// Source units: the `units` attribute, else the assumed units.
    pub fn source_units(&self, field: &GriddedField) -> GridResult<Units> {
        let declared = field.attr_str("units").map(Units::from);
        match (declared, &self.assume_source) {
            (Some(units), _) if units.is_temperature() => Ok(units),
            (Some(units), Some(assumed)) => {
                warn!(declared = %units, assumed = %assumed, "Unrecognised units, using assumed source units");
                Ok(assumed.clone())
            }
            (Some(units), None) => Err(GridError::UnitMismatch(format!(
                "field '{}' declares units '{}', which are not a temperature",
                field.name(),
                units
            ))),
            (None, Some(assumed)) => Ok(assumed.clone()),
            (None, None) => Err(GridError::UnitMismatch(format!(
                "field '{}' declares no units; set an assumed source unit to convert it",
                field.name()
            ))),
        }
    }

    /// Convert `field` into the target units. The returned field's `units`
    /// attribute names the target.
    pub fn apply(&self, field: &GriddedField) -> GridResult<GriddedField> {
        if !self.target.is_temperature() {
            return Err(GridError::UnitMismatch(format!(
                "cannot convert to non-temperature units '{}'",
                self.target
            )));
        }

        let source = self.source_units(field)?;
        if source == self.target {
            return Ok(field.clone());
        }

        info!(from = %source, to = %self.target, offset = self.kelvin_offset, "Converting units");
        let convert = self.converter(&source, &self.target);
        let data = field.data().mapv(|v| convert(v as f64) as f32);

        let mut out = field.replace_data(data);
        out.set_attr("units", AttrValue::Text(self.target.symbol().to_string()));
        Ok(out)
    }

    /// Per-value conversion between two temperature units. Only the
    /// Kelvin/Celsius pair uses the configurable offset; Fahrenheit is tied
    /// to Kelvin by [`KELVIN_OFFSET_EXACT`].
    fn converter(&self, source: &Units, target: &Units) -> impl Fn(f64) -> f64 {
        let offset = self.kelvin_offset;
        let pair = (source.clone(), target.clone());
        move |v| match &pair {
            (Units::Kelvin, Units::Celsius) => v - offset,
            (Units::Celsius, Units::Kelvin) => v + offset,
            (Units::Kelvin, Units::Fahrenheit) => (v - KELVIN_OFFSET_EXACT) * 9.0 / 5.0 + 32.0,
            (Units::Fahrenheit, Units::Kelvin) => (v - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET_EXACT,
            (Units::Celsius, Units::Fahrenheit) => v * 9.0 / 5.0 + 32.0,
            (Units::Fahrenheit, Units::Celsius) => (v - 32.0) * 5.0 / 9.0,
            _ => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Coordinate;
    use ndarray::{ArrayD, IxDyn};

    fn field_with_units(values: Vec<f32>, units: Option<&str>) -> GriddedField {
        let n = values.len();
        let data = ArrayD::from_shape_vec(IxDyn(&[n]), values).unwrap();
        let lon: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let field = GriddedField::new("air", vec![Coordinate::numeric("lon", lon)], data).unwrap();
        match units {
            Some(u) => field.with_attr("units", AttrValue::Text(u.to_string())),
            None => field,
        }
    }

    #[test]
    fn test_units_parse() {
        assert_eq!("degK".parse::<Units>().unwrap(), Units::Kelvin);
        assert_eq!("K".parse::<Units>().unwrap(), Units::Kelvin);
        assert_eq!("degC".parse::<Units>().unwrap(), Units::Celsius);
        assert_eq!("Celsius".parse::<Units>().unwrap(), Units::Celsius);
        assert_eq!("m s-1".parse::<Units>().unwrap(), Units::Other("m s-1".into()));
    }

    #[test]
    fn test_kelvin_to_celsius_default_offset() {
        let field = field_with_units(vec![300.0, 273.5], Some("degK"));
        let out = UnitConversion::default().apply(&field).unwrap();
        assert!((out.data()[IxDyn(&[0])] - 26.5).abs() < 1e-5);
        assert!(out.data()[IxDyn(&[1])].abs() < 1e-5);
        assert_eq!(out.attr_str("units"), Some("degC"));
        // Source untouched
        assert_eq!(field.data()[IxDyn(&[0])], 300.0);
    }

    #[test]
    fn test_exact_offset() {
        let field = field_with_units(vec![273.15], Some("K"));
        let out = UnitConversion::default()
            .with_kelvin_offset(KELVIN_OFFSET_EXACT)
            .apply(&field)
            .unwrap();
        assert!(out.data()[IxDyn(&[0])].abs() < 1e-4);
    }

    #[test]
    fn test_celsius_input_unchanged() {
        let field = field_with_units(vec![12.0, -3.5], Some("degC"));
        let out = UnitConversion::default().apply(&field).unwrap();
        assert_eq!(out.data(), field.data());
    }

    #[test]
    fn test_missing_units_rejected_unless_assumed() {
        let field = field_with_units(vec![300.0], None);
        assert!(matches!(
            UnitConversion::default().apply(&field),
            Err(GridError::UnitMismatch(_))
        ));

        let out = UnitConversion::default().assuming(Units::Kelvin).apply(&field).unwrap();
        assert!((out.data()[IxDyn(&[0])] - 26.5).abs() < 1e-5);
    }

    #[test]
    fn test_non_temperature_units_rejected() {
        let field = field_with_units(vec![5.0], Some("m s-1"));
        assert!(matches!(
            UnitConversion::default().apply(&field),
            Err(GridError::UnitMismatch(_))
        ));
    }

    #[test]
    fn test_fahrenheit_uses_physical_offset() {
        let field = field_with_units(vec![300.0], Some("K"));

        // The configured 273.5 offset applies to Celsius only
        let fahrenheit = UnitConversion::to(Units::Fahrenheit).apply(&field).unwrap();
        assert!((fahrenheit.data()[IxDyn(&[0])] - 80.33).abs() < 0.01);
        assert_eq!(fahrenheit.attr_str("units"), Some("degF"));

        let celsius = UnitConversion::default().apply(&field).unwrap();
        assert!((celsius.data()[IxDyn(&[0])] - 26.5).abs() < 1e-5);
    }

    #[test]
    fn test_fahrenheit_to_kelvin_and_celsius() {
        let field = field_with_units(vec![32.0, 212.0], Some("degF"));

        let kelvin = UnitConversion::to(Units::Kelvin).apply(&field).unwrap();
        assert!((kelvin.data()[IxDyn(&[0])] - 273.15).abs() < 1e-3);

        let celsius = UnitConversion::default().apply(&field).unwrap();
        assert!(celsius.data()[IxDyn(&[0])].abs() < 1e-5);
        assert!((celsius.data()[IxDyn(&[1])] - 100.0).abs() < 1e-4);
    }
}
