//! Boundary layer model and reprojection.

use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, Coord, MapCoords, MultiPolygon};
use grid_common::{resolve_crs, BoundingBox, CrsCode, CrsDefinition, CrsLike, CrsResolution, GridError, GridResult};
use projection::Reprojector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BoundaryError;

/// A single attribute value from a DBF record or GeoJSON properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Null,
}

impl AttributeValue {
    /// Numeric value; text that parses as a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) if v.is_finite() => Some(*v),
            AttributeValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(v) => write!(f, "{}", v),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Null => f.write_str("null"),
        }
    }
}

/// One polygonal feature with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// An ordered collection of polygon features sharing one CRS.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryLayer {
    features: Vec<Feature>,
    crs: Option<CrsDefinition>,
}

impl BoundaryLayer {
    pub fn new(features: Vec<Feature>, crs: Option<CrsDefinition>) -> Self {
        Self { features, crs }
    }

    /// Replace the layer's CRS without touching coordinates.
    pub fn with_crs(mut self, crs: CrsDefinition) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn crs(&self) -> Option<&CrsDefinition> {
        self.crs.as_ref()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounds over every feature, `None` for an empty layer.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut bbox = BoundingBox::empty();
        let mut any = false;
        for rect in self.features.iter().filter_map(|f| f.geometry.bounding_rect()) {
            bbox.expand(rect.min().x, rect.min().y);
            bbox.expand(rect.max().x, rect.max().y);
            any = true;
        }
        any.then_some(bbox)
    }

    /// One entry per feature: its value for `name`, if present.
    pub fn attribute(&self, name: &str) -> Vec<Option<&AttributeValue>> {
        self.features.iter().map(|f| f.attribute(name)).collect()
    }

    /// Whether any feature carries the attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.attributes.contains_key(name))
    }

    /// Resolve the layer's own CRS to a supported code.
    pub fn crs_code(&self) -> GridResult<CrsCode> {
        let crs = self.crs.as_ref().ok_or(BoundaryError::MissingCrs)?;
        let (code, _) = resolve_logged(crs)?;
        Ok(code)
    }

    /// Reproject every vertex into `target`.
    ///
    /// Both CRSs are resolved through [`CrsLike`]: an authority code when
    /// the value exposes one, otherwise its definition string is parsed.
    pub fn to_crs(&self, target: &dyn CrsLike) -> GridResult<BoundaryLayer> {
        let source = self.crs_code()?;
        let (target_code, _) = resolve_logged(target)?;

        let reprojector = Reprojector::new(source, target_code);
        if reprojector.is_identity() {
            debug!(from = %source, to = %target_code, "Boundary layer already in target CRS");
            return Ok(BoundaryLayer::new(self.features.clone(), Some(target_code.into())));
        }

        info!(from = %source, to = %target_code, features = self.len(), "Reprojecting boundary layer");
        let features = self
            .features
            .iter()
            .map(|feature| -> GridResult<Feature> {
                let geometry = feature.geometry.try_map_coords(|c| {
                    reprojector
                        .transform(c.x, c.y)
                        .map(|(x, y)| Coord { x, y })
                })?;
                Ok(Feature {
                    geometry,
                    attributes: feature.attributes.clone(),
                })
            })
            .collect::<GridResult<Vec<_>>>()?;

        Ok(BoundaryLayer::new(features, Some(target_code.into())))
    }
}

/// Resolve a CRS value and log which path produced the code.
fn resolve_logged(crs: &dyn CrsLike) -> GridResult<(CrsCode, CrsResolution)> {
    match resolve_crs(crs) {
        Ok((code, CrsResolution::Authority)) => {
            debug!(crs = %crs, code = %code, "Resolved CRS from its authority code");
            Ok((code, CrsResolution::Authority))
        }
        Ok((code, CrsResolution::Definition)) => {
            debug!(crs = %crs, code = %code, "CRS has no authority code, resolved from its definition string");
            Ok((code, CrsResolution::Definition))
        }
        Err(e) => {
            debug!(crs = %crs, "CRS resolution failed on both the authority and definition paths");
            Err(GridError::from(e))
        }
    }
}
