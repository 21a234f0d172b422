//! Colour scale configuration for rendering gridded fields.
//!
//! A scale is a colormap (colour stops over the normalized range 0..1) plus a
//! fixed data range and an optional level step. With a step, values are
//! binned into discrete levels `vmin, vmin + step, ...` the way filled
//! contour plots are; without one the gradient is sampled continuously.

use serde::{Deserialize, Serialize};

/// Fixed-range colour scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScale {
    /// Data value mapped to the first colour stop
    pub vmin: f64,

    /// Data value mapped to the last colour stop
    pub vmax: f64,

    /// Width of each discrete level; continuous when absent
    #[serde(default)]
    pub step: Option<f64>,

    /// Colormap stops over 0..1
    #[serde(default = "coolwarm_stops")]
    pub stops: Vec<ColorStop>,

    /// How to handle values outside `vmin..=vmax`
    #[serde(default)]
    pub out_of_range: OutOfRangeBehavior,

    /// Colour for NaN cells
    #[serde(default)]
    pub no_data_color: Option<Color>,

    /// Colour below `vmin` under [`OutOfRangeBehavior::Extend`]; the
    /// colormap's first colour when absent
    #[serde(default)]
    pub under_color: Option<Color>,

    /// Colour above `vmax` under [`OutOfRangeBehavior::Extend`]; the
    /// colormap's last colour when absent
    #[serde(default)]
    pub over_color: Option<Color>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            vmin: -30.0,
            vmax: 30.0,
            step: Some(2.0),
            stops: coolwarm_stops(),
            out_of_range: OutOfRangeBehavior::Clamp,
            no_data_color: None,
            under_color: None,
            over_color: None,
        }
    }
}

impl ColorScale {
    /// Parse a colour scale from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let scale: ColorScale =
            serde_json::from_str(json).map_err(|e| StyleError::ParseError(e.to_string()))?;
        scale.validate()?;
        Ok(scale)
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        if !(self.vmin < self.vmax) {
            return Err(StyleError::ValidationError(format!(
                "vmin ({}) must be below vmax ({})",
                self.vmin, self.vmax
            )));
        }
        if let Some(step) = self.step {
            if !(step > 0.0) {
                return Err(StyleError::ValidationError(
                    "Level step must be positive".to_string(),
                ));
            }
        }
        if self.stops.len() < 2 {
            return Err(StyleError::ValidationError(
                "Colormap must have at least 2 color stops".to_string(),
            ));
        }
        for i in 1..self.stops.len() {
            if self.stops[i].position <= self.stops[i - 1].position {
                return Err(StyleError::ValidationError(
                    "Color stops must be in ascending position order".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Level values, `arange(vmin, vmax, step)`.
    ///
    /// Empty for a continuous scale.
    pub fn levels(&self) -> Vec<f64> {
        let Some(step) = self.step else {
            return Vec::new();
        };
        let count = ((self.vmax - self.vmin) / step).ceil().max(0.0) as usize;
        (0..count).map(|i| self.vmin + i as f64 * step).collect()
    }

    /// Bin edges: the levels closed off by `vmax`.
    pub fn boundaries(&self) -> Vec<f64> {
        let mut edges = self.levels();
        if edges.last().map_or(false, |last| *last < self.vmax) {
            edges.push(self.vmax);
        }
        edges
    }

    /// Sample the colormap at a normalized position.
    pub fn sample(&self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let first = &self.stops[0];
        if t <= first.position {
            return first.color.clone();
        }
        for i in 1..self.stops.len() {
            let high = &self.stops[i];
            if t <= high.position {
                let low = &self.stops[i - 1];
                let local = (t - low.position) / (high.position - low.position);
                return low.color.lerp(&high.color, local);
            }
        }
        self.stops[self.stops.len() - 1].color.clone()
    }

    /// RGBA colour for a data value.
    pub fn color_for(&self, value: f64) -> (u8, u8, u8, u8) {
        if value.is_nan() {
            return self
                .no_data_color
                .as_ref()
                .map(Color::to_rgba)
                .unwrap_or((0, 0, 0, 0));
        }

        if value < self.vmin || value > self.vmax {
            return match self.out_of_range {
                OutOfRangeBehavior::Transparent => (0, 0, 0, 0),
                OutOfRangeBehavior::Clamp => {
                    let t = if value < self.vmin { 0.0 } else { 1.0 };
                    self.sample(t).to_rgba()
                }
                OutOfRangeBehavior::Extend if value < self.vmin => self
                    .under_color
                    .as_ref()
                    .map_or_else(|| self.sample(0.0).to_rgba(), Color::to_rgba),
                OutOfRangeBehavior::Extend => self
                    .over_color
                    .as_ref()
                    .map_or_else(|| self.sample(1.0).to_rgba(), Color::to_rgba),
            };
        }

        let edges = self.boundaries();
        if edges.len() < 2 {
            let t = (value - self.vmin) / (self.vmax - self.vmin);
            return self.sample(t).to_rgba();
        }

        let bins = edges.len() - 1;
        let bin = edges[1..]
            .iter()
            .position(|upper| value < *upper)
            .unwrap_or(bins - 1);
        let t = match self.out_of_range {
            // Both ends of the colormap are kept for the extensions
            OutOfRangeBehavior::Extend => (bin + 1) as f64 / (bins + 1) as f64,
            _ if bins > 1 => bin as f64 / (bins - 1) as f64,
            _ => 0.5,
        };
        self.sample(t).to_rgba()
    }
}

/// A colour stop in a colormap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorStop {
    /// Normalized position in 0..1
    pub position: f64,

    /// The color at this stop
    pub color: Color,
}

impl ColorStop {
    pub fn new(position: f64, color: Color) -> Self {
        Self { position, color }
    }
}

/// Blue-white-red diverging colormap.
pub fn coolwarm_stops() -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.0, Color::rgb(59, 76, 192)),
        ColorStop::new(0.25, Color::rgb(141, 176, 254)),
        ColorStop::new(0.5, Color::rgb(221, 221, 221)),
        ColorStop::new(0.75, Color::rgb(244, 154, 123)),
        ColorStop::new(1.0, Color::rgb(180, 4, 38)),
    ]
}

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Hex string ("#RRGGBB" or "#RRGGBBAA") or a color name
    Text(String),

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgba { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert to RGBA tuple.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        match self {
            Color::Text(s) if s.starts_with('#') => parse_hex_color(s),
            Color::Text(name) => named_color(name),
            Color::Array(arr) => {
                let r = arr.first().copied().unwrap_or(0);
                let g = arr.get(1).copied().unwrap_or(0);
                let b = arr.get(2).copied().unwrap_or(0);
                let a = arr.get(3).copied().unwrap_or(255);
                (r, g, b, a)
            }
            Color::Rgba { r, g, b, a } => (*r, *g, *b, *a),
        }
    }

    /// Linear interpolation between two colors.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let (r1, g1, b1, a1) = self.to_rgba();
        let (r2, g2, b2, a2) = other.to_rgba();

        let t = t.clamp(0.0, 1.0);

        let lerp_u8 =
            |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };

        Color::Rgba {
            r: lerp_u8(r1, r2),
            g: lerp_u8(g1, g2),
            b: lerp_u8(b1, b2),
            a: lerp_u8(a1, a2),
        }
    }
}

fn parse_hex_color(s: &str) -> (u8, u8, u8, u8) {
    let s = s.trim_start_matches('#');
    let channel = |i: usize, default: u8| {
        s.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(default)
    };

    match s.len() {
        6 => (channel(0, 0), channel(2, 0), channel(4, 0), 255),
        8 => (channel(0, 0), channel(2, 0), channel(4, 0), channel(6, 255)),
        _ => (0, 0, 0, 255),
    }
}

fn named_color(name: &str) -> (u8, u8, u8, u8) {
    match name.to_lowercase().as_str() {
        "transparent" | "none" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 255, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "cyan" => (0, 255, 255, 255),
        "magenta" => (255, 0, 255, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        _ => (0, 0, 0, 255),
    }
}

/// Behavior for values outside the scale range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangeBehavior {
    /// Use the nearest end colour; the end bins share it with outliers
    #[default]
    Clamp,
    Transparent,
    /// Outliers get their own under/over colours; binned levels are spread
    /// over the inside of the colormap so they never match them
    Extend,
}

/// Style-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
