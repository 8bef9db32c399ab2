//! Wire types for the distance-matrix JSON response. Only the fields the
//! client reads are modelled.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatrixElement {
    pub status: String,
    pub distance: Option<TextValue>,
    pub duration: Option<TextValue>,
}

/// A measured quantity: `value` in meters or seconds plus its display text.
#[derive(Debug, Deserialize)]
pub(crate) struct TextValue {
    pub text: String,
    pub value: f64,
}
