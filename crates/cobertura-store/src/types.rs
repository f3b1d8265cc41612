//! Zone store wire types.
//!
//! Field names follow the store's camelCase Spanish schema. Values that the
//! store has been seen to send in more than one shape are kept loose here and
//! tightened in [`crate::normalize`].

use serde::{Deserialize, Serialize};

/// One entry of `GET internalapi/SubsidiaryList/1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBranch {
    pub sucursal_id: i64,
    pub nombre: String,
    #[serde(default)]
    pub direccion: Option<String>,
    pub latitud: WireNumber,
    pub longitud: WireNumber,
    #[serde(default)]
    pub ciudad: Option<String>,
}

/// Body of `GET internalapi/GetZonasCobertura/{branchId}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonesResponse {
    #[serde(default)]
    pub zonas_cobertura: Vec<WireZone>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireZone {
    #[serde(default)]
    pub zona_id: Option<i64>,
    pub nombre_zona: String,
    /// Any of the accepted polygon encodings, see
    /// [`parse_polygon`](crate::normalize::parse_polygon).
    #[serde(default)]
    pub poligono_coordenadas: serde_json::Value,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    #[serde(default)]
    pub activa: Option<WireFlag>,
    #[serde(default)]
    pub calles: Vec<WireStreet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStreet {
    pub nombre_calle: String,
    pub altura_desde: i64,
    pub altura_hasta: i64,
}

/// Body of `POST internalapi/GuardarZonaCobertura`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveZoneRequest {
    pub sucursal_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zona_id: Option<i64>,
    pub nombre_zona: String,
    /// `[latitude, longitude]` pairs.
    pub poligono_coordenadas: Vec<[f64; 2]>,
    pub activa: bool,
    pub calles: Vec<WireStreet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveZoneResponse {
    #[serde(default)]
    pub zona_id: Option<i64>,
}

/// A boolean the store sends either as `true`/`false` or as `1`/`0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireFlag {
    Bool(bool),
    Int(i64),
}

impl WireFlag {
    #[must_use]
    pub const fn is_set(self) -> bool {
        match self {
            WireFlag::Bool(b) => b,
            WireFlag::Int(n) => n != 0,
        }
    }
}

/// A number the store sends either as JSON number or as a decimal string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireNumber::Number(n) => Some(*n),
            WireNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}
