//! Conversion between zone store wire types and core types.

use chrono::{DateTime, NaiveDateTime, Utc};
use cobertura_core::{geometry, Branch, Coordinate, CoverageZone, StreetRange, StreetRangeDraft};
use serde_json::Value;

use crate::error::StoreError;
use crate::types::{SaveZoneRequest, WireBranch, WireStreet, WireZone};

const LATITUDE_KEYS: [&str; 3] = ["lat", "latitud", "latitude"];
const LONGITUDE_KEYS: [&str; 4] = ["lng", "longitud", "longitude", "lon"];

/// Decode a polygon in any of the store's encodings.
///
/// Accepted: an array of `[lat, lon]` pairs, an array of objects keyed
/// `lat`/`lng`, `latitud`/`longitud` or `latitude`/`longitude`, or a JSON
/// string holding one of those arrays. Numbers may be quoted.
///
/// # Errors
///
/// Returns a description of the first vertex that cannot be read.
pub fn parse_polygon(value: &Value) -> Result<Vec<Coordinate>, String> {
    match value {
        Value::String(encoded) => {
            let decoded: Value = serde_json::from_str(encoded)
                .map_err(|e| format!("polygon string is not JSON: {e}"))?;
            if decoded.is_string() {
                return Err("polygon string decodes to another string".to_string());
            }
            parse_polygon(&decoded)
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                parse_vertex(item)
                    .ok_or_else(|| format!("vertex {index} is not a coordinate: {item}"))
            })
            .collect(),
        Value::Null => Err("polygon is missing".to_string()),
        other => Err(format!("unsupported polygon encoding: {other}")),
    }
}

fn parse_vertex(item: &Value) -> Option<Coordinate> {
    match item {
        Value::Array(pair) if pair.len() == 2 => {
            Some(Coordinate::new(number(&pair[0])?, number(&pair[1])?))
        }
        Value::Object(map) => {
            let latitude = LATITUDE_KEYS.iter().find_map(|k| map.get(*k))?;
            let longitude = LONGITUDE_KEYS.iter().find_map(|k| map.get(*k))?;
            Some(Coordinate::new(number(latitude)?, number(longitude)?))
        }
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse `fechaCreacion`. Missing or blank means the Unix epoch.
///
/// # Errors
///
/// Returns a description when the value is neither RFC 3339 nor a naive
/// `YYYY-MM-DD[T ]HH:MM:SS[.f]` timestamp.
pub fn parse_created_at(raw: Option<&str>) -> Result<DateTime<Utc>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DateTime::UNIX_EPOCH);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unrecognised creation timestamp '{raw}'"))
}

/// Convert a store zone into a validated [`CoverageZone`].
///
/// The polygon goes through the same normalization as zones written by this
/// service, so every zone reaching the resolver is well formed.
///
/// # Errors
///
/// Returns [`StoreError::InvalidZone`] when the polygon, a street range or the
/// creation timestamp cannot be accepted.
pub fn zone_from_wire(branch_id: i64, wire: WireZone) -> Result<CoverageZone, StoreError> {
    let invalid = |reason: String| StoreError::InvalidZone {
        zone: wire.nombre_zona.clone(),
        reason,
    };

    let raw_points = parse_polygon(&wire.poligono_coordenadas).map_err(&invalid)?;
    let polygon = geometry::normalize(&raw_points).map_err(|e| invalid(e.to_string()))?;

    let street_ranges = wire
        .calles
        .iter()
        .enumerate()
        .map(|(index, street)| {
            StreetRange::try_from(StreetRangeDraft {
                street_name: street.nombre_calle.clone(),
                height_from: street.altura_desde,
                height_to: street.altura_hasta,
            })
            .map_err(|e| invalid(format!("street {index} ('{}'): {e}", street.nombre_calle)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let created_at = parse_created_at(wire.fecha_creacion.as_deref()).map_err(&invalid)?;

    Ok(CoverageZone {
        id: wire.zona_id,
        branch_id,
        name: wire.nombre_zona.trim().to_owned(),
        polygon,
        active: wire.activa.is_none_or(|flag| flag.is_set()),
        street_ranges,
        created_at,
    })
}

/// Convert a store branch into a [`Branch`].
///
/// `ciudad`, when present, is appended to the address.
///
/// # Errors
///
/// Returns [`StoreError::InvalidBranch`] for unreadable or out-of-range
/// coordinates.
pub fn branch_from_wire(wire: WireBranch) -> Result<Branch, StoreError> {
    let invalid = |reason: String| StoreError::InvalidBranch {
        branch_id: wire.sucursal_id,
        reason,
    };

    let latitude = wire
        .latitud
        .as_f64()
        .ok_or_else(|| invalid(format!("unreadable latitude {:?}", wire.latitud)))?;
    let longitude = wire
        .longitud
        .as_f64()
        .ok_or_else(|| invalid(format!("unreadable longitude {:?}", wire.longitud)))?;
    let location = Coordinate::try_new(latitude, longitude).map_err(|e| invalid(e.to_string()))?;

    let street = wire.direccion.unwrap_or_default();
    let address = match wire.ciudad.as_deref().map(str::trim) {
        Some(city) if !city.is_empty() && !street.is_empty() => format!("{street}, {city}"),
        Some(city) if !city.is_empty() => city.to_owned(),
        _ => street,
    };

    Ok(Branch {
        id: wire.sucursal_id,
        name: wire.nombre,
        address,
        location,
    })
}

/// Build the save request for `zone`.
#[must_use]
pub fn zone_to_wire(zone: &CoverageZone) -> SaveZoneRequest {
    SaveZoneRequest {
        sucursal_id: zone.branch_id,
        zona_id: zone.id,
        nombre_zona: zone.name.clone(),
        poligono_coordenadas: zone
            .polygon
            .points()
            .iter()
            .map(|p| [p.latitude, p.longitude])
            .collect(),
        activa: zone.active,
        calles: zone
            .street_ranges
            .iter()
            .map(|r| WireStreet {
                nombre_calle: r.street_name().to_owned(),
                altura_desde: i64::from(r.height_from()),
                altura_hasta: i64::from(r.height_to()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{WireFlag, WireNumber};

    fn wire_zone(polygon: Value) -> WireZone {
        WireZone {
            zona_id: Some(3),
            nombre_zona: "Zona Centro".to_string(),
            poligono_coordenadas: polygon,
            fecha_creacion: None,
            activa: None,
            calles: vec![],
        }
    }

    const EXPECTED: [(f64, f64); 3] = [(-38.71, -62.27), (-38.71, -62.254), (-38.722, -62.262)];

    fn assert_triangle(points: &[Coordinate]) {
        let got: Vec<(f64, f64)> = points.iter().map(|p| (p.latitude, p.longitude)).collect();
        assert_eq!(got, EXPECTED);
    }

    #[test]
    fn parses_pair_arrays() {
        let points =
            parse_polygon(&json!([[-38.71, -62.27], [-38.71, -62.254], [-38.722, -62.262]]))
                .unwrap();
        assert_triangle(&points);
    }

    #[test]
    fn parses_lat_lng_objects() {
        let points = parse_polygon(&json!([
            {"lat": -38.71, "lng": -62.27},
            {"lat": -38.71, "lng": -62.254},
            {"lat": -38.722, "lng": -62.262}
        ]))
        .unwrap();
        assert_triangle(&points);
    }

    #[test]
    fn parses_spanish_keys_and_quoted_numbers() {
        let points = parse_polygon(&json!([
            {"latitud": "-38.71", "longitud": "-62.27"},
            {"latitud": -38.71, "longitud": -62.254},
            {"latitude": -38.722, "longitude": -62.262}
        ]))
        .unwrap();
        assert_triangle(&points);
    }

    #[test]
    fn parses_json_encoded_string() {
        let encoded = json!("[[-38.71,-62.27],[-38.71,-62.254],[-38.722,-62.262]]");
        assert_triangle(&parse_polygon(&encoded).unwrap());
    }

    #[test]
    fn rejects_unreadable_vertex() {
        let err = parse_polygon(&json!([[1.0, 2.0], {"x": 1}, [3.0, 4.0]])).unwrap_err();
        assert!(err.contains("vertex 1"), "got: {err}");
    }

    #[test]
    fn rejects_missing_polygon() {
        assert!(parse_polygon(&Value::Null).is_err());
        assert!(parse_polygon(&json!("not json")).is_err());
    }

    #[test]
    fn created_at_formats() {
        assert_eq!(parse_created_at(None).unwrap(), DateTime::UNIX_EPOCH);
        assert_eq!(parse_created_at(Some("  ")).unwrap(), DateTime::UNIX_EPOCH);

        let rfc = parse_created_at(Some("2024-03-01T12:30:00-03:00")).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T15:30:00+00:00");

        let naive = parse_created_at(Some("2024-03-01T12:30:00.123")).unwrap();
        assert_eq!(naive.timestamp_millis() % 1000, 123);

        let spaced = parse_created_at(Some("2024-03-01 12:30:00")).unwrap();
        assert_eq!(spaced.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        assert!(parse_created_at(Some("yesterday")).is_err());
    }

    #[test]
    fn zone_from_wire_normalizes_and_defaults_active() {
        let mut wire = wire_zone(json!([
            [-38.71, -62.27],
            [-38.71, -62.254],
            [-38.722, -62.262],
            [-38.71, -62.27]
        ]));
        wire.calles = vec![WireStreet {
            nombre_calle: "San Martín".to_string(),
            altura_desde: 200,
            altura_hasta: 800,
        }];

        let zone = zone_from_wire(1, wire).unwrap();
        assert_eq!(zone.id, Some(3));
        assert_eq!(zone.branch_id, 1);
        assert!(zone.active);
        assert_eq!(zone.polygon.len(), 3);
        assert_eq!(zone.street_ranges[0].street_key(), "san martin");
        assert_eq!(zone.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn zone_from_wire_reads_numeric_active_flag() {
        let mut wire = wire_zone(json!([[0, 0], [0, 1], [1, 1]]));
        wire.activa = Some(WireFlag::Int(0));
        assert!(!zone_from_wire(1, wire).unwrap().active);
    }

    #[test]
    fn zone_from_wire_rejects_degenerate_polygon() {
        let wire = wire_zone(json!([[0, 0], [1, 1], [2, 2]]));
        let err = zone_from_wire(1, wire).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidZone { ref zone, .. } if zone == "Zona Centro"),
            "got: {err:?}"
        );
    }

    #[test]
    fn zone_from_wire_rejects_inverted_street() {
        let mut wire = wire_zone(json!([[0, 0], [0, 1], [1, 1]]));
        wire.calles = vec![WireStreet {
            nombre_calle: "Mitre".to_string(),
            altura_desde: 500,
            altura_hasta: 100,
        }];
        let err = zone_from_wire(1, wire).unwrap_err();
        assert!(err.to_string().contains("street 0 ('Mitre')"), "got: {err}");
    }

    #[test]
    fn branch_from_wire_joins_city() {
        let branch = branch_from_wire(WireBranch {
            sucursal_id: 4,
            nombre: "Sucursal Belgrano".to_string(),
            direccion: Some("Av. Cabildo 2345".to_string()),
            latitud: WireNumber::Number(-34.5627),
            longitud: WireNumber::Text("-58.4580".to_string()),
            ciudad: Some("CABA".to_string()),
        })
        .unwrap();
        assert_eq!(branch.address, "Av. Cabildo 2345, CABA");
        assert_eq!(branch.location, Coordinate::new(-34.5627, -58.458));
    }

    #[test]
    fn branch_from_wire_rejects_bad_location() {
        let err = branch_from_wire(WireBranch {
            sucursal_id: 4,
            nombre: "Lejos".to_string(),
            direccion: None,
            latitud: WireNumber::Number(-134.0),
            longitud: WireNumber::Number(0.0),
            ciudad: None,
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidBranch { branch_id: 4, .. }));
    }

    #[test]
    fn zone_to_wire_uses_pairs_and_street_names() {
        let zone = zone_from_wire(
            2,
            WireZone {
                calles: vec![WireStreet {
                    nombre_calle: "Alsina".to_string(),
                    altura_desde: 0,
                    altura_hasta: 99,
                }],
                ..wire_zone(json!([[0, 0], [0, 1], [1, 1]]))
            },
        )
        .unwrap();

        let request = zone_to_wire(&zone);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "sucursalId": 2,
                "zonaId": 3,
                "nombreZona": "Zona Centro",
                "poligonoCoordenadas": [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
                "activa": true,
                "calles": [{"nombreCalle": "Alsina", "alturaDesde": 0, "alturaHasta": 99}]
            })
        );
    }
}
