//! Intake payload validation and sanitization.
//!
//! Both functions work on untyped JSON so that wrong types surface as
//! field-level messages instead of a deserialization failure.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::models::{BloodType, MaritalStatus, RecordFields, Sex, YesNo};

/// Free-text answers.
const TEXT_FIELDS: &[&str] = &[
    "funcion",
    "planSalud",
    "nombrePlan",
    "tarjetaSalud",
    "organismoSalud",
    "cardiacoMed",
    "diabetesMed",
    "renalMed",
    "psicologicoMed",
    "listaAlergias",
    "medicamentosAlergias",
    "medicamentosRecientes",
    "tiempoInmovilizado",
    "cirugias",
    "hospitalizacion",
    "observacionDiscapacidad",
];

/// Questions answered with `Sí` / `No`.
const YES_NO_FIELDS: &[&str] = &[
    "transfusion",
    "cardiaco",
    "diabetes",
    "renal",
    "psicologico",
    "alergiaPiel",
    "alergiaAlimentos",
    "alergiaMedicamentos",
    "problemasRecientes",
    "lesionGrave",
    "fractura",
];

const LIST_FIELDS: &[&str] = &["enfermedades", "discapacidades"];

/// Check a raw form payload. Returns every violation found; empty means valid.
pub fn validate(payload: &Value) -> Vec<String> {
    let Some(obj) = payload.as_object() else {
        return vec!["Payload must be a JSON object".to_string()];
    };
    let mut errors = Vec::new();

    match present(obj, "nombre") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        _ => errors.push("nombre is required".to_string()),
    }

    match present(obj, "fechaNacimiento") {
        None => errors.push("fechaNacimiento is required".to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => errors.push("fechaNacimiento is required".to_string()),
        Some(Value::String(s)) if parse_birth_date(s).is_some() => {}
        Some(_) => errors.push("fechaNacimiento is not a valid date".to_string()),
    }

    match present(obj, "sexo") {
        Some(Value::String(s)) if Sex::from_str(s.trim()).is_ok() => {}
        _ => errors.push("sexo is required and must be Masculino, Femenino or Otro".to_string()),
    }

    check_choice::<BloodType>(obj, "tipoSangre", &mut errors);
    check_choice::<MaritalStatus>(obj, "estadoCivil", &mut errors);
    for key in YES_NO_FIELDS {
        check_choice::<YesNo>(obj, key, &mut errors);
    }

    for key in LIST_FIELDS {
        match present(obj, key) {
            None => {}
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
            Some(_) => errors.push(format!("{key} must be a list of text values")),
        }
    }

    for key in TEXT_FIELDS {
        if matches!(present(obj, key), Some(v) if !v.is_string()) {
            errors.push(format!("{key} must be text"));
        }
    }

    errors
}

/// Normalize a payload into fully-populated record fields.
///
/// Total and idempotent: strings are trimmed, absent or mistyped values
/// become empty, the birth date is rewritten as `YYYY-MM-DD` when it parses.
pub fn sanitize(payload: &Value) -> RecordFields {
    let empty = Map::new();
    let obj = payload.as_object().unwrap_or(&empty);
    let text = |key: &str| -> String {
        obj.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let list = |key: &str| -> Vec<String> {
        obj.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };

    let fecha = text("fechaNacimiento");
    let fecha_nacimiento = parse_birth_date(&fecha)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or(fecha);

    RecordFields {
        nombre: text("nombre"),
        fecha_nacimiento,
        sexo: text("sexo"),
        funcion: text("funcion"),
        estado_civil: text("estadoCivil"),
        plan_salud: text("planSalud"),
        nombre_plan: text("nombrePlan"),
        tarjeta_salud: text("tarjetaSalud"),
        organismo_salud: text("organismoSalud"),
        tipo_sangre: text("tipoSangre"),
        enfermedades: list("enfermedades"),
        transfusion: text("transfusion"),
        cardiaco: text("cardiaco"),
        cardiaco_med: text("cardiacoMed"),
        diabetes: text("diabetes"),
        diabetes_med: text("diabetesMed"),
        renal: text("renal"),
        renal_med: text("renalMed"),
        psicologico: text("psicologico"),
        psicologico_med: text("psicologicoMed"),
        alergia_piel: text("alergiaPiel"),
        alergia_alimentos: text("alergiaAlimentos"),
        alergia_medicamentos: text("alergiaMedicamentos"),
        lista_alergias: text("listaAlergias"),
        medicamentos_alergias: text("medicamentosAlergias"),
        problemas_recientes: text("problemasRecientes"),
        medicamentos_recientes: text("medicamentosRecientes"),
        lesion_grave: text("lesionGrave"),
        fractura: text("fractura"),
        tiempo_inmovilizado: text("tiempoInmovilizado"),
        cirugias: text("cirugias"),
        hospitalizacion: text("hospitalizacion"),
        discapacidades: list("discapacidades"),
        observacion_discapacidad: text("observacionDiscapacidad"),
    }
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, or `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date()))
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok().map(|dt| dt.date()))
}

/// A key counts as present unless missing or `null`.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Optional enumerated answer: empty is allowed, anything else must parse.
fn check_choice<T: FromStr>(obj: &Map<String, Value>, key: &str, errors: &mut Vec<String>) {
    match present(obj, key) {
        None => {}
        Some(Value::String(s)) if s.trim().is_empty() || T::from_str(s.trim()).is_ok() => {}
        Some(_) => errors.push(format!("{key} has an invalid value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "nombre": "Ana Pérez",
            "fechaNacimiento": "1990-04-12",
            "sexo": "Femenino"
        })
    }

    #[test]
    fn minimal_payload_is_valid() {
        assert!(validate(&minimal()).is_empty());
    }

    #[test]
    fn missing_nombre_rejected() {
        let mut payload = minimal();
        payload.as_object_mut().unwrap().remove("nombre");
        let errors = validate(&payload);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("nombre"));

        payload["nombre"] = json!("   ");
        assert_eq!(validate(&payload).len(), 1);

        payload["nombre"] = json!(42);
        assert_eq!(validate(&payload).len(), 1);
    }

    #[test]
    fn bad_birth_date_rejected() {
        let mut payload = minimal();
        payload["fechaNacimiento"] = json!("not-a-date");
        let errors = validate(&payload);
        assert_eq!(errors, vec!["fechaNacimiento is not a valid date"]);

        payload.as_object_mut().unwrap().remove("fechaNacimiento");
        assert_eq!(validate(&payload), vec!["fechaNacimiento is required"]);
    }

    #[test]
    fn blank_birth_date_counts_as_missing() {
        let mut payload = minimal();
        payload["fechaNacimiento"] = json!("");
        assert_eq!(validate(&payload), vec!["fechaNacimiento is required"]);

        payload["fechaNacimiento"] = json!("   ");
        assert_eq!(validate(&payload), vec!["fechaNacimiento is required"]);
    }

    #[test]
    fn sexo_outside_enumeration_rejected() {
        let mut payload = minimal();
        payload["sexo"] = json!("X");
        assert_eq!(validate(&payload).len(), 1);
        payload["sexo"] = json!("masculino");
        assert_eq!(validate(&payload).len(), 1);
    }

    #[test]
    fn optional_choices_checked_when_non_empty() {
        let mut payload = minimal();
        payload["tipoSangre"] = json!("");
        payload["estadoCivil"] = json!("Casado/a");
        payload["cardiaco"] = json!("Sí");
        assert!(validate(&payload).is_empty());

        payload["tipoSangre"] = json!("Z+");
        payload["fractura"] = json!("maybe");
        let errors = validate(&payload);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("tipoSangre")));
        assert!(errors.iter().any(|e| e.starts_with("fractura")));
    }

    #[test]
    fn list_fields_must_hold_text() {
        let mut payload = minimal();
        payload["enfermedades"] = json!("asma");
        payload["discapacidades"] = json!(["visual", 3]);
        let errors = validate(&payload);
        assert_eq!(errors.len(), 2);

        payload["enfermedades"] = json!(["asma"]);
        payload["discapacidades"] = Value::Null;
        assert!(validate(&payload).is_empty());
    }

    #[test]
    fn non_string_text_field_rejected() {
        let mut payload = minimal();
        payload["cirugias"] = json!({"count": 2});
        assert_eq!(validate(&payload), vec!["cirugias must be text"]);
    }

    #[test]
    fn non_object_payload_rejected() {
        assert_eq!(validate(&json!([1, 2])).len(), 1);
        assert_eq!(validate(&Value::Null).len(), 1);
    }

    #[test]
    fn sanitize_fills_defaults_and_trims() {
        let fields = sanitize(&json!({
            "nombre": "  Luis  ",
            "fechaNacimiento": "1975-11-02T00:00:00.000Z",
            "sexo": "Masculino",
            "enfermedades": [" asma ", 7, "", "hipertensión"],
            "cirugias": 5
        }));
        assert_eq!(fields.nombre, "Luis");
        assert_eq!(fields.fecha_nacimiento, "1975-11-02");
        assert_eq!(fields.enfermedades, vec!["asma", "hipertensión"]);
        assert_eq!(fields.cirugias, "");
        assert!(fields.discapacidades.is_empty());
        assert_eq!(fields.tipo_sangre, "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = json!({
            "nombre": " Marta ",
            "fechaNacimiento": "2001-02-03T10:30",
            "sexo": "Otro",
            "tipoSangre": " O- ",
            "discapacidades": ["auditiva ", null],
            "observacionDiscapacidad": "  usa audífono "
        });
        let once = sanitize(&raw);
        let twice = sanitize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
        assert_eq!(once.fecha_nacimiento, "2001-02-03");
    }

    #[test]
    fn sanitize_keeps_unparseable_date_text() {
        let fields = sanitize(&json!({ "fechaNacimiento": " ayer " }));
        assert_eq!(fields.fecha_nacimiento, "ayer");
        assert_eq!(sanitize(&Value::Null), RecordFields::default());
    }

    #[test]
    fn birth_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 4, 12);
        assert_eq!(parse_birth_date("1990-04-12"), expected);
        assert_eq!(parse_birth_date("1990-04-12T08:00:00+02:00"), expected);
        assert_eq!(parse_birth_date("1990-04-12T08:00:00"), expected);
        assert_eq!(parse_birth_date("1990-04-12T08:00"), expected);
        assert_eq!(parse_birth_date("12/04/1990"), None);
        assert_eq!(parse_birth_date(""), None);
    }
}
