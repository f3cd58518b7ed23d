use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient-entered content of an intake form, fully populated.
///
/// Produced by `validation::sanitize`; every optional answer is an empty
/// string or list rather than absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordFields {
    // General information
    pub nombre: String,
    pub fecha_nacimiento: String,
    pub sexo: String,
    pub funcion: String,
    pub estado_civil: String,

    // Health plan
    pub plan_salud: String,
    pub nombre_plan: String,
    pub tarjeta_salud: String,
    pub organismo_salud: String,
    pub tipo_sangre: String,

    pub enfermedades: Vec<String>,

    // Medical conditions
    pub transfusion: String,
    pub cardiaco: String,
    pub cardiaco_med: String,
    pub diabetes: String,
    pub diabetes_med: String,
    pub renal: String,
    pub renal_med: String,
    pub psicologico: String,
    pub psicologico_med: String,

    // Allergies
    pub alergia_piel: String,
    pub alergia_alimentos: String,
    pub alergia_medicamentos: String,
    pub lista_alergias: String,
    pub medicamentos_alergias: String,

    // Recent events
    pub problemas_recientes: String,
    pub medicamentos_recientes: String,
    pub lesion_grave: String,
    pub fractura: String,
    pub tiempo_inmovilizado: String,
    pub cirugias: String,
    pub hospitalizacion: String,

    // Disability
    pub discapacidades: Vec<String>,
    pub observacion_discapacidad: String,
}

/// A stored intake record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: RecordFields,
    pub last_token_used: Option<String>,
    pub submission_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    /// A record created by its first submission.
    pub fn from_submission(fields: RecordFields, token: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
            last_token_used: Some(token.to_string()),
            submission_count: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordFilter {
    /// Case-insensitive substring match on `nombre`.
    pub search: Option<String>,
}
