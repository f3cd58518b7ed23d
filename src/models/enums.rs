use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form doubles as the serde representation.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Lifecycle state of a form token. `Submitted` and `Expired` are terminal.
    TokenStatus {
        Pending => "pending",
        Submitted => "submitted",
        Expired => "expired",
    }
);

str_enum!(Sex {
    Masculino => "Masculino",
    Femenino => "Femenino",
    Otro => "Otro",
});

str_enum!(BloodType {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

str_enum!(MaritalStatus {
    Single => "Soltero/a",
    Married => "Casado/a",
    Divorced => "Divorciado/a",
    Widowed => "Viudo/a",
});

str_enum!(
    /// Answer to a yes/no question on the intake form.
    YesNo {
        Yes => "Sí",
        No => "No",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn token_status_round_trip() {
        for (variant, s) in [
            (TokenStatus::Pending, "pending"),
            (TokenStatus::Submitted, "submitted"),
            (TokenStatus::Expired, "expired"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(TokenStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_uses_string_form() {
        assert_eq!(serde_json::to_string(&TokenStatus::Submitted).unwrap(), "\"submitted\"");
        assert_eq!(serde_json::to_string(&BloodType::AbNegative).unwrap(), "\"AB-\"");
        let yes: YesNo = serde_json::from_str("\"Sí\"").unwrap();
        assert_eq!(yes, YesNo::Yes);
    }

    #[test]
    fn blood_types_cover_all_groups() {
        assert_eq!(BloodType::ALL.len(), 8);
        assert!(BloodType::from_str("AB+").is_ok());
        assert!(BloodType::from_str("C+").is_err());
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(TokenStatus::from_str("used").is_err());
        assert!(Sex::from_str("masculino").is_err());
        assert!(MaritalStatus::from_str("").is_err());
    }
}
