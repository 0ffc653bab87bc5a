use serde::{Deserialize, Serialize};

/// Coarse-grained permission class carried by the session token.
///
/// The stored role strings come in English and Portuguese variants
/// (`doctor`/`medico`, `patient`/`paciente`); normalization happens here,
/// at the boundary, and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Reception,
    Patient,
}

impl Role {
    /// Normalizes a raw role string. Unknown strings map to `None`;
    /// callers decide what an unknown role means in their context.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" | "medico" | "médico" => Some(Role::Doctor),
            "reception" | "recepcao" | "recepção" => Some(Role::Reception),
            "patient" | "paciente" => Some(Role::Patient),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "medico",
            Role::Reception => "recepcao",
            Role::Patient => "paciente",
        }
    }
}

/// Area each role lands on after login. Shared by the guard's redirect
/// decisions and the login response. An unknown role falls through to the
/// patient area.
pub fn home_path(raw_role: &str) -> &'static str {
    match Role::parse(raw_role) {
        Some(Role::Admin) => "/admin/dashboard",
        Some(Role::Doctor) => "/medic",
        Some(Role::Reception) => "/acolhimento/agendamentos",
        Some(Role::Patient) | None => "/paciente/dashboard",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_synonyms() {
        assert_eq!(Role::parse("medico"), Some(Role::Doctor));
        assert_eq!(Role::parse("doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse("recepcao"), Some(Role::Reception));
        assert_eq!(Role::parse("reception"), Some(Role::Reception));
        assert_eq!(Role::parse("paciente"), Some(Role::Patient));
        assert_eq!(Role::parse("patient"), Some(Role::Patient));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn home_path_table() {
        assert_eq!(home_path("admin"), "/admin/dashboard");
        assert_eq!(home_path("medico"), "/medic");
        assert_eq!(home_path("doctor"), "/medic");
        assert_eq!(home_path("recepcao"), "/acolhimento/agendamentos");
        assert_eq!(home_path("paciente"), "/paciente/dashboard");
    }

    #[test]
    fn home_path_unknown_role_goes_to_patient_area() {
        assert_eq!(home_path("banana"), "/paciente/dashboard");
    }
}
