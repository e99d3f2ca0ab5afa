use serde::Serialize;

use crate::text::canonical;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleStyle {
    pub color: &'static str,
    pub icono: &'static str,
}

const DEFAULT_ROLE: RoleStyle = RoleStyle {
    color: "#7F8C8D",
    icono: "person-outline",
};

const ROLE_STYLES: &[(&str, RoleStyle)] = &[
    (
        "gerente",
        RoleStyle {
            color: "#8E44AD",
            icono: "briefcase-outline",
        },
    ),
    (
        "administrador",
        RoleStyle {
            color: "#C0392B",
            icono: "shield-checkmark-outline",
        },
    ),
    (
        "optometrista",
        RoleStyle {
            color: "#2980B9",
            icono: "eye-outline",
        },
    ),
    (
        "oftalmologo",
        RoleStyle {
            color: "#1F618D",
            icono: "medkit-outline",
        },
    ),
    (
        "vendedor",
        RoleStyle {
            color: "#27AE60",
            icono: "cart-outline",
        },
    ),
    (
        "recepcion",
        RoleStyle {
            color: "#E67E22",
            icono: "call-outline",
        },
    ),
    (
        "tecnico",
        RoleStyle {
            color: "#16A085",
            icono: "construct-outline",
        },
    ),
];

pub fn role_style(cargo: Option<&str>) -> RoleStyle {
    let Some(cargo) = cargo else {
        return DEFAULT_ROLE;
    };
    let cargo = canonical(cargo);
    ROLE_STYLES
        .iter()
        .find(|(token, _)| cargo.contains(token))
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_ROLE)
}
