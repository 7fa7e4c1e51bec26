//! Built-in object type rules.

use super::country::is_valid_alpha2;
use super::error::{OperandField, ViolationKind};
use super::model::{Operand, object_types as ot};
use super::registry::{ObjectTypeRegistry, ObjectTypeRule, ValueShape};

/// Client type tokens accepted for `CLIENT_TYPE`.
pub const CLIENT_TYPES: [&str; 12] = [
    "zpn_client_type_exporter",
    "zpn_client_type_exporter_noauth",
    "zpn_client_type_machine_tunnel",
    "zpn_client_type_edge_connector",
    "zpn_client_type_zia_inspection",
    "zpn_client_type_vdi",
    "zpn_client_type_zapp",
    "zpn_client_type_slogger",
    "zpn_client_type_browser_isolation",
    "zpn_client_type_ip_anchoring",
    "zpn_client_type_zapp_partner",
    "zpn_client_type_branch_connector",
];

pub const PLATFORMS: [&str; 5] = ["mac", "linux", "ios", "windows", "android"];

pub const RISK_SCORES: [&str; 5] = ["UNKNOWN", "LOW", "MEDIUM", "HIGH", "CRITICAL"];

pub const RISK_FACTOR_PROVIDER: &str = "ZIA";

pub const CHROME_MANAGED: &str = "managed";

const BOOLEAN: &str = "'true' or 'false'";

const MEMBERSHIP: [(&str, &str); 8] = [
    (ot::APP, "an Application Segment ID"),
    (ot::APP_GROUP, "a Segment Group ID"),
    (ot::MACHINE_GRP, "a Machine Group ID"),
    (ot::LOCATION, "a Location ID"),
    (ot::EDGE_CONNECTOR_GROUP, "an Edge Connector Group ID"),
    (ot::BRANCH_CONNECTOR_GROUP, "a Branch Connector Group ID"),
    (ot::USER_PORTAL, "a User Portal ID"),
    (ot::CHROME_POSTURE_PROFILE, "a Chrome Posture Profile ID"),
];

pub(super) fn register_builtin(registry: &mut ObjectTypeRegistry) {
    for (object_type, expected) in MEMBERSHIP {
        registry.register(
            object_type,
            ObjectTypeRule::new(ValueShape::Values)
                .with_validator(move |op| require_values(op, expected)),
        );
    }

    registry
        .register(ot::CONSOLE, ObjectTypeRule::new(ValueShape::Values))
        .register(ot::PRIVILEGE_PORTAL, ObjectTypeRule::new(ValueShape::Values))
        .register(
            ot::CLIENT_TYPE,
            ObjectTypeRule::new(ValueShape::Values).with_validator(validate_client_type),
        )
        .register(
            ot::PLATFORM,
            ObjectTypeRule::new(ValueShape::EntryValues).with_validator(validate_platform),
        )
        .register(
            ot::RISK_FACTOR_TYPE,
            ObjectTypeRule::new(ValueShape::EntryValues).with_validator(validate_risk_factor),
        )
        .register(
            ot::POSTURE,
            ObjectTypeRule::new(ValueShape::EntryValues)
                .with_validator(|op| validate_reference_flag(op, "a Posture UDID")),
        )
        .register(
            ot::TRUSTED_NETWORK,
            ObjectTypeRule::new(ValueShape::EntryValues)
                .with_validator(|op| validate_reference_flag(op, "a Network ID")),
        )
        .register(
            ot::COUNTRY_CODE,
            ObjectTypeRule::new(ValueShape::EntryValues).with_validator(validate_country_code),
        )
        .register(
            ot::SAML,
            ObjectTypeRule::new(ValueShape::EntryValues)
                .with_validator(|op| validate_opaque_pair(op, "a SAML attribute ID")),
        )
        .register(
            ot::SCIM,
            ObjectTypeRule::new(ValueShape::EntryValues)
                .with_validator(|op| validate_opaque_pair(op, "an IdP ID")),
        )
        .register(
            ot::SCIM_GROUP,
            ObjectTypeRule::new(ValueShape::EntryValues)
                .with_validator(|op| validate_opaque_pair(op, "an IdP ID")),
        )
        .register(
            ot::CHROME_ENTERPRISE,
            ObjectTypeRule::new(ValueShape::EntryValues).with_validator(validate_chrome_enterprise),
        );
}

fn one_of(allowed: &[&str]) -> String {
    format!("one of {}", allowed.join(", "))
}

fn require_values(op: &Operand, expected: &str) -> Result<(), ViolationKind> {
    if op.values.is_empty() {
        return Err(ViolationKind::missing_values(expected));
    }
    Ok(())
}

fn require_entries(op: &Operand, expected: &str) -> Result<(), ViolationKind> {
    if op.entry_values.is_empty() {
        return Err(ViolationKind::missing_entry_values(expected));
    }
    Ok(())
}

fn is_bool_literal(s: &str) -> bool {
    s == "true" || s == "false"
}

fn validate_client_type(op: &Operand) -> Result<(), ViolationKind> {
    require_values(op, "one of the valid client types")?;
    if let Some(bad) = op.values.iter().find(|v| !CLIENT_TYPES.contains(&v.as_str())) {
        return Err(ViolationKind::invalid(
            OperandField::Value,
            bad,
            one_of(&CLIENT_TYPES),
        ));
    }
    Ok(())
}

fn validate_platform(op: &Operand) -> Result<(), ViolationKind> {
    require_entries(op, "one of the valid platform types")?;
    for ev in &op.entry_values {
        if !PLATFORMS.contains(&ev.lhs.as_str()) {
            return Err(ViolationKind::invalid(
                OperandField::Lhs,
                &ev.lhs,
                one_of(&PLATFORMS),
            ));
        }
    }
    Ok(())
}

fn validate_risk_factor(op: &Operand) -> Result<(), ViolationKind> {
    require_entries(op, "valid risk factor values")?;
    for ev in &op.entry_values {
        if ev.lhs != RISK_FACTOR_PROVIDER {
            return Err(ViolationKind::invalid(
                OperandField::Lhs,
                &ev.lhs,
                format!("'{RISK_FACTOR_PROVIDER}'"),
            ));
        }
        if !RISK_SCORES.contains(&ev.rhs.as_str()) {
            return Err(ViolationKind::invalid(
                OperandField::Rhs,
                &ev.rhs,
                one_of(&RISK_SCORES),
            ));
        }
    }
    Ok(())
}

/// Opaque reference ID on the left, boolean literal on the right.
fn validate_reference_flag(op: &Operand, reference: &str) -> Result<(), ViolationKind> {
    require_entries(op, reference)?;
    for ev in &op.entry_values {
        if ev.lhs.is_empty() {
            return Err(ViolationKind::invalid(OperandField::Lhs, "", reference));
        }
        if !is_bool_literal(&ev.rhs) {
            return Err(ViolationKind::invalid(OperandField::Rhs, &ev.rhs, BOOLEAN));
        }
    }
    Ok(())
}

fn validate_country_code(op: &Operand) -> Result<(), ViolationKind> {
    require_entries(op, "a valid country code")?;
    let mut invalid = Vec::new();
    for ev in &op.entry_values {
        if !is_valid_alpha2(&ev.lhs) {
            invalid.push(ev.lhs.clone());
        }
        // No "is not" form remotely.
        if ev.rhs != "true" {
            return Err(ViolationKind::invalid(OperandField::Rhs, &ev.rhs, "'true'"));
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(ViolationKind::InvalidCountryCodes { codes: invalid })
    }
}

fn validate_opaque_pair(op: &Operand, reference: &str) -> Result<(), ViolationKind> {
    require_entries(op, "entry values")?;
    for ev in &op.entry_values {
        if ev.lhs.is_empty() {
            return Err(ViolationKind::invalid(OperandField::Lhs, "", reference));
        }
        if ev.rhs.is_empty() {
            return Err(ViolationKind::invalid(
                OperandField::Rhs,
                "",
                "a non-empty attribute or group reference",
            ));
        }
    }
    Ok(())
}

fn validate_chrome_enterprise(op: &Operand) -> Result<(), ViolationKind> {
    require_entries(op, "entry values")?;
    for ev in &op.entry_values {
        if ev.lhs != CHROME_MANAGED {
            return Err(ViolationKind::invalid(
                OperandField::Lhs,
                &ev.lhs,
                format!("'{CHROME_MANAGED}'"),
            ));
        }
        if !is_bool_literal(&ev.rhs) {
            return Err(ViolationKind::invalid(OperandField::Rhs, &ev.rhs, BOOLEAN));
        }
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn check(op: &Operand) -> Result<(), ViolationKind> {
        ObjectTypeRegistry::builtin()
            .get(&op.object_type)
            .unwrap()
            .validate(op)
    }

    #[test]
    fn membership_types_require_values() {
        for (object_type, _) in MEMBERSHIP {
            let err = check(&Operand::values(object_type, Vec::<String>::new())).unwrap_err();
            assert!(matches!(err, ViolationKind::MissingValues { .. }), "{object_type}");
            assert!(check(&Operand::values(object_type, ["123"])).is_ok());
        }
        let err = check(&Operand::values(ot::APP, Vec::<String>::new())).unwrap_err();
        assert_eq!(err.to_string(), "must provide an Application Segment ID");
    }

    #[test]
    fn client_type_rejects_empty_and_unknown() {
        let err = check(&Operand::values(ot::CLIENT_TYPE, Vec::<String>::new())).unwrap_err();
        assert_eq!(err.to_string(), "must provide one of the valid client types");

        let err = check(&Operand::values(
            ot::CLIENT_TYPE,
            ["zpn_client_type_zapp", "zpn_bogus_type"],
        ))
        .unwrap_err();
        assert!(err.to_string().contains("zpn_bogus_type"));

        assert!(check(&Operand::values(ot::CLIENT_TYPE, CLIENT_TYPES)).is_ok());
    }

    #[test]
    fn platform_lhs_allow_list() {
        assert!(check(&Operand::entries(ot::PLATFORM, [("linux", "true")])).is_ok());
        let err = check(&Operand::entries(ot::PLATFORM, [("beos", "true")])).unwrap_err();
        assert!(matches!(
            err,
            ViolationKind::InvalidValue { field: OperandField::Lhs, ref value, .. } if value == "beos"
        ));
    }

    #[test]
    fn risk_factor_requires_zia_and_known_score() {
        assert!(check(&Operand::entries(ot::RISK_FACTOR_TYPE, [("ZIA", "HIGH")])).is_ok());
        assert!(check(&Operand::entries(ot::RISK_FACTOR_TYPE, [("ZPA", "HIGH")])).is_err());
        let err = check(&Operand::entries(ot::RISK_FACTOR_TYPE, [("ZIA", "SEVERE")])).unwrap_err();
        assert!(err.to_string().contains("SEVERE"));
    }

    #[test]
    fn posture_and_trusted_network_need_boolean_rhs() {
        let err = check(&Operand::entries(ot::POSTURE, [("abc-123", "maybe")])).unwrap_err();
        assert_eq!(
            err,
            ViolationKind::invalid(OperandField::Rhs, "maybe", BOOLEAN)
        );
        assert!(check(&Operand::entries(ot::POSTURE, [("abc-123", "false")])).is_ok());
        assert!(check(&Operand::entries(ot::TRUSTED_NETWORK, [("", "true")])).is_err());
        assert!(check(&Operand::entries(ot::TRUSTED_NETWORK, [("net-1", "true")])).is_ok());
    }

    #[test]
    fn country_code_aggregates_invalid_codes() {
        assert!(check(&Operand::entries(ot::COUNTRY_CODE, [("US", "true")])).is_ok());

        let err = check(&Operand::entries(
            ot::COUNTRY_CODE,
            [("ZZ", "true"), ("US", "true"), ("XX", "true")],
        ))
        .unwrap_err();
        assert_eq!(
            err,
            ViolationKind::InvalidCountryCodes {
                codes: vec!["XX".to_owned(), "ZZ".to_owned()]
            }
        );
    }

    #[test]
    fn country_code_rejects_negation() {
        let err = check(&Operand::entries(ot::COUNTRY_CODE, [("US", "false")])).unwrap_err();
        assert!(matches!(
            err,
            ViolationKind::InvalidValue { field: OperandField::Rhs, .. }
        ));
    }

    #[test]
    fn identity_pairs_need_both_sides() {
        for object_type in [ot::SAML, ot::SCIM, ot::SCIM_GROUP] {
            assert!(check(&Operand::entries(object_type, [("idp", "eng")])).is_ok());
            assert!(check(&Operand::entries(object_type, [("idp", "")])).is_err());
            assert!(check(&Operand::entries(object_type, [("", "eng")])).is_err());
            assert!(check(&Operand::entries(object_type, Vec::<(String, String)>::new())).is_err());
        }
    }

    #[test]
    fn chrome_enterprise_requires_managed_flag() {
        assert!(check(&Operand::entries(ot::CHROME_ENTERPRISE, [("managed", "true")])).is_ok());
        assert!(check(&Operand::entries(ot::CHROME_ENTERPRISE, [("unmanaged", "true")])).is_err());
        assert!(check(&Operand::entries(ot::CHROME_ENTERPRISE, [("managed", "yes")])).is_err());
    }
}
