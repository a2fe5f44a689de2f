//! Conversions between gate-core types and Sui SDK types.

use std::collections::BTreeMap;

use gate_core::{Address, ObjectChange, ObjectChangeKind, ObjectId};
use serde_json::Value;
use sui_sdk::rpc_types::ObjectChange as SuiObjectChange;
use sui_types::base_types::{ObjectID, SuiAddress};
use sui_types::object::Owner;

// ============================================================================
// Identifiers
// ============================================================================

pub fn to_object_id(id: &ObjectId) -> ObjectID {
    ObjectID::new(*id.as_bytes())
}

pub fn to_sui_address(address: &Address) -> SuiAddress {
    SuiAddress::from(to_object_id(address))
}

pub fn from_object_id(id: ObjectID) -> ObjectId {
    Address::new(id.into_bytes())
}

pub fn from_sui_address(address: SuiAddress) -> Address {
    Address::new(address.to_inner())
}

fn address_owner(owner: &Owner) -> Option<Address> {
    match owner {
        Owner::AddressOwner(address) => Some(from_sui_address(*address)),
        _ => None,
    }
}

// ============================================================================
// Object changes
// ============================================================================

/// Map an RPC object change onto the core representation.
pub fn object_change(change: &SuiObjectChange) -> ObjectChange {
    match change {
        SuiObjectChange::Created {
            object_id,
            object_type,
            owner,
            ..
        } => ObjectChange {
            kind: ObjectChangeKind::Created,
            object_id: from_object_id(*object_id),
            object_type: Some(object_type.to_string()),
            owner: address_owner(owner),
        },
        SuiObjectChange::Mutated {
            object_id,
            object_type,
            owner,
            ..
        } => ObjectChange {
            kind: ObjectChangeKind::Mutated,
            object_id: from_object_id(*object_id),
            object_type: Some(object_type.to_string()),
            owner: address_owner(owner),
        },
        SuiObjectChange::Transferred {
            object_id,
            object_type,
            recipient,
            ..
        } => ObjectChange {
            kind: ObjectChangeKind::Transferred,
            object_id: from_object_id(*object_id),
            object_type: Some(object_type.to_string()),
            owner: address_owner(recipient),
        },
        SuiObjectChange::Deleted {
            object_id,
            object_type,
            ..
        } => ObjectChange {
            kind: ObjectChangeKind::Deleted,
            object_id: from_object_id(*object_id),
            object_type: Some(object_type.to_string()),
            owner: None,
        },
        SuiObjectChange::Wrapped {
            object_id,
            object_type,
            ..
        } => ObjectChange {
            kind: ObjectChangeKind::Wrapped,
            object_id: from_object_id(*object_id),
            object_type: Some(object_type.to_string()),
            owner: None,
        },
        SuiObjectChange::Published { package_id, .. } => ObjectChange {
            kind: ObjectChangeKind::Published,
            object_id: from_object_id(*package_id),
            object_type: None,
            owner: None,
        },
    }
}

// ============================================================================
// Move values
// ============================================================================

/// Flatten the top-level fields of a Move struct rendered as JSON into
/// display strings.
///
/// `UID`/`ID` wrappers collapse to the inner id; other nested values are
/// kept as compact JSON.
pub fn flatten_fields(fields: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = fields else {
        return BTreeMap::new();
    };

    map.iter()
        .map(|(key, value)| (key.clone(), display_value(value)))
        .collect()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(inner) => match inner.get("id") {
            Some(id) if inner.len() == 1 => display_value(id),
            _ => value.to_string(),
        },
        Value::Array(_) => value.to_string(),
    }
}

/// Parse a Move `u64` rendered as JSON (string or number).
pub fn parse_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn address_conversions_round_trip() {
        let address = Address::parse("0xa11ce").unwrap();
        assert_eq!(from_sui_address(to_sui_address(&address)), address);
        assert_eq!(from_object_id(to_object_id(&address)), address);
    }

    #[test]
    fn uid_fields_collapse_to_the_id() {
        let fields = flatten_fields(&json!({
            "id": { "id": "0xbeef" },
            "name": "Final Lap",
            "edition": 3,
            "verified": true,
            "tags": ["a", "b"],
        }));

        assert_eq!(fields["id"], "0xbeef");
        assert_eq!(fields["name"], "Final Lap");
        assert_eq!(fields["edition"], "3");
        assert_eq!(fields["verified"], "true");
        assert_eq!(fields["tags"], r#"["a","b"]"#);
    }

    #[test]
    fn non_struct_values_flatten_to_nothing() {
        assert!(flatten_fields(&json!("scalar")).is_empty());
    }

    #[test]
    fn u64_accepts_string_and_number() {
        assert_eq!(parse_u64(&json!("1000000000")), Some(1_000_000_000));
        assert_eq!(parse_u64(&json!(42)), Some(42));
        assert_eq!(parse_u64(&json!("not a number")), None);
        assert_eq!(parse_u64(&json!(null)), None);
    }
}
