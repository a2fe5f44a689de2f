use gate_chain_sui::SuiError;
use gate_core::ChainError;

/// Sponsor shortfalls surface with both amounts intact.
#[test]
fn test_insufficient_gas_keeps_amounts() {
    let error: ChainError = SuiError::InsufficientGas {
        required: 1_100_000_000,
        available: 5,
    }
    .into();

    assert!(matches!(
        error,
        ChainError::InsufficientGas {
            required: 1_100_000_000,
            available: 5
        }
    ));
}

/// Keystore problems are signing failures to the core.
#[test]
fn test_keystore_errors_become_signing_errors() {
    let error: ChainError = SuiError::Keystore("sponsor missing".to_string()).into();
    assert!(matches!(error, ChainError::Signing(message) if message == "sponsor missing"));
}

#[test]
fn test_anyhow_context_is_preserved() {
    let source = anyhow::anyhow!("connection reset").context("Failed to select gas coins");
    let error: ChainError = SuiError::from(source).into();

    match error {
        ChainError::Backend(message) => {
            assert!(message.contains("Failed to select gas coins"));
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected Backend, got {other:?}"),
    }
}

#[test]
fn test_missing_objects_stay_not_found() {
    let error: ChainError = SuiError::ObjectNotFound("0xb105".to_string()).into();
    assert!(matches!(error, ChainError::ObjectNotFound(id) if id == "0xb105"));
}
