use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MaskeditError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MaskeditError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(MaskeditError::model("x").to_string().contains("model error:"));
    assert!(
        MaskeditError::quota("x")
            .to_string()
            .contains("quota exhausted:")
    );
}

#[test]
fn quota_is_distinguished() {
    assert!(MaskeditError::quota("daily cap").is_quota());
    assert!(!MaskeditError::model("boom").is_quota());
    assert!(!MaskeditError::validation("bad").is_quota());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MaskeditError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
