use super::*;

#[test]
fn fnv_is_incremental_and_matches_reference() {
    let mut whole = Fnv1a64::new();
    whole.update(b"traitloom");
    let mut split = Fnv1a64::new();
    split.update(b"trait");
    split.update(b"loom");
    assert_eq!(whole.digest(), split.digest());

    // Published FNV-1a 64 test vector.
    let mut a = Fnv1a64::new();
    a.update(b"a");
    assert_eq!(a.digest(), 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255(255, 255), 255);
    assert_eq!(mul_div255(255, 0), 0);
    assert_eq!(mul_div255(128, 128), 64);
    assert_eq!(mul_div255(1, 127), 0);
    assert_eq!(mul_div255(1, 128), 1);
}

#[test]
fn gcd_and_add_mod() {
    assert_eq!(gcd_u128(12, 18), 6);
    assert_eq!(gcd_u128(7, 0), 7);
    assert_eq!(add_mod_u128(5, 6, 8), 3);
    assert_eq!(add_mod_u128(u128::MAX - 1, u128::MAX - 1, u128::MAX), u128::MAX - 2);
}
