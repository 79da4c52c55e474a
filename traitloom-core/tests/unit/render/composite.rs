use super::*;

#[test]
fn transparent_source_keeps_destination() {
    assert_eq!(over([10, 20, 30, 40], [255, 255, 255, 0]), [10, 20, 30, 40]);
}

#[test]
fn opaque_source_occludes() {
    assert_eq!(over([0, 0, 255, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
}

#[test]
fn empty_destination_takes_source() {
    assert_eq!(over([0, 0, 0, 0], [100, 110, 120, 200]), [100, 110, 120, 200]);
}

#[test]
fn half_alpha_blends_premultiplied() {
    // 50% red over opaque blue.
    let out = over([0, 0, 255, 255], [128, 0, 0, 128]);
    assert_eq!(out, [128, 0, 127, 255]);
}

#[test]
fn stacking_order_matters() {
    let red_half = [128, 0, 0, 128];
    let blue = [0, 0, 255, 255];
    assert_ne!(over(over([0; 4], blue), red_half), over(over([0; 4], red_half), blue));
}

#[test]
fn in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    over_in_place(&mut dst, &[9, 9, 9, 255, 0, 0, 0, 0]).unwrap();
    assert_eq!(dst, vec![9, 9, 9, 255, 0, 0, 0, 0]);
}
