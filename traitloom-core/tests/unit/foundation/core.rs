use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(3, 2).unwrap();
    assert_eq!(c.rgba_len(), 24);
}

#[test]
fn raster_clear_drops_stale_pixels_and_resizes() {
    let mut r = Raster::transparent(Canvas::new(2, 2).unwrap());
    r.data.fill(200);
    assert!(!r.is_blank());

    r.clear(Canvas::new(3, 1).unwrap());
    assert_eq!((r.width, r.height), (3, 1));
    assert_eq!(r.data.len(), 12);
    assert!(r.is_blank());
}

#[test]
fn raster_pixel_bounds() {
    let mut r = Raster::transparent(Canvas::new(2, 1).unwrap());
    r.data[4..8].copy_from_slice(&[1, 2, 3, 4]);
    assert_eq!(r.pixel(1, 0), Some([1, 2, 3, 4]));
    assert_eq!(r.pixel(2, 0), None);
    assert_eq!(r.pixel(0, 1), None);
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(token.check().is_ok());
    other.cancel();
    assert!(matches!(token.check(), Err(TraitloomError::Cancelled)));
}
