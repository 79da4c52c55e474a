use std::io::Cursor;

use super::*;

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, vec![1u8, 2, 3, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("../up.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn register_rejects_non_png() {
    let mut store = ImageStore::new();
    let err = store
        .register(&Upload::new("hat.jpg", b"\xFF\xD8\xFF\xE0junk".to_vec()))
        .unwrap_err();
    assert!(matches!(err, TraitloomError::Validation(_)));
    assert!(store.is_empty());
}

#[test]
fn identical_bytes_share_one_key() {
    let mut store = ImageStore::new();
    let a = store.register(&Upload::new("a.png", tiny_png())).unwrap();
    let b = store.register(&Upload::new("b.png", tiny_png())).unwrap();
    assert_eq!(a, b);
    assert_eq!(store.len(), 1);
    assert!(store.get(&a).is_some());
}

#[test]
fn display_name_strips_everything_after_first_dot() {
    assert_eq!(Upload::new("red.hat.png", vec![]).display_name(), "red");
    assert_eq!(Upload::new("plain", vec![]).display_name(), "plain");
}

#[test]
fn retain_keys_drops_unreferenced() {
    let mut store = ImageStore::new();
    let keep = store.insert_bytes(vec![1]);
    let _drop = store.insert_bytes(vec![2]);
    store.retain_keys([&keep]);
    assert_eq!(store.len(), 1);
    assert!(store.contains(&keep));
}
