use std::io::Cursor;

use super::*;
use crate::archive::export::{MemorySaver, StaticGate};
use crate::assets::decode::is_png;

fn png_1x1(px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, px.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn upload(name: &str, px: [u8; 4]) -> Upload {
    Upload::new(name, png_1x1(px))
}

/// Background: red, green. Body: blue, white, black. 6 combinations on a 1x1 canvas.
fn studio() -> Studio {
    let mut s = Studio::default();
    s.set_canvas(1, 1).unwrap();
    s.add_layer("Background").unwrap();
    s.upload_variants(
        0,
        vec![
            upload("red.png", [255, 0, 0, 255]),
            upload("green.png", [0, 255, 0, 255]),
        ],
    )
    .unwrap();
    s.add_layer("Body").unwrap();
    s.upload_variants(
        1,
        vec![
            upload("blue.png", [0, 0, 255, 255]),
            upload("white.png", [255, 255, 255, 255]),
            upload("black.png", [0, 0, 0, 255]),
        ],
    )
    .unwrap();
    s
}

#[test]
fn active_layer_tracks_adds_removes_and_moves() {
    let mut s = Studio::default();
    s.add_layer("A").unwrap();
    s.add_layer("B").unwrap();
    s.add_layer("C").unwrap();
    assert_eq!(s.active_layer(), 2);

    s.select_layer(0).unwrap();
    s.move_layer_up(0).unwrap();
    assert_eq!(s.active_layer(), 1);
    assert_eq!(s.collection().layers()[1].name, "A");

    s.move_layer(2, 0).unwrap();
    assert_eq!(s.active_layer(), 2);
    assert_eq!(s.collection().layers()[2].name, "A");

    s.move_layer_up(2).unwrap();
    assert_eq!(s.active_layer(), 2);

    s.remove_layer(2).unwrap();
    assert_eq!(s.active_layer(), 1);
    s.remove_layer(0).unwrap();
    s.remove_layer(0).unwrap();
    assert_eq!(s.active_layer(), 0);
    assert!(s.select_layer(0).is_err());
}

#[test]
fn swap_keeps_active_on_its_layer() {
    let mut s = studio();
    s.select_layer(1).unwrap();
    s.swap_layers(0, 1).unwrap();
    assert_eq!(s.active_layer(), 0);
    assert_eq!(s.collection().layers()[0].name, "Body");
    assert_eq!(s.collection().layers()[0].z_order, 0);
}

#[test]
fn follow_move_shifts_neighbours() {
    assert_eq!(follow_move(3, 1, 4), 2);
    assert_eq!(follow_move(1, 3, 0), 2);
    assert_eq!(follow_move(0, 2, 4), 0);
}

#[test]
fn uploads_are_named_and_split_equally() {
    let s = studio();
    let body = &s.collection().layers()[1];
    let names: Vec<_> = body.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["blue", "white", "black"]);
    assert!(body.variants.iter().all(|v| v.rarity == 33));
    assert_eq!(s.images().len(), 5);
    assert_eq!(s.total_combinations(), 6);
}

#[test]
fn rejected_upload_leaves_layer_untouched() {
    let mut s = studio();
    let err = s
        .upload_variants(
            0,
            vec![
                upload("blue.png", [0, 0, 255, 255]),
                Upload::new("notes.txt", b"hello".to_vec()),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, TraitloomError::Validation(_)));
    assert_eq!(s.collection().layers()[0].variants.len(), 2);
}

#[test]
fn batch_size_is_clamped_with_warning() {
    let mut s = studio();
    let check = s.set_batch_size(10);
    assert_eq!(check.accepted, 6);
    assert!(check.warning().unwrap().contains("only 6 possible"));
    assert_eq!(s.meta().batch_size, 6);

    let check = s.set_batch_size(4);
    assert!(!check.was_clamped());
    assert_eq!(s.meta().batch_size, 4);
}

#[test]
fn seeded_previews_repeat_and_structural_edits_discard_them() {
    let mut s = studio();
    s.set_batch_size(4);
    s.set_seed(Some(7));
    let cancel = CancelToken::new();

    let first = s.generate_previews(&cancel).unwrap().clone();
    let second = s.generate_previews(&cancel).unwrap().clone();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);

    s.rename_layer(1, "Torso").unwrap();
    s.set_variant_rarity(1, 0, 90).unwrap();
    assert!(s.batch().is_some());

    s.toggle_layer_enabled(1).unwrap();
    assert!(s.batch().is_none());
}

#[test]
fn generation_requires_layers() {
    let mut s = Studio::default();
    let err = s.generate_previews(&CancelToken::new()).unwrap_err();
    assert!(matches!(err, TraitloomError::Config(_)));
}

#[test]
fn single_item_export_uses_prefixed_name() {
    let mut s = studio();
    s.set_item_prefix("Raccoon");
    s.set_batch_size(2);
    s.generate_previews_with(&mut Sampler::seeded(1), &CancelToken::new())
        .unwrap();

    let (name, bytes) = s.export_item_png(ItemId(1)).unwrap();
    assert_eq!(name, "Raccoon-nft-2.png");
    assert!(is_png(&bytes));
    assert!(s.export_item_png(ItemId(5)).is_err());
}

#[test]
fn overview_shows_active_layer_or_all() {
    let mut s = studio();
    s.select_layer(0).unwrap();
    assert_eq!(s.render_overview(false).pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(s.render_overview(true).pixel(0, 0), Some([0, 0, 255, 255]));
}

#[test]
fn removing_variants_prunes_unused_images() {
    let mut s = studio();
    s.remove_variant(1, 2).unwrap();
    assert_eq!(s.images().len(), 4);
    assert!(s.collection().layers()[1].variants.iter().all(|v| v.rarity == 50));
    s.remove_layer(0).unwrap();
    assert_eq!(s.images().len(), 2);
}

#[test]
fn download_is_gated_and_needs_previews() {
    let mut s = studio();
    s.set_batch_size(3);
    let cancel = CancelToken::new();
    let mut saver = MemorySaver::default();

    let err = s
        .download_archive(&mut StaticGate::unlocked(), &mut saver, |_| {}, &cancel)
        .unwrap_err();
    assert!(matches!(err, TraitloomError::Config(_)));

    s.generate_previews_with(&mut Sampler::seeded(3), &cancel)
        .unwrap();
    let err = s
        .download_archive(&mut StaticGate::locked(), &mut saver, |_| {}, &cancel)
        .unwrap_err();
    assert!(matches!(err, TraitloomError::Locked));
    assert!(saver.saved.is_none());

    let mut last = None;
    let out = s
        .download_archive(
            &mut StaticGate::granting(),
            &mut saver,
            |p| last = Some(p),
            &cancel,
        )
        .unwrap();
    assert_eq!(out.stats.images_written, 3);
    assert_eq!(out.table.rows().len(), 3);
    assert_eq!(last.map(|p| p.rounded()), Some(100));
    let (name, bytes) = saver.saved.unwrap();
    assert_eq!(name, "my_collection.zip");
    assert_eq!(bytes, out.bytes);
}
