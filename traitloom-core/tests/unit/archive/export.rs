use std::io::{Cursor, Read};

use super::*;
use crate::assets::store::Upload;
use crate::engine::selection::{ItemId, LayerSelection};
use crate::foundation::core::Canvas;

fn png_1x1(px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, px.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn fixture() -> (Collection, ImageStore, Vec<GeneratedItem>) {
    let mut store = ImageStore::new();
    let mut c = Collection::default();
    c.meta.canvas = Canvas::new(1, 1).unwrap();
    c.meta.name = "Pedro's Raccoons!".to_string();
    c.add_layer("Background").unwrap();
    let keys: Vec<_> = [[255, 0, 0, 255], [0, 255, 0, 255]]
        .iter()
        .enumerate()
        .map(|(i, px)| {
            (
                store
                    .register(&Upload::new(format!("bg{i}.png"), png_1x1(*px)))
                    .unwrap(),
                format!("bg{i}"),
            )
        })
        .collect();
    c.add_variants(0, keys).unwrap();
    let items = (0..2)
        .map(|i| GeneratedItem {
            id: ItemId(i),
            selections: vec![LayerSelection::Used(i)],
        })
        .collect();
    (c, store, items)
}

struct FailSecond;

impl RasterEncoder for FailSecond {
    fn encode(&self, raster: &Raster) -> TraitloomResult<Vec<u8>> {
        if raster.pixel(0, 0) == Some([0, 255, 0, 255]) {
            return Err(TraitloomError::validation("encoder refused"));
        }
        PngEncoder.encode(raster)
    }
}

#[test]
fn archive_name_is_sanitized() {
    assert_eq!(archive_file_name("My collection"), "my_collection.zip");
    assert_eq!(archive_file_name("Pedro's #1"), "pedro_s__1.zip");
    assert_eq!(archive_file_name(""), "nft-collection.zip");
}

#[test]
fn build_writes_every_item_and_reports_progress() {
    let (c, store, items) = fixture();
    let mut comp = Compositor::new(c.meta.canvas);
    let mut seen = Vec::new();
    let out = Archiver::new(&c, &store)
        .build(&mut comp, &items, |p| seen.push(p))
        .unwrap();

    assert_eq!(out.file_name, "pedro_s_raccoons_.zip");
    assert_eq!(out.stats.items, 2);
    assert_eq!(out.stats.images_written, 2);
    assert_eq!(out.table.rows().len(), 2);

    let mut archive = zip::ZipArchive::new(Cursor::new(out.bytes)).unwrap();
    let mut img = Vec::new();
    archive
        .by_name("nfts/nft-2.png")
        .unwrap()
        .read_to_end(&mut img)
        .unwrap();
    let decoded = image::load_from_memory(&img).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw().as_slice(), &[0, 255, 0, 255]);

    let rendering: Vec<_> = seen
        .iter()
        .filter(|p| p.phase == ProgressPhase::Rendering)
        .map(|p| p.rounded())
        .collect();
    assert_eq!(rendering, [0, 50, 100]);
    assert_eq!(seen.last().unwrap().phase, ProgressPhase::Compressing);
    assert_eq!(seen.last().unwrap().percent, 100.0);
}

#[test]
fn encode_failure_skips_image_but_keeps_row() {
    let (c, store, items) = fixture();
    let mut comp = Compositor::new(c.meta.canvas);
    let encoder = FailSecond;
    let out = Archiver::new(&c, &store)
        .with_encoder(&encoder)
        .build(&mut comp, &items, |_| {})
        .unwrap();

    assert_eq!(out.stats.images_written, 1);
    assert_eq!(out.stats.images_skipped, 1);
    assert_eq!(out.table.rows().len(), 2);
    assert_eq!(out.table.rows()[1][4], "bg1");

    let archive = zip::ZipArchive::new(Cursor::new(out.bytes)).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"nfts/nft-1.png"));
    assert!(!names.contains(&"nfts/nft-2.png"));
    assert!(names.contains(&"metadata.csv"));
}

#[test]
fn cancellation_aborts_build() {
    let (c, store, items) = fixture();
    let mut comp = Compositor::new(c.meta.canvas);
    let token = CancelToken::new();
    token.cancel();
    let err = Archiver::new(&c, &store)
        .with_cancel(token)
        .build(&mut comp, &items, |_| {})
        .unwrap_err();
    assert!(matches!(err, TraitloomError::Cancelled));
}

#[test]
fn gate_requests_unlock_once() {
    assert!(ensure_unlocked(&mut StaticGate::unlocked()).is_ok());

    let mut granting = StaticGate::granting();
    assert!(!granting.is_unlocked());
    assert!(ensure_unlocked(&mut granting).is_ok());
    assert!(granting.is_unlocked());

    assert!(matches!(
        ensure_unlocked(&mut StaticGate::locked()),
        Err(TraitloomError::Locked)
    ));
}

#[test]
fn savers_store_bytes() {
    let mut mem = MemorySaver::default();
    mem.save("a.zip", &[1, 2]).unwrap();
    assert_eq!(mem.saved, Some(("a.zip".to_string(), vec![1, 2])));

    let dir = std::env::temp_dir().join(format!("traitloom_saver_{}", std::process::id()));
    let mut saver = DirSaver::new(dir.join("nested"));
    saver.save("b.zip", &[3]).unwrap();
    assert_eq!(std::fs::read(saver.dir().join("b.zip")).unwrap(), vec![3]);
    std::fs::remove_dir_all(&dir).ok();
}
