use std::io::Read;

use super::*;
use crate::collection::model::Collection;

fn read_entries(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[test]
fn layout_has_image_dir_and_top_level_metadata() {
    let mut c = Collection::default();
    c.add_layer("Hat").unwrap();
    let table = MetadataTable::new(c.layers());
    let images = vec![
        StagedImage {
            file_name: "nft-1.png".to_string(),
            bytes: vec![1, 2, 3],
        },
        StagedImage {
            file_name: "nft-2.png".to_string(),
            bytes: vec![4, 5],
        },
    ];

    let mut seen = Vec::new();
    let bytes = write_zip(
        &images,
        &table,
        CompressionMethod::Deflated,
        &mut |p: Progress| seen.push(p),
        &CancelToken::new(),
    )
    .unwrap();

    let names = read_entries(bytes.clone());
    assert_eq!(
        names,
        ["nfts/", "nfts/nft-1.png", "nfts/nft-2.png", "metadata.csv"]
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut csv = String::new();
    archive
        .by_name("metadata.csv")
        .unwrap()
        .read_to_string(&mut csv)
        .unwrap();
    assert_eq!(csv, "Filename;Title;Description;NbCopies;Hat\n");

    assert!(seen.iter().all(|p| p.phase == ProgressPhase::Compressing));
    assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(seen.last().unwrap().percent, 100.0);
}

#[test]
fn empty_image_set_still_writes_metadata() {
    let table = MetadataTable::new(&[]);
    let bytes = write_zip(
        &[],
        &table,
        CompressionMethod::Stored,
        &mut |_: Progress| {},
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(read_entries(bytes), ["nfts/", "metadata.csv"]);
}
