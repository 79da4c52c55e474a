use super::*;
use crate::assets::store::ImageKey;
use crate::collection::model::Collection;
use crate::engine::selection::{ItemId, LayerSelection};

fn collection() -> Collection {
    let mut c = Collection::default();
    for (i, (layer, variants)) in [("Background", &["Blue", "Green"][..]), ("Hat", &["Cap"][..])]
        .iter()
        .enumerate()
    {
        c.add_layer(layer).unwrap();
        c.add_variants(
            i,
            variants
                .iter()
                .map(|v| (ImageKey::for_bytes(v.as_bytes()), v.to_string())),
        )
        .unwrap();
    }
    c
}

#[test]
fn names_and_titles_follow_prefix() {
    assert_eq!(item_file_name("", 3), "nft-3.png");
    assert_eq!(item_file_name("Pedro", 3), "Pedro-nft-3.png");
    assert_eq!(item_title("", 12), "#12");
    assert_eq!(item_title("Pedro", 12), "Pedro #12");
}

#[test]
fn header_has_fixed_columns_then_layers() {
    let c = collection();
    let table = MetadataTable::new(c.layers());
    assert_eq!(table.column_count(), 4 + c.layers().len());
    assert_eq!(
        table.to_csv(),
        "Filename;Title;Description;NbCopies;Background;Hat\n"
    );
}

#[test]
fn rows_use_variant_names_or_none() {
    let mut c = collection();
    c.meta.item_prefix = "Pedro".to_string();
    let mut table = MetadataTable::new(c.layers());
    table.push_item(
        &c.meta,
        c.layers(),
        &GeneratedItem {
            id: ItemId(0),
            selections: vec![LayerSelection::Used(1), LayerSelection::Skipped],
        },
    );
    table.push_item(
        &c.meta,
        c.layers(),
        &GeneratedItem {
            id: ItemId(1),
            selections: vec![LayerSelection::Used(0), LayerSelection::Used(5)],
        },
    );
    assert_eq!(
        table.rows()[0],
        ["Pedro-nft-1.png", "Pedro #1", "NFT Art", "1", "Green", "None"]
    );
    assert_eq!(
        table.rows()[1],
        ["Pedro-nft-2.png", "Pedro #2", "NFT Art", "1", "Blue", "None"]
    );
}

#[test]
fn disabled_layers_report_none_and_description_is_used() {
    let mut c = collection();
    c.meta.description = "Raccoons".to_string();
    c.set_layer_enabled(1, false).unwrap();
    let mut table = MetadataTable::new(c.layers());
    table.push_item(
        &c.meta,
        c.layers(),
        &GeneratedItem {
            id: ItemId(0),
            selections: vec![LayerSelection::Used(0), LayerSelection::Used(0)],
        },
    );
    assert_eq!(table.rows()[0][2], "Raccoons");
    assert_eq!(table.rows()[0][5], "None");
}

#[test]
fn delimiters_inside_cells_are_neutralized() {
    let mut c = collection();
    c.meta.description = "a;b\nc".to_string();
    c.set_variant_name(0, 0, "Deep;Blue").unwrap();
    let mut table = MetadataTable::new(c.layers());
    table.push_item(
        &c.meta,
        c.layers(),
        &GeneratedItem {
            id: ItemId(0),
            selections: vec![LayerSelection::Used(0), LayerSelection::Skipped],
        },
    );
    let csv = table.to_csv();
    let line = csv.lines().nth(1).unwrap();
    assert_eq!(line.split(';').count(), table.column_count());
    assert!(line.contains("a,b c"));
    assert!(line.contains("Deep,Blue"));
}
