use crate::{
    collection::model::{CollectionMeta, Layer},
    engine::selection::GeneratedItem,
};

/// Name of the metadata table inside the archive.
pub const METADATA_FILE: &str = "metadata.csv";
/// Directory holding rendered item images inside the archive.
pub const IMAGE_DIR: &str = "nfts";
/// Description used when the collection has none.
pub const DEFAULT_DESCRIPTION: &str = "NFT Art";
/// Cell value for a layer that is absent from an item.
pub const NONE_CELL: &str = "None";
/// Copies per item; always one.
pub const NB_COPIES: &str = "1";

const DELIMITER: char = ';';
const FIXED_COLUMNS: [&str; 4] = ["Filename", "Title", "Description", "NbCopies"];

/// `<prefix>-nft-<seq>.png`, or `nft-<seq>.png` without a prefix.
pub fn item_file_name(prefix: &str, seq: usize) -> String {
    if prefix.is_empty() {
        format!("nft-{seq}.png")
    } else {
        format!("{prefix}-nft-{seq}.png")
    }
}

/// `<prefix> #<seq>`, or `#<seq>` without a prefix.
pub fn item_title(prefix: &str, seq: usize) -> String {
    if prefix.is_empty() {
        format!("#{seq}")
    } else {
        format!("{prefix} #{seq}")
    }
}

fn sanitize_cell(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ';' => ',',
            '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}

/// Semicolon-delimited table: four fixed columns, then one column per layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MetadataTable {
    pub fn new(layers: &[Layer]) -> Self {
        let header = FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(layers.iter().map(|l| sanitize_cell(&l.name)))
            .collect();
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Append the row for `item`, named by its 1-based sequence number.
    pub fn push_item(&mut self, meta: &CollectionMeta, layers: &[Layer], item: &GeneratedItem) {
        let seq = item.id.sequence();
        let description = if meta.description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            meta.description.as_str()
        };

        let mut row = Vec::with_capacity(self.header.len());
        row.push(sanitize_cell(&item_file_name(&meta.item_prefix, seq)));
        row.push(sanitize_cell(&item_title(&meta.item_prefix, seq)));
        row.push(sanitize_cell(description));
        row.push(NB_COPIES.to_string());
        for (i, layer) in layers.iter().enumerate() {
            let cell = item
                .variant(layers, i)
                .filter(|v| layer.enabled && !v.name.is_empty())
                .map(|v| sanitize_cell(&v.name))
                .unwrap_or_else(|| NONE_CELL.to_string());
            row.push(cell);
        }
        self.rows.push(row);
    }

    /// Render as text: header line, then one line per row, each terminated by `\n`.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for line in std::iter::once(&self.header).chain(self.rows.iter()) {
            for (i, cell) in line.iter().enumerate() {
                if i > 0 {
                    out.push(DELIMITER);
                }
                out.push_str(cell);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/archive/metadata.rs"]
mod tests;
