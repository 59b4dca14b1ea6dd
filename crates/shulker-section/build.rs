use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct LegacyBlock {
    id: u32,
    name: String,
}

fn main() {
    let blocks_json_path = "blocks.json";
    let blocks_json = fs::read_to_string(blocks_json_path).expect("Failed to read blocks.json");

    let blocks: Vec<LegacyBlock> =
        serde_json::from_str(&blocks_json).expect("Failed to parse blocks.json");

    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("legacy_blocks.rs");
    let mut out_file = File::create(&dest_path).expect("Failed to create legacy_blocks.rs");

    writeln!(&mut out_file, "pub static LEGACY_BLOCKS: &[(u32, &str)] = &[").unwrap();

    let mut seen_ids = HashSet::new();
    for block in blocks {
        assert!(block.id <= 0xFFF, "legacy id {} out of range", block.id);
        assert!(seen_ids.insert(block.id), "duplicate legacy id {}", block.id);
        writeln!(&mut out_file, "    ({}, {:?}),", block.id, block.name).unwrap();
    }

    writeln!(&mut out_file, "];").unwrap();
    println!("cargo:rerun-if-changed={}", blocks_json_path);
}
