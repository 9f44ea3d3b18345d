//! `list`: print the catalog as a table.

use crate::catalog::Catalog;
use crate::util::{format_hms_secs, format_size, truncate};

pub fn run(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("The catalog is empty. Add tracks with 'trackstash add <file>'.");
        return;
    }

    println!("{} track(s) in the catalog\n", catalog.len());
    println!(
        "{:<4} {:<30} {:<30} {:<20} {:<10} {:<12}",
        "ID", "Artist", "Title", "Album", "Length", "Size"
    );
    println!("{}", "-".repeat(110));

    for track in &catalog.tracks {
        let length = if track.length > 0 {
            format_hms_secs(track.length)
        } else {
            "N/A".to_string()
        };
        println!(
            "{:<4} {:<30} {:<30} {:<20} {:<10} {:<12}",
            track.id,
            truncate(&track.artist, 28),
            truncate(&track.title, 28),
            truncate(&track.album, 18),
            length,
            format_size(track.file_size)
        );
    }

    println!();
    println!("Use 'trackstash play <id>' to stream a track");
}
