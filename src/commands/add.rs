//! `add`: upload a local MP3 to the object store and record it.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::catalog::{Catalog, TrackRecord};
use crate::config::Settings;
use crate::error::Error;
use crate::storage::{ProgressReader, Storage};
use crate::stream::CancelToken;
use crate::tags;
use crate::util::{format_hms, format_size};

pub fn run(
    settings: &Settings,
    catalog: &mut Catalog,
    catalog_path: &Path,
    file: &Path,
) -> Result<(), Error> {
    if !file.is_file() {
        return Err(Error::Validation(format!(
            "file not found: {}",
            file.display()
        )));
    }

    let probe = tags::probe_file(file)?;
    let track_tags = tags::read_tags(file);
    let storage = Storage::new(&settings.storage)?;

    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Validation(format!("unusable file name: {}", file.display())))?;
    let key = format!("{stem}.mp3");

    println!("Uploading {}", file.display());
    println!("  size:   {}", format_size(probe.size));
    println!("  bucket: {}", settings.storage.bucket);
    println!();

    let total = probe.size;
    let started = Instant::now();
    let mut last_render: Option<Instant> = None;
    let reader = ProgressReader::new(File::open(file)?, move |read| {
        // The body reader calls back per chunk; rendering is throttled.
        let due = last_render
            .map(|at| at.elapsed() >= Duration::from_millis(200))
            .unwrap_or(true);
        if !due && read < total {
            return;
        }
        last_render = Some(Instant::now());
        let elapsed = started.elapsed();
        let percent = if total > 0 {
            read as f64 / total as f64 * 100.0
        } else {
            100.0
        };
        let rate = if elapsed.as_secs_f64() > 0.0 {
            (read as f64 / elapsed.as_secs_f64()) as u64
        } else {
            0
        };
        print!(
            "\r\x1b[K  {:5.1}% | {}/s | elapsed {}",
            percent,
            format_size(rate),
            format_hms(elapsed)
        );
        let _ = io::stdout().flush();
    });

    let url = storage.put(reader, total, &key, &CancelToken::new())?;
    println!();
    println!("Upload complete: {url}");

    let record = TrackRecord {
        id: 0,
        artist: track_tags.artist,
        title: track_tags.title,
        album: track_tags.album,
        length: probe.duration.as_secs(),
        file_size: probe.size,
        url,
        source_url: String::new(),
        playback_position: 0,
    };
    let id = catalog.add(record);
    catalog.save(catalog_path)?;
    println!("Track {id} added to the catalog");
    Ok(())
}
