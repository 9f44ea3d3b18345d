//! `delete`: remove a track's object from storage and its catalog record.

use std::path::Path;

use tracing::warn;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::Error;
use crate::storage::Storage;
use crate::stream::CancelToken;

use super::parse_track_id;

pub fn run(
    settings: &Settings,
    catalog: &mut Catalog,
    catalog_path: &Path,
    id_arg: &str,
) -> Result<(), Error> {
    let id = parse_track_id(id_arg)?;
    let track = catalog.track_by_id(id)?.clone();

    println!("Deleting track {}: {}", id, track.display());

    // A stale or unreachable object should not keep the record around.
    if !track.url.is_empty() {
        let removed = Storage::new(&settings.storage).and_then(|storage| {
            let key = Storage::key_from_url(&track.url)?;
            storage.delete(&key, &CancelToken::new())
        });
        match removed {
            Ok(()) => println!("Removed object from storage"),
            Err(err) => {
                warn!(%err, url = %track.url, "could not remove object from storage");
                eprintln!("warning: could not remove object from storage: {err}");
            }
        }
    }

    catalog.delete_by_id(id)?;
    catalog.save(catalog_path)?;
    println!("Track removed from the catalog");
    Ok(())
}
