//! `download`: save the best audio stream of a video locally.

use std::fs;
use std::io;

use crate::config::{Settings, expand_tilde};
use crate::error::Error;
use crate::source::{
    InnertubeClient, MediaSource, extract_video_id, sanitize_file_name, select_audio_format,
};
use crate::util::format_size;

pub fn run(settings: &Settings, url_arg: &str) -> Result<(), Error> {
    let video_id = extract_video_id(url_arg)?;
    println!("Fetching stream info for video {video_id}");

    let source = InnertubeClient::new()?;
    let info = source.resolve(&video_id)?;
    if !info.title.is_empty() {
        println!("  title:  {}", info.title);
    }
    if !info.author.is_empty() {
        println!("  author: {}", info.author);
    }

    let format = select_audio_format(&info.formats)
        .ok_or_else(|| Error::Validation("no audio-capable format available".to_string()))?;
    println!(
        "  format: itag={} bitrate={} ({})",
        format.itag, format.bitrate, format.mime_type
    );

    let dir = expand_tilde(&settings.download.dir);
    fs::create_dir_all(&dir)?;
    let name = if info.title.is_empty() {
        video_id.clone()
    } else {
        sanitize_file_name(&info.title)
    };
    let path = dir.join(format!("{name}.mp3"));

    println!("Downloading to {}", path.display());
    let mut stream = source.open_format(format)?;
    let mut file = fs::File::create(&path)?;
    let bytes = io::copy(&mut stream, &mut file)?;

    println!("Saved {} ({})", path.display(), format_size(bytes));
    Ok(())
}
