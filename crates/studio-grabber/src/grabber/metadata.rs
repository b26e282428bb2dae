//! ID3v2.4 tagging using lofty
//!
//! Every tag field maps to one frame through [`FRAME_TABLE`]. Writing a field
//! removes all earlier frames with the same ID before inserting the new one, so
//! re-tagging a file never accumulates duplicates.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::AudioFile;
use lofty::id3::v2::{
    AttachedPictureFrame, CommentFrame, Frame, FrameId, Id3v2Tag, TextInformationFrame,
    TimestampFrame, UrlLinkFrame,
};
use lofty::mpeg::MpegFile;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::items::Timestamp;
use lofty::tag::TagExt;
use lofty::TextEncoding;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use studio_proto::config::TagsConfig;
use tracing::debug;

use crate::grabber::BroadcastDescriptor;

const PICTURE_FRAME_ID: &str = "APIC";
const COMMENT_LANGUAGE: [u8; 3] = *b"eng";

/// Everything written into a broadcast's tag. `None` fields are left alone.
#[derive(Clone, Default, PartialEq)]
pub struct TagModel {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub comment: Option<String>,
    pub artist_url: Option<String>,
    pub broadcast_source_url: Option<String>,
    pub publisher: Option<String>,
    pub publisher_url: Option<String>,
    pub radio_url: Option<String>,
    pub audio_file_url: Option<String>,
    pub copyright: Option<String>,
    pub language: Option<String>,
    pub release_time: Option<NaiveDateTime>,
    /// Shared by every broadcast of a run
    pub cover_art: Option<Arc<[u8]>>,
}

impl fmt::Debug for TagModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagModel")
            .field("title", &self.title)
            .field("album", &self.album)
            .field("artist", &self.artist)
            .field("comment", &self.comment)
            .field("artist_url", &self.artist_url)
            .field("broadcast_source_url", &self.broadcast_source_url)
            .field("publisher", &self.publisher)
            .field("publisher_url", &self.publisher_url)
            .field("radio_url", &self.radio_url)
            .field("audio_file_url", &self.audio_file_url)
            .field("copyright", &self.copyright)
            .field("language", &self.language)
            .field("release_time", &self.release_time)
            .field("cover_art_bytes", &self.cover_art.as_ref().map(|c| c.len()))
            .finish()
    }
}

impl TagModel {
    /// Tag contents for a grabbed broadcast
    pub fn for_broadcast(
        broadcast: &BroadcastDescriptor,
        tags: &TagsConfig,
        cover_art: Option<Arc<[u8]>>,
    ) -> Self {
        Self {
            title: non_empty(&broadcast.stream_title),
            album: non_empty(&broadcast.broadcast_title),
            artist: non_empty(&tags.artist),
            comment: non_empty(&broadcast.description),
            artist_url: non_empty(&broadcast.broadcast_page_url),
            broadcast_source_url: non_empty(&broadcast.stream_url),
            publisher: non_empty(&tags.publisher),
            publisher_url: non_empty(&tags.publisher_url),
            radio_url: non_empty(&tags.radio_url),
            audio_file_url: non_empty(&broadcast.stream_url),
            copyright: non_empty(&tags.copyright),
            language: non_empty(&tags.language),
            release_time: Some(broadcast.release_time()),
            cover_art,
        }
    }

    /// Present fields in frame-table order
    pub fn field_values(&self) -> Vec<(TagField, FieldValue)> {
        let text = [
            (TagField::Title, &self.title),
            (TagField::Album, &self.album),
            (TagField::Artist, &self.artist),
            (TagField::Comment, &self.comment),
            (TagField::ArtistUrl, &self.artist_url),
            (TagField::BroadcastSourceUrl, &self.broadcast_source_url),
            (TagField::Publisher, &self.publisher),
            (TagField::PublisherUrl, &self.publisher_url),
            (TagField::RadioUrl, &self.radio_url),
            (TagField::AudioFileUrl, &self.audio_file_url),
            (TagField::Copyright, &self.copyright),
            (TagField::Language, &self.language),
        ];

        let mut values: Vec<(TagField, FieldValue)> = text
            .into_iter()
            .filter_map(|(field, value)| {
                value
                    .as_ref()
                    .map(|v| (field, FieldValue::Text(v.clone())))
            })
            .collect();

        if let Some(release) = self.release_time {
            values.push((TagField::OriginalReleaseTime, FieldValue::DateTime(release)));
            values.push((TagField::Year, FieldValue::Year(release.year())));
        }

        values
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Semantic tag fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    Title,
    Album,
    Artist,
    Comment,
    ArtistUrl,
    BroadcastSourceUrl,
    Publisher,
    PublisherUrl,
    RadioUrl,
    AudioFileUrl,
    Copyright,
    Language,
    OriginalReleaseTime,
    Year,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    DateTime(NaiveDateTime),
    Year(i32),
}

type FrameBuilder = fn(FrameId<'static>, &FieldValue) -> Result<Frame<'static>>;

/// One row of the field → frame lookup table
pub struct FrameMapping {
    pub field: TagField,
    pub frame_id: &'static str,
    build: FrameBuilder,
}

pub const FRAME_TABLE: &[FrameMapping] = &[
    FrameMapping { field: TagField::Title, frame_id: "TIT2", build: text_frame },
    FrameMapping { field: TagField::Album, frame_id: "TALB", build: text_frame },
    FrameMapping { field: TagField::Artist, frame_id: "TPE1", build: text_frame },
    FrameMapping { field: TagField::Comment, frame_id: "COMM", build: comment_frame },
    FrameMapping { field: TagField::ArtistUrl, frame_id: "WOAR", build: url_frame },
    FrameMapping { field: TagField::BroadcastSourceUrl, frame_id: "WOAS", build: url_frame },
    FrameMapping { field: TagField::Publisher, frame_id: "TPUB", build: text_frame },
    FrameMapping { field: TagField::PublisherUrl, frame_id: "WPUB", build: url_frame },
    FrameMapping { field: TagField::RadioUrl, frame_id: "WORS", build: url_frame },
    FrameMapping { field: TagField::AudioFileUrl, frame_id: "WOAF", build: url_frame },
    FrameMapping { field: TagField::Copyright, frame_id: "TCOP", build: text_frame },
    FrameMapping { field: TagField::Language, frame_id: "TLAN", build: text_frame },
    FrameMapping { field: TagField::OriginalReleaseTime, frame_id: "TDOR", build: timestamp_frame },
    FrameMapping { field: TagField::Year, frame_id: "TDRC", build: timestamp_frame },
];

pub fn frame_mapping(field: TagField) -> Option<&'static FrameMapping> {
    FRAME_TABLE.iter().find(|m| m.field == field)
}

fn text_frame(id: FrameId<'static>, value: &FieldValue) -> Result<Frame<'static>> {
    Ok(Frame::Text(TextInformationFrame::new(
        id,
        TextEncoding::UTF8,
        field_text(value),
    )))
}

fn url_frame(id: FrameId<'static>, value: &FieldValue) -> Result<Frame<'static>> {
    Ok(Frame::Url(UrlLinkFrame::new(id, field_text(value))))
}

fn comment_frame(_id: FrameId<'static>, value: &FieldValue) -> Result<Frame<'static>> {
    Ok(Frame::Comment(CommentFrame::new(
        TextEncoding::UTF8,
        COMMENT_LANGUAGE,
        String::new(),
        field_text(value),
    )))
}

fn timestamp_frame(id: FrameId<'static>, value: &FieldValue) -> Result<Frame<'static>> {
    let timestamp = match value {
        FieldValue::DateTime(dt) => Timestamp {
            year: u16::try_from(dt.year()).context("Year out of range")?,
            month: Some(dt.month() as u8),
            day: Some(dt.day() as u8),
            hour: Some(dt.hour() as u8),
            minute: Some(dt.minute() as u8),
            second: Some(dt.second() as u8),
        },
        FieldValue::Year(year) => Timestamp {
            year: u16::try_from(*year).context("Year out of range")?,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
        },
        FieldValue::Text(text) => anyhow::bail!("Not a timestamp: {}", text),
    };

    Ok(Frame::Timestamp(TimestampFrame::new(
        id,
        TextEncoding::UTF8,
        timestamp,
    )))
}

fn field_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        FieldValue::Year(year) => year.to_string(),
    }
}

/// Write `model` into the MP3 at `file_path`, saving as ID3v2.4.
///
/// Returns the number of frames written.
pub async fn write_tags(file_path: &Path, model: &TagModel) -> Result<usize> {
    // Use blocking task for file I/O
    let path = file_path.to_path_buf();
    let model = model.clone();

    tokio::task::spawn_blocking(move || write_tags_blocking(&path, &model))
        .await
        .context("Tag writing task failed")?
}

fn write_tags_blocking(file_path: &Path, model: &TagModel) -> Result<usize> {
    let mut tag = read_id3v2(file_path)?.unwrap_or_default();

    let written = apply_tag_model(&mut tag, model)?;

    tag.save_to_path(file_path, WriteOptions::new().use_id3v23(false))
        .context("Failed to save tag to file")?;

    debug!("Wrote {} frames to {}", written, file_path.display());
    Ok(written)
}

fn read_id3v2(file_path: &Path) -> Result<Option<Id3v2Tag>> {
    let mut file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open {}", file_path.display()))?;

    let mpeg = MpegFile::read_from(&mut file, ParseOptions::new().read_properties(false))
        .context("Failed to read MPEG file")?;

    Ok(mpeg.id3v2().cloned())
}

/// Replace the frames for every present field of `model`
pub fn apply_tag_model(tag: &mut Id3v2Tag, model: &TagModel) -> Result<usize> {
    let mut written = 0;

    for (field, value) in model.field_values() {
        let mapping = frame_mapping(field)
            .with_context(|| format!("No frame mapping for {:?}", field))?;
        let id = FrameId::new(mapping.frame_id)?;
        let frame = (mapping.build)(id.clone(), &value)?;

        tag.remove(&id).for_each(drop);
        tag.insert(frame);
        written += 1;
    }

    if let Some(cover) = &model.cover_art {
        let id = FrameId::new(PICTURE_FRAME_ID)?;
        tag.remove(&id).for_each(drop);

        let picture = Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            cover.to_vec(),
        );
        tag.insert(Frame::Picture(AttachedPictureFrame::new(
            TextEncoding::UTF8,
            picture,
        )));
        written += 1;
    }

    Ok(written)
}

/// Frames read back from a file (for verification)
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ReadMetadata {
    /// `(frame id, value)` in tag order; pictures read as their byte length
    pub frames: Vec<(String, String)>,
}

#[cfg(test)]
impl ReadMetadata {
    pub fn count(&self, frame_id: &str) -> usize {
        self.frames.iter().filter(|(id, _)| id == frame_id).count()
    }

    pub fn value(&self, frame_id: &str) -> Option<&str> {
        self.frames
            .iter()
            .find(|(id, _)| id == frame_id)
            .map(|(_, v)| v.as_str())
    }
}

/// Read the ID3v2 frames of an MP3 file
#[cfg(test)]
pub fn read_tags(file_path: &Path) -> Result<ReadMetadata> {
    let tag = read_id3v2(file_path)?.context("No ID3v2 tag found")?;

    let frames = (&tag)
        .into_iter()
        .map(|frame| {
            let value = match frame {
                Frame::Text(f) => f.value.to_string(),
                Frame::Url(f) => f.url().to_string(),
                Frame::Comment(f) => f.content.to_string(),
                Frame::Timestamp(f) => f.timestamp.to_string(),
                Frame::Picture(f) => f.picture.data().len().to_string(),
                _ => String::new(),
            };
            (frame.id_str().to_string(), value)
        })
        .collect();

    Ok(ReadMetadata { frames })
}
