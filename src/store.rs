use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context as _, Result};

use crate::annotation::{thumb_boxes, AnnotationDoc, BoxAnnot, Label, ThumbBox};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Persistence collaborator for per-image box lists.
///
/// The editor core never sees transport details: reads degrade to an empty
/// list on any failure, writes are attempted exactly once and swallowed on
/// failure, so the in-memory list stays authoritative.
pub trait AnnotationStore {
    fn load_boxes(&self, image_id: &str) -> Vec<BoxAnnot>;
    fn save_boxes(&self, image_id: &str, boxes: &[BoxAnnot], image_size: (u32, u32));
}

/// An image available for annotation, with the normalized boxes its
/// thumbnail preview shows.
#[derive(Clone, Debug)]
pub struct ImageEntry {
    pub id: String,
    pub path: PathBuf,
    pub thumb_boxes: Vec<ThumbBox>,
}

/// Filesystem-backed store rooted at the opened image directory: one JSON
/// document per image under `annotations/`, label names in `labels.json`.
/// The document schema matches the annotation backend's files
/// (`imageId`/`imageWidth`/`imageHeight`/`boxes`, camelCase).
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, image_id: &str) -> PathBuf {
        let stem = Path::new(image_id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_id.to_string());
        self.root.join("annotations").join(format!("{stem}.json"))
    }

    fn labels_path(&self) -> PathBuf {
        self.root.join("labels.json")
    }

    pub fn load_doc(&self, image_id: &str) -> Option<AnnotationDoc> {
        let data = fs::read_to_string(self.doc_path(image_id)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Stored label names; ids are list indices.
    pub fn load_labels(&self) -> Vec<Label> {
        let names: Vec<String> = fs::read_to_string(self.labels_path())
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();
        names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Label {
                id: id as i32,
                name,
            })
            .collect()
    }

    /// Add a label name, returning the existing entry if the name is taken.
    pub fn add_label(&self, name: &str) -> Result<Label> {
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "label name is required");
        let mut labels = self.load_labels();
        if let Some(existing) = labels.iter().find(|l| l.name == name) {
            return Ok(existing.clone());
        }
        let label = Label {
            id: labels.len() as i32,
            name: name.to_string(),
        };
        labels.push(label.clone());
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        let data = serde_json::to_string_pretty(&names)?;
        fs::write(self.labels_path(), data)
            .with_context(|| format!("writing {}", self.labels_path().display()))?;
        Ok(label)
    }

    /// Scan the root directory for images, newest first.
    pub fn list_images(&self) -> Result<Vec<ImageEntry>> {
        let mut entries: Vec<(SystemTime, ImageEntry)> = Vec::new();
        let dir = fs::read_dir(&self.root)
            .with_context(|| format!("reading {}", self.root.display()))?;
        for entry in dir.flatten() {
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let mtime = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let thumbs = self
                .load_doc(id)
                .map(|doc| thumb_boxes(&doc.boxes, (doc.image_width, doc.image_height)))
                .unwrap_or_default();
            entries.push((
                mtime,
                ImageEntry {
                    id: id.to_string(),
                    path,
                    thumb_boxes: thumbs,
                },
            ));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, e)| e).collect())
    }
}

impl AnnotationStore for FsStore {
    fn load_boxes(&self, image_id: &str) -> Vec<BoxAnnot> {
        match self.load_doc(image_id) {
            Some(doc) => doc.boxes.into_iter().map(|b| b.normalized()).collect(),
            None => {
                log::debug!("no annotations for {image_id}, starting empty");
                Vec::new()
            }
        }
    }

    fn save_boxes(&self, image_id: &str, boxes: &[BoxAnnot], image_size: (u32, u32)) {
        let doc = AnnotationDoc {
            image_id: image_id.to_string(),
            image_width: image_size.0,
            image_height: image_size.1,
            boxes: boxes.to_vec(),
        };
        let path = self.doc_path(image_id);
        let result = (|| -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let data = serde_json::to_string_pretty(&doc)?;
            fs::write(&path, data)?;
            Ok(())
        })();
        if let Err(err) = result {
            // local state stays the source of truth; no retry
            log::warn!("failed to save annotations for {image_id}: {err}");
        }
    }
}
