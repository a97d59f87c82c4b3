use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, Result};

use crate::annotation::Label;
use crate::store::FsStore;

/// One YOLO label line: `class cx cy w h`, center-based `[0,1]` fractions.
fn yolo_line(class_id: i32, x: f32, y: f32, w: f32, h: f32, iw: u32, ih: u32) -> String {
    let iw = iw.max(1) as f32;
    let ih = ih.max(1) as f32;
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id,
        (x + w / 2.0) / iw,
        (y + h / 2.0) / ih,
        w / iw,
        h / ih
    )
}

/// Export the whole directory as a YOLO dataset under
/// `exports/yolo_<timestamp>/`: copied images, one label file per annotated
/// image, `classes.txt` and a `data.yaml` pointing at the images.
pub fn export_yolo(store: &FsStore, labels: &[Label]) -> Result<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let export_root = store.root().join("exports").join(format!("yolo_{stamp}"));
    let images_dir = export_root.join("images");
    let labels_dir = export_root.join("labels");
    fs::create_dir_all(&images_dir)
        .with_context(|| format!("creating {}", images_dir.display()))?;
    fs::create_dir_all(&labels_dir)
        .with_context(|| format!("creating {}", labels_dir.display()))?;

    for entry in store.list_images()? {
        fs::copy(&entry.path, images_dir.join(&entry.id))
            .with_context(|| format!("copying {}", entry.path.display()))?;
        let Some(doc) = store.load_doc(&entry.id) else {
            continue;
        };
        if doc.boxes.is_empty() {
            continue;
        }
        let stem = Path::new(&entry.id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.id.clone());
        let mut lines = String::new();
        for b in &doc.boxes {
            lines.push_str(&yolo_line(
                b.class_id,
                b.x as f32,
                b.y as f32,
                b.width as f32,
                b.height as f32,
                doc.image_width,
                doc.image_height,
            ));
            lines.push('\n');
        }
        fs::write(labels_dir.join(format!("{stem}.txt")), lines)?;
    }

    let classes: String = labels.iter().map(|l| format!("{}\n", l.name)).collect();
    fs::write(export_root.join("classes.txt"), classes)?;

    let names = labels
        .iter()
        .map(|l| format!("'{}'", l.name))
        .collect::<Vec<_>>()
        .join(", ");
    let data_yaml = format!(
        "# Auto-generated YOLO dataset config\n\
         nc: {}\n\
         names: [{}]\n\
         train: {}\n\
         val: {}\n",
        labels.len(),
        names,
        images_dir.display(),
        images_dir.display(),
    );
    fs::write(export_root.join("data.yaml"), data_yaml)?;

    Ok(export_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::BoxAnnot;
    use crate::store::AnnotationStore;
    use tempfile::TempDir;

    #[test]
    fn yolo_lines_are_center_normalized() {
        assert_eq!(
            yolo_line(3, 40.0, 40.0, 20.0, 20.0, 100, 100),
            "3 0.500000 0.500000 0.200000 0.200000"
        );
        // degenerate image size doesn't divide by zero
        assert_eq!(yolo_line(0, 0.0, 0.0, 0.0, 0.0, 0, 0), "0 0.000000 0.000000 0.000000 0.000000");
    }

    #[test]
    fn exports_labels_classes_and_config() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        fs::write(dir.path().join("a.png"), b"png").unwrap();
        fs::write(dir.path().join("empty.png"), b"png").unwrap();
        store.save_boxes(
            "a.png",
            &[BoxAnnot {
                class_id: 0,
                x: 40,
                y: 40,
                width: 20,
                height: 20,
            }],
            (100, 100),
        );
        let labels = vec![
            Label {
                id: 0,
                name: "cat".into(),
            },
            Label {
                id: 1,
                name: "dog".into(),
            },
        ];

        let out = export_yolo(&store, &labels).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("labels/a.txt")).unwrap(),
            "0 0.500000 0.500000 0.200000 0.200000\n"
        );
        assert!(out.join("images/a.png").exists());
        assert!(out.join("images/empty.png").exists());
        assert!(!out.join("labels/empty.txt").exists());
        assert_eq!(
            fs::read_to_string(out.join("classes.txt")).unwrap(),
            "cat\ndog\n"
        );
        let yaml = fs::read_to_string(out.join("data.yaml")).unwrap();
        assert!(yaml.contains("nc: 2"));
        assert!(yaml.contains("names: ['cat', 'dog']"));
    }
}
