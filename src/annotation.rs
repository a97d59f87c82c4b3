use serde::{Deserialize, Serialize};

/// An axis-aligned box in image-pixel coordinates, tagged with a label id.
///
/// Serialized in camelCase (`classId`) so documents stay compatible with the
/// annotation backend's JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxAnnot {
    pub class_id: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoxAnnot {
    /// Build a box from two opposite corners, in any order.
    pub fn from_corners(class_id: i32, a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            class_id,
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    /// Fold negative extents back into the origin so `width,height >= 0`.
    pub fn normalized(mut self) -> Self {
        if self.width < 0 {
            self.x += self.width;
            self.width = -self.width;
        }
        if self.height < 0 {
            self.y += self.height;
            self.height = -self.height;
        }
        self
    }
}

/// Per-image annotation document, the persistence wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDoc {
    pub image_id: String,
    pub image_width: u32,
    pub image_height: u32,
    pub boxes: Vec<BoxAnnot>,
}

/// A box scaled to `[0,1]` fractions of the image, for thumbnail previews.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbBox {
    pub class_id: i32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Thumbnails only show the first few boxes of a crowded image.
pub const THUMB_BOX_LIMIT: usize = 20;

pub fn thumb_boxes(boxes: &[BoxAnnot], image_size: (u32, u32)) -> Vec<ThumbBox> {
    let iw = image_size.0.max(1) as f32;
    let ih = image_size.1.max(1) as f32;
    boxes
        .iter()
        .take(THUMB_BOX_LIMIT)
        .map(|b| ThumbBox {
            class_id: b.class_id,
            x: b.x as f32 / iw,
            y: b.y as f32 / ih,
            width: b.width as f32 / iw,
            height: b.height as f32 / ih,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i32,
    pub name: String,
}

/// Display name for a label id; unknown ids fall back to the bare number.
pub fn label_name(labels: &[Label], id: i32) -> String {
    labels
        .iter()
        .find(|l| l.id == id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| id.to_string())
}
