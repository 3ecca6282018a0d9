/// YOLO-pose face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, NMS post-processing and the
/// mapping of boxes and eye keypoints back to image coordinates.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::eye_pair::EyePair;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::image::Image;
use crate::shared::region::Region;
use crate::shared::usage::Usage;

use super::execution_provider::open_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Keypoint slots of the two eyes in the model output.
const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;

/// YOLO face detector backed by an ONNX Runtime session.
///
/// Keeps no state between calls, so the same image always yields the same
/// regions.
pub struct OnnxYoloDetector {
    session: Mutex<ort::session::Session>,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;

        // NCHW: [1, 3, H, W]
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!("Loaded YOLO model {} (input {input_size}px)", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
            confidence,
            input_size,
        })
    }

    /// Runs the model on `image` and returns NMS-filtered detections,
    /// highest confidence first.
    fn infer(&self, image: &Image) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(image, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut raw = parse_output(
            data,
            &shape,
            Letterbox {
                scale,
                pad_x,
                pad_y,
            },
            self.confidence,
        )?;
        Ok(nms(&mut raw, NMS_IOU_THRESH))
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect_faces(
        &self,
        images: &[Image],
        usage: Usage,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        let Some(image) = images.first() else {
            return Ok(Vec::new());
        };
        let detections = self.infer(image)?;
        Ok(select_faces(&detections, usage, image.width(), image.height()))
    }

    fn detect_eyes(&self, image: &Image) -> Result<Option<EyePair>, Box<dyn std::error::Error>> {
        let detections = self.infer(image)?;
        Ok(detections.first().and_then(eyes_of))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize an image to `target_size` × `target_size`.
///
/// Gray images are replicated into all three planes and alpha is dropped.
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(image: &Image, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = image.width() as f64;
    let fh = image.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = image.as_ndarray(); // [H, W, C] u8
    let src_h = image.height() as usize;
    let src_w = image.width() as usize;
    let single = image.is_gray();

    // Nearest-neighbor resize + copy into padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                let sc = if single { 0 } else { c };
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
    keypoints: [Option<(f64, f64)>; 5],
}

impl RawDetection {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    fn area(&self) -> f64 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

/// Decodes the raw output tensor into detections in image coordinates.
///
/// YOLO output shape is `[1, features, detections]` (transposed) or
/// `[1, detections, features]`; both are accepted. Rows are
/// `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_output(
    data: &[f32],
    shape: &[usize],
    letterbox: Letterbox,
    confidence: f64,
) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if data.len() < num_dets * num_feats {
        return Err(format!("YOLO output too short for shape {shape:?}").into());
    }

    let mut detections = Vec::new();
    for i in 0..num_dets {
        let row: Vec<f32> = if transposed {
            (0..num_feats).map(|f| data[f * num_dets + i]).collect()
        } else {
            data[i * num_feats..(i + 1) * num_feats].to_vec()
        };

        if row.len() < 5 {
            continue;
        }
        let conf = row[4] as f64;
        if conf < confidence {
            continue;
        }

        let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
        let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

        let mut keypoints = [None; 5];
        if row.len() >= 5 + NUM_KEYPOINT_VALUES {
            for (k, slot) in keypoints.iter_mut().enumerate() {
                let base = 5 + k * 3;
                if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                    *slot = Some(letterbox.unmap(row[base] as f64, row[base + 1] as f64));
                }
            }
        }

        detections.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence: conf,
            keypoints,
        });
    }
    Ok(detections)
}

/// Turns NMS output into face regions for `usage`.
///
/// Detection keeps every face in confidence order; recognition keeps only
/// the largest one.
fn select_faces(detections: &[RawDetection], usage: Usage, width: u32, height: u32) -> Vec<Region> {
    let chosen: Vec<&RawDetection> = match usage {
        Usage::Detection => detections.iter().collect(),
        Usage::Recognition => detections
            .iter()
            .max_by(|a, b| {
                a.area()
                    .partial_cmp(&b.area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .into_iter()
            .collect(),
    };

    chosen
        .into_iter()
        .filter_map(|d| Region::from_corners(d.x1, d.y1, d.x2, d.y2).clamp_to(width, height))
        .collect()
}

fn eyes_of(detection: &RawDetection) -> Option<EyePair> {
    EyePair::from_points(
        detection.keypoints[LEFT_EYE],
        detection.keypoints[RIGHT_EYE],
    )
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&dets[i].bbox(), &dets[j].bbox()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
