//! YOLO segmentation model backend
//!
//! Runs a YOLOv8-seg ONNX export: `output0` carries box coordinates, class
//! scores, and mask coefficients per proposal; `output1` carries the mask
//! prototype tensor. Per-instance masks are the sigmoid of the coefficient
//! and prototype dot product, cropped to the detection box.

use crate::detector::{BBox, Detection, Detector, Mask};
use crate::error::VisionError;
use framelens_core::InferenceConfig;
use image::imageops::FilterType;
use image::RgbImage;
use ort::execution_providers as ep;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// COCO class names (80 classes)
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// A proposal that survived the confidence filter, before NMS.
struct Candidate {
    bbox: BBox,
    confidence: f32,
    class_id: usize,
    coeffs: Vec<f32>,
}

/// YOLO segmentation detector backed by ONNX Runtime.
pub struct YoloSegDetector {
    // ort sessions run through &mut; the lock serializes inference across
    // in-flight requests.
    session: Mutex<Session>,
    config: InferenceConfig,
    class_names: Vec<String>,
}

impl YoloSegDetector {
    /// Load the ONNX model from disk with COCO class names.
    pub fn load(model_path: &Path, config: InferenceConfig) -> Result<Self, VisionError> {
        let names = COCO_CLASSES.iter().map(|s| s.to_string()).collect();
        Self::load_with_names(model_path, config, names)
    }

    /// Load the ONNX model from disk with an explicit class name list.
    pub fn load_with_names(
        model_path: &Path,
        config: InferenceConfig,
        class_names: Vec<String>,
    ) -> Result<Self, VisionError> {
        let session = Session::builder()
            .map_err(|e| VisionError::Ort(format!("Failed to create session builder: {}", e)))?
            .with_execution_providers([ep::CPUExecutionProvider::default().build()])
            .map_err(|e| VisionError::Ort(format!("Failed to register execution provider: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::Model(format!("Failed to load model: {}", e)))?;

        info!("Segmentation model loaded from {:?}", model_path);

        Ok(Self {
            session: Mutex::new(session),
            config,
            class_names,
        })
    }

    /// Resize the frame to the model input size and pack it as an NCHW
    /// float tensor normalized to [0, 1].
    fn preprocess(&self, frame: &RgbImage) -> Result<ort::value::DynValue, VisionError> {
        let size = self.config.image_size;
        let resized = image::imageops::resize(frame, size, size, FilterType::Triangle);

        let plane = (size * size) as usize;
        let mut tensor_data = vec![0f32; 3 * plane];
        let raw = resized.as_raw();

        for idx in 0..plane {
            tensor_data[idx] = raw[idx * 3] as f32 / 255.0;
            tensor_data[plane + idx] = raw[idx * 3 + 1] as f32 / 255.0;
            tensor_data[2 * plane + idx] = raw[idx * 3 + 2] as f32 / 255.0;
        }

        let shape = [1usize, 3, size as usize, size as usize];
        Ok(Tensor::from_array((shape, tensor_data.into_boxed_slice()))
            .map_err(|e| VisionError::Ort(format!("Failed to create input tensor: {}", e)))?
            .into_dyn())
    }
}

impl Detector for YoloSegDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        let input = self.preprocess(frame)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs!["images" => input])
            .map_err(|e| VisionError::Ort(format!("Inference failed: {}", e)))?;

        // output0: [1, 4 + num_classes + num_coeffs, num_proposals]
        let (shape0, data0) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Ort(format!("Failed to extract output tensor: {}", e)))?;
        let num_attrs = shape0[1] as usize;
        let num_proposals = shape0[2] as usize;

        // output1: [1, num_coeffs, mask_height, mask_width]; absent on
        // plain detection exports.
        let proto = outputs
            .iter()
            .find(|(name, _)| *name == "output1")
            .map(|(_, value)| value);

        let (num_coeffs, proto_tensor) = match &proto {
            Some(value) => {
                let (shape1, data1) = value.try_extract_tensor::<f32>().map_err(|e| {
                    VisionError::Ort(format!("Failed to extract prototype tensor: {}", e))
                })?;
                let num_coeffs = shape1[1] as usize;
                let mask_height = shape1[2] as usize;
                let mask_width = shape1[3] as usize;
                (num_coeffs, Some((data1, mask_width, mask_height)))
            }
            None => (0, None),
        };

        let candidates = collect_candidates(
            &self.config,
            data0,
            num_attrs,
            num_proposals,
            num_coeffs,
            frame.width(),
            frame.height(),
        );
        debug!("{} candidates above confidence threshold", candidates.len());

        let kept = nms(&self.config, candidates);

        let detections = kept
            .into_iter()
            .map(|candidate| {
                let mask = proto_tensor.map(|(protos, mask_width, mask_height)| {
                    instance_mask(
                        &candidate,
                        protos,
                        mask_width,
                        mask_height,
                        frame.width(),
                        frame.height(),
                    )
                });
                Detection {
                    bbox: candidate.bbox,
                    confidence: candidate.confidence,
                    class_id: candidate.class_id,
                    mask,
                }
            })
            .collect::<Vec<_>>();

        debug!("Detected {} objects", detections.len());
        Ok(detections)
    }

    fn class_name(&self, class_id: usize) -> &str {
        self.class_names
            .get(class_id)
            .map(|s| s.as_str())
            .unwrap_or("object")
    }
}

/// Parse `output0` into confidence-filtered candidates in original frame
/// pixel coordinates, carrying their mask coefficients.
fn collect_candidates(
    config: &InferenceConfig,
    data: &[f32],
    num_attrs: usize,
    num_proposals: usize,
    num_coeffs: usize,
    frame_width: u32,
    frame_height: u32,
) -> Vec<Candidate> {
    let num_classes = num_attrs.saturating_sub(4 + num_coeffs);
    let scale_x = frame_width as f32 / config.image_size as f32;
    let scale_y = frame_height as f32 / config.image_size as f32;

    // Layout is column-major across attributes: [attr][proposal].
    let at = |attr: usize, i: usize| data[attr * num_proposals + i];

    let mut candidates = Vec::new();
    for i in 0..num_proposals {
        let mut best_class = 0usize;
        let mut best_score = 0f32;
        for c in 0..num_classes {
            let s = at(4 + c, i);
            if s > best_score {
                best_score = s;
                best_class = c;
            }
        }

        if best_score < config.confidence || !best_score.is_finite() {
            continue;
        }

        let cx = at(0, i);
        let cy = at(1, i);
        let w = at(2, i);
        let h = at(3, i);

        let bbox = BBox {
            x1: (cx - w / 2.0) * scale_x,
            y1: (cy - h / 2.0) * scale_y,
            x2: (cx + w / 2.0) * scale_x,
            y2: (cy + h / 2.0) * scale_y,
        }
        .clamp_to(frame_width, frame_height);

        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            continue;
        }

        let coeffs = (0..num_coeffs)
            .map(|c| at(4 + num_classes + c, i))
            .collect();

        candidates.push(Candidate {
            bbox,
            confidence: best_score,
            class_id: best_class,
            coeffs,
        });
    }

    candidates
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes
/// above the IoU threshold, cap at max_detections.
///
/// With agnostic NMS off, only same-class overlaps suppress.
fn nms(config: &InferenceConfig, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if suppressed[j] {
                continue;
            }
            if !config.agnostic_nms && candidates[i].class_id != candidates[j].class_id {
                continue;
            }
            if candidates[i].bbox.iou(&candidates[j].bbox) > config.iou {
                suppressed[j] = true;
            }
        }
        kept.push(Candidate {
            bbox: candidates[i].bbox,
            confidence: candidates[i].confidence,
            class_id: candidates[i].class_id,
            coeffs: std::mem::take(&mut candidates[i].coeffs),
        });
        if kept.len() >= config.max_detections {
            break;
        }
    }

    kept
}

/// Compute the instance mask for a candidate from the prototype tensor:
/// sigmoid(coeffs · protos), zeroed outside the detection box.
fn instance_mask(
    candidate: &Candidate,
    protos: &[f32],
    mask_width: usize,
    mask_height: usize,
    frame_width: u32,
    frame_height: u32,
) -> Mask {
    let plane = mask_width * mask_height;

    // Detection box mapped into prototype space.
    let px1 = candidate.bbox.x1 / frame_width as f32 * mask_width as f32;
    let py1 = candidate.bbox.y1 / frame_height as f32 * mask_height as f32;
    let px2 = candidate.bbox.x2 / frame_width as f32 * mask_width as f32;
    let py2 = candidate.bbox.y2 / frame_height as f32 * mask_height as f32;

    let mut data = vec![0f32; plane];
    for y in 0..mask_height {
        let fy = y as f32 + 0.5;
        if fy < py1 || fy > py2 {
            continue;
        }
        for x in 0..mask_width {
            let fx = x as f32 + 0.5;
            if fx < px1 || fx > px2 {
                continue;
            }
            let mut logit = 0f32;
            for (c, coeff) in candidate.coeffs.iter().enumerate() {
                logit += coeff * protos[c * plane + y * mask_width + x];
            }
            data[y * mask_width + x] = 1.0 / (1.0 + (-logit).exp());
        }
    }

    Mask {
        width: mask_width as u32,
        height: mask_height as u32,
        data,
    }
}
