//! Pretrained model backends

pub mod yolo;

pub use yolo::YoloSegDetector;
