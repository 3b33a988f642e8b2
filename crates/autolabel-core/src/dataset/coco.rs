//! COCO detection dataset export.
//!
//! Writes `<dir>/labels.json` and copies the images into `<dir>/data/`.
//! Boxes are converted from relative `[x, y, w, h]` to absolute pixels.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AutolabelError;
use crate::types::Sample;

/// Top-level COCO document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoDataset {
    pub info: CocoInfo,
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoInfo {
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    /// Absolute `[x, y, w, h]` in pixels
    pub bbox: [f32; 4],
    pub area: f32,
    pub iscrowd: u8,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
    pub supercategory: String,
}

impl CocoDataset {
    /// Build the COCO document for `samples`.
    ///
    /// Categories start with `classes` in order (ids from 1). A detection
    /// whose label is not one of them (the detector can return a partial
    /// phrase) gets a new category on first sight. Returns the document and
    /// the file name each sample is stored under.
    pub fn build(samples: &[Sample], classes: &[&str]) -> (Self, Vec<String>) {
        let mut categories: Vec<CocoCategory> = Vec::new();
        let mut category_ids: HashMap<String, u64> = HashMap::new();
        let mut category_id = |name: &str, categories: &mut Vec<CocoCategory>| -> u64 {
            if let Some(id) = category_ids.get(name) {
                return *id;
            }
            let id = categories.len() as u64 + 1;
            categories.push(CocoCategory {
                id,
                name: name.to_string(),
                supercategory: "object".to_string(),
            });
            category_ids.insert(name.to_string(), id);
            id
        };
        for class in classes {
            category_id(class, &mut categories);
        }

        let file_names = unique_file_names(samples);
        let mut images = Vec::with_capacity(samples.len());
        let mut annotations = Vec::new();

        for (index, (sample, file_name)) in samples.iter().zip(&file_names).enumerate() {
            let image_id = index as u64 + 1;
            images.push(CocoImage {
                id: image_id,
                file_name: file_name.clone(),
                width: sample.width,
                height: sample.height,
            });

            for detection in &sample.detections {
                let bbox = detection
                    .bounding_box
                    .to_pixels(sample.width, sample.height);
                annotations.push(CocoAnnotation {
                    id: annotations.len() as u64 + 1,
                    image_id,
                    category_id: category_id(&detection.label, &mut categories),
                    bbox: bbox.into(),
                    area: bbox.area(),
                    iscrowd: 0,
                    score: detection.confidence,
                });
            }
        }

        let dataset = Self {
            info: CocoInfo {
                description: "Exported by autolabel".to_string(),
                version: crate::VERSION.to_string(),
            },
            images,
            annotations,
            categories,
        };
        (dataset, file_names)
    }
}

/// Writes COCO datasets to disk.
pub struct CocoExporter {
    dir: PathBuf,
    copy_media: bool,
}

impl CocoExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            copy_media: true,
        }
    }

    /// Exporter for `[export] dir`, honoring `copy_media`.
    pub fn from_config(config: &Config) -> Self {
        let exporter = Self::new(config.export_dir());
        if config.export.copy_media {
            exporter
        } else {
            exporter.labels_only()
        }
    }

    /// Write only `labels.json`, leaving images where they are.
    pub fn labels_only(mut self) -> Self {
        self.copy_media = false;
        self
    }

    /// Export `samples` and return the path of `labels.json`.
    pub fn export(&self, samples: &[Sample], classes: &[&str]) -> Result<PathBuf, AutolabelError> {
        std::fs::create_dir_all(&self.dir)?;
        let (dataset, file_names) = CocoDataset::build(samples, classes);

        if self.copy_media {
            let data_dir = self.dir.join("data");
            std::fs::create_dir_all(&data_dir)?;
            for (sample, file_name) in samples.iter().zip(&file_names) {
                std::fs::copy(&sample.filepath, data_dir.join(file_name))?;
            }
        }

        let labels_path = self.dir.join("labels.json");
        let mut writer = BufWriter::new(std::fs::File::create(&labels_path)?);
        serde_json::to_writer(&mut writer, &dataset)?;
        writer.flush()?;

        tracing::info!(
            "Exported {} images, {} annotations, {} categories to {:?}",
            dataset.images.len(),
            dataset.annotations.len(),
            dataset.categories.len(),
            self.dir
        );
        Ok(labels_path)
    }
}

/// File names for the export's flat `data/` directory, suffixed on collision.
fn unique_file_names(samples: &[Sample]) -> Vec<String> {
    let mut taken = HashSet::new();
    samples
        .iter()
        .map(|sample| {
            let path = &sample.filepath;
            let name = file_name(path);
            if taken.insert(name.clone()) {
                return name;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let mut n = 1;
            loop {
                let candidate = format!("{stem}-{n}{ext}");
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoxXywh, Detection};

    fn sample(path: &str, detections: Vec<Detection>) -> Sample {
        Sample {
            filepath: PathBuf::from(path),
            width: 200,
            height: 100,
            detections,
        }
    }

    #[test]
    fn test_build_converts_boxes_to_pixels() {
        let samples = vec![sample(
            "/images/a.jpg",
            vec![Detection::new(
                "blue car",
                0.8,
                BoxXywh::new(0.25, 0.5, 0.5, 0.25),
            )],
        )];

        let (coco, _) = CocoDataset::build(&samples, &["red car", "blue car"]);

        assert_eq!(coco.images.len(), 1);
        assert_eq!(coco.images[0].width, 200);
        assert_eq!(coco.annotations.len(), 1);

        let ann = &coco.annotations[0];
        assert_eq!(ann.bbox, [50.0, 50.0, 100.0, 25.0]);
        assert_eq!(ann.area, 2500.0);
        assert_eq!(ann.category_id, 2);
        assert_eq!(ann.image_id, 1);
    }

    #[test]
    fn test_unknown_labels_get_new_categories() {
        let samples = vec![sample(
            "/images/a.jpg",
            vec![
                Detection::new("car", 0.6, BoxXywh::new(0.0, 0.0, 0.1, 0.1)),
                Detection::new("red car", 0.7, BoxXywh::new(0.0, 0.0, 0.1, 0.1)),
                Detection::new("car", 0.5, BoxXywh::new(0.0, 0.0, 0.1, 0.1)),
            ],
        )];

        let (coco, _) = CocoDataset::build(&samples, &["red car"]);
        let names: Vec<&str> = coco.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["red car", "car"]);

        let ids: Vec<u64> = coco.annotations.iter().map(|a| a.category_id).collect();
        assert_eq!(ids, vec![2, 1, 2]);
    }

    #[test]
    fn test_colliding_file_names_are_suffixed() {
        let samples = vec![
            sample("/a/img.jpg", vec![]),
            sample("/b/img.jpg", vec![]),
            sample("/c/img.jpg", vec![]),
        ];
        assert_eq!(
            unique_file_names(&samples),
            vec!["img.jpg", "img-1.jpg", "img-2.jpg"]
        );
    }

    #[test]
    fn test_export_writes_labels_and_media() {
        let src = tempfile::tempdir().unwrap();
        let image = src.path().join("street.png");
        std::fs::write(&image, b"png bytes").unwrap();

        let out = tempfile::tempdir().unwrap();
        let samples = vec![Sample {
            filepath: image,
            width: 10,
            height: 10,
            detections: vec![Detection::new(
                "dog",
                0.9,
                BoxXywh::new(0.1, 0.1, 0.5, 0.5),
            )],
        }];

        let labels = CocoExporter::new(out.path())
            .export(&samples, &["dog"])
            .unwrap();

        assert!(out.path().join("data/street.png").exists());
        let coco: CocoDataset =
            serde_json::from_str(&std::fs::read_to_string(labels).unwrap()).unwrap();
        assert_eq!(coco.images[0].file_name, "street.png");
        assert_eq!(coco.annotations.len(), 1);
        assert_eq!(coco.categories[0].name, "dog");
    }

    #[test]
    fn test_labels_only_skips_media() {
        let out = tempfile::tempdir().unwrap();
        let samples = vec![sample("/does/not/exist.jpg", vec![])];

        CocoExporter::new(out.path())
            .labels_only()
            .export(&samples, &[])
            .unwrap();

        assert!(out.path().join("labels.json").exists());
        assert!(!out.path().join("data").exists());
    }

    #[test]
    fn test_from_config_honors_copy_media() {
        let mut config = Config::default();
        config.export.dir = PathBuf::from("/tmp/coco");
        let exporter = CocoExporter::from_config(&config);
        assert_eq!(exporter.dir, PathBuf::from("/tmp/coco"));
        assert!(exporter.copy_media);

        config.export.copy_media = false;
        assert!(!CocoExporter::from_config(&config).copy_media);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_export_reports_failed_write() {
        let out = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/dev/full", out.path().join("labels.json")).unwrap();
        let samples = vec![sample(
            "/images/a.jpg",
            vec![Detection::new("car", 0.9, BoxXywh::new(0.1, 0.1, 0.2, 0.2))],
        )];

        let result = CocoExporter::new(out.path())
            .labels_only()
            .export(&samples, &["car"]);
        assert!(matches!(result, Err(AutolabelError::Io(_))));
    }
}
