//! Per-file processing: discovery, blur-and-save, output layout

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Result, Severity};
use crate::parallel::{Outcome, Task};

pub mod discovery;
pub mod output;
pub mod transform;

pub use discovery::*;
pub use output::*;
pub use transform::*;

/// Processes a single task: open, blur, save.
///
/// Workers are stateless apart from their configuration and never talk to
/// each other; the output directory is the only shared resource.
pub struct ImageWorker<T: ImageTransform> {
    transform: T,
    layout: OutputLayout,
    pace: Option<Duration>,
}

impl<T: ImageTransform> ImageWorker<T> {
    /// Create a new worker writing into `layout`
    pub fn new(transform: T, layout: OutputLayout) -> Self {
        Self {
            transform,
            layout,
            pace: None,
        }
    }

    /// Sleep this long before each item
    pub fn with_pace(mut self, pace: Option<Duration>) -> Self {
        self.pace = pace;
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Run one task to a terminal outcome.
    ///
    /// Recoverable (I/O category) failures are logged and reported as
    /// `Outcome::Failed`. Fatal errors are returned and abort the batch.
    pub fn process(&self, task: &Task) -> Result<Outcome> {
        info!(
            worker_id = task.worker_id,
            "Worker {} processing {}",
            task.worker_id,
            task.path.display()
        );
        let start_time = Instant::now();

        match self.blur_and_save(task) {
            Ok(output_path) => {
                info!(
                    worker_id = task.worker_id,
                    "Worker {} completed {} in {:.2}s, saved to {}",
                    task.worker_id,
                    task.path.display(),
                    start_time.elapsed().as_secs_f64(),
                    output_path.display()
                );
                Ok(Outcome::Succeeded)
            }
            Err(e) => match e.severity() {
                Severity::Recoverable => {
                    error!(
                        worker_id = task.worker_id,
                        "Error in worker {} processing {}: {}",
                        task.worker_id,
                        task.path.display(),
                        e.user_message()
                    );
                    Ok(Outcome::Failed)
                }
                Severity::Fatal => Err(e),
            },
        }
    }

    fn blur_and_save(&self, task: &Task) -> Result<PathBuf> {
        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }

        let image = self.transform.open(&task.path)?;
        let blurred = self.transform.apply_blur(image)?;

        let output_path = self.layout.output_path_for(&task.path)?;
        self.layout.ensure_dir()?;
        self.transform.save(&blurred, &output_path)?;

        Ok(output_path)
    }
}

impl ImageWorker<BlurTransform> {
    /// Build the default blur worker from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BlurTransform::from_config(&config.blur, config.output.quality),
            OutputLayout::from_config(config),
        )
        .with_pace(config.processing.pace_ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlurBatchError;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_jpeg(path: &Path) {
        let image = RgbImage::from_fn(12, 12, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 128]));
        image.save(path).unwrap();
    }

    fn task(path: PathBuf, worker_id: usize) -> Task {
        Task { path, worker_id }
    }

    /// Transform whose blur step fails with a non-I/O error
    struct ExplodingTransform;

    impl ImageTransform for ExplodingTransform {
        fn open(&self, _path: &Path) -> Result<DynamicImage> {
            Ok(DynamicImage::new_rgb8(1, 1))
        }

        fn apply_blur(&self, _image: DynamicImage) -> Result<DynamicImage> {
            Err(BlurBatchError::system("filter state corrupted"))
        }

        fn save(&self, _image: &DynamicImage, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_valid_image_succeeds() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("photo.jpg");
        write_jpeg(&input);

        let worker = ImageWorker::from_config(&Config::new(dir.path()));
        let outcome = worker.process(&task(input, 1)).unwrap();

        assert_eq!(outcome, Outcome::Succeeded);
        assert!(dir.path().join("out").join("output_photo.jpg").is_file());
    }

    #[test]
    fn test_corrupt_image_fails_without_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.jpg");
        std::fs::write(&input, b"definitely not a jpeg").unwrap();

        let worker = ImageWorker::from_config(&Config::new(dir.path()));
        let outcome = worker.process(&task(input, 2)).unwrap();

        assert_eq!(outcome, Outcome::Failed);
        assert!(!dir.path().join("out").join("output_broken.jpg").exists());
    }

    #[test]
    fn test_mislabelled_png_succeeds() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("scan.jpg");
        RgbImage::from_pixel(8, 8, Rgb([10, 200, 30]))
            .save_with_format(&input, image::ImageFormat::Png)
            .unwrap();

        let worker = ImageWorker::from_config(&Config::new(dir.path()));
        assert_eq!(worker.process(&task(input, 1)).unwrap(), Outcome::Succeeded);
        assert!(dir.path().join("out").join("output_scan.jpg").is_file());
    }

    #[test]
    fn test_directory_named_like_image_fails_without_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("album.jpg");
        std::fs::create_dir(&input).unwrap();

        let worker = ImageWorker::from_config(&Config::new(dir.path()));
        assert_eq!(worker.process(&task(input, 1)).unwrap(), Outcome::Failed);
    }

    #[test]
    fn test_missing_image_fails_without_error() {
        let dir = TempDir::new().unwrap();
        let worker = ImageWorker::from_config(&Config::new(dir.path()));

        let outcome = worker.process(&task(dir.path().join("gone.jpg"), 1)).unwrap();
        assert_eq!(outcome, Outcome::Failed);
    }

    #[test]
    fn test_unwritable_output_fails_without_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("photo.jpg");
        write_jpeg(&input);
        // A regular file where the output directory should be
        std::fs::write(dir.path().join("out"), b"").unwrap();

        let worker = ImageWorker::from_config(&Config::new(dir.path()));
        assert_eq!(worker.process(&task(input, 1)).unwrap(), Outcome::Failed);
    }

    #[test]
    fn test_non_io_error_propagates() {
        let dir = TempDir::new().unwrap();
        let worker = ImageWorker::new(ExplodingTransform, OutputLayout::new(dir.path(), "output_"));

        let err = worker.process(&task(dir.path().join("a.jpg"), 1)).unwrap_err();
        assert!(matches!(err, BlurBatchError::SystemError { .. }));
    }

    #[test]
    fn test_pace_delays_processing() {
        let dir = TempDir::new().unwrap();
        let worker = ImageWorker::from_config(&Config::new(dir.path()))
            .with_pace(Some(Duration::from_millis(30)));

        let start = Instant::now();
        worker.process(&task(dir.path().join("gone.jpg"), 1)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_from_config_honours_output_dir_and_prefix() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path()).with_output_dir(dir.path().join("blurred"));
        config.output.prefix = "soft_".to_string();

        let worker = ImageWorker::from_config(&config);
        assert_eq!(
            worker.layout().output_path_for(Path::new("x.jpg")).unwrap(),
            dir.path().join("blurred").join("soft_x.jpg")
        );
    }
}
