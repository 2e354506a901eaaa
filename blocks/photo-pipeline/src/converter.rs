use async_trait::async_trait;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(String),

    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Conversion task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces a thumbnail `size` pixels wide at `output`, keeping the aspect ratio.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, input: &Path, size: u32, output: &Path) -> Result<(), ConvertError>;
}

/// In-process resize with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeConverter;

fn resize_file(input: &Path, size: u32, output: &Path) -> Result<(), ConvertError> {
    let reader = image::io::Reader::open(input)?
        .with_guessed_format()
        .map_err(ConvertError::Io)?;
    let format = reader
        .format()
        .ok_or_else(|| ConvertError::Decode(format!("unknown format for {}", input.display())))?;
    let img = reader
        .decode()
        .map_err(|e| ConvertError::Decode(e.to_string()))?;

    let resized = img.resize(size, u32::MAX, FilterType::Lanczos3);
    resized
        .save_with_format(output, format)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl ImageConverter for ResizeConverter {
    async fn convert(&self, input: &Path, size: u32, output: &Path) -> Result<(), ConvertError> {
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || resize_file(&input, size, &output))
            .await
            .map_err(|e| ConvertError::Task(e.to_string()))?
    }
}

/// ImageMagick: `convert <input> -thumbnail <size> <output>`.
#[derive(Debug, Clone)]
pub struct MagickConverter {
    program: PathBuf,
}

impl MagickConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MagickConverter {
    fn default() -> Self {
        Self::new("convert")
    }
}

#[async_trait]
impl ImageConverter for MagickConverter {
    async fn convert(&self, input: &Path, size: u32, output: &Path) -> Result<(), ConvertError> {
        let result = Command::new(&self.program)
            .arg(input)
            .arg("-thumbnail")
            .arg(size.to_string())
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !result.status.success() {
            return Err(ConvertError::Tool {
                program: self.program.display().to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgb};

    #[tokio::test]
    async fn resize_keeps_aspect_ratio_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("r1_wide.png");
        let output = dir.path().join("thumb_128_r1_wide.png");
        ImageBuffer::from_pixel(400, 200, Rgb([10u8, 120, 200]))
            .save(&input)
            .unwrap();

        ResizeConverter.convert(&input, 128, &output).await.unwrap();

        let thumb = image::open(&output).unwrap();
        assert_eq!(thumb.dimensions(), (128, 64));
        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[tokio::test]
    async fn resize_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.png");
        std::fs::write(&input, b"definitely not a png").unwrap();

        let err = ResizeConverter
            .convert(&input, 128, &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_tool_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MagickConverter::new(dir.path().join("no-such-convert"));
        let err = converter
            .convert(&dir.path().join("a.png"), 128, &dir.path().join("b.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
