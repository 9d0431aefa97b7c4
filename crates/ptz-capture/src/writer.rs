//! 帧对落盘
//!
//! 同一对帧共享一个文件名主干：自 Unix 纪元起的 100ns 计数。
//! 左帧写为 `A_<stem>.<ext>`，右帧写为 `D_<stem>.<ext>`。
//! 同一个 writer 产生的主干严格递增，即使两次写入落在同一个时钟刻度内。

use crate::config::ImageFormat;
use crate::error::CaptureError;
use crate::frame::{Frame, PairFiles};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// 当前时间（100ns 计数）
pub fn now_ticks() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos() / 100).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// 帧对写入器
#[derive(Debug)]
pub struct PairWriter {
    dir: PathBuf,
    format: ImageFormat,
    last_stem: AtomicU64,
}

impl PairWriter {
    pub fn new(dir: impl Into<PathBuf>, format: ImageFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
            last_stem: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// 分配下一个文件名主干（严格递增）
    pub fn next_stem(&self) -> u64 {
        let now = now_ticks();
        let prev = self
            .last_stem
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    pub fn paths_for(&self, stem: u64) -> (PathBuf, PathBuf) {
        let ext = self.format.extension();
        (
            self.dir.join(format!("A_{}.{}", stem, ext)),
            self.dir.join(format!("D_{}.{}", stem, ext)),
        )
    }

    /// 写入一对帧
    pub fn write(&self, left: &Frame, right: &Frame) -> Result<PairFiles, CaptureError> {
        fs::create_dir_all(&self.dir)?;
        let stem = self.next_stem();
        let (left_path, right_path) = self.paths_for(stem);

        self.write_frame(left, &left_path)?;
        self.write_frame(right, &right_path)?;

        info!(
            "Saved pair {} -> {}, {}",
            left.trigger_id,
            left_path.display(),
            right_path.display()
        );
        Ok(PairFiles {
            stem,
            left: left_path,
            right: right_path,
        })
    }

    fn write_frame(&self, frame: &Frame, path: &Path) -> Result<(), CaptureError> {
        let persist = |source: ImageError| CaptureError::Persist {
            path: path.to_path_buf(),
            source,
        };
        let file = BufWriter::new(File::create(path)?);
        match self.format {
            ImageFormat::Jpeg { quality } => JpegEncoder::new_with_quality(file, quality)
                .write_image(&frame.pixels, frame.width, frame.height, ExtendedColorType::Rgb8)
                .map_err(persist)?,
            ImageFormat::Png => PngEncoder::new(file)
                .write_image(&frame.pixels, frame.width, frame.height, ExtendedColorType::Rgb8)
                .map_err(persist)?,
        }
        debug!("Wrote {} ({}x{})", path.display(), frame.width, frame.height);
        Ok(())
    }
}
