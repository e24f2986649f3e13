use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbaImage;

use crate::export::sink::{FrameSink, SinkConfig, check_order, ensure_parent_dir, flatten_over, started};
use crate::foundation::core::Rgb8;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Videos are upscaled (nearest neighbour) until the longer side reaches this.
pub const MIN_VIDEO_DIM: u32 = 720;

/// Output formats produced through the system `ffmpeg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoFormat {
    /// H.264, opaque.
    Mp4,
    /// VP9, opaque.
    Webm,
    /// Animated PNG with alpha, looping forever.
    Apng,
}

impl VideoFormat {
    pub fn parse(s: &str) -> ForgeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" | "h264" => Ok(Self::Mp4),
            "webm" | "vp9" => Ok(Self::Webm),
            "apng" | "png" => Ok(Self::Apng),
            other => Err(ForgeError::validation(format!(
                "unknown video format '{other}'"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Apng => "png",
        }
    }

    /// Whether frames are flattened over a solid background before encoding.
    pub fn is_opaque(self) -> bool {
        !matches!(self, Self::Apng)
    }
}

/// Integer upscale factor bringing the longer side to at least [`MIN_VIDEO_DIM`].
pub fn video_scale(width: u32, height: u32) -> u32 {
    MIN_VIDEO_DIM.div_ceil(width.max(height).max(1)).max(1)
}

/// Arguments following the `-i pipe:0` input for `format`.
pub fn output_args(format: VideoFormat, width: u32, height: u32) -> Vec<String> {
    let mut args: Vec<String> = vec!["-an".into()];
    match format {
        VideoFormat::Mp4 | VideoFormat::Webm => {
            let s = video_scale(width, height);
            // yuv420p needs even dimensions.
            args.extend([
                "-vf".into(),
                format!("scale=trunc(iw*{s}/2)*2:trunc(ih*{s}/2)*2:flags=neighbor"),
            ]);
            if format == VideoFormat::Mp4 {
                args.extend(
                    ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"]
                        .map(String::from),
                );
            } else {
                args.extend(
                    ["-c:v", "libvpx-vp9", "-pix_fmt", "yuv420p", "-b:v", "0", "-crf", "24"]
                        .map(String::from),
                );
            }
        }
        VideoFormat::Apng => {
            args.extend(["-f", "apng", "-plays", "0", "-pix_fmt", "rgba"].map(String::from));
        }
    }
    args
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    pub format: VideoFormat,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>, format: VideoFormat) -> Self {
        Self {
            out_path: out_path.into(),
            format,
            overwrite: true,
        }
    }
}

/// Spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    flatten_bg: [u8; 3],
    cfg: Option<SinkConfig>,
    pushed: usize,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            flatten_bg: [0, 0, 0],
            cfg: None,
            pushed: 0,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ForgeResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ForgeError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ForgeError::encode(
                "ffmpeg is required for video/apng export, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        // Frames are evenly spaced over the loop, so the input rate is count / loop.
        let loop_ms = cfg.loop_ms.round().max(1.0) as u64;
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-framerate",
            &format!("{}/{}", u64::from(cfg.frame_count) * 1000, loop_ms),
            "-i",
            "pipe:0",
        ])
        .args(output_args(self.opts.format, cfg.width, cfg.height))
        .arg(&self.opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ForgeError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ForgeError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ForgeError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let bg = cfg.background.solid().unwrap_or(Rgb8::BLACK);
        self.flatten_bg = [bg.r, bg.g, bg.b];
        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.pushed = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: u32, frame: &RgbaImage) -> ForgeResult<()> {
        let cfg = started(&self.cfg)?;
        cfg.check_frame(frame)?;
        check_order(idx, self.pushed)?;
        self.pushed += 1;

        let bytes: &[u8] = if self.opts.format.is_opaque() {
            flatten_over(&mut self.scratch, frame.as_raw(), self.flatten_bg)?;
            &self.scratch
        } else {
            frame.as_raw()
        };

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ForgeError::encode("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(bytes).map_err(|e| {
            ForgeError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ForgeResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ForgeError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            ForgeError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ForgeError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ForgeError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ForgeError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        tracing::info!(path = %self.opts.out_path.display(), format = ?self.opts.format, "ffmpeg export written");
        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // An aborted export leaves ffmpeg waiting on stdin; closing it lets the child exit.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/export/ffmpeg.rs"]
mod tests;
