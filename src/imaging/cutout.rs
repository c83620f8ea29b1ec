//! Background removal capability.
//!
//! The bot treats background removal as an opaque service: photo bytes in,
//! RGBA cutout out. [`CommandCutout`] adapts an external program such as
//! `rembg` to that contract.

use std::fs;
use std::process::{Command, Stdio};

use image::RgbaImage;
use tracing::{debug, info_span};

use crate::config::CutoutConfig;
use crate::{AppError, Result};

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Removes the background from a photo.
///
/// Implementations are called from the blocking thread pool and may block.
pub trait CutoutService: Send + Sync {
    /// Return the subject of `photo` with a per-pixel alpha channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cutout` if the photo cannot be processed.
    fn cutout(&self, photo: &[u8]) -> Result<RgbaImage>;
}

/// Runs an external background-removal program per photo.
///
/// The photo is written to a temporary directory, the program is invoked
/// with `{input}` / `{output}` substituted, and the PNG it produces is
/// decoded as the cutout.
#[derive(Debug, Clone)]
pub struct CommandCutout {
    program: String,
    args: Vec<String>,
}

impl CommandCutout {
    /// Build the adapter from configuration.
    #[must_use]
    pub fn from_config(config: &CutoutConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl CutoutService for CommandCutout {
    fn cutout(&self, photo: &[u8]) -> Result<RgbaImage> {
        let _span = info_span!("cutout_command", program = %self.program).entered();

        image::guess_format(photo)
            .map_err(|err| AppError::Cutout(format!("unsupported photo: {err}")))?;

        let workdir = tempfile::tempdir()
            .map_err(|err| AppError::Cutout(format!("failed to create work dir: {err}")))?;
        let input = workdir.path().join("subject");
        let output = workdir.path().join("cutout.png");
        fs::write(&input, photo)
            .map_err(|err| AppError::Cutout(format!("failed to stage photo: {err}")))?;

        let input_arg = input.to_string_lossy();
        let output_arg = output.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input_arg)
                    .replace(OUTPUT_PLACEHOLDER, &output_arg)
            })
            .collect();

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| AppError::Cutout(format!("failed to run {}: {err}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AppError::Cutout(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let cutout = image::open(&output)
            .map_err(|err| AppError::Cutout(format!("unreadable cutout: {err}")))?
            .to_rgba8();
        debug!(
            width = cutout.width(),
            height = cutout.height(),
            "cutout produced"
        );
        Ok(cutout)
    }
}
