/// Runs an external program to completion, capturing stdout and stderr.
#[async_trait::async_trait]
pub trait CommandRunner {
    async fn output(
        &self,
        program: &std::path::Path,
        args: &[std::ffi::OsString],
    ) -> Result<std::process::Output, std::io::Error>;
}

pub struct TokioRunner;

#[async_trait::async_trait]
impl CommandRunner for TokioRunner {
    async fn output(
        &self,
        program: &std::path::Path,
        args: &[std::ffi::OsString],
    ) -> Result<std::process::Output, std::io::Error> {
        tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
    }
}

/// 10 seconds of SMPTE color bars, 1280x720 at 30 fps, interlaced and encoded with libx264.
pub fn ffmpeg_args(output: &std::path::Path) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = [
        "-f",
        "lavfi",
        "-i",
        "smptebars=duration=10:size=1280x720:rate=30",
        "-vf",
        "interlace=scan=tff",
        "-c:v",
        "libx264",
        "-crf",
        "18",
        "-preset",
        "ultrafast",
        "-r",
        "30",
        "-b:v",
        "2M",
        "-y",
    ]
    .iter()
    .map(std::ffi::OsString::from)
    .collect();
    args.push(output.as_os_str().to_owned());
    args
}

/// Generates the test video into a fresh `tmp*.mp4` file.
///
/// The returned path removes the file when dropped. If ffmpeg fails the file is removed before
/// the error is returned.
pub async fn generate<R>(
    runner: &R,
    ffmpeg: &std::path::Path,
) -> Result<tempfile::TempPath, crate::Error>
where
    R: CommandRunner + ?Sized,
{
    let output_path = tempfile::Builder::new()
        .prefix("tmp")
        .suffix(".mp4")
        .tempfile()
        .map_err(crate::Error::TempFile)?
        .into_temp_path();
    let args = ffmpeg_args(&output_path);

    log::info!("Starting ffmpeg process to generate test video...");
    log::debug!("ffmpeg arguments: {:?}", args);
    let output = runner
        .output(ffmpeg, &args)
        .await
        .map_err(|source| crate::Error::Spawn {
            program: ffmpeg.to_owned(),
            source,
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log::error!("ffmpeg error: {}", stderr);
        return Err(crate::Error::Encoder {
            status: output.status,
            stderr,
        });
    }
    log::debug!("ffmpeg output: {}", String::from_utf8_lossy(&output.stdout));

    log::info!("Temporary video file created at: {}", output_path.display());
    Ok(output_path)
}
