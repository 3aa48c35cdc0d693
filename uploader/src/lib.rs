mod credentials;
mod error;
mod upload;
mod video;

pub use credentials::{CredentialResolver, ProfileStore};
pub use error::Error;
pub use upload::{
    object_url, s3_client, upload_file, Upload, DEFAULT_PART_SIZE, MAX_PART_SIZE,
};
pub use video::{ffmpeg_args, generate, CommandRunner, TokioRunner};

pub const USAGE: &str = "Usage: s3-video-upload --s3 <bucket_name> --profile <profile_name>";

pub const REGION: rusoto_core::Region = rusoto_core::Region::EuWest1;

/// Encoder binary, looked up on PATH.
pub const FFMPEG: &str = "ffmpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub bucket: String,
    pub profile: String,
}

/// Scans `--s3 <bucket>` and `--profile <profile>`. Other tokens are ignored.
pub fn parse_args<I>(args: I) -> Result<Invocation, Error>
where
    I: IntoIterator<Item = String>,
{
    let mut bucket = None;
    let mut profile = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--s3" => &mut bucket,
            "--profile" => &mut profile,
            _ => continue,
        };
        if let Some(value) = args.next() {
            *slot = Some(value);
        }
    }

    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
    Ok(Invocation {
        bucket: non_empty(bucket).ok_or(Error::Usage)?,
        profile: non_empty(profile).ok_or(Error::Usage)?,
    })
}

/// Resolves credentials, generates the test video, uploads it and deletes the local copy.
///
/// Nothing is spawned or sent when the profile cannot be resolved, and nothing is uploaded when
/// ffmpeg fails. Once the video exists it is deleted whether or not the upload succeeded.
pub async fn run<C, R, F, S>(
    invocation: &Invocation,
    resolver: &C,
    runner: &R,
    connect: F,
) -> Result<Upload, Error>
where
    C: CredentialResolver + ?Sized,
    R: CommandRunner + ?Sized,
    F: FnOnce(rusoto_credential::AwsCredentials, rusoto_core::Region) -> Result<S, Error>,
    S: rusoto_s3::S3,
{
    let credentials = resolver.resolve(&invocation.profile).await?;
    let s3 = connect(credentials, REGION)?;

    let video = generate(runner, std::path::Path::new(FFMPEG)).await?;
    let uploaded = upload_file(&s3, &invocation.bucket, &video, &REGION, DEFAULT_PART_SIZE).await;

    let path = video.to_path_buf();
    log::info!("Deleting temporary file: {}", path.display());
    if let Err(source) = video.close() {
        let e = Error::Cleanup { path, source };
        match uploaded {
            Ok(_) => return Err(e),
            Err(_) => log::error!("{}", e),
        }
    }
    uploaded
}

#[cfg(test)]
mod tests {
    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn parses_bucket_and_profile() {
        let invocation =
            super::parse_args(args(&["--s3", "my-bucket", "--profile", "dev"])).unwrap();
        assert_eq!(
            invocation,
            super::Invocation {
                bucket: "my-bucket".to_owned(),
                profile: "dev".to_owned(),
            }
        );
    }

    #[test]
    fn ignores_unknown_tokens() {
        let invocation = super::parse_args(args(&[
            "upload", "--profile", "dev", "-v", "--s3", "my-bucket", "--config", "c.toml",
        ]))
        .unwrap();
        assert_eq!(invocation.bucket, "my-bucket");
        assert_eq!(invocation.profile, "dev");
    }

    #[test]
    fn unknown_flags_do_not_consume_values() {
        let invocation = super::parse_args(args(&[
            "--s3", "my-bucket", "--config", "--profile", "dev",
        ]))
        .unwrap();
        assert_eq!(invocation.bucket, "my-bucket");
        assert_eq!(invocation.profile, "dev");
    }

    #[test]
    fn later_flags_override_earlier_ones() {
        let invocation = super::parse_args(args(&[
            "--s3", "first", "--profile", "dev", "--s3", "second",
        ]))
        .unwrap();
        assert_eq!(invocation.bucket, "second");
    }

    #[test]
    fn missing_or_empty_values_are_usage_errors() {
        let cases: &[&[&str]] = &[
            &[],
            &["--s3", "my-bucket"],
            &["--profile", "dev"],
            &["--s3", "", "--profile", "dev"],
            &["--s3", "my-bucket", "--profile", ""],
            &["--s3", "my-bucket", "--profile"],
            &["--s3", "--profile", "dev"],
        ];
        for case in cases {
            match super::parse_args(args(case)) {
                Err(super::Error::Usage) => {}
                other => panic!("{:?} => {:?}", case, other),
            }
        }
    }
}
