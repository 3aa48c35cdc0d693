#[async_trait::async_trait]
pub trait CredentialResolver {
    async fn resolve(
        &self,
        profile: &str,
    ) -> Result<rusoto_credential::AwsCredentials, crate::Error>;
}

/// Named profiles from the shared AWS credentials file.
#[derive(Default)]
pub struct ProfileStore {
    credentials_file: Option<std::path::PathBuf>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials_file<P>(path: P) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self {
            credentials_file: Some(path.into()),
        }
    }
}

#[async_trait::async_trait]
impl CredentialResolver for ProfileStore {
    async fn resolve(
        &self,
        profile: &str,
    ) -> Result<rusoto_credential::AwsCredentials, crate::Error> {
        use rusoto_credential::ProvideAwsCredentials as _;

        let not_found = |e: rusoto_credential::CredentialsError| crate::Error::Profile {
            profile: profile.to_owned(),
            message: e.message,
        };
        let provider = match self.credentials_file {
            Some(ref path) => rusoto_credential::ProfileProvider::with_configuration(path, profile),
            None => {
                let mut provider = rusoto_credential::ProfileProvider::new().map_err(not_found)?;
                provider.set_profile(profile);
                provider
            }
        };
        let credentials = provider.credentials().await.map_err(not_found)?;
        log::debug!("Resolved credentials for profile {}", profile);
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialResolver as _;

    fn credentials_file() -> tempfile::NamedTempFile {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[default]\n\
             aws_access_key_id = AKIDDEFAULT\n\
             aws_secret_access_key = default-secret\n\
             \n\
             [dev]\n\
             aws_access_key_id = AKIDDEV\n\
             aws_secret_access_key = dev-secret\n\
             aws_session_token = dev-token"
        )
        .unwrap();
        file
    }

    #[tokio::test]
    async fn resolves_named_profile() {
        let file = credentials_file();
        let store = super::ProfileStore::with_credentials_file(file.path());
        let credentials = store.resolve("dev").await.unwrap();
        assert_eq!(credentials.aws_access_key_id(), "AKIDDEV");
        assert_eq!(credentials.aws_secret_access_key(), "dev-secret");
        assert_eq!(credentials.token().as_deref(), Some("dev-token"));
    }

    #[tokio::test]
    async fn unknown_profile_names_the_profile() {
        let file = credentials_file();
        let store = super::ProfileStore::with_credentials_file(file.path());
        let err = store.resolve("staging").await.unwrap_err();
        match err {
            crate::Error::Profile { ref profile, .. } => assert_eq!(profile, "staging"),
            ref e => panic!("unexpected error: {:?}", e),
        }
        assert!(err.to_string().contains("staging"), "{}", err);
    }
}
