use thiserror::Error;

/// Failures callers may want to tell apart from transport or storage errors
///
/// These are carried inside [`anyhow::Error`] and can be recovered from the
/// whole context chain with [`anyhow::Error::downcast_ref`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PakError {
    #[error("invalid install spec: package ID is empty")]
    InvalidInstallSpec,

    #[error("package {id} was not found in the source repository")]
    SpecNotFound { id: String },

    #[error("manifest not found for version {version} of package {id}")]
    ManifestNotFound { id: String, version: String },

    #[error("file {file:?} not found in version {version} of package {id}")]
    FileNotFound {
        id: String,
        version: String,
        file: String,
    },
}

impl PakError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::InvalidInstallSpec => false,
            Self::SpecNotFound { .. }
            | Self::ManifestNotFound { .. }
            | Self::FileNotFound { .. } => true,
        }
    }
}

/// Find the first [`PakError`] in an error's context chain
pub fn find_pak_error(err: &anyhow::Error) -> Option<&PakError> {
    err.chain().find_map(|cause| cause.downcast_ref::<PakError>())
}
