use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("could not read artifact '{path}': {source}")]
    ArtifactUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse manifest at '{path}': {source}")]
    ManifestMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl IntegrityError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArtifactUnreadable { .. } => "ERR_DOTNOPE_ARTIFACT_UNREADABLE",
            Self::ManifestMalformed { .. } => "ERR_DOTNOPE_MANIFEST_MALFORMED",
        }
    }
}
